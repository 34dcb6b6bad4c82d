use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use log::{ debug, error, info, warn };
use serde_json::{ json, Value };

use crate::errors::{ ClauseError, ClauseResult };
use crate::implementations::config::{ AnalyzerConfig, Provider, ResolvedProvider };
use crate::traits::text_generator::{ GenerationRequest, ResponseFormat, TextGenerator };

const SYSTEM_PROMPT: &str =
    "You are an expert legal assistant. When asked for JSON you respond with JSON only.";

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Text generator backed by a hosted LLM API.
///
/// Provider credentials are resolved on the first request and cached for the
/// lifetime of the client. A failed resolution is cached too: later requests
/// return the same `ClauseError::Unavailable` without repeating setup.
///
/// # API Keys
/// Set `api_key` in the configuration, or one of these environment variables:
///    - Gemini: GOOGLE_API_KEY or GEMINI_API_KEY
///    - OpenAI: OPENAI_API_KEY
///    - Anthropic: ANTHROPIC_API_KEY
pub struct LlmTextGenerator {
    config: AnalyzerConfig,
    http_client: reqwest::Client,
    env_lookup: EnvLookup,
    provider: OnceLock<Result<ResolvedProvider, String>>,
}

impl LlmTextGenerator {
    /// Create a client reading credentials from the process environment
    pub fn new(config: AnalyzerConfig) -> ClauseResult<Self> {
        Self::with_env_lookup(config, |name| std::env::var(name).ok())
    }

    /// Create a client with a custom credential lookup
    pub fn with_env_lookup<F>(config: AnalyzerConfig, lookup: F) -> ClauseResult<Self>
        where F: Fn(&str) -> Option<String> + Send + Sync + 'static
    {
        let http_client = reqwest::Client
            ::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClauseError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            env_lookup: Box::new(lookup),
            provider: OnceLock::new(),
        })
    }

    /// Resolve the provider once; every later call sees the cached outcome
    fn resolve(&self) -> ClauseResult<&ResolvedProvider> {
        let state = self.provider.get_or_init(|| {
            match self.config.resolve_provider_with(|name| (self.env_lookup)(name)) {
                Ok(resolved) => {
                    info!("Text generation configured: {} ({})", resolved.provider, resolved.model);
                    Ok(resolved)
                }
                Err(e) => {
                    error!("Text generation setup failed: {}", e);
                    Err(e.to_string())
                }
            }
        });

        state.as_ref().map_err(|reason| ClauseError::Unavailable(reason.clone()))
    }

    /// Whether credentials could be resolved. Triggers resolution if needed.
    pub fn is_available(&self) -> bool {
        self.resolve().is_ok()
    }

    async fn send(&self, resolved: &ResolvedProvider, body: &Value) -> ClauseResult<Value> {
        let mut request_builder = self.http_client
            .post(&resolved.endpoint)
            .header("Content-Type", "application/json");

        request_builder = match resolved.provider {
            Provider::Gemini => request_builder.header("x-goog-api-key", &resolved.api_key),
            Provider::OpenAi =>
                request_builder.header("Authorization", format!("Bearer {}", resolved.api_key)),
            Provider::Anthropic =>
                request_builder
                    .header("x-api-key", &resolved.api_key)
                    .header("anthropic-version", "2023-06-01"),
        };

        let response = request_builder
            .json(body)
            .send().await
            .map_err(|e| {
                let error_msg = format!("Network error when calling {} API: {}", resolved.provider, e);
                warn!("{}", error_msg);
                if e.is_timeout() {
                    warn!("Request timed out");
                }
                if e.is_connect() {
                    warn!("Connection error - check network connectivity");
                }
                ClauseError::Network(error_msg)
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text().await
                .unwrap_or_else(|_| "Failed to get error message".to_string());

            warn!("API error: HTTP {} - {}", status, error_text);
            return Err(ClauseError::Http {
                status,
                message: error_text,
            });
        }

        let response_text = response.text().await.map_err(|e| {
            warn!("Failed to get response text: {}", e);
            ClauseError::Network(e.to_string())
        })?;

        debug!("Response length: {} characters", response_text.len());

        serde_json::from_str(&response_text).map_err(|e| {
            warn!("Failed to parse response envelope: {}", e);
            ClauseError::MalformedResponse(format!("Invalid JSON envelope: {}", e))
        })
    }
}

/// Provider-specific request body
pub fn build_request_body(
    provider: Provider,
    model: &str,
    request: &GenerationRequest,
    default_max_tokens: usize
) -> Value {
    let max_tokens = request.max_tokens.unwrap_or(default_max_tokens);

    match provider {
        Provider::Gemini => {
            let mut generation_config =
                json!({
                "temperature": request.temperature,
                "maxOutputTokens": max_tokens,
            });
            if request.response_format.is_json() {
                generation_config["responseMimeType"] = json!("application/json");
            }
            json!({
                "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
                "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
                "generationConfig": generation_config,
            })
        }
        Provider::OpenAi => {
            let mut body =
                json!({
                "model": model,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": request.prompt }
                ],
                "temperature": request.temperature,
                "max_tokens": max_tokens,
            });
            // json_object mode forces an object, so array requests rely on the prompt
            if request.response_format == ResponseFormat::JsonObject {
                body["response_format"] = json!({ "type": "json_object" });
            }
            body
        }
        Provider::Anthropic =>
            json!({
            "model": model,
            "max_tokens": max_tokens,
            "temperature": request.temperature,
            "system": SYSTEM_PROMPT,
            "messages": [{ "role": "user", "content": request.prompt }],
        }),
    }
}

/// Pull the generated text out of a provider response envelope
pub fn extract_content(provider: Provider, response: &Value) -> ClauseResult<String> {
    let content = match provider {
        Provider::Gemini => {
            if let Some(reason) = response["promptFeedback"]["blockReason"].as_str() {
                return Err(ClauseError::MalformedResponse(format!("Request blocked: {}", reason)));
            }
            response["candidates"][0]["content"]["parts"].as_array().map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<String>()
            })
        }
        Provider::OpenAi => response["choices"][0]["message"]["content"].as_str().map(String::from),
        Provider::Anthropic => response["content"][0]["text"].as_str().map(String::from),
    };

    content
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            ClauseError::MalformedResponse(format!("No text content in {} response", provider))
        })
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> ClauseResult<String> {
        let resolved = self.resolve()?;
        let body = build_request_body(
            resolved.provider,
            &resolved.model,
            request,
            self.config.max_tokens
        );

        info!("Making LLM API request to {}", resolved.provider);
        debug!("API endpoint: {}", resolved.endpoint);
        debug!("Model: {}", resolved.model);
        debug!("Temperature: {}", request.temperature);
        debug!("Prompt length: {} characters", request.prompt.len());

        let response = self.send(resolved, &body).await?;
        let content = extract_content(resolved.provider, &response)?;

        debug!("Content length: {} characters", content.len());
        Ok(content)
    }

    fn name(&self) -> &str {
        "llm-api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_credentials_are_cached_as_unavailable() {
        let lookups = Arc::new(AtomicUsize::new(0));
        let counter = lookups.clone();
        let generator = LlmTextGenerator::with_env_lookup(AnalyzerConfig::default(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        }).unwrap();

        let request = GenerationRequest::new("Classify this.");
        let first = generator.generate(&request).await;
        let after_first = lookups.load(Ordering::SeqCst);
        let second = generator.generate(&request).await;

        assert!(matches!(first, Err(ClauseError::Unavailable(_))));
        assert!(matches!(second, Err(ClauseError::Unavailable(_))));
        assert!(after_first > 0);
        assert_eq!(lookups.load(Ordering::SeqCst), after_first);
        assert!(!generator.is_available());
    }

    #[test]
    fn configured_key_makes_client_available() {
        let mut config = AnalyzerConfig::default();
        config.llm_api.api_key = Some("secret".to_string());
        let generator = LlmTextGenerator::with_env_lookup(config, |_| None).unwrap();
        assert!(generator.is_available());
    }

    #[test]
    fn gemini_body_requests_json_mime_type() {
        let request = GenerationRequest::new("prompt")
            .temperature(0.1)
            .format(ResponseFormat::JsonArray);
        let body = build_request_body(Provider::Gemini, "gemini-2.5-flash", &request, 1024);

        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "prompt");
    }

    #[test]
    fn openai_json_mode_only_for_objects() {
        let object_request = GenerationRequest::new("p").format(ResponseFormat::JsonObject);
        let array_request = GenerationRequest::new("p").format(ResponseFormat::JsonArray).max_tokens(50);

        let object_body = build_request_body(Provider::OpenAi, "gpt-4o", &object_request, 1024);
        let array_body = build_request_body(Provider::OpenAi, "gpt-4o", &array_request, 1024);

        assert_eq!(object_body["response_format"]["type"], "json_object");
        assert!(array_body.get("response_format").is_none());
        assert_eq!(array_body["max_tokens"], 50);
    }

    #[test]
    fn extracts_content_per_provider() {
        let gemini = json!({"candidates": [{"content": {"parts": [{"text": "[\"a\","}, {"text": "\"b\"]"}]}}]});
        let openai = json!({"choices": [{"message": {"role": "assistant", "content": "{}"}}]});
        let anthropic = json!({"content": [{"type": "text", "text": "[]"}]});

        assert_eq!(extract_content(Provider::Gemini, &gemini).unwrap(), "[\"a\",\"b\"]");
        assert_eq!(extract_content(Provider::OpenAi, &openai).unwrap(), "{}");
        assert_eq!(extract_content(Provider::Anthropic, &anthropic).unwrap(), "[]");
    }

    #[test]
    fn blocked_or_empty_responses_are_malformed() {
        let blocked = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let empty = json!({"choices": []});

        assert!(matches!(
            extract_content(Provider::Gemini, &blocked),
            Err(ClauseError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_content(Provider::OpenAi, &empty),
            Err(ClauseError::MalformedResponse(_))
        ));
    }
}
