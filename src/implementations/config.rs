use serde::{ Deserialize, Serialize };
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::models::common::ClassificationStrategy;

pub const SEGMENTATION_TEMPLATE: &str = "segmentation";
pub const CLAUSE_ANALYSIS_TEMPLATE: &str = "clause_analysis";
pub const BATCH_ANALYSIS_TEMPLATE: &str = "batch_analysis";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required API key: {0}")]
    MissingApiKey(String),

    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),
}

/// Supported text-generation providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
    Anthropic,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Gemini, Provider::OpenAi, Provider::Anthropic];

    /// Environment variables checked for this provider's key, in order
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            Provider::Gemini => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
            Provider::OpenAi => &["OPENAI_API_KEY"],
            Provider::Anthropic => &["ANTHROPIC_API_KEY"],
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-flash",
            Provider::OpenAi => "gpt-4o",
            Provider::Anthropic => "claude-3-5-sonnet-latest",
        }
    }

    /// Endpoint for the given model
    pub fn default_endpoint(&self, model: &str) -> String {
        match self {
            Provider::Gemini =>
                format!(
                    "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                    model
                ),
            Provider::OpenAi => "https://api.openai.com/v1/chat/completions".to_string(),
            Provider::Anthropic => "https://api.anthropic.com/v1/messages".to_string(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => f.write_str("gemini"),
            Provider::OpenAi => f.write_str("openai"),
            Provider::Anthropic => f.write_str("anthropic"),
        }
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ApiConfig {
    /// Preferred provider (gemini, openai, anthropic)
    pub provider: Option<String>,

    /// API key for LLM service
    pub api_key: Option<String>,

    /// API endpoint for LLM service
    pub api_endpoint: Option<String>,

    /// API model to use
    pub model: Option<String>,
}

/// Provider settings after credentials have been found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub provider: Provider,
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Configuration for the LLM used for segmentation and classification
    pub llm_api: ApiConfig,

    /// Temperature for clause segmentation
    pub segmentation_temperature: f32,

    /// Temperature for risk classification
    pub classification_temperature: f32,

    /// Maximum tokens for API calls
    pub max_tokens: usize,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Classification strategy
    pub strategy: ClassificationStrategy,

    /// Parallel per-clause requests (1 = sequential)
    pub concurrency: usize,

    /// Prompt templates keyed by task
    pub prompt_templates: HashMap<String, String>,
}

impl AnalyzerConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse YAML, keeping default templates that the file does not override
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let mut config: AnalyzerConfig = serde_yaml::from_str(contents)?;
        for (name, template) in default_templates() {
            config.prompt_templates.entry(name).or_insert(template);
        }
        Ok(config)
    }

    pub fn preferred_provider(&self) -> Result<Provider, ConfigError> {
        match &self.llm_api.provider {
            Some(name) => name.parse(),
            None => Ok(Provider::Gemini),
        }
    }

    /// Get the API key, checking the looked-up environment if not in config.
    /// If the preferred provider has no key, the other providers are tried.
    pub fn get_api_key_with<F>(&self, lookup: F) -> Result<(Provider, String), ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        use log::{ debug, info };

        let preferred = self.preferred_provider()?;

        if let Some(api_key) = &self.llm_api.api_key {
            if !api_key.trim().is_empty() {
                debug!("Using API key from config");
                return Ok((preferred, api_key.clone()));
            }
        }

        let candidates = std::iter
            ::once(preferred)
            .chain(Provider::ALL.into_iter().filter(|p| *p != preferred));

        for provider in candidates {
            for env_var in provider.env_vars() {
                match lookup(env_var) {
                    Some(key) if !key.trim().is_empty() => {
                        if provider == preferred {
                            info!("Using preferred provider: {}", provider);
                        } else {
                            info!("Using alternative provider: {} (preferred was {})", provider, preferred);
                        }
                        return Ok((provider, key));
                    }
                    _ => debug!("{} not set", env_var),
                }
            }
        }

        Err(ConfigError::MissingApiKey("No API keys found for any provider".to_string()))
    }

    /// Find credentials and fill in endpoint and model
    pub fn resolve_provider_with<F>(&self, lookup: F) -> Result<ResolvedProvider, ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        let preferred = self.preferred_provider()?;
        let (provider, api_key) = self.get_api_key_with(lookup)?;

        // Model and endpoint overrides only apply to the provider they were written for
        let overrides_apply = provider == preferred;
        let model = self.llm_api.model
            .clone()
            .filter(|_| overrides_apply)
            .unwrap_or_else(|| provider.default_model().to_string());
        let endpoint = self.llm_api.api_endpoint
            .clone()
            .filter(|_| overrides_apply)
            .unwrap_or_else(|| provider.default_endpoint(&model));

        Ok(ResolvedProvider { provider, api_key, endpoint, model })
    }

    /// Get the template for a specific task
    pub fn get_template(&self, template_name: &str) -> Option<String> {
        self.prompt_templates.get(template_name).cloned()
    }

    /// Render a template, replacing each `{{key}}` with its value
    pub fn render_template(
        &self,
        template_name: &str,
        params: &[(&str, &str)]
    ) -> Result<String, ConfigError> {
        let template = self
            .get_template(template_name)
            .ok_or_else(|| ConfigError::TemplateNotFound(template_name.to_string()))?;

        let mut result = template;
        for (key, value) in params {
            let placeholder = format!("{{{{{}}}}}", key);
            result = result.replace(&placeholder, value);
        }

        Ok(result)
    }
}

fn default_templates() -> HashMap<String, String> {
    let mut prompt_templates = HashMap::new();
    prompt_templates.insert(
        SEGMENTATION_TEMPLATE.to_string(),
        r#"
You are an expert legal assistant. Your task is to extract all distinct clauses from the provided contract text.

**Rules:**
1.  A "clause" is a full paragraph of text, often starting with a number or letter (e.g., "1.1", "a.").
2.  You MUST ignore titles, headers, footers, page numbers, and source citations (e.g., "Source: ACME CORP").
3.  You MUST ignore simple lists of names or definitions that are not full clauses.
4.  You MUST return your answer *only* as a valid JSON list of strings.
5.  Do not provide any preamble, explanation, or conversational text. Your entire response must be the JSON list.

Example Format: ["This is the first clause.", "This is the second clause.", "This is the third clause."]

**Contract Text to Analyze:**
---
{{contract_text}}
---

**JSON Output:**
"#.to_string(),
    );
    prompt_templates.insert(
        CLAUSE_ANALYSIS_TEMPLATE.to_string(),
        r#"
Analyze the following legal contract clause. Provide your analysis as a single valid JSON object
with exactly the keys "risk_level", "risk_explanation" and "plain_english".

**Analysis Rules:**
1.  **risk_level**: Classify the risk as "Low", "Medium", "High", or "Informational".
    - "High": Poses a significant, non-standard danger or liability (e.g., unlimited liability, auto-renewal with no exit).
    - "Medium": A standard but important clause that one party should be aware of (e.g., standard confidentiality, non-compete).
    - "Low": Standard, benign, or "boilerplate" text (e.g., "This agreement is governed by the laws of Delaware").
    - "Informational": Not a risk, just a definition or statement (e.g., "The 'Company' shall mean...").
2.  **risk_explanation**: A *brief*, 1-2 sentence explanation for the assigned risk level.
3.  **plain_english**: A simple, 1-2 sentence rewrite of the clause in plain English.

**Clause to Analyze:**
---
{{clause_text}}
---

**JSON Output:**
"#.to_string(),
    );
    prompt_templates.insert(
        BATCH_ANALYSIS_TEMPLATE.to_string(),
        r#"
Analyze each of the {{clause_count}} numbered legal contract clauses below.

Return a JSON array with exactly {{clause_count}} objects, one per clause, in the same order as the input.
Each object must have exactly the keys "clause_number", "risk_level", "risk_explanation" and "plain_english".
"clause_number" is the number shown before the clause.

**Analysis Rules:**
1.  **risk_level**: Classify the risk as "Low", "Medium", "High", or "Informational".
    - "High": Poses a significant, non-standard danger or liability (e.g., unlimited liability, auto-renewal with no exit).
    - "Medium": A standard but important clause that one party should be aware of (e.g., standard confidentiality, non-compete).
    - "Low": Standard, benign, or "boilerplate" text (e.g., "This agreement is governed by the laws of Delaware").
    - "Informational": Not a risk, just a definition or statement (e.g., "The 'Company' shall mean...").
2.  **risk_explanation**: A *brief*, 1-2 sentence explanation for the assigned risk level.
3.  **plain_english**: A simple, 1-2 sentence rewrite of the clause in plain English.

Do not provide any preamble or explanation. Your entire response must be the JSON array.

**Clauses to Analyze:**
---
{{numbered_clauses}}
---

**JSON Output:**
"#.to_string(),
    );
    prompt_templates
}

/// Default configuration
impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            llm_api: ApiConfig::default(),
            segmentation_temperature: 0.1,
            classification_temperature: 0.2,
            max_tokens: 8192,
            request_timeout_secs: 120,
            strategy: ClassificationStrategy::PerClause,
            concurrency: 1,
            prompt_templates: default_templates(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| owned.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn yaml_overrides_keep_default_templates() {
        let config = AnalyzerConfig::from_yaml(
            "strategy: batch\nconcurrency: 4\nllm_api:\n  provider: openai\n"
        ).unwrap();

        assert_eq!(config.strategy, ClassificationStrategy::Batch);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.segmentation_temperature, 0.1);
        assert!(config.get_template(SEGMENTATION_TEMPLATE).is_some());
        assert!(config.get_template(BATCH_ANALYSIS_TEMPLATE).is_some());
    }

    #[test]
    fn render_template_replaces_placeholders() {
        let config = AnalyzerConfig::default();
        let prompt = config
            .render_template(CLAUSE_ANALYSIS_TEMPLATE, &[("clause_text", "Party shall pay.")])
            .unwrap();
        assert!(prompt.contains("Party shall pay."));
        assert!(!prompt.contains("{{clause_text}}"));

        assert!(matches!(
            config.render_template("missing", &[]),
            Err(ConfigError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn preferred_provider_is_checked_first() {
        let mut config = AnalyzerConfig::default();
        config.llm_api.provider = Some("anthropic".to_string());

        let (provider, key) = config
            .get_api_key_with(env(&[("OPENAI_API_KEY", "o"), ("ANTHROPIC_API_KEY", "a")]))
            .unwrap();
        assert_eq!(provider, Provider::Anthropic);
        assert_eq!(key, "a");
    }

    #[test]
    fn falls_back_to_other_providers() {
        let config = AnalyzerConfig::default();
        let resolved = config.resolve_provider_with(env(&[("OPENAI_API_KEY", "o")])).unwrap();

        assert_eq!(resolved.provider, Provider::OpenAi);
        assert_eq!(resolved.model, "gpt-4o");
        assert_eq!(resolved.endpoint, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn gemini_endpoint_includes_model() {
        let mut config = AnalyzerConfig::default();
        config.llm_api.model = Some("gemini-2.0-pro".to_string());
        let resolved = config.resolve_provider_with(env(&[("GEMINI_API_KEY", "g")])).unwrap();

        assert_eq!(resolved.provider, Provider::Gemini);
        assert!(resolved.endpoint.ends_with("/models/gemini-2.0-pro:generateContent"));
    }

    #[test]
    fn missing_keys_are_reported() {
        let config = AnalyzerConfig::default();
        assert!(matches!(
            config.get_api_key_with(env(&[("GOOGLE_API_KEY", "  ")])),
            Err(ConfigError::MissingApiKey(_))
        ));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let mut config = AnalyzerConfig::default();
        config.llm_api.provider = Some("cohere".to_string());
        assert!(matches!(config.preferred_provider(), Err(ConfigError::UnknownProvider(_))));
    }
}
