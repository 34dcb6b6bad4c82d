use async_trait::async_trait;

use crate::errors::ClauseResult;

/// The shape of output a request asks the model for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
    JsonArray,
}

impl ResponseFormat {
    pub fn is_json(&self) -> bool {
        !matches!(self, ResponseFormat::Text)
    }
}

/// A single prompt plus generation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub response_format: ResponseFormat,
    pub max_tokens: Option<usize>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.2,
            response_format: ResponseFormat::Text,
            max_tokens: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = response_format;
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Text-generation capability used for segmentation and classification.
///
/// Implementations return the raw model text. Callers are responsible for
/// parsing it, since models do not reliably follow output contracts.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one request to completion
    async fn generate(&self, request: &GenerationRequest) -> ClauseResult<String>;

    /// Name used in logs
    fn name(&self) -> &str {
        "text-generator"
    }
}
