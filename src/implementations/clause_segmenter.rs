use std::sync::Arc;

use async_trait::async_trait;
use log::{ info, warn };

use crate::errors::{ ClauseError, ClauseResult };
use crate::implementations::config::{ AnalyzerConfig, SEGMENTATION_TEMPLATE };
use crate::implementations::response_parser::{ expect_string_array, parse_json, JsonShape };
use crate::models::document::ContractText;
use crate::traits::clause_segmenter::ClauseSegmenter;
use crate::traits::text_generator::{ GenerationRequest, ResponseFormat, TextGenerator };

/// Segments a contract with a single model request returning a JSON array of strings.
///
/// Output is validated strictly. A partially valid list is rejected, since a
/// short clause list would understate the document's risk.
pub struct LlmClauseSegmenter {
    generator: Arc<dyn TextGenerator>,
    config: Arc<AnalyzerConfig>,
}

impl LlmClauseSegmenter {
    pub fn new(generator: Arc<dyn TextGenerator>, config: Arc<AnalyzerConfig>) -> Self {
        Self { generator, config }
    }

    fn build_request(&self, text: &ContractText) -> ClauseResult<GenerationRequest> {
        let prompt = self.config.render_template(
            SEGMENTATION_TEMPLATE,
            &[("contract_text", text.as_str())]
        )?;

        Ok(
            GenerationRequest::new(prompt)
                .temperature(self.config.segmentation_temperature)
                .format(ResponseFormat::JsonArray)
        )
    }
}

#[async_trait]
impl ClauseSegmenter for LlmClauseSegmenter {
    async fn try_segment(&self, text: &ContractText) -> ClauseResult<Vec<String>> {
        let request = self.build_request(text)?;

        info!("Sending {} characters to {} for clause segmentation", text.as_str().len(), self.generator.name());
        let raw = self.generator.generate(&request).await.map_err(|e| {
            warn!("Segmentation request failed: {}", e);
            ClauseError::SegmentationFailed(e.to_string())
        })?;

        let value = parse_json(&raw, JsonShape::Array).map_err(|e| {
            ClauseError::SegmentationFailed(e.to_string())
        })?;
        let clauses = expect_string_array(value)?;

        info!("Successfully extracted {} clauses", clauses.len());
        Ok(clauses)
    }
}
