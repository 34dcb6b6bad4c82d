use async_trait::async_trait;
use log::warn;

use crate::errors::ClauseResult;
use crate::models::document::ContractText;

/// Splits contract text into ordered clauses
#[async_trait]
pub trait ClauseSegmenter: Send + Sync {
    /// Segment the text, keeping the reason when it fails
    async fn try_segment(&self, text: &ContractText) -> ClauseResult<Vec<String>>;

    /// Segment the text. An empty result means the document could not be
    /// segmented, not that it has zero clauses.
    async fn segment(&self, text: &ContractText) -> Vec<String> {
        match self.try_segment(text).await {
            Ok(clauses) => clauses,
            Err(e) => {
                warn!("Segmentation failed: {}", e);
                Vec::new()
            }
        }
    }
}
