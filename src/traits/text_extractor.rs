use crate::errors::ClauseResult;
use crate::models::document::{ ContractText, RawDocument };

/// Turns an uploaded document into contract text
pub trait TextExtractor: Send + Sync {
    /// Extract the text of every page in reading order.
    ///
    /// Fails with `ClauseError::ExtractionFailed` when the document cannot be
    /// decoded or holds no text (typically a scanned, image-only PDF).
    fn extract(&self, document: &RawDocument) -> ClauseResult<ContractText>;
}
