use thiserror::Error;

use crate::implementations::config::ConfigError;

/// Error types for the clause analysis pipeline
#[derive(Debug, Error)]
pub enum ClauseError {
    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Clause segmentation failed: {0}")]
    SegmentationFailed(String),

    #[error("Clause classification failed: {0}")]
    Classification(String),

    #[error("Batch response had {actual} entries for {expected} clauses")]
    BatchMismatch { expected: usize, actual: usize },

    #[error("Got {analyses} analyses for {clauses} clauses")]
    AlignmentMismatch { clauses: usize, analyses: usize },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Text generation unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type specific to clause analysis operations
pub type ClauseResult<T> = Result<T, ClauseError>;

impl ClauseError {
    /// Whether this error stops the submission instead of marking a single clause
    pub fn is_stage_fatal(&self) -> bool {
        matches!(
            self,
            ClauseError::ExtractionFailed(_)
                | ClauseError::SegmentationFailed(_)
                | ClauseError::AlignmentMismatch { .. }
                | ClauseError::Config(_)
                | ClauseError::Io(_)
        )
    }

    /// Message shown to the person reviewing the contract
    pub fn user_message(&self) -> String {
        match self {
            ClauseError::ExtractionFailed(_) =>
                "Could not extract text from this PDF. It might be an image-based or scanned document.".to_string(),
            ClauseError::SegmentationFailed(_) =>
                "Could not identify any clauses. The model may have had an issue, or the document format might be unusual.".to_string(),
            ClauseError::AlignmentMismatch { clauses, analyses } =>
                format!(
                    "Analysis results could not be matched to clauses ({} clauses, {} analyses).",
                    clauses,
                    analyses
                ),
            ClauseError::Config(e) => format!("Configuration problem: {}", e),
            other => other.to_string(),
        }
    }
}
