pub mod analyze;
pub mod extract;
pub mod segment;

use anyhow::{ Context, Result };
use std::path::Path;

use clausewise::{ ClauseError, RawDocument };

use crate::cli::ui;
use crate::cli::OutputFormat;

/// Read a PDF from disk, keeping its file name for the report
pub fn load_document(path: &Path) -> Result<RawDocument> {
    RawDocument::from_path(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Message to print for a failed stage. Text mode already shows it through
/// the terminal observer.
pub fn failure_notice(format: OutputFormat, error: &ClauseError) -> Option<String> {
    match format {
        OutputFormat::Text => None,
        OutputFormat::Json => Some(error.user_message()),
    }
}

/// Report a pipeline failure to the user and hand it back for the exit code
pub fn stage_failure(format: OutputFormat, error: ClauseError) -> anyhow::Error {
    if let Some(message) = failure_notice(format, &error) {
        ui::print_error(&message);
    }
    error.into()
}
