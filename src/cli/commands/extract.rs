use anyhow::Result;
use std::path::Path;

use clausewise::{ LopdfTextExtractor, TextExtractor };

use super::load_document;
use crate::cli::ui;

pub fn execute(file: &Path) -> Result<()> {
    let document = load_document(file)?;
    let spinner = ui::spinner_with_message("Extracting text from PDF...");
    let result = LopdfTextExtractor::new().extract(&document);
    spinner.finish_and_clear();

    match result {
        Ok(text) => {
            println!("{}", text.as_str());
            Ok(())
        }
        Err(e) => {
            ui::print_error(&e.user_message());
            Err(e.into())
        }
    }
}
