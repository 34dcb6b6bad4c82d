use anyhow::Result;
use std::path::Path;

use clausewise::{ AnalyzerConfig, ContractAnalyzer, NoProgress, PipelineObserver };

use super::{ load_document, stage_failure };
use crate::cli::ui;
use crate::cli::OutputFormat;

pub async fn execute(config: AnalyzerConfig, file: &Path, format: OutputFormat) -> Result<()> {
    let document = load_document(file)?;
    let analyzer = ContractAnalyzer::from_config(config)?;

    let terminal = ui::TerminalObserver::new();
    let observer: &dyn PipelineObserver = match format {
        OutputFormat::Text => &terminal,
        OutputFormat::Json => &NoProgress,
    };

    let text = analyzer.extract(&document, observer).map_err(|e| stage_failure(format, e))?;
    let clauses = analyzer
        .segment(&text, observer).await
        .map_err(|e| stage_failure(format, e))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&clauses)?),
        OutputFormat::Text => {
            ui::print_header("Identified Clauses");
            for (i, clause) in clauses.iter().enumerate() {
                println!("{}.", i + 1);
                ui::print_wrapped(clause, 3);
                println!();
            }
        }
    }

    Ok(())
}
