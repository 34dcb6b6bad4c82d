use anyhow::{ Context, Result };
use log::{ debug, info };
use std::fs;
use std::path::Path;

use clausewise::{
    AnalyzerConfig,
    ClassificationStrategy,
    ContractAnalyzer,
    ContractReport,
    NoProgress,
    PipelineObserver,
    PipelineOptions,
};

use super::{ load_document, stage_failure };
use crate::cli::ui;
use crate::cli::OutputFormat;

pub struct AnalyzeArgs<'a> {
    pub file: &'a Path,
    pub strategy: Option<ClassificationStrategy>,
    pub concurrency: Option<usize>,
    pub output: Option<&'a Path>,
    pub format: OutputFormat,
    pub assume_yes: bool,
}

pub async fn execute(mut config: AnalyzerConfig, args: AnalyzeArgs<'_>) -> Result<()> {
    let options = PipelineOptions::resolve(&config, args.strategy, args.concurrency);
    options.apply_to(&mut config);
    info!(
        "Analyzing {} with strategy {} (concurrency {})",
        args.file.display(),
        options.strategy,
        options.concurrency
    );

    let document = load_document(args.file)?;
    let analyzer = ContractAnalyzer::from_config(config)?;

    if args.format == OutputFormat::Text {
        ui::print_header("Contract Risk Analysis");
        ui::print_info(&format!("Strategy: {}", options.strategy));
    }

    let terminal = ui::TerminalObserver::new();
    let observer: &dyn PipelineObserver = match args.format {
        OutputFormat::Text => &terminal,
        OutputFormat::Json => &NoProgress,
    };

    let report = analyzer
        .analyze_document(document, observer).await
        .map_err(|e| stage_failure(args.format, e))?;

    match args.format {
        OutputFormat::Text => ui::print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if let Some(path) = args.output {
        export_report(&report, path, args.assume_yes, args.format)?;
    }

    Ok(())
}

fn export_report(
    report: &ContractReport,
    path: &Path,
    assume_yes: bool,
    format: OutputFormat
) -> Result<()> {
    if path.exists() && !assume_yes {
        let prompt = format!("{} already exists. Overwrite?", path.display());
        if !ui::confirm_action(&prompt)? {
            if format == OutputFormat::Text {
                ui::print_warning("Report was not saved");
            }
            return Ok(());
        }
    }

    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Report written to {}", path.display());

    if format == OutputFormat::Text {
        ui::print_success(&format!("Report saved to {}", path.display()));
    }
    Ok(())
}
