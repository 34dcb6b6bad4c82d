use anyhow::{ anyhow, Context, Result };
use clap::Parser;
use dotenv::dotenv;
use log::{ debug, info };

use clausewise::{ AnalyzerConfig, ClassificationStrategy };

mod cli;
use cli::{ ClausewiseCli, Commands, OutputFormat };
use cli::commands::{ analyze, extract, segment };

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ClausewiseCli::parse();

    setup_logging(&cli.log_level);

    if let Err(e) = dotenv() {
        debug!("No .env file loaded: {}", e);
    }

    let config = match &cli.config {
        Some(path) =>
            AnalyzerConfig::from_file(path).with_context(|| {
                format!("Failed to load configuration from {}", path.display())
            })?,
        None => AnalyzerConfig::default(),
    };

    match &cli.command {
        Commands::Analyze { file, strategy, concurrency, output, format, yes } => {
            let strategy = strategy
                .as_deref()
                .map(|s| s.parse::<ClassificationStrategy>().map_err(|e| anyhow!(e)))
                .transpose()?;

            analyze::execute(config, analyze::AnalyzeArgs {
                file,
                strategy,
                concurrency: *concurrency,
                output: output.as_deref(),
                format: OutputFormat::parse(format)?,
                assume_yes: *yes,
            }).await?;
        }
        Commands::Segment { file, format } => {
            segment::execute(config, file, OutputFormat::parse(format)?).await?;
        }
        Commands::Extract { file } => {
            extract::execute(file)?;
        }
    }

    Ok(())
}

fn setup_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Warn,
    };

    env_logger::Builder::new().filter_level(level).init();

    info!("Logger initialized with level: {}", log_level);
}
