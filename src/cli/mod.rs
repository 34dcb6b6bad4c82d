use clap::{ Parser, Subcommand };
use std::path::PathBuf;

pub mod commands;
pub mod ui;

#[derive(Parser)]
#[command(
    name = "clausewise",
    about = "Splits a PDF contract into clauses and explains the risk of each one",
    version,
    author,
    long_about = None
)]
pub struct ClausewiseCli {
    /// Sets the log level (error, warn, info, debug, trace)
    #[arg(short, long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract, segment and classify every clause of a contract
    Analyze {
        /// PDF contract to analyze
        file: PathBuf,

        /// Classification strategy (per-clause, batch)
        #[arg(short, long)]
        strategy: Option<String>,

        /// Parallel per-clause requests
        #[arg(long)]
        concurrency: Option<usize>,

        /// Write the report as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Overwrite the output file without asking
        #[arg(short, long, default_value = "false")]
        yes: bool,
    },

    /// Extract and segment a contract without classifying it
    Segment {
        /// PDF contract to segment
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the text extracted from a PDF
    Extract {
        /// PDF file to read
        file: PathBuf,
    },
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow::anyhow!("Unknown output format: {}", other)),
        }
    }
}
