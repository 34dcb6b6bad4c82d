use colored::*;
use console::Term;
use dialoguer::{ theme::ColorfulTheme, Confirm };
use indicatif::{ ProgressBar, ProgressStyle };
use std::sync::Mutex;
use std::time::Duration;
use textwrap::wrap;

use clausewise::{
    AnalyzedClause,
    ClassificationProgress,
    ClauseAnalysis,
    ContractReport,
    PipelineObserver,
    PipelineStage,
    RiskLevel,
    RiskSummary,
};

/// UI theme for consistent appearance
pub fn get_theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

fn term_width() -> usize {
    (Term::stdout().size().1 as usize).max(40)
}

/// Print a section header
pub fn print_header(title: &str) {
    let title = format!(" {} ", title);
    println!("\n{}\n", title.bold().white().on_blue());
}

/// Print text wrapped to the terminal, indented by `indent` spaces
pub fn print_wrapped(text: &str, indent: usize) {
    let width = term_width().saturating_sub(indent + 2);
    let padding = " ".repeat(indent);
    for line in text.lines() {
        for wrapped_line in wrap(line, width) {
            println!("{}{}", padding, wrapped_line);
        }
    }
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "ERROR:".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "WARNING:".yellow().bold(), message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "SUCCESS:".green().bold(), message);
}

/// Print information
pub fn print_info(message: &str) {
    println!("{} {}", "INFO:".blue().bold(), message);
}

/// Confirm an action with the user
pub fn confirm_action(prompt: &str) -> std::io::Result<bool> {
    Confirm::with_theme(&get_theme())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

/// Display a spinner while waiting for an operation to complete
pub fn spinner_with_message(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn clause_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

/// Risk level with its dashboard color
pub fn colored_level(level: RiskLevel) -> ColoredString {
    let label = level.as_str();
    match level {
        RiskLevel::High => label.white().bold().on_red(),
        RiskLevel::Medium => label.black().bold().on_yellow(),
        RiskLevel::Low => label.white().bold().on_green(),
        RiskLevel::Informational => label.white().bold().on_cyan(),
        RiskLevel::Error => label.white().bold().on_bright_black(),
    }
}

fn preview(clause: &str, max_chars: usize) -> String {
    let single_line = clause.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let cut: String = single_line.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Print clause counts per risk level
pub fn print_risk_summary(summary: &RiskSummary) {
    let mut parts: Vec<String> = RiskLevel::ASSIGNABLE.iter()
        .map(|level| format!("{} {}", colored_level(*level), summary.count(*level)))
        .collect();
    if summary.error > 0 {
        parts.push(format!("{} {}", colored_level(RiskLevel::Error), summary.error));
    }
    println!("{}", parts.join("   "));
}

/// Print one clause with its analysis
pub fn print_clause_detail(index: usize, record: &AnalyzedClause) {
    println!(
        "{} {} {}",
        format!("#{}", index + 1).bold(),
        colored_level(record.risk_level),
        preview(&record.clause, 100).dimmed()
    );

    println!("  {}", "Plain English".bold());
    print_wrapped(&record.plain_english, 4);
    println!("  {}", "Risk Explanation".bold());
    print_wrapped(&record.risk_explanation, 4);
    println!("  {}", "Original Clause".bold());
    print_wrapped(&record.clause, 4);

    if let Some(error) = &record.error {
        println!("  {} {}", "Analysis error:".red().bold(), error);
    }
    println!();
}

/// Print the full dashboard for a report
pub fn print_report(report: &ContractReport) {
    print_header("Contract Analysis Dashboard");
    if let Some(source) = &report.source {
        println!("{}: {}", "Contract".bold(), source);
    }
    println!("{}: {}", "Strategy".bold(), report.strategy);
    println!("{}: {}\n", "Clauses".bold(), report.records.len());
    print_risk_summary(&report.summary);

    print_header("Clause-by-Clause View");
    for (index, record) in report.records.iter().enumerate() {
        print_clause_detail(index, record);
    }

    if report.summary.error > 0 {
        print_warning(
            &format!("{} clauses could not be analyzed and are marked Error", report.summary.error)
        );
    }
}

/// Shows stage spinners and a per-clause progress bar
#[derive(Default)]
pub struct TerminalObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn replace_bar(&self, bar: Option<ProgressBar>) {
        if let Ok(mut current) = self.bar.lock() {
            if let Some(previous) = current.take() {
                previous.finish_and_clear();
            }
            *current = bar;
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(current) = self.bar.lock() {
            if let Some(bar) = current.as_ref() {
                f(bar);
            }
        }
    }
}

impl ClassificationProgress for TerminalObserver {
    fn clause_started(&self, index: usize, total: usize) {
        self.with_bar(|bar| {
            if bar.length() != Some(total as u64) {
                bar.set_style(clause_bar_style());
                bar.set_length(total as u64);
            }
            bar.set_message(format!("Analyzing clause {}/{}", index + 1, total));
        });
    }

    fn clause_finished(&self, _index: usize, total: usize, _analysis: &ClauseAnalysis) {
        self.with_bar(|bar| {
            if bar.length() != Some(total as u64) {
                bar.set_style(clause_bar_style());
                bar.set_length(total as u64);
            }
            bar.inc(1);
        });
    }
}

impl PipelineObserver for TerminalObserver {
    fn stage_started(&self, stage: PipelineStage) {
        let message = match stage {
            PipelineStage::Extraction => "Step 1: Extracting text from PDF...",
            PipelineStage::Segmentation => "Step 2: Identifying clauses...",
            PipelineStage::Classification => "Step 3: Analyzing clauses... This may take a moment.",
        };
        self.replace_bar(Some(spinner_with_message(message)));
    }

    fn stage_finished(&self, _stage: PipelineStage, detail: &str) {
        self.replace_bar(None);
        print_success(detail);
    }

    fn stage_failed(&self, _stage: PipelineStage, message: &str) {
        self.replace_bar(None);
        print_error(message);
    }
}
