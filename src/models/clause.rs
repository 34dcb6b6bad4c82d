use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };

use crate::models::common::{ ClassificationStrategy, RiskLevel };

/// Placeholder text used in error records
pub const NOT_AVAILABLE: &str = "N/A";

/// Risk analysis of one clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseAnalysis {
    pub risk_level: RiskLevel,
    pub risk_explanation: String,
    pub plain_english: String,
    pub error: Option<String>,
}

impl ClauseAnalysis {
    pub fn new(
        risk_level: RiskLevel,
        risk_explanation: impl Into<String>,
        plain_english: impl Into<String>
    ) -> Self {
        Self {
            risk_level,
            risk_explanation: risk_explanation.into(),
            plain_english: plain_english.into(),
            error: None,
        }
    }

    /// An analysis that could not be completed
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            risk_level: RiskLevel::Error,
            risk_explanation: NOT_AVAILABLE.to_string(),
            plain_english: NOT_AVAILABLE.to_string(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A clause joined with its analysis. This is the output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedClause {
    pub clause: String,
    pub risk_level: RiskLevel,
    pub risk_explanation: String,
    pub plain_english: String,
    pub error: Option<String>,
}

impl AnalyzedClause {
    pub fn new(clause: String, analysis: ClauseAnalysis) -> Self {
        Self {
            clause,
            risk_level: analysis.risk_level,
            risk_explanation: analysis.risk_explanation,
            plain_english: analysis.plain_english,
            error: analysis.error,
        }
    }
}

/// Clause counts per risk level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub informational: usize,
    pub error: usize,
}

impl RiskSummary {
    pub fn from_records(records: &[AnalyzedClause]) -> Self {
        let mut summary = RiskSummary::default();
        for record in records {
            match record.risk_level {
                RiskLevel::High => summary.high += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::Low => summary.low += 1,
                RiskLevel::Informational => summary.informational += 1,
                RiskLevel::Error => summary.error += 1,
            }
        }
        summary
    }

    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Low => self.low,
            RiskLevel::Informational => self.informational,
            RiskLevel::Error => self.error,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low + self.informational + self.error
    }
}

/// Everything produced for one submitted contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractReport {
    pub source: Option<String>,
    pub strategy: ClassificationStrategy,
    pub generated_at: DateTime<Utc>,
    pub records: Vec<AnalyzedClause>,
    pub summary: RiskSummary,
}

impl ContractReport {
    pub fn new(
        source: Option<String>,
        strategy: ClassificationStrategy,
        records: Vec<AnalyzedClause>
    ) -> Self {
        let summary = RiskSummary::from_records(&records);
        Self {
            source,
            strategy,
            generated_at: Utc::now(),
            records,
            summary,
        }
    }
}
