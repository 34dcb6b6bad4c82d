use std::fmt;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

/// Risk classification of a single clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Informational,
    /// The analysis could not be completed
    Error,
}

impl RiskLevel {
    /// Levels a model is allowed to return, in dashboard order
    pub const ASSIGNABLE: [RiskLevel; 4] = [
        RiskLevel::High,
        RiskLevel::Medium,
        RiskLevel::Low,
        RiskLevel::Informational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::Informational => "Informational",
            RiskLevel::Error => "Error",
        }
    }

    /// Parse a level produced by the model. `Error` is never accepted from a model.
    pub fn from_model_label(label: &str) -> Option<RiskLevel> {
        let label = label.trim();
        RiskLevel::ASSIGNABLE.iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How clauses are sent to the model for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationStrategy {
    /// One request per clause
    #[default]
    PerClause,
    /// One request covering every clause
    Batch,
}

impl fmt::Display for ClassificationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationStrategy::PerClause => f.write_str("per-clause"),
            ClassificationStrategy::Batch => f.write_str("batch"),
        }
    }
}

impl FromStr for ClassificationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per-clause" | "perclause" | "single" | "clause" => Ok(ClassificationStrategy::PerClause),
            "batch" | "all" => Ok(ClassificationStrategy::Batch),
            other => Err(format!("Unknown classification strategy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_labels_are_case_insensitive() {
        assert_eq!(RiskLevel::from_model_label("high"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_model_label(" Informational "), Some(RiskLevel::Informational));
        assert_eq!(RiskLevel::from_model_label("Error"), None);
        assert_eq!(RiskLevel::from_model_label("Severe"), None);
    }

    #[test]
    fn strategy_parses_cli_names() {
        assert_eq!("per-clause".parse::<ClassificationStrategy>(), Ok(ClassificationStrategy::PerClause));
        assert_eq!("BATCH".parse::<ClassificationStrategy>(), Ok(ClassificationStrategy::Batch));
        assert!("parallel".parse::<ClassificationStrategy>().is_err());
        assert_eq!(ClassificationStrategy::Batch.to_string(), "batch");
    }
}
