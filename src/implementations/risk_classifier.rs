use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{ self, StreamExt };
use log::{ debug, info, warn };
use serde_json::Value;

use crate::errors::{ ClauseError, ClauseResult };
use crate::implementations::config::{
    AnalyzerConfig,
    BATCH_ANALYSIS_TEMPLATE,
    CLAUSE_ANALYSIS_TEMPLATE,
};
use crate::implementations::response_parser::{ analysis_from_value, parse_json, JsonShape };
use crate::models::clause::ClauseAnalysis;
use crate::models::common::ClassificationStrategy;
use crate::traits::progress::ClassificationProgress;
use crate::traits::risk_classifier::RiskClassifier;
use crate::traits::text_generator::{ GenerationRequest, ResponseFormat, TextGenerator };

/// Error recorded for every clause when a batch response cannot be trusted
pub const BATCH_FAILED: &str = "Batch analysis failed";

/// Build the classifier for a configured strategy
pub fn build_classifier(
    strategy: ClassificationStrategy,
    generator: Arc<dyn TextGenerator>,
    config: Arc<AnalyzerConfig>
) -> Box<dyn RiskClassifier> {
    match strategy {
        ClassificationStrategy::PerClause => Box::new(PerClauseClassifier::new(generator, config)),
        ClassificationStrategy::Batch => Box::new(BatchClassifier::new(generator, config)),
    }
}

/// One request per clause. A failed clause never affects the others.
pub struct PerClauseClassifier {
    generator: Arc<dyn TextGenerator>,
    config: Arc<AnalyzerConfig>,
    concurrency: usize,
}

impl PerClauseClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>, config: Arc<AnalyzerConfig>) -> Self {
        let concurrency = config.concurrency.max(1);
        Self { generator, config, concurrency }
    }

    /// Run up to `concurrency` requests at once. Results keep clause order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Classify one clause, converting any failure into an error analysis
    pub async fn classify_clause(&self, clause: &str) -> ClauseAnalysis {
        match self.try_classify_clause(clause).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Clause analysis failed: {}", e);
                ClauseAnalysis::failed(e.to_string())
            }
        }
    }

    async fn try_classify_clause(&self, clause: &str) -> ClauseResult<ClauseAnalysis> {
        let prompt = self.config.render_template(
            CLAUSE_ANALYSIS_TEMPLATE,
            &[("clause_text", clause)]
        )?;
        let request = GenerationRequest::new(prompt)
            .temperature(self.config.classification_temperature)
            .format(ResponseFormat::JsonObject);

        let raw = self.generator.generate(&request).await?;
        let value = parse_json(&raw, JsonShape::Object)?;
        Ok(analysis_from_value(&value))
    }

    async fn classify_at(
        &self,
        index: usize,
        total: usize,
        clause: &str,
        progress: &dyn ClassificationProgress
    ) -> ClauseAnalysis {
        progress.clause_started(index, total);
        let analysis = self.classify_clause(clause).await;
        debug!("Clause {}/{} classified as {}", index + 1, total, analysis.risk_level);
        progress.clause_finished(index, total, &analysis);
        analysis
    }
}

#[async_trait]
impl RiskClassifier for PerClauseClassifier {
    async fn classify(
        &self,
        clauses: &[String],
        progress: &dyn ClassificationProgress
    ) -> Vec<ClauseAnalysis> {
        let total = clauses.len();
        info!("Analyzing {} clauses one at a time (concurrency {})", total, self.concurrency);

        if self.concurrency == 1 {
            let mut analyses = Vec::with_capacity(total);
            for (index, clause) in clauses.iter().enumerate() {
                analyses.push(self.classify_at(index, total, clause, progress).await);
            }
            return analyses;
        }

        let futures: Vec<_> = clauses
            .iter()
            .enumerate()
            .map(|(index, clause)| self.classify_at(index, total, clause, progress))
            .collect();

        // buffered() yields in input order regardless of completion order
        stream::iter(futures).buffered(self.concurrency).collect().await
    }

    fn strategy(&self) -> ClassificationStrategy {
        ClassificationStrategy::PerClause
    }
}

/// One request for every clause. Any doubt about alignment fails the whole batch.
pub struct BatchClassifier {
    generator: Arc<dyn TextGenerator>,
    config: Arc<AnalyzerConfig>,
}

impl BatchClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>, config: Arc<AnalyzerConfig>) -> Self {
        Self { generator, config }
    }

    /// Label each clause with its 1-based position
    pub fn numbered_clauses(clauses: &[String]) -> String {
        clauses
            .iter()
            .enumerate()
            .map(|(i, clause)| format!("Clause {}:\n{}", i + 1, clause.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    async fn try_classify_batch(&self, clauses: &[String]) -> ClauseResult<Vec<ClauseAnalysis>> {
        let clause_count = clauses.len().to_string();
        let numbered = Self::numbered_clauses(clauses);
        let prompt = self.config.render_template(
            BATCH_ANALYSIS_TEMPLATE,
            &[
                ("clause_count", clause_count.as_str()),
                ("numbered_clauses", numbered.as_str()),
            ]
        )?;
        let request = GenerationRequest::new(prompt)
            .temperature(self.config.classification_temperature)
            .format(ResponseFormat::JsonArray);

        let raw = self.generator.generate(&request).await?;
        let items = match parse_json(&raw, JsonShape::Array)? {
            Value::Array(items) => items,
            _ => {
                return Err(
                    ClauseError::MalformedResponse("Batch response is not a JSON array".to_string())
                );
            }
        };

        if items.len() != clauses.len() {
            return Err(ClauseError::BatchMismatch {
                expected: clauses.len(),
                actual: items.len(),
            });
        }

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                check_clause_number(item, i + 1)?;
                Ok(analysis_from_value(item))
            })
            .collect()
    }
}

fn whole_number(value: Option<f64>) -> Option<u64> {
    value.filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0).map(|v| v as u64)
}

/// The echoed `clause_number` must match the entry's position
fn check_clause_number(item: &Value, expected: usize) -> ClauseResult<()> {
    let echoed = match item.get("clause_number") {
        Some(Value::Number(n)) => n.as_u64().or_else(|| whole_number(n.as_f64())),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| whole_number(s.parse::<f64>().ok()))
        }
        _ => None,
    };

    match echoed {
        Some(n) if n == (expected as u64) => Ok(()),
        Some(n) =>
            Err(
                ClauseError::MalformedResponse(
                    format!("Entry {} is labelled clause {}", expected, n)
                )
            ),
        None =>
            Err(
                ClauseError::MalformedResponse(
                    format!("Entry {} has no usable clause_number", expected)
                )
            ),
    }
}

#[async_trait]
impl RiskClassifier for BatchClassifier {
    async fn classify(
        &self,
        clauses: &[String],
        progress: &dyn ClassificationProgress
    ) -> Vec<ClauseAnalysis> {
        let total = clauses.len();
        if total == 0 {
            return Vec::new();
        }

        info!("Analyzing {} clauses in a single batch request", total);
        let analyses = match self.try_classify_batch(clauses).await {
            Ok(analyses) => analyses,
            Err(e) => {
                warn!("{}: {}", BATCH_FAILED, e);
                vec![ClauseAnalysis::failed(BATCH_FAILED); total]
            }
        };

        for (index, analysis) in analyses.iter().enumerate() {
            progress.clause_finished(index, total, analysis);
        }
        analyses
    }

    fn strategy(&self) -> ClassificationStrategy {
        ClassificationStrategy::Batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_clauses_from_one() {
        let numbered = BatchClassifier::numbered_clauses(&["First.".to_string(), " Second. ".to_string()]);
        assert_eq!(numbered, "Clause 1:\nFirst.\n\nClause 2:\nSecond.");
    }

    #[test]
    fn clause_number_must_match_position() {
        assert!(check_clause_number(&json!({"clause_number": 2}), 2).is_ok());
        assert!(check_clause_number(&json!({"clause_number": "3"}), 3).is_ok());
        assert!(check_clause_number(&json!({"clause_number": 1}), 2).is_err());
        assert!(check_clause_number(&json!({"risk_level": "Low"}), 1).is_err());
    }

    #[test]
    fn whole_float_clause_numbers_are_accepted() {
        assert!(check_clause_number(&json!({"clause_number": 1.0}), 1).is_ok());
        assert!(check_clause_number(&json!({"clause_number": "2.0"}), 2).is_ok());
        assert!(check_clause_number(&json!({"clause_number": 1.5}), 1).is_err());
        assert!(check_clause_number(&json!({"clause_number": -1.0}), 1).is_err());
    }
}
