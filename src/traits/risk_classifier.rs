use async_trait::async_trait;

use crate::models::clause::ClauseAnalysis;
use crate::models::common::ClassificationStrategy;
use crate::traits::progress::ClassificationProgress;

/// Classifies the risk of a sequence of clauses.
///
/// The returned vector always has one analysis per input clause, in input
/// order. Failures are reported as error analyses, never by shortening the
/// result.
#[async_trait]
pub trait RiskClassifier: Send + Sync {
    async fn classify(
        &self,
        clauses: &[String],
        progress: &dyn ClassificationProgress
    ) -> Vec<ClauseAnalysis>;

    fn strategy(&self) -> ClassificationStrategy;
}
