use crate::models::clause::ClauseAnalysis;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Extraction,
    Segmentation,
    Classification,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Extraction => f.write_str("text extraction"),
            PipelineStage::Segmentation => f.write_str("clause segmentation"),
            PipelineStage::Classification => f.write_str("risk classification"),
        }
    }
}

/// Receives per-clause progress during classification.
///
/// Indices are zero-based. The batch strategy reports every clause at once
/// after its single request returns.
pub trait ClassificationProgress: Send + Sync {
    fn clause_started(&self, _index: usize, _total: usize) {}

    fn clause_finished(&self, _index: usize, _total: usize, _analysis: &ClauseAnalysis) {}
}

/// Receives stage and clause progress for a whole pipeline run
pub trait PipelineObserver: ClassificationProgress {
    fn stage_started(&self, _stage: PipelineStage) {}

    fn stage_finished(&self, _stage: PipelineStage, _detail: &str) {}

    fn stage_failed(&self, _stage: PipelineStage, _message: &str) {}
}

/// Ignores all progress
pub struct NoProgress;

impl ClassificationProgress for NoProgress {}

impl PipelineObserver for NoProgress {}
