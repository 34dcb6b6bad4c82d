pub mod models;
pub mod traits;
pub mod errors;
pub mod config;
pub mod implementations;
pub mod testing;
#[cfg(test)]
pub mod tests;

// Re-export core components
pub use config::PipelineOptions;
pub use errors::{ ClauseError, ClauseResult };
pub use implementations::config::{ AnalyzerConfig, ConfigError, Provider };
pub use implementations::llm_client::LlmTextGenerator;
pub use implementations::pdf_extractor::LopdfTextExtractor;
pub use implementations::clause_segmenter::LlmClauseSegmenter;
pub use implementations::risk_classifier::{ build_classifier, BatchClassifier, PerClauseClassifier };
pub use implementations::pipeline::ContractAnalyzer;
pub use models::{
    common::{ ClassificationStrategy, RiskLevel },
    document::{ ContractText, RawDocument },
    clause::{ AnalyzedClause, ClauseAnalysis, ContractReport, RiskSummary },
};
pub use traits::{
    ClassificationProgress,
    ClauseSegmenter,
    GenerationRequest,
    NoProgress,
    PipelineObserver,
    PipelineStage,
    ResponseFormat,
    RiskClassifier,
    TextExtractor,
    TextGenerator,
};
