pub mod text_generator;
pub mod text_extractor;
pub mod clause_segmenter;
pub mod risk_classifier;
pub mod progress;

// Re-export traits
pub use text_generator::{ GenerationRequest, ResponseFormat, TextGenerator };
pub use text_extractor::TextExtractor;
pub use clause_segmenter::ClauseSegmenter;
pub use risk_classifier::RiskClassifier;
pub use progress::{ ClassificationProgress, NoProgress, PipelineObserver, PipelineStage };
