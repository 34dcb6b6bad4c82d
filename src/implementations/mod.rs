pub mod config;
pub mod response_parser;
pub mod llm_client;
pub mod pdf_extractor;
pub mod clause_segmenter;
pub mod risk_classifier;
pub mod pipeline;
