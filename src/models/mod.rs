pub mod common;
pub mod document;
pub mod clause;

// Re-export common model types
pub use common::{ ClassificationStrategy, RiskLevel };
pub use document::{ ContractText, RawDocument };
pub use clause::{ AnalyzedClause, ClauseAnalysis, ContractReport, RiskSummary };
