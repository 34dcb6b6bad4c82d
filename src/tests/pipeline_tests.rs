use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::errors::ClauseError;
use crate::implementations::clause_segmenter::LlmClauseSegmenter;
use crate::implementations::config::AnalyzerConfig;
use crate::implementations::pipeline::ContractAnalyzer;
use crate::implementations::risk_classifier::build_classifier;
use crate::models::clause::ClauseAnalysis;
use crate::models::common::{ ClassificationStrategy, RiskLevel };
use crate::models::document::RawDocument;
use crate::testing::{
    MockRequestKind,
    MockTextGenerator,
    ProgressEvent,
    RecordingProgress,
    StaticTextExtractor,
};
use crate::traits::progress::{ ClassificationProgress, NoProgress, PipelineStage };
use crate::traits::risk_classifier::RiskClassifier;
use crate::traits::text_generator::TextGenerator;

use super::{ analysis_json, default_config, shared };

const CONFIDENTIALITY: &str = "1. Confidentiality. Party shall keep information secret.";

fn analyzer_with_text(
    text: &str,
    generator: Arc<dyn TextGenerator>,
    strategy: ClassificationStrategy
) -> ContractAnalyzer {
    let config = default_config();
    ContractAnalyzer::new(
        Box::new(StaticTextExtractor::new(text)),
        Box::new(LlmClauseSegmenter::new(generator.clone(), config.clone())),
        build_classifier(strategy, generator, config)
    )
}

fn upload() -> RawDocument {
    RawDocument::new(b"%PDF-1.7".to_vec()).with_name("contract.pdf")
}

#[tokio::test]
async fn single_confidentiality_clause_matches_exactly() {
    let (_, generator) = shared(
        MockTextGenerator::new()
            .with_clauses(&[CONFIDENTIALITY])
            .with_clause_response(
                "Party shall keep information secret.",
                r#"{"risk_level":"Medium","risk_explanation":"Standard confidentiality obligation.","plain_english":"You must keep information private."}"#
            )
    );
    let analyzer = analyzer_with_text(CONFIDENTIALITY, generator, ClassificationStrategy::PerClause);

    let report = analyzer.analyze_document(upload(), &NoProgress).await.unwrap();

    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.clause, CONFIDENTIALITY);
    assert_eq!(record.risk_level, RiskLevel::Medium);
    assert_eq!(record.risk_explanation, "Standard confidentiality obligation.");
    assert_eq!(record.plain_english, "You must keep information private.");
    assert_eq!(record.error, None);
    assert_eq!(report.source.as_deref(), Some("contract.pdf"));
    assert_eq!(report.summary.medium, 1);
}

#[tokio::test]
async fn object_segmentation_stops_before_classification() {
    let (mock, generator) = shared(
        MockTextGenerator::new()
            .with_segmentation(r#"{"not": "a list"}"#)
            .with_default_clause_response(analysis_json("Low", "x", "y"))
    );
    let analyzer = analyzer_with_text(CONFIDENTIALITY, generator, ClassificationStrategy::PerClause);
    let progress = RecordingProgress::new();

    let result = analyzer.analyze_document(upload(), &progress).await;

    assert!(matches!(result, Err(ClauseError::SegmentationFailed(_))));
    assert_eq!(mock.calls_of(MockRequestKind::Clause), 0);
    assert!(progress.events().contains(&ProgressEvent::StageFailed(PipelineStage::Segmentation)));
    assert!(!progress.events().contains(&ProgressEvent::StageStarted(PipelineStage::Classification)));
}

#[tokio::test]
async fn empty_clause_list_is_a_segmentation_failure() {
    let (_, generator) = shared(MockTextGenerator::new().with_segmentation("[]"));
    let analyzer = analyzer_with_text(CONFIDENTIALITY, generator, ClassificationStrategy::PerClause);

    let result = analyzer.analyze_document(upload(), &NoProgress).await;

    assert!(matches!(result, Err(ClauseError::SegmentationFailed(_))));
}

#[tokio::test]
async fn whitespace_extraction_never_reaches_the_model() {
    let (mock, generator) = shared(MockTextGenerator::new().with_clauses(&[CONFIDENTIALITY]));
    let analyzer = analyzer_with_text(" \n\n\t ", generator, ClassificationStrategy::PerClause);

    let result = analyzer.analyze_document(upload(), &NoProgress).await;

    match result {
        Err(e @ ClauseError::ExtractionFailed(_)) => assert!(e.user_message().contains("scanned")),
        other => panic!("expected extraction failure, got {:?}", other.map(|r| r.records.len())),
    }
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn records_follow_clause_positions() {
    let clauses = ["Alpha: First clause.", "Bravo: Second clause.", "Charlie: Third clause."];
    let (_, generator) = shared(
        MockTextGenerator::new()
            .with_clauses(&clauses)
            .with_clause_response("Alpha:", analysis_json("High", "1", "1"))
            .with_clause_failure("Bravo:", "socket closed")
            .with_clause_response("Charlie:", analysis_json("Informational", "3", "3"))
    );
    let analyzer = analyzer_with_text(&clauses.join("\n"), generator, ClassificationStrategy::PerClause);
    let progress = RecordingProgress::new();

    let report = analyzer.analyze_document(upload(), &progress).await.unwrap();

    assert_eq!(progress.messages().last().map(String::as_str), Some("Analyzed 3 clauses (1 failed)"));
    assert_eq!(report.records.len(), clauses.len());
    for (record, clause) in report.records.iter().zip(clauses.iter()) {
        assert_eq!(record.clause, *clause);
    }
    assert_eq!(report.records[0].risk_level, RiskLevel::High);
    assert_eq!(report.records[1].risk_level, RiskLevel::Error);
    assert!(report.records[1].error.is_some());
    assert_eq!(report.records[2].risk_level, RiskLevel::Informational);
    assert_eq!(report.summary.error, 1);
    assert_eq!(report.summary.total(), 3);
}

#[tokio::test]
async fn batch_pipeline_keeps_full_result_set_on_failure() {
    let clauses = ["Alpha: First clause.", "Bravo: Second clause."];
    let (mock, generator) = shared(
        MockTextGenerator::new()
            .with_clauses(&clauses)
            .with_batch_response(json!([{"clause_number": 1, "risk_level": "Low", "risk_explanation": "x", "plain_english": "y"}]).to_string())
    );
    let analyzer = analyzer_with_text(&clauses.join("\n"), generator, ClassificationStrategy::Batch);

    let report = analyzer.analyze_document(upload(), &NoProgress).await.unwrap();

    assert_eq!(report.strategy, ClassificationStrategy::Batch);
    assert_eq!(report.records.len(), 2);
    assert!(report.records.iter().all(|r| r.risk_level == RiskLevel::Error));
    assert_eq!(mock.calls().len(), 2);
}

#[tokio::test]
async fn observer_sees_stages_in_order() {
    let (_, generator) = shared(
        MockTextGenerator::new()
            .with_clauses(&[CONFIDENTIALITY])
            .with_default_clause_response(analysis_json("Medium", "x", "y"))
    );
    let analyzer = analyzer_with_text(CONFIDENTIALITY, generator, ClassificationStrategy::PerClause);
    let progress = RecordingProgress::new();

    analyzer.analyze_document(upload(), &progress).await.unwrap();

    assert_eq!(progress.events(), vec![
        ProgressEvent::StageStarted(PipelineStage::Extraction),
        ProgressEvent::StageFinished(PipelineStage::Extraction),
        ProgressEvent::StageStarted(PipelineStage::Segmentation),
        ProgressEvent::StageFinished(PipelineStage::Segmentation),
        ProgressEvent::StageStarted(PipelineStage::Classification),
        ProgressEvent::ClauseStarted(0, 1),
        ProgressEvent::ClauseFinished(0, 1, RiskLevel::Medium),
        ProgressEvent::StageFinished(PipelineStage::Classification)
    ]);
}

#[tokio::test]
async fn analyze_text_skips_extraction() {
    let (_, generator) = shared(
        MockTextGenerator::new()
            .with_clauses(&[CONFIDENTIALITY])
            .with_default_clause_response(analysis_json("Medium", "x", "y"))
    );
    let analyzer = ContractAnalyzer::with_generator(generator, default_config());

    let report = analyzer.analyze_text(CONFIDENTIALITY, None, &NoProgress).await.unwrap();
    assert_eq!(report.records.len(), 1);

    let empty = analyzer.analyze_text("   ", None, &NoProgress).await;
    assert!(matches!(empty, Err(ClauseError::ExtractionFailed(_))));
}

#[tokio::test]
async fn configured_strategy_is_used() {
    let mut config = AnalyzerConfig::default();
    config.strategy = ClassificationStrategy::Batch;
    let (_, generator) = shared(MockTextGenerator::new());

    let analyzer = ContractAnalyzer::with_generator(generator, Arc::new(config));

    assert_eq!(analyzer.strategy(), ClassificationStrategy::Batch);
}

/// Classifier that drops the last clause
struct ShortClassifier;

#[async_trait]
impl RiskClassifier for ShortClassifier {
    async fn classify(
        &self,
        clauses: &[String],
        _progress: &dyn ClassificationProgress
    ) -> Vec<ClauseAnalysis> {
        clauses
            .iter()
            .skip(1)
            .map(|_| ClauseAnalysis::new(RiskLevel::Low, "x", "y"))
            .collect()
    }

    fn strategy(&self) -> ClassificationStrategy {
        ClassificationStrategy::PerClause
    }
}

#[tokio::test]
async fn length_mismatch_is_reported_not_zipped() {
    let (_, generator) = shared(MockTextGenerator::new().with_clauses(&["A.", "B."]));
    let config = default_config();
    let analyzer = ContractAnalyzer::new(
        Box::new(StaticTextExtractor::new("A. B.")),
        Box::new(LlmClauseSegmenter::new(generator, config)),
        Box::new(ShortClassifier)
    );

    let result = analyzer.analyze_document(upload(), &NoProgress).await;

    assert!(matches!(result, Err(ClauseError::AlignmentMismatch { clauses: 2, analyses: 1 })));
}
