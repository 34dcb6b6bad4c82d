use std::sync::Arc;

use log::{ error, info };

use crate::errors::{ ClauseError, ClauseResult };
use crate::implementations::clause_segmenter::LlmClauseSegmenter;
use crate::implementations::config::AnalyzerConfig;
use crate::implementations::llm_client::LlmTextGenerator;
use crate::implementations::pdf_extractor::LopdfTextExtractor;
use crate::implementations::risk_classifier::build_classifier;
use crate::models::clause::{ AnalyzedClause, ClauseAnalysis, ContractReport };
use crate::models::common::ClassificationStrategy;
use crate::models::document::{ ContractText, RawDocument };
use crate::traits::clause_segmenter::ClauseSegmenter;
use crate::traits::progress::{ ClassificationProgress, PipelineObserver, PipelineStage };
use crate::traits::risk_classifier::RiskClassifier;
use crate::traits::text_extractor::TextExtractor;
use crate::traits::text_generator::TextGenerator;

/// Runs extraction, segmentation and classification for one contract.
///
/// Stages run strictly in sequence; each needs the full output of the one
/// before it. Extraction and segmentation failures end the run. Clause
/// failures are carried in the report as error records.
pub struct ContractAnalyzer {
    extractor: Box<dyn TextExtractor>,
    segmenter: Box<dyn ClauseSegmenter>,
    classifier: Box<dyn RiskClassifier>,
}

impl ContractAnalyzer {
    pub fn new(
        extractor: Box<dyn TextExtractor>,
        segmenter: Box<dyn ClauseSegmenter>,
        classifier: Box<dyn RiskClassifier>
    ) -> Self {
        Self { extractor, segmenter, classifier }
    }

    /// Standard pipeline talking to the configured LLM provider
    pub fn from_config(config: AnalyzerConfig) -> ClauseResult<Self> {
        let generator: Arc<dyn TextGenerator> = Arc::new(LlmTextGenerator::new(config.clone())?);
        Ok(Self::with_generator(generator, Arc::new(config)))
    }

    /// Standard pipeline over any text generator. The generator is shared by
    /// the segmenter and the classifier.
    pub fn with_generator(generator: Arc<dyn TextGenerator>, config: Arc<AnalyzerConfig>) -> Self {
        let segmenter = LlmClauseSegmenter::new(generator.clone(), config.clone());
        let classifier = build_classifier(config.strategy, generator, config);
        Self::new(Box::new(LopdfTextExtractor::new()), Box::new(segmenter), classifier)
    }

    pub fn strategy(&self) -> ClassificationStrategy {
        self.classifier.strategy()
    }

    /// Stage 1: document bytes to text
    pub fn extract(
        &self,
        document: &RawDocument,
        observer: &dyn PipelineObserver
    ) -> ClauseResult<ContractText> {
        observer.stage_started(PipelineStage::Extraction);
        match self.extractor.extract(document) {
            Ok(text) => {
                observer.stage_finished(
                    PipelineStage::Extraction,
                    &format!("Extracted {} characters", text.as_str().len())
                );
                Ok(text)
            }
            Err(e) => Err(fail(observer, PipelineStage::Extraction, e)),
        }
    }

    /// Stage 2: text to clauses. An empty clause list is a failure.
    pub async fn segment(
        &self,
        text: &ContractText,
        observer: &dyn PipelineObserver
    ) -> ClauseResult<Vec<String>> {
        observer.stage_started(PipelineStage::Segmentation);
        let result = match self.segmenter.try_segment(text).await {
            Ok(clauses) if clauses.is_empty() =>
                Err(ClauseError::SegmentationFailed("No clauses identified".to_string())),
            Ok(clauses) => Ok(clauses),
            Err(e @ (ClauseError::SegmentationFailed(_) | ClauseError::Config(_))) => Err(e),
            Err(other) => Err(ClauseError::SegmentationFailed(other.to_string())),
        };

        match result {
            Ok(clauses) => {
                observer.stage_finished(
                    PipelineStage::Segmentation,
                    &format!("Identified {} clauses", clauses.len())
                );
                Ok(clauses)
            }
            Err(e) => Err(fail(observer, PipelineStage::Segmentation, e)),
        }
    }

    /// Stage 3: clauses to output records
    pub async fn classify(
        &self,
        clauses: Vec<String>,
        observer: &dyn PipelineObserver
    ) -> ClauseResult<Vec<AnalyzedClause>> {
        observer.stage_started(PipelineStage::Classification);
        let progress = ObserverProgress(observer);
        let analyses = self.classifier.classify(&clauses, &progress).await;
        let failed = analyses
            .iter()
            .filter(|analysis| analysis.is_error())
            .count();

        match join_results(clauses, analyses) {
            Ok(records) => {
                observer.stage_finished(
                    PipelineStage::Classification,
                    &format!("Analyzed {} clauses ({} failed)", records.len(), failed)
                );
                Ok(records)
            }
            Err(e) => Err(fail(observer, PipelineStage::Classification, e)),
        }
    }

    /// Run the whole pipeline on an uploaded PDF
    pub async fn analyze_document(
        &self,
        document: RawDocument,
        observer: &dyn PipelineObserver
    ) -> ClauseResult<ContractReport> {
        let text = self.extract(&document, observer)?;
        let source = document.name;
        self.run_from_text(text, source, observer).await
    }

    /// Run segmentation and classification on text that is already extracted
    pub async fn analyze_text(
        &self,
        text: &str,
        source: Option<String>,
        observer: &dyn PipelineObserver
    ) -> ClauseResult<ContractReport> {
        let text = ContractText::new(text).ok_or_else(|| {
            ClauseError::ExtractionFailed("Contract text is empty".to_string())
        })?;
        self.run_from_text(text, source, observer).await
    }

    async fn run_from_text(
        &self,
        text: ContractText,
        source: Option<String>,
        observer: &dyn PipelineObserver
    ) -> ClauseResult<ContractReport> {
        let clauses = self.segment(&text, observer).await?;
        let records = self.classify(clauses, observer).await?;

        let report = ContractReport::new(source, self.strategy(), records);
        info!(
            "Analysis complete: {} high, {} medium, {} low, {} informational, {} errors",
            report.summary.high,
            report.summary.medium,
            report.summary.low,
            report.summary.informational,
            report.summary.error
        );
        Ok(report)
    }
}

fn fail(observer: &dyn PipelineObserver, stage: PipelineStage, e: ClauseError) -> ClauseError {
    error!("Pipeline stopped during {}: {}", stage, e);
    observer.stage_failed(stage, &e.user_message());
    e
}

/// Pair each clause with the analysis at the same index
pub fn join_results(
    clauses: Vec<String>,
    analyses: Vec<ClauseAnalysis>
) -> ClauseResult<Vec<AnalyzedClause>> {
    if clauses.len() != analyses.len() {
        return Err(ClauseError::AlignmentMismatch {
            clauses: clauses.len(),
            analyses: analyses.len(),
        });
    }

    Ok(
        clauses
            .into_iter()
            .zip(analyses)
            .map(|(clause, analysis)| AnalyzedClause::new(clause, analysis))
            .collect()
    )
}

/// Forwards classifier progress to a pipeline observer
struct ObserverProgress<'a>(&'a dyn PipelineObserver);

impl ClassificationProgress for ObserverProgress<'_> {
    fn clause_started(&self, index: usize, total: usize) {
        self.0.clause_started(index, total);
    }

    fn clause_finished(&self, index: usize, total: usize, analysis: &ClauseAnalysis) {
        self.0.clause_finished(index, total, analysis);
    }
}
