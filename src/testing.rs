//! Testing utilities including mock implementations.
//!
//! These let the pipeline run end to end without network calls or PDF files.
//! The mock generator tells requests apart by markers in the default prompt
//! templates, so tests using it should keep those templates.

use async_trait::async_trait;
use std::sync::{ Arc, RwLock };
use std::time::Duration;

use crate::errors::{ ClauseError, ClauseResult };
use crate::models::clause::ClauseAnalysis;
use crate::models::common::RiskLevel;
use crate::models::document::{ ContractText, RawDocument };
use crate::traits::progress::{ ClassificationProgress, PipelineObserver, PipelineStage };
use crate::traits::text_extractor::TextExtractor;
use crate::traits::text_generator::{ GenerationRequest, ResponseFormat, TextGenerator };

const SEGMENTATION_MARKER: &str = "**Contract Text to Analyze:**";
const BATCH_MARKER: &str = "**Clauses to Analyze:**";

/// Which pipeline call a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockRequestKind {
    Segmentation,
    Batch,
    Clause,
}

impl MockRequestKind {
    fn of(prompt: &str) -> Self {
        if prompt.contains(SEGMENTATION_MARKER) {
            MockRequestKind::Segmentation
        } else if prompt.contains(BATCH_MARKER) {
            MockRequestKind::Batch
        } else {
            MockRequestKind::Clause
        }
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Respond { text: String, delay: Option<Duration> },
    Fail(String),
}

impl MockReply {
    async fn produce(&self) -> ClauseResult<String> {
        match self {
            MockReply::Respond { text, delay } => {
                if let Some(delay) = delay {
                    tokio::time::sleep(*delay).await;
                }
                Ok(text.clone())
            }
            MockReply::Fail(message) => Err(ClauseError::Network(message.clone())),
        }
    }
}

/// Record of a request made to the mock generator
#[derive(Debug, Clone)]
pub struct MockCall {
    pub kind: MockRequestKind,
    pub prompt: String,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

/// A mock text generator with deterministic, configurable responses.
///
/// Clause rules match when the prompt contains their needle; the first
/// matching rule wins. Failures surface as `ClauseError::Network`.
#[derive(Default)]
pub struct MockTextGenerator {
    segmentation: Option<MockReply>,
    batch: Option<MockReply>,
    clause_rules: Vec<(String, MockReply)>,
    default_clause: Option<MockReply>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockCall>>>,
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw response for the segmentation request
    pub fn with_segmentation(mut self, response: impl Into<String>) -> Self {
        self.segmentation = Some(MockReply::Respond { text: response.into(), delay: None });
        self
    }

    /// Segmentation clauses, serialized as the JSON array a model would return
    pub fn with_clauses(self, clauses: &[&str]) -> Self {
        let json = serde_json::to_string(clauses).unwrap_or_default();
        self.with_segmentation(json)
    }

    pub fn with_segmentation_failure(mut self, message: impl Into<String>) -> Self {
        self.segmentation = Some(MockReply::Fail(message.into()));
        self
    }

    /// Raw response for the batch classification request
    pub fn with_batch_response(mut self, response: impl Into<String>) -> Self {
        self.batch = Some(MockReply::Respond { text: response.into(), delay: None });
        self
    }

    pub fn with_batch_failure(mut self, message: impl Into<String>) -> Self {
        self.batch = Some(MockReply::Fail(message.into()));
        self
    }

    /// Response for per-clause requests whose prompt contains `needle`
    pub fn with_clause_response(
        mut self,
        needle: impl Into<String>,
        response: impl Into<String>
    ) -> Self {
        self.clause_rules.push((needle.into(), MockReply::Respond {
            text: response.into(),
            delay: None,
        }));
        self
    }

    /// Like `with_clause_response`, answering only after `delay`
    pub fn with_delayed_clause_response(
        mut self,
        needle: impl Into<String>,
        response: impl Into<String>,
        delay: Duration
    ) -> Self {
        self.clause_rules.push((needle.into(), MockReply::Respond {
            text: response.into(),
            delay: Some(delay),
        }));
        self
    }

    pub fn with_clause_failure(mut self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        self.clause_rules.push((needle.into(), MockReply::Fail(message.into())));
        self
    }

    /// Response for per-clause requests no rule matched
    pub fn with_default_clause_response(mut self, response: impl Into<String>) -> Self {
        self.default_clause = Some(MockReply::Respond { text: response.into(), delay: None });
        self
    }

    /// All requests made so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .read()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn calls_of(&self, kind: MockRequestKind) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.kind == kind)
            .count()
    }

    fn reply_for(&self, kind: MockRequestKind, prompt: &str) -> Option<&MockReply> {
        match kind {
            MockRequestKind::Segmentation => self.segmentation.as_ref(),
            MockRequestKind::Batch => self.batch.as_ref(),
            MockRequestKind::Clause =>
                self.clause_rules
                    .iter()
                    .find(|(needle, _)| prompt.contains(needle.as_str()))
                    .map(|(_, reply)| reply)
                    .or(self.default_clause.as_ref()),
        }
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> ClauseResult<String> {
        let kind = MockRequestKind::of(&request.prompt);
        if let Ok(mut calls) = self.calls.write() {
            calls.push(MockCall {
                kind,
                prompt: request.prompt.clone(),
                temperature: request.temperature,
                response_format: request.response_format,
            });
        }

        match self.reply_for(kind, &request.prompt) {
            Some(reply) => reply.produce().await,
            None =>
                Err(ClauseError::Network(format!("No mock response configured for {:?} request", kind))),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Text extractor returning fixed text regardless of the document
pub struct StaticTextExtractor {
    text: String,
}

impl StaticTextExtractor {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextExtractor for StaticTextExtractor {
    fn extract(&self, _document: &RawDocument) -> ClauseResult<ContractText> {
        ContractText::new(self.text.clone()).ok_or_else(|| {
            ClauseError::ExtractionFailed("No extractable text".to_string())
        })
    }
}

/// Progress event captured by `RecordingProgress`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    StageStarted(PipelineStage),
    StageFinished(PipelineStage),
    StageFailed(PipelineStage),
    ClauseStarted(usize, usize),
    ClauseFinished(usize, usize, RiskLevel),
}

/// Observer that records every event it receives
#[derive(Default)]
pub struct RecordingProgress {
    events: RwLock<Vec<ProgressEvent>>,
    messages: RwLock<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .read()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Stage details and failure messages, in arrival order
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .read()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    fn note(&self, message: &str) {
        if let Ok(mut messages) = self.messages.write() {
            messages.push(message.to_string());
        }
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
        }
    }
}

impl ClassificationProgress for RecordingProgress {
    fn clause_started(&self, index: usize, total: usize) {
        self.push(ProgressEvent::ClauseStarted(index, total));
    }

    fn clause_finished(&self, index: usize, total: usize, analysis: &ClauseAnalysis) {
        self.push(ProgressEvent::ClauseFinished(index, total, analysis.risk_level));
    }
}

impl PipelineObserver for RecordingProgress {
    fn stage_started(&self, stage: PipelineStage) {
        self.push(ProgressEvent::StageStarted(stage));
    }

    fn stage_finished(&self, stage: PipelineStage, detail: &str) {
        self.push(ProgressEvent::StageFinished(stage));
        self.note(detail);
    }

    fn stage_failed(&self, stage: PipelineStage, message: &str) {
        self.push(ProgressEvent::StageFailed(stage));
        self.note(message);
    }
}
