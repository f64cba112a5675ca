//! Testing utilities for the competitive matrix workspace
//!
//! Shared fixtures, a scripted generator and a recording persistence sink.

#![allow(missing_docs)]

use matrix_core::{
    EngineConfig, FillResult, GeneratedAnalysis, GenerationError, Generator, MatrixEngine, PersistedAnalysis,
    PersistenceError, PersistenceSink, ProjectContext,
};
use matrix_model::{AttributeSchema, CompetitorRecord, Tab, MATCH_PROBABILITY};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Install a test subscriber honouring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn record(id: &str, name: &str, tab: &str) -> CompetitorRecord {
    CompetitorRecord::new(id, name, tab)
}

pub fn scored(id: &str, name: &str, tab: &str, score: &str) -> CompetitorRecord {
    CompetitorRecord::new(id, name, tab).with_attribute(MATCH_PROBABILITY, score)
}

pub fn tab(id: &str, name: &str, attributes: &[&str], competitors: Vec<CompetitorRecord>) -> Tab {
    Tab::new(id, name)
        .with_schema(AttributeSchema::from_names(attributes.iter().copied()))
        .with_competitors(competitors)
}

/// Full result carrying tab structure
pub fn structured(summary: &str, sub_tabs: Vec<Tab>) -> GeneratedAnalysis {
    GeneratedAnalysis {
        attributes: AttributeSchema::new(),
        analysis_summary: summary.to_string(),
        sub_tabs,
        competitors: Vec::new(),
    }
}

/// Full result without tab structure
pub fn unstructured(summary: &str, attributes: &[&str], competitors: Vec<CompetitorRecord>) -> GeneratedAnalysis {
    GeneratedAnalysis {
        attributes: AttributeSchema::from_names(attributes.iter().copied()),
        analysis_summary: summary.to_string(),
        sub_tabs: Vec::new(),
        competitors,
    }
}

/// Generator replaying queued responses
///
/// An exhausted queue answers with `GenerationError::EmptyResponse`. With a
/// gate installed every call waits for one `Notify` permit before answering.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    full: Mutex<VecDeque<Result<GeneratedAnalysis, GenerationError>>>,
    fill: Mutex<VecDeque<Result<FillResult, GenerationError>>>,
    previous_tabs: Mutex<Vec<Vec<Tab>>>,
    full_calls: AtomicUsize,
    fill_calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_full(self, result: Result<GeneratedAnalysis, GenerationError>) -> Self {
        self.full.lock().push_back(result);
        self
    }

    #[must_use]
    pub fn with_fill(self, result: Result<FillResult, GenerationError>) -> Self {
        self.fill.lock().push_back(result);
        self
    }

    #[must_use]
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn full_calls(&self) -> usize {
        self.full_calls.load(Ordering::SeqCst)
    }

    pub fn fill_calls(&self) -> usize {
        self.fill_calls.load(Ordering::SeqCst)
    }

    /// Tab sets passed to `generate`, one entry per call
    pub fn previous_tabs(&self) -> Vec<Vec<Tab>> {
        self.previous_tabs.lock().clone()
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait::async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        _project: &ProjectContext,
        previous_tabs: &[Tab],
    ) -> Result<GeneratedAnalysis, GenerationError> {
        self.full_calls.fetch_add(1, Ordering::SeqCst);
        self.previous_tabs.lock().push(previous_tabs.to_vec());
        self.wait_gate().await;
        let next = self.full.lock().pop_front();
        next.unwrap_or_else(|| Err(GenerationError::EmptyResponse("no scripted full result".into())))
    }

    async fn fill_empty_cells(
        &self,
        _project: &ProjectContext,
        _records: &[CompetitorRecord],
        _attributes: &AttributeSchema,
    ) -> Result<FillResult, GenerationError> {
        self.fill_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_gate().await;
        let next = self.fill.lock().pop_front();
        next.unwrap_or_else(|| Err(GenerationError::EmptyResponse("no scripted fill result".into())))
    }
}

/// Sink recording every snapshot it is asked to save
#[derive(Debug, Default)]
pub struct RecordingSink {
    saved: Mutex<Vec<PersistedAnalysis>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail (snapshots are still recorded)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Vec<PersistedAnalysis> {
        self.saved.lock().clone()
    }

    pub fn last(&self) -> Option<PersistedAnalysis> {
        self.saved.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.saved.lock().len()
    }
}

#[async_trait::async_trait]
impl PersistenceSink for RecordingSink {
    async fn save(&self, snapshot: &PersistedAnalysis) -> Result<(), PersistenceError> {
        self.saved.lock().push(snapshot.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::backend("recording sink set to fail"));
        }
        Ok(())
    }
}

/// Engine wired to a scripted generator and a recording sink
pub fn setup_engine(
    config: EngineConfig,
    generator: ScriptedGenerator,
) -> (Arc<MatrixEngine>, Arc<ScriptedGenerator>, Arc<RecordingSink>) {
    let generator = Arc::new(generator);
    let sink = Arc::new(RecordingSink::new());
    let engine = MatrixEngine::new(config, generator.clone(), sink.clone())
        .unwrap_or_else(|e| panic!("test engine config rejected: {e}"));
    (Arc::new(engine), generator, sink)
}
