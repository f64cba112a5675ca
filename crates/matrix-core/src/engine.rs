//! Matrix engine
//!
//! Coordinates per-project state, generation and persistence.
//!
//! # Concurrency
//!
//! Each project has its own async mutex. Local edits hold it for the whole
//! mutate-then-persist sequence so snapshots reach the sink in mutation
//! order. Generation snapshots the tabs, releases the lock while the
//! collaborator runs, and re-acquires it to merge against whatever the tab
//! looks like at commit time.

use crate::collaborators::{FillResult, GeneratedAnalysis, Generator, PersistenceSink, ProjectContext};
use crate::config::EngineConfig;
use crate::dispatch::{PersistenceDispatcher, PersistenceReceipt};
use crate::error::{EngineError, GenerationError};
use crate::guard::GenerationGuards;
use crate::persisted::PersistedAnalysis;
use crate::tabs::TabManager;
use dashmap::DashMap;
use matrix_model::{CompetitorRecord, ProjectId, RecordId, Tab, TabId};
use matrix_reconcile::{
    ActiveTabFallbackStrategy, FallbackBatch, FillBatch, FillEmptyStrategy, MergeStats, ModeSelector,
    ReconcileMode, ReconcileStrategy, RegenerateStrategy,
};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Result of a successful generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    /// Merge mode that was committed
    pub mode: ReconcileMode,
    /// Partial mode failed and full regeneration ran instead
    pub fell_back: bool,
    /// Tab the caller should show next
    pub active_tab: TabId,
    /// Per-tab merge counters, in commit order
    pub stats: Vec<(TabId, MergeStats)>,
}

/// Competitive matrix engine
pub struct MatrixEngine {
    config: EngineConfig,
    generator: Arc<dyn Generator>,
    dispatcher: PersistenceDispatcher,
    projects: DashMap<ProjectId, Arc<Mutex<TabManager>>>,
    guards: GenerationGuards,
    selector: ModeSelector,
}

impl MatrixEngine {
    /// Create engine
    ///
    /// Queued persistence spawns a worker and must be called inside a
    /// Tokio runtime.
    ///
    /// # Errors
    /// `EngineError::Config` if the configuration is invalid
    pub fn new(
        config: EngineConfig,
        generator: Arc<dyn Generator>,
        sink: Arc<dyn PersistenceSink>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let dispatcher = PersistenceDispatcher::new(config.persistence, sink);
        info!(persistence = ?config.persistence, "Matrix engine created");
        Ok(Self {
            config,
            generator,
            dispatcher,
            projects: DashMap::new(),
            guards: GenerationGuards::new(),
            selector: ModeSelector::new(),
        })
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generation guard registry
    #[inline]
    #[must_use]
    pub fn guards(&self) -> &GenerationGuards {
        &self.guards
    }

    /// Take the queued-persistence receipt stream
    pub fn take_receipts(&self) -> Option<mpsc::UnboundedReceiver<PersistenceReceipt>> {
        self.dispatcher.take_receipts()
    }

    /// Load (or reload) a project from its persisted snapshot
    pub async fn load_project(&self, snapshot: &PersistedAnalysis) {
        let manager = TabManager::from_persisted(snapshot, &self.config);
        let state = self.state(&snapshot.project_id);
        *state.lock().await = manager;
        debug!(project_id = %snapshot.project_id, "Project loaded");
    }

    /// Drop a project's in-memory state; returns whether it was loaded
    ///
    /// A generation already running keeps its own handle and commits to the
    /// detached state. The next access starts from the configured defaults.
    pub fn unload_project(&self, project: &ProjectId) -> bool {
        let removed = self.projects.remove(project).is_some();
        if removed {
            debug!(project_id = %project, "Project unloaded");
        }
        removed
    }

    /// Number of projects held in memory
    #[inline]
    #[must_use]
    pub fn loaded_projects(&self) -> usize {
        self.projects.len()
    }

    /// Current tabs of a project
    pub async fn tabs(&self, project: &ProjectId) -> Vec<Tab> {
        self.state(project).lock().await.tabs().to_vec()
    }

    /// Current analysis summary of a project
    pub async fn analysis_summary(&self, project: &ProjectId) -> String {
        self.state(project).lock().await.analysis_summary().to_string()
    }

    /// Current flattened snapshot of a project
    pub async fn snapshot(&self, project: &ProjectId) -> PersistedAnalysis {
        self.state(project).lock().await.flatten(project)
    }

    /// Add an attribute to the active tab
    ///
    /// # Errors
    /// Validation errors, or `PersistenceFailed` after the change is applied
    pub async fn add_attribute(&self, project: &ProjectId, active: Option<&TabId>, name: &str) -> Result<(), EngineError> {
        self.mutate(project, |tabs| tabs.add_attribute(active, name)).await
    }

    /// Remove an attribute from the active tab
    ///
    /// # Errors
    /// Validation errors, or `PersistenceFailed` after the change is applied
    pub async fn remove_attribute(&self, project: &ProjectId, active: Option<&TabId>, name: &str) -> Result<(), EngineError> {
        self.mutate(project, |tabs| tabs.remove_attribute(active, name)).await
    }

    /// Add a blank hand-made record to the active tab
    ///
    /// # Errors
    /// `PersistenceFailed` after the record is added
    pub async fn add_competitor(&self, project: &ProjectId, active: Option<&TabId>) -> Result<RecordId, EngineError> {
        self.mutate(project, |tabs| Ok(tabs.add_competitor(active))).await
    }

    /// Replace a record by id
    ///
    /// # Errors
    /// Validation errors, or `PersistenceFailed` after the change is applied
    pub async fn update_competitor(&self, project: &ProjectId, record: CompetitorRecord) -> Result<(), EngineError> {
        self.mutate(project, |tabs| tabs.update_competitor(record)).await
    }

    /// Delete one record
    ///
    /// # Errors
    /// `RecordNotFound`, or `PersistenceFailed` after the change is applied
    pub async fn delete_competitor(&self, project: &ProjectId, id: &RecordId) -> Result<(), EngineError> {
        self.mutate(project, |tabs| tabs.delete_competitor(id)).await
    }

    /// Delete records across all tabs; returns the ids removed
    ///
    /// # Errors
    /// `PersistenceFailed` after the change is applied
    pub async fn bulk_delete(&self, project: &ProjectId, ids: &HashSet<RecordId>) -> Result<Vec<RecordId>, EngineError> {
        self.mutate(project, |tabs| {
            let removed = tabs.bulk_delete(ids);
            info!(project_id = %project, requested = ids.len(), removed = removed.len(), "Bulk delete");
            Ok(removed)
        })
        .await
    }

    /// Append records to the active tab
    ///
    /// # Errors
    /// `InvalidRecord`, or `PersistenceFailed` after the change is applied
    pub async fn bulk_add(
        &self,
        project: &ProjectId,
        active: Option<&TabId>,
        records: Vec<CompetitorRecord>,
    ) -> Result<Vec<RecordId>, EngineError> {
        self.mutate(project, |tabs| tabs.bulk_add(active, records)).await
    }

    /// Delete a tab
    ///
    /// # Errors
    /// `TabNotFound`, `LastTab`, or `PersistenceFailed` after the change is applied
    pub async fn delete_tab(&self, project: &ProjectId, tab: &TabId) -> Result<(), EngineError> {
        self.mutate(project, |tabs| tabs.delete_tab(tab)).await
    }

    /// Run a generation request for the active tab
    ///
    /// # Mode
    /// - active tab has empty cells → partial fill; on failure falls back to full
    /// - otherwise → full regeneration
    ///
    /// Nothing is committed unless a merge succeeds. Cancellation is reported
    /// as `GenerationFailed(Cancelled)` and never triggers the fallback.
    ///
    /// # Errors
    /// - `GenerationInProgress` if this tab is already generating
    /// - `GenerationFailed` if the collaborator fails in full mode
    /// - `Reconcile` if a merge produces an invalid tab
    /// - `PersistenceFailed` after the merge is committed
    #[instrument(skip(self, project, cancel), fields(project_id = %project))]
    pub async fn generate(
        &self,
        project: &ProjectId,
        active: Option<&TabId>,
        cancel: CancellationToken,
    ) -> Result<GenerationOutcome, EngineError> {
        let state = self.state(project);

        let (active_id, previous_tabs, context) = {
            let tabs = state.lock().await;
            let active_tab = tabs.resolve_active(active);
            let context = ProjectContext::new(project.clone()).with_summary(tabs.analysis_summary());
            (active_tab.id.clone(), tabs.tabs().to_vec(), context)
        };

        let _guard = self.guards.try_acquire(project, &active_id)?;

        let active_tab = previous_tabs
            .iter()
            .find(|t| t.id == active_id)
            .ok_or_else(|| EngineError::TabNotFound(active_id.clone()))?;
        let mode = self.selector.select(active_tab);
        info!(tab_id = %active_id, mode = %mode, "Generation started");

        let mut fell_back = false;
        if mode == ReconcileMode::FillEmpty {
            let request = self
                .generator
                .fill_empty_cells(&context, &active_tab.competitors, &active_tab.schema);
            match self.call(&cancel, request).await {
                Ok(fill) => return self.commit_fill(project, &state, &active_id, fill).await,
                Err(e) if e.is_cancelled() => return Err(e.into()),
                Err(e) => {
                    warn!(tab_id = %active_id, error = %e, "Partial fill failed, falling back to full regeneration");
                    fell_back = true;
                }
            }
        }

        let request = self.generator.generate(&context, &previous_tabs);
        let generated = self.call(&cancel, request).await?;
        let mut outcome = self.commit_full(project, &state, &active_id, generated).await?;
        outcome.fell_back = fell_back;
        Ok(outcome)
    }

    fn state(&self, project: &ProjectId) -> Arc<Mutex<TabManager>> {
        Arc::clone(
            self.projects
                .entry(project.clone())
                .or_insert_with(|| Arc::new(Mutex::new(TabManager::new(Vec::new(), &self.config))))
                .value(),
        )
    }

    async fn mutate<T, F>(&self, project: &ProjectId, apply: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut TabManager) -> Result<T, EngineError>,
    {
        let state = self.state(project);
        let mut tabs = state.lock().await;
        let value = apply(&mut *tabs)?;
        self.dispatcher.dispatch(tabs.flatten(project)).await?;
        Ok(value)
    }

    async fn call<T, F>(&self, cancel: &CancellationToken, request: F) -> Result<T, GenerationError>
    where
        F: Future<Output = Result<T, GenerationError>>,
    {
        let timed = async {
            match self.config.generation_timeout() {
                Some(limit) => match tokio::time::timeout(limit, request).await {
                    Ok(result) => result,
                    Err(_) => Err(GenerationError::Timeout {
                        duration_secs: self.config.generation_timeout_secs,
                    }),
                },
                None => request.await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(GenerationError::Cancelled),
            result = timed => result,
        }
    }

    async fn commit_fill(
        &self,
        project: &ProjectId,
        state: &Mutex<TabManager>,
        active_id: &TabId,
        fill: FillResult,
    ) -> Result<GenerationOutcome, EngineError> {
        let batch: FillBatch = fill
            .competitors
            .into_iter()
            .map(|filled| (filled.id, filled.attributes))
            .collect();

        let mut tabs = state.lock().await;
        let current = tabs
            .tab(active_id)
            .ok_or_else(|| EngineError::TabNotFound(active_id.clone()))?;
        let merged = FillEmptyStrategy::new().reconcile(current, batch)?;
        let tab_id = merged.tab.id.clone();
        debug!(tab_id = %tab_id, stats = ?merged.stats, "Partial fill merged");
        tabs.replace_tab(merged.tab)?;

        self.dispatcher.dispatch(tabs.flatten(project)).await?;
        Ok(GenerationOutcome {
            mode: ReconcileMode::FillEmpty,
            fell_back: false,
            active_tab: tab_id.clone(),
            stats: vec![(tab_id, merged.stats)],
        })
    }

    async fn commit_full(
        &self,
        project: &ProjectId,
        state: &Mutex<TabManager>,
        active_id: &TabId,
        generated: GeneratedAnalysis,
    ) -> Result<GenerationOutcome, EngineError> {
        let mut tabs = state.lock().await;

        let outcome = if generated.is_structured() {
            let strategy = RegenerateStrategy::new();
            let mut merged_tabs = Vec::with_capacity(generated.sub_tabs.len());
            let mut stats = Vec::with_capacity(generated.sub_tabs.len());
            for generated_tab in generated.sub_tabs {
                let existing = tabs
                    .tab(&generated_tab.id)
                    .cloned()
                    .unwrap_or_else(|| Tab::new(generated_tab.id.clone(), generated_tab.name.clone()));
                let merged = strategy.reconcile(&existing, generated_tab)?;
                stats.push((merged.tab.id.clone(), merged.stats));
                merged_tabs.push(merged.tab);
            }

            tabs.replace_all(merged_tabs);
            tabs.set_analysis_summary(generated.analysis_summary);
            let first = tabs.resolve_active(None).id.clone();
            info!(tabs = stats.len(), active_tab = %first, "Full regeneration merged");
            GenerationOutcome {
                mode: ReconcileMode::Regenerate,
                fell_back: false,
                active_tab: first,
                stats,
            }
        } else {
            // the tab may have been deleted while the collaborator ran
            let current = tabs
                .tab(active_id)
                .ok_or_else(|| EngineError::TabNotFound(active_id.clone()))?;
            let batch = FallbackBatch {
                schema: generated.attributes,
                competitors: generated.competitors,
            };
            let merged = ActiveTabFallbackStrategy::new().reconcile(current, batch)?;
            let tab_id = merged.tab.id.clone();
            tabs.replace_tab(merged.tab)?;
            tabs.set_analysis_summary(generated.analysis_summary);
            info!(tab_id = %tab_id, "Unstructured result merged into active tab");
            GenerationOutcome {
                mode: ReconcileMode::ActiveTabFallback,
                fell_back: false,
                active_tab: tab_id.clone(),
                stats: vec![(tab_id, merged.stats)],
            }
        };

        self.dispatcher.dispatch(tabs.flatten(project)).await?;
        Ok(outcome)
    }
}

impl std::fmt::Debug for MatrixEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixEngine")
            .field("config", &self.config)
            .field("projects", &self.projects.len())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
