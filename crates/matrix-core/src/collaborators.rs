//! External collaborators: generation and persistence
//!
//! The engine never talks to a model or a document store directly. Callers
//! provide a [`Generator`] and a [`PersistenceSink`].

use crate::error::{GenerationError, PersistenceError};
use crate::persisted::PersistedAnalysis;
use matrix_model::{AttributeMap, AttributeSchema, CompetitorRecord, ProjectId, RecordId, Tab};
use serde::{Deserialize, Serialize};

/// Project information handed to the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    /// Project being analysed
    pub project_id: ProjectId,
    /// Current analysis summary, if any
    #[serde(default)]
    pub analysis_summary: String,
}

impl ProjectContext {
    /// Create context
    #[inline]
    #[must_use]
    pub fn new(project_id: impl Into<ProjectId>) -> Self {
        Self {
            project_id: project_id.into(),
            analysis_summary: String::new(),
        }
    }

    /// With analysis summary
    #[inline]
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.analysis_summary = summary.into();
        self
    }
}

/// Full generation result
///
/// With `sub_tabs` present the result replaces the whole tab set. Without
/// them `attributes` and `competitors` target the active tab only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAnalysis {
    /// Flat attribute list
    #[serde(default)]
    pub attributes: AttributeSchema,
    /// Narrative summary
    #[serde(default)]
    pub analysis_summary: String,
    /// Structured tabs with their records
    #[serde(default)]
    pub sub_tabs: Vec<Tab>,
    /// Flat record list (used when `sub_tabs` is empty)
    #[serde(default)]
    pub competitors: Vec<CompetitorRecord>,
}

impl GeneratedAnalysis {
    /// Result carries tab structure
    #[inline]
    #[must_use]
    pub fn is_structured(&self) -> bool {
        !self.sub_tabs.is_empty()
    }
}

/// Generated values for one existing record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledRecord {
    /// Existing record id
    pub id: RecordId,
    /// Values for (previously empty) cells
    #[serde(default)]
    pub attributes: AttributeMap,
}

impl FilledRecord {
    /// Create filled record
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<RecordId>, attributes: AttributeMap) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }
}

/// Partial generation result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillResult {
    /// Records with generated values, keyed by id
    #[serde(default)]
    pub competitors: Vec<FilledRecord>,
}

/// Produces competitor analyses
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Generate a full analysis
    ///
    /// `previous_tabs` is the tab set at request time, for context.
    async fn generate(
        &self,
        project: &ProjectContext,
        previous_tabs: &[Tab],
    ) -> Result<GeneratedAnalysis, GenerationError>;

    /// Fill empty cells of existing records
    async fn fill_empty_cells(
        &self,
        project: &ProjectContext,
        records: &[CompetitorRecord],
        attributes: &AttributeSchema,
    ) -> Result<FillResult, GenerationError>;
}

/// Stores project snapshots
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Save a full snapshot, replacing the previous one
    async fn save(&self, snapshot: &PersistedAnalysis) -> Result<(), PersistenceError>;
}
