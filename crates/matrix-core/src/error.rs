//! Error types for the matrix engine
//!
//! Provides error handling for:
//! - Local validation (schema and record edits)
//! - Generation collaborator failures
//! - Persistence collaborator failures
//! - Concurrency rejections

use matrix_model::{ModelError, ProjectId, RecordId, TabId};
use matrix_reconcile::ReconcileError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Attribute already exists in the tab
    #[error("attribute already exists: {0}")]
    DuplicateAttribute(String),

    /// Attribute is not in the tab's schema
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    /// Record failed validation
    #[error("invalid record: {0}")]
    InvalidRecord(ModelError),

    /// Edit touches the AI-only `Match Probability` attribute
    #[error("attribute is reserved and cannot be edited: {0}")]
    ReservedAttribute(String),

    /// Edit writes an attribute outside the tab schema
    #[error("attribute {name} is not in the schema of tab {tab}")]
    UnknownAttribute { tab: TabId, name: String },

    /// Tab does not exist
    #[error("tab not found: {0}")]
    TabNotFound(TabId),

    /// Record does not exist in any tab
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    /// Deleting the last tab would leave the project without tabs
    #[error("cannot delete the last tab")]
    LastTab,

    /// A generation is already running for this tab
    #[error("generation already in progress for project {project}, tab {tab}")]
    GenerationInProgress { project: ProjectId, tab: TabId },

    /// Generation collaborator failed
    #[error("generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),

    /// Merge produced an invalid tab
    #[error("reconcile failed: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Save failed; the in-memory mutation is already applied
    #[error("persistence failed: {0}")]
    PersistenceFailed(#[from] PersistenceError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Local validation failure (the action is rejected, nothing changed)
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateAttribute(_)
                | Self::AttributeNotFound(_)
                | Self::InvalidRecord(_)
                | Self::ReservedAttribute(_)
                | Self::UnknownAttribute { .. }
                | Self::LastTab
        )
    }

    /// Check if the caller may retry
    ///
    /// Persistence failures are retryable by re-saving the current snapshot.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::GenerationInProgress { .. }
                | Self::PersistenceFailed(_)
                | Self::GenerationFailed(GenerationError::Timeout { .. } | GenerationError::Backend(_))
        )
    }

    /// In-memory state was committed even though an error is returned
    #[inline]
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::PersistenceFailed(_))
    }
}

impl From<ModelError> for EngineError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::DuplicateAttribute(name) => Self::DuplicateAttribute(name),
            ModelError::AttributeNotFound(name) => Self::AttributeNotFound(name),
            other => Self::InvalidRecord(other),
        }
    }
}

/// Generation collaborator errors
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Collaborator produced nothing usable
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// Collaborator did not answer in time
    #[error("timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Generation was cancelled by the caller
    #[error("cancelled")]
    Cancelled,

    /// Backend failure (transport, model, parsing)
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl GenerationError {
    /// Create backend error from a message
    #[inline]
    #[must_use]
    pub fn backend(message: impl std::fmt::Display) -> Self {
        Self::Backend(anyhow::anyhow!("{message}"))
    }

    /// Cancellation is not a failure and never triggers the full-mode fallback
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Persistence collaborator errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The queued persistence worker has shut down
    #[error("persistence worker stopped")]
    WorkerStopped,

    /// Store failure
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl PersistenceError {
    /// Create backend error from a message
    #[inline]
    #[must_use]
    pub fn backend(message: impl std::fmt::Display) -> Self {
        Self::Backend(anyhow::anyhow!("{message}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_map_to_schema_variants() {
        let err: EngineError = ModelError::DuplicateAttribute("Pricing".into()).into();
        assert!(matches!(err, EngineError::DuplicateAttribute(ref n) if n == "Pricing"));

        let err: EngineError = ModelError::AttributeNotFound("Pricing".into()).into();
        assert!(matches!(err, EngineError::AttributeNotFound(_)));

        let err: EngineError = ModelError::EmptyName(RecordId::new("1")).into();
        assert!(matches!(err, EngineError::InvalidRecord(_)));
    }

    #[test]
    fn validation_errors_are_not_retryable() {
        let err = EngineError::DuplicateAttribute("x".into());
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn persistence_failure_is_committed_and_retryable() {
        let err = EngineError::from(PersistenceError::backend("store down"));
        assert!(err.is_committed());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("store down"));
    }

    #[test]
    fn cancellation_is_not_retryable() {
        let err = EngineError::from(GenerationError::Cancelled);
        assert!(!err.is_retryable());
        assert!(GenerationError::Cancelled.is_cancelled());
    }
}
