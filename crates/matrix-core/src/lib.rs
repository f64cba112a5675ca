//! Matrix Core - Competitive Matrix Engine
//!
//! Owns per-project tab state and:
//! - Applies local schema and record edits
//! - Runs generation requests in partial or full mode
//! - Merges results through `matrix-reconcile`
//! - Flattens every committed state into one persisted snapshot
//!
//! # Example
//!
//! ```rust,ignore
//! use matrix_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(generator: Arc<dyn Generator>, sink: Arc<dyn PersistenceSink>) -> Result<(), EngineError> {
//! let engine = MatrixEngine::new(EngineConfig::new(), generator, sink)?;
//! let project = ProjectId::new("project-1");
//!
//! engine.add_attribute(&project, None, "Pricing").await?;
//! let outcome = engine.generate(&project, None, CancellationToken::new()).await?;
//! println!("{} via {}", outcome.active_tab, outcome.mode);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod guard;
pub mod persisted;
pub mod tabs;

// Re-exports for convenience
pub use collaborators::{
    FillResult, FilledRecord, GeneratedAnalysis, Generator, PersistenceSink, ProjectContext,
};
pub use config::{EngineConfig, PersistenceMode};
pub use dispatch::{PersistenceDispatcher, PersistenceReceipt};
pub use engine::{GenerationOutcome, MatrixEngine};
pub use error::{EngineError, GenerationError, PersistenceError};
pub use guard::{GenerationGuard, GenerationGuards};
pub use persisted::{
    decode_attributes, encode_attributes, PersistedAnalysis, PersistedCompetitor, PersistedSubTab,
};
pub use tabs::{TabManager, SOURCE_HUMAN, TAG_MANUAL};

pub use tokio_util::sync::CancellationToken;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Matrix Core
    pub use crate::{
        CancellationToken, EngineConfig, EngineError, GeneratedAnalysis, GenerationOutcome, Generator,
        MatrixEngine, PersistedAnalysis, PersistenceMode, PersistenceSink, TabManager,
    };
    pub use matrix_model::{CompetitorRecord, ProjectId, RecordId, Tab, TabId};
    pub use matrix_reconcile::ReconcileMode;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
