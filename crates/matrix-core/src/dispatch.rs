//! Persistence dispatch
//!
//! Every successful mutation emits one full snapshot. Inline dispatch awaits
//! the save; queued dispatch hands the snapshot to a single worker that saves
//! in submission order and reports each outcome on a receipt channel.

use crate::collaborators::PersistenceSink;
use crate::config::PersistenceMode;
use crate::error::PersistenceError;
use crate::persisted::PersistedAnalysis;
use matrix_model::ProjectId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Outcome of one queued save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceReceipt {
    /// Submission order, starting at 0
    pub sequence: u64,
    /// Saved project
    pub project_id: ProjectId,
    /// Error message if the save failed
    pub error: Option<String>,
}

impl PersistenceReceipt {
    /// Save succeeded
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

struct Job {
    sequence: u64,
    snapshot: PersistedAnalysis,
}

/// Sends snapshots to the persistence sink
pub struct PersistenceDispatcher {
    inner: DispatchMode,
    receipts: Mutex<Option<mpsc::UnboundedReceiver<PersistenceReceipt>>>,
}

enum DispatchMode {
    Inline(Arc<dyn PersistenceSink>),
    Queued {
        sender: mpsc::UnboundedSender<Job>,
        next_sequence: AtomicU64,
    },
}

impl PersistenceDispatcher {
    /// Create dispatcher
    ///
    /// Queued mode spawns the worker task and must be called inside a
    /// Tokio runtime.
    #[must_use]
    pub fn new(mode: PersistenceMode, sink: Arc<dyn PersistenceSink>) -> Self {
        match mode {
            PersistenceMode::Inline => Self {
                inner: DispatchMode::Inline(sink),
                receipts: Mutex::new(None),
            },
            PersistenceMode::Queued => {
                let (sender, jobs) = mpsc::unbounded_channel();
                let (receipt_tx, receipt_rx) = mpsc::unbounded_channel();
                tokio::spawn(run_worker(sink, jobs, receipt_tx));
                Self {
                    inner: DispatchMode::Queued {
                        sender,
                        next_sequence: AtomicU64::new(0),
                    },
                    receipts: Mutex::new(Some(receipt_rx)),
                }
            }
        }
    }

    /// Dispatch mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> PersistenceMode {
        match self.inner {
            DispatchMode::Inline(_) => PersistenceMode::Inline,
            DispatchMode::Queued { .. } => PersistenceMode::Queued,
        }
    }

    /// Take the receipt stream (queued mode only, once)
    pub fn take_receipts(&self) -> Option<mpsc::UnboundedReceiver<PersistenceReceipt>> {
        self.receipts.lock().take()
    }

    /// Dispatch one snapshot
    ///
    /// # Errors
    /// - Inline: the sink's error
    /// - Queued: `PersistenceError::WorkerStopped` if the worker is gone
    pub async fn dispatch(&self, snapshot: PersistedAnalysis) -> Result<(), PersistenceError> {
        match &self.inner {
            DispatchMode::Inline(sink) => {
                let project_id = snapshot.project_id.clone();
                sink.save(&snapshot).await.map_err(|e| {
                    error!(project_id = %project_id, error = %e, "Snapshot save failed");
                    e
                })
            }
            DispatchMode::Queued {
                sender,
                next_sequence,
            } => {
                let sequence = next_sequence.fetch_add(1, Ordering::SeqCst);
                debug!(sequence, project_id = %snapshot.project_id, "Snapshot queued");
                sender
                    .send(Job { sequence, snapshot })
                    .map_err(|_| PersistenceError::WorkerStopped)
            }
        }
    }
}

impl std::fmt::Debug for PersistenceDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceDispatcher")
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}

async fn run_worker(
    sink: Arc<dyn PersistenceSink>,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    receipts: mpsc::UnboundedSender<PersistenceReceipt>,
) {
    while let Some(Job { sequence, snapshot }) = jobs.recv().await {
        let error = match sink.save(&snapshot).await {
            Ok(()) => None,
            Err(e) => {
                error!(sequence, project_id = %snapshot.project_id, error = %e, "Queued snapshot save failed");
                Some(e.to_string())
            }
        };
        // receiver may have been dropped; saving continues regardless
        let _ = receipts.send(PersistenceReceipt {
            sequence,
            project_id: snapshot.project_id,
            error,
        });
    }
    debug!("Persistence worker stopped");
}
