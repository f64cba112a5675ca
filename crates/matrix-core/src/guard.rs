//! Generation guards
//!
//! At most one generation may run per (project, tab). A guard is held for
//! the whole request and released on drop, including on error paths.

use crate::error::EngineError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use matrix_model::{ProjectId, TabId};
use std::sync::Arc;
use std::time::Instant;

type GuardKey = (ProjectId, TabId);

/// Registry of running generations
#[derive(Debug, Clone, Default)]
pub struct GenerationGuards {
    running: Arc<DashMap<GuardKey, Instant>>,
}

impl GenerationGuards {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the (project, tab) slot
    ///
    /// # Errors
    /// `EngineError::GenerationInProgress` if already claimed
    pub fn try_acquire(&self, project: &ProjectId, tab: &TabId) -> Result<GenerationGuard, EngineError> {
        let key = (project.clone(), tab.clone());
        match self.running.entry(key.clone()) {
            Entry::Occupied(_) => Err(EngineError::GenerationInProgress {
                project: project.clone(),
                tab: tab.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                Ok(GenerationGuard {
                    running: Arc::clone(&self.running),
                    key,
                })
            }
        }
    }

    /// A generation is running for (project, tab)
    #[must_use]
    pub fn is_running(&self, project: &ProjectId, tab: &TabId) -> bool {
        self.running.contains_key(&(project.clone(), tab.clone()))
    }

    /// Number of running generations
    #[inline]
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.running.len()
    }
}

/// Held while a generation runs
#[derive(Debug)]
pub struct GenerationGuard {
    running: Arc<DashMap<GuardKey, Instant>>,
    key: GuardKey,
}

impl GenerationGuard {
    /// Tab being generated
    #[inline]
    #[must_use]
    pub fn tab(&self) -> &TabId {
        &self.key.1
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        if let Some((_, started)) = self.running.remove(&self.key) {
            tracing::debug!(
                project_id = %self.key.0,
                tab_id = %self.key.1,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Generation guard released"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_until_drop() {
        let guards = GenerationGuards::new();
        let project = ProjectId::new("p1");
        let tab = TabId::new("t");

        let guard = guards.try_acquire(&project, &tab).unwrap();
        assert!(guards.is_running(&project, &tab));
        assert!(matches!(
            guards.try_acquire(&project, &tab),
            Err(EngineError::GenerationInProgress { .. })
        ));

        drop(guard);
        assert!(!guards.is_running(&project, &tab));
        assert!(guards.try_acquire(&project, &tab).is_ok());
    }

    #[test]
    fn different_tabs_run_concurrently() {
        let guards = GenerationGuards::new();
        let project = ProjectId::new("p1");

        let _a = guards.try_acquire(&project, &TabId::new("a")).unwrap();
        let _b = guards.try_acquire(&project, &TabId::new("b")).unwrap();
        assert_eq!(guards.running_count(), 2);
    }
}
