//! Reconcile strategy trait and core types
//!
//! Provides the [`ReconcileStrategy`] trait implemented by every merge mode.

use crate::dedup::Deduplicator;
use crate::sort::sort_by_score;
use matrix_model::{CompetitorRecord, ModelError, RecordId, Tab};
use std::fmt;

/// Merge a generated batch into one tab
///
/// # Contract
/// - `reconcile()` is pure: the same tab and batch give the same output
/// - Output competitors are deduplicated and sorted by descending score
/// - Output tab passes `Tab::validate`
pub trait ReconcileStrategy: Send + Sync + fmt::Debug {
    /// Batch shape this strategy consumes
    type Batch;

    /// Merge `batch` into `existing`
    ///
    /// # Errors
    /// `ReconcileError::InvalidOutput` if the merged tab breaks a tab invariant
    fn reconcile(&self, existing: &Tab, batch: Self::Batch) -> Result<Reconciled, ReconcileError>;

    /// Mode implemented by this strategy
    fn mode(&self) -> ReconcileMode;

    /// Strategy name (for logging)
    fn name(&self) -> &'static str;
}

/// Merge mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileMode {
    /// Overlay generated values onto existing records, keyed by id
    FillEmpty,
    /// Replace records with a fresh batch, reusing ids by exact name
    Regenerate,
    /// Unstructured batch merged into the active tab only
    ActiveTabFallback,
}

impl ReconcileMode {
    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FillEmpty => "fill_empty",
            Self::Regenerate => "regenerate",
            Self::ActiveTabFallback => "active_tab_fallback",
        }
    }
}

impl fmt::Display for ReconcileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters describing one merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Records in the incoming batch
    pub incoming: usize,
    /// Incoming records that took over an existing id
    pub reused_ids: usize,
    /// Incoming records that kept a fresh id
    pub new_ids: usize,
    /// Existing records updated in place
    pub overlaid: usize,
    /// Records removed by deduplication
    pub duplicates_dropped: usize,
    /// Batch entries that matched nothing and were skipped
    pub ignored: usize,
    /// Batch entries rejected as invalid (blank names)
    pub rejected: usize,
}

/// Merge output for one tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// The tab as it should be committed
    pub tab: Tab,
    /// What happened
    pub stats: MergeStats,
    /// Ids removed by deduplication
    pub dropped: Vec<RecordId>,
}

/// Reconcile error
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Merged tab violates a tab invariant
    #[error("merged tab {tab} is invalid: {source}")]
    InvalidOutput {
        /// Tab being merged
        tab: String,
        /// Violated invariant
        #[source]
        source: ModelError,
    },

    /// Strategy-specific error
    #[error("{0}")]
    Strategy(String),
}

impl ReconcileError {
    /// Create invalid output error
    #[inline]
    #[must_use]
    pub fn invalid_output(tab: &Tab, source: ModelError) -> Self {
        Self::InvalidOutput {
            tab: tab.id.to_string(),
            source,
        }
    }
}

/// Dedup, sort and validate merged records into `tab`
///
/// Shared last step of every strategy.
pub(crate) fn finalize(
    mut tab: Tab,
    merged: Vec<CompetitorRecord>,
    mut stats: MergeStats,
) -> Result<Reconciled, ReconcileError> {
    let outcome = Deduplicator::new().dedup(merged);
    let mut survivors = outcome.survivors;
    sort_by_score(&mut survivors);

    stats.duplicates_dropped = outcome.dropped.len();
    tab.replace_competitors(survivors);
    tab.validate()
        .map_err(|e| ReconcileError::invalid_output(&tab, e))?;

    Ok(Reconciled {
        tab,
        stats,
        dropped: outcome.dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_model::MATCH_PROBABILITY;

    #[test]
    fn mode_names_are_stable() {
        assert_eq!(ReconcileMode::FillEmpty.to_string(), "fill_empty");
        assert_eq!(ReconcileMode::Regenerate.as_str(), "regenerate");
        assert_eq!(ReconcileMode::ActiveTabFallback.as_str(), "active_tab_fallback");
    }

    #[test]
    fn finalize_dedups_then_sorts() {
        let tab = Tab::new("t", "T");
        let merged = vec![
            CompetitorRecord::new("1", "Low", "t").with_attribute(MATCH_PROBABILITY, "10"),
            CompetitorRecord::new("2", "High", "t").with_attribute(MATCH_PROBABILITY, "90"),
            CompetitorRecord::new("3", "low", "t").with_attribute(MATCH_PROBABILITY, "20"),
        ];
        let out = finalize(tab, merged, MergeStats::default()).unwrap();
        let order: Vec<_> = out.tab.competitors.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["2", "3"]);
        assert_eq!(out.stats.duplicates_dropped, 1);
        assert_eq!(out.dropped, vec![RecordId::new("1")]);
    }

    #[test]
    fn finalize_rejects_colliding_ids() {
        let tab = Tab::new("t", "T");
        let merged = vec![
            CompetitorRecord::new("same", "Acme", "t"),
            CompetitorRecord::new("same", "Globex", "t"),
        ];
        let err = finalize(tab, merged, MergeStats::default()).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidOutput { .. }));
    }
}
