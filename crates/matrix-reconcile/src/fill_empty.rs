//! Fill-empty-cells (partial) strategy
//!
//! Generated values are keyed by existing record id and overlaid onto the
//! records already in the tab. Ids and names never change in this mode.

use crate::strategy::{finalize, MergeStats, ReconcileError, ReconcileMode, ReconcileStrategy, Reconciled};
use indexmap::IndexMap;
use matrix_model::{AttributeMap, RecordId, Tab, MATCH_PROBABILITY};

/// Generated values for existing records, keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillBatch {
    values: IndexMap<RecordId, AttributeMap>,
}

impl FillBatch {
    /// Create empty batch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add values for a record; later inserts for the same id merge on top
    pub fn insert(&mut self, id: RecordId, values: AttributeMap) {
        let entry = self.values.entry(id).or_default();
        entry.extend(values);
    }

    /// With values for a record
    #[inline]
    #[must_use]
    pub fn with(mut self, id: impl Into<RecordId>, values: AttributeMap) -> Self {
        self.insert(id.into(), values);
        self
    }

    /// Number of records with values
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if batch is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(RecordId, AttributeMap)> for FillBatch {
    fn from_iter<I: IntoIterator<Item = (RecordId, AttributeMap)>>(iter: I) -> Self {
        let mut batch = Self::new();
        for (id, values) in iter {
            batch.insert(id, values);
        }
        batch
    }
}

/// Overlay strategy for partial generation
///
/// # Characteristics
/// - Identity preserving (no id or name changes)
/// - Only schema attributes and `Match Probability` are written
/// - Records without generated values are kept as they are
/// - Batch entries for unknown ids are ignored
#[derive(Debug, Clone, Copy, Default)]
pub struct FillEmptyStrategy;

impl FillEmptyStrategy {
    /// Create new fill-empty strategy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Whether a generated key may be written onto a record of `tab`
    fn writable(tab: &Tab, key: &str) -> bool {
        key == MATCH_PROBABILITY || tab.schema.contains(key)
    }
}

impl ReconcileStrategy for FillEmptyStrategy {
    type Batch = FillBatch;

    fn reconcile(&self, existing: &Tab, mut batch: FillBatch) -> Result<Reconciled, ReconcileError> {
        let mut stats = MergeStats {
            incoming: batch.len(),
            ..MergeStats::default()
        };

        let mut merged = existing.competitors.clone();
        for record in &mut merged {
            let Some(values) = batch.values.shift_remove(&record.id) else {
                continue;
            };
            let mut skipped = 0usize;
            for (key, value) in values {
                if Self::writable(existing, &key) {
                    record.attributes.insert(key, value);
                } else {
                    skipped += 1;
                }
            }
            if skipped > 0 {
                tracing::debug!(record = %record.id, skipped, "dropped generated values outside schema");
            }
            stats.overlaid += 1;
        }

        stats.ignored = batch.len();
        if stats.ignored > 0 {
            tracing::warn!(
                tab = %existing.id,
                ignored = stats.ignored,
                "fill batch referenced records not in tab"
            );
        }

        let tab = Tab {
            competitors: Vec::new(),
            ..existing.clone()
        };
        finalize(tab, merged, stats)
    }

    fn mode(&self) -> ReconcileMode {
        ReconcileMode::FillEmpty
    }

    fn name(&self) -> &'static str {
        "FillEmpty"
    }
}
