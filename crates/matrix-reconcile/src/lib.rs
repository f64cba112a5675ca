//! Competitive Matrix Reconciliation
//!
//! Merges generated competitor batches into existing tabs.
//!
//! # Core Concepts
//!
//! - [`Deduplicator`]: One survivor per normalized name, deterministic tie-breaks
//! - [`ReconcileStrategy`]: Core trait for merge modes
//! - [`FillEmptyStrategy`]: Overlay generated values by id (partial mode)
//! - [`RegenerateStrategy`]: Replace records, reusing ids by exact name
//! - [`ActiveTabFallbackStrategy`]: Unstructured batch into the active tab
//! - [`ModeSelector`]: Partial or full, based on empty cells
//!
//! Every strategy ends the same way: deduplicate, then stable-sort by
//! descending `Match Probability`.
//!
//! # Example
//!
//! ```rust
//! use matrix_model::{CompetitorRecord, Tab, MATCH_PROBABILITY};
//! use matrix_reconcile::{ReconcileStrategy, RegenerateStrategy};
//!
//! let existing = Tab::new("t", "General")
//!     .with_competitors(vec![CompetitorRecord::new("X", "Acme", "t")]);
//! let generated = Tab::new("t", "General").with_competitors(vec![
//!     CompetitorRecord::new("fresh", "Acme", "t").with_attribute(MATCH_PROBABILITY, "80%"),
//! ]);
//!
//! let merged = RegenerateStrategy::new().reconcile(&existing, generated).unwrap();
//! assert_eq!(merged.tab.competitors[0].id.as_str(), "X");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod dedup;
mod fill_empty;
mod regenerate;
mod selector;
mod sort;
mod strategy;

pub use dedup::{dedup, DedupOutcome, Deduplicator, TieBreak, Winner};
pub use fill_empty::{FillBatch, FillEmptyStrategy};
pub use regenerate::{ActiveTabFallbackStrategy, FallbackBatch, RegenerateStrategy};
pub use selector::ModeSelector;
pub use sort::{is_sorted_by_score, sort_by_score};
pub use strategy::{MergeStats, ReconcileError, ReconcileMode, ReconcileStrategy, Reconciled};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use matrix_model::{AttributeMap, AttributeSchema, CompetitorRecord, Tab, EMPTY_SENTINEL};

    #[test]
    fn selector_drives_strategy_choice() {
        let tab = Tab::new("t", "General")
            .with_schema(AttributeSchema::from_names(["Focus"]))
            .with_competitors(vec![
                CompetitorRecord::new("1", "Acme", "t").with_attribute("Focus", EMPTY_SENTINEL),
            ]);

        assert_eq!(ModeSelector::new().select(&tab), ReconcileMode::FillEmpty);

        let mut values = AttributeMap::new();
        values.insert("Focus".to_string(), "B2B".to_string());
        let filled = FillEmptyStrategy::new()
            .reconcile(&tab, FillBatch::new().with("1", values))
            .unwrap();

        assert_eq!(ModeSelector::new().select(&filled.tab), ReconcileMode::Regenerate);
    }

    #[test]
    fn strategy_names() {
        assert_eq!(FillEmptyStrategy::new().name(), "FillEmpty");
        assert_eq!(RegenerateStrategy::new().mode(), ReconcileMode::Regenerate);
        assert_eq!(
            ActiveTabFallbackStrategy::new().mode(),
            ReconcileMode::ActiveTabFallback
        );
    }
}
