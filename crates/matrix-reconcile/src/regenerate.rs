//! Full regeneration strategies
//!
//! A fresh batch replaces a tab's records. Identity continuity: an incoming
//! record whose `name` exactly equals an existing record's name in the same
//! tab takes over that record's id, keeping all incoming values. Exact rather
//! than normalized matching avoids over-eager reuse; normalized duplicates are
//! collapsed afterwards by the deduplicator.

use crate::strategy::{finalize, MergeStats, ReconcileError, ReconcileMode, ReconcileStrategy, Reconciled};
use matrix_model::{AttributeSchema, CompetitorRecord, Tab};

/// Reuse existing ids for exact name matches
fn adopt_ids(existing: &Tab, incoming: Vec<CompetitorRecord>, stats: &mut MergeStats) -> Vec<CompetitorRecord> {
    stats.incoming = incoming.len();
    let mut merged = Vec::with_capacity(incoming.len());

    for mut record in incoming {
        if record.validate().is_err() {
            stats.rejected += 1;
            continue;
        }
        match existing.find_by_exact_name(&record.name) {
            Some(prior) => {
                record.id = prior.id.clone();
                stats.reused_ids += 1;
            }
            None => stats.new_ids += 1,
        }
        merged.push(record);
    }

    if stats.rejected > 0 {
        tracing::warn!(
            tab = %existing.id,
            rejected = stats.rejected,
            "dropped generated records with blank names"
        );
    }
    merged
}

/// Structured full regeneration of one tab
///
/// The batch is the generated tab. Its id, name and schema win; `existing` is
/// consulted only for id continuity and may be empty when the tab is new.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegenerateStrategy;

impl RegenerateStrategy {
    /// Create new regenerate strategy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ReconcileStrategy for RegenerateStrategy {
    type Batch = Tab;

    fn reconcile(&self, existing: &Tab, mut generated: Tab) -> Result<Reconciled, ReconcileError> {
        let mut stats = MergeStats::default();
        let incoming = std::mem::take(&mut generated.competitors);
        let merged = adopt_ids(existing, incoming, &mut stats);
        finalize(generated, merged, stats)
    }

    fn mode(&self) -> ReconcileMode {
        ReconcileMode::Regenerate
    }

    fn name(&self) -> &'static str {
        "Regenerate"
    }
}

/// Unstructured generation result for the active tab
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackBatch {
    /// Generated attribute list; replaces the active tab's schema
    pub schema: AttributeSchema,
    /// Generated records
    pub competitors: Vec<CompetitorRecord>,
}

/// Legacy-shape regeneration confined to the active tab
///
/// Used when generation returns no sub-tab structure. The active tab keeps
/// its id and name; schema and records are replaced. Other tabs are never
/// touched by this path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveTabFallbackStrategy;

impl ActiveTabFallbackStrategy {
    /// Create new fallback strategy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ReconcileStrategy for ActiveTabFallbackStrategy {
    type Batch = FallbackBatch;

    fn reconcile(&self, existing: &Tab, batch: FallbackBatch) -> Result<Reconciled, ReconcileError> {
        let mut stats = MergeStats::default();
        let merged = adopt_ids(existing, batch.competitors, &mut stats);
        let tab = Tab::new(existing.id.clone(), existing.name.clone()).with_schema(batch.schema);
        finalize(tab, merged, stats)
    }

    fn mode(&self) -> ReconcileMode {
        ReconcileMode::ActiveTabFallback
    }

    fn name(&self) -> &'static str {
        "ActiveTabFallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_model::{RecordId, MATCH_PROBABILITY};
    use pretty_assertions::assert_eq;

    fn existing() -> Tab {
        Tab::new("tab_competitors", "Competitors")
            .with_schema(AttributeSchema::from_names(["Focus"]))
            .with_competitors(vec![
                CompetitorRecord::new("X", "Acme", "tab_competitors")
                    .with_attribute("Focus", "hand edited"),
                CompetitorRecord::new("Y", "Globex", "tab_competitors"),
            ])
    }

    #[test]
    fn exact_name_adopts_existing_id() {
        let generated = Tab::new("tab_competitors", "Competitors")
            .with_schema(AttributeSchema::from_names(["Focus", "Technology"]))
            .with_competitors(vec![
                CompetitorRecord::new("fresh-1", "Acme", "tab_competitors")
                    .with_attribute("Focus", "AI written"),
                CompetitorRecord::new("fresh-2", "Initech", "tab_competitors"),
            ]);

        let out = RegenerateStrategy::new().reconcile(&existing(), generated).unwrap();
        let acme = out.tab.find_by_exact_name("Acme").unwrap();

        assert_eq!(acme.id, RecordId::new("X"));
        assert_eq!(acme.get("Focus"), Some("AI written"));
        assert!(out.tab.find(&RecordId::new("fresh-2")).is_some());
        assert!(out.tab.find(&RecordId::new("Y")).is_none());
        assert_eq!(out.tab.schema.to_vec(), vec!["Focus", "Technology"]);
        assert_eq!((out.stats.reused_ids, out.stats.new_ids), (1, 1));
    }

    #[test]
    fn normalized_match_does_not_adopt() {
        let generated = Tab::new("tab_competitors", "Competitors").with_competitors(vec![
            CompetitorRecord::new("fresh", "acme ", "tab_competitors"),
        ]);
        let out = RegenerateStrategy::new().reconcile(&existing(), generated).unwrap();
        assert_eq!(out.tab.competitors[0].id, RecordId::new("fresh"));
    }

    #[test]
    fn new_tab_keeps_fresh_ids_and_is_sorted() {
        let generated = Tab::new("tab_niche", "Niche").with_competitors(vec![
            CompetitorRecord::new("a", "A", "tab_niche").with_attribute(MATCH_PROBABILITY, "10"),
            CompetitorRecord::new("b", "B", "tab_niche").with_attribute(MATCH_PROBABILITY, "50"),
            CompetitorRecord::new("c", "C", "tab_niche").with_attribute(MATCH_PROBABILITY, "50"),
            CompetitorRecord::new("d", "D", "tab_niche").with_attribute(MATCH_PROBABILITY, "30"),
        ]);
        let out = RegenerateStrategy::new()
            .reconcile(&Tab::new("tab_niche", "Niche"), generated)
            .unwrap();
        let order: Vec<_> = out.tab.competitors.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn blank_names_are_rejected() {
        let generated = Tab::new("t", "T").with_competitors(vec![
            CompetitorRecord::new("a", "   ", "t"),
            CompetitorRecord::new("b", "Real", "t"),
        ]);
        let out = RegenerateStrategy::new()
            .reconcile(&Tab::new("t", "T"), generated)
            .unwrap();
        assert_eq!(out.tab.len(), 1);
        assert_eq!(out.stats.rejected, 1);
    }

    #[test]
    fn fallback_keeps_tab_identity_and_replaces_schema() {
        let batch = FallbackBatch {
            schema: AttributeSchema::from_names(["Pricing"]),
            competitors: vec![
                CompetitorRecord::new("fresh", "Globex", "whatever").with_attribute("Pricing", "$5"),
            ],
        };
        let out = ActiveTabFallbackStrategy::new()
            .reconcile(&existing(), batch)
            .unwrap();

        assert_eq!(out.tab.id.as_str(), "tab_competitors");
        assert_eq!(out.tab.name, "Competitors");
        assert_eq!(out.tab.schema.to_vec(), vec!["Pricing"]);
        assert_eq!(out.tab.len(), 1);
        assert_eq!(out.tab.competitors[0].id, RecordId::new("Y"));
        assert_eq!(out.tab.competitors[0].tab_id.as_str(), "tab_competitors");
    }
}
