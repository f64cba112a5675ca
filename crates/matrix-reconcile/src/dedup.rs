//! Deduplication by normalized name
//!
//! Candidates are grouped by `trim(name).to_lowercase()`. Each group folds
//! left to right, carrying the current winner forward:
//!
//! 1. Higher parsed `Match Probability`
//! 2. Has a real `Description` (present, not `"Empty"`)
//! 3. Strictly more attribute keys
//! 4. Earlier record
//!
//! Groups come out in first-encounter order. The function is deterministic
//! and idempotent.

use indexmap::IndexMap;
use matrix_model::{CompetitorRecord, RecordId};

/// Which side of a pairwise comparison survived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    /// The record carried forward from earlier in the group
    Incumbent,
    /// The record being compared against it
    Challenger,
}

/// Criterion that decided a pairwise comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TieBreak {
    /// Match Probability differed
    Score,
    /// Exactly one side had a description
    Description,
    /// Attribute key counts differed
    KeyCount,
    /// Everything tied; earlier record kept
    Order,
}

/// Result of deduplicating a candidate list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupOutcome {
    /// One survivor per normalized name, in first-encounter order
    pub survivors: Vec<CompetitorRecord>,
    /// Ids of records that lost a tie-break
    pub dropped: Vec<RecordId>,
}

/// Groups candidates by normalized name and picks one survivor per group
#[derive(Debug, Clone, Copy, Default)]
pub struct Deduplicator;

impl Deduplicator {
    /// Create new deduplicator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compare two same-named candidates
    ///
    /// `incumbent` is the record earlier in iteration order (or the winner
    /// so far). Ties on every criterion keep the incumbent.
    #[must_use]
    pub fn compare(incumbent: &CompetitorRecord, challenger: &CompetitorRecord) -> (Winner, TieBreak) {
        let (inc_score, ch_score) = (incumbent.score(), challenger.score());
        if inc_score != ch_score {
            let winner = if inc_score > ch_score {
                Winner::Incumbent
            } else {
                Winner::Challenger
            };
            return (winner, TieBreak::Score);
        }

        match (incumbent.has_description(), challenger.has_description()) {
            (true, false) => return (Winner::Incumbent, TieBreak::Description),
            (false, true) => return (Winner::Challenger, TieBreak::Description),
            _ => {}
        }

        match challenger.key_count().cmp(&incumbent.key_count()) {
            std::cmp::Ordering::Greater => (Winner::Challenger, TieBreak::KeyCount),
            std::cmp::Ordering::Less => (Winner::Incumbent, TieBreak::KeyCount),
            std::cmp::Ordering::Equal => (Winner::Incumbent, TieBreak::Order),
        }
    }

    /// Deduplicate candidates
    #[must_use]
    pub fn dedup(&self, candidates: Vec<CompetitorRecord>) -> DedupOutcome {
        let mut groups: IndexMap<String, Vec<CompetitorRecord>> = IndexMap::new();
        for record in candidates {
            groups.entry(record.identity_key()).or_default().push(record);
        }

        let mut outcome = DedupOutcome {
            survivors: Vec::with_capacity(groups.len()),
            dropped: Vec::new(),
        };

        for (_, members) in groups {
            let mut members = members.into_iter();
            let Some(mut best) = members.next() else {
                continue;
            };
            for current in members {
                match Self::compare(&best, &current).0 {
                    Winner::Incumbent => outcome.dropped.push(current.id),
                    Winner::Challenger => {
                        outcome.dropped.push(std::mem::replace(&mut best, current).id);
                    }
                }
            }
            outcome.survivors.push(best);
        }

        if !outcome.dropped.is_empty() {
            tracing::debug!(
                survivors = outcome.survivors.len(),
                dropped = outcome.dropped.len(),
                "collapsed duplicate competitors"
            );
        }

        outcome
    }
}

/// Deduplicate and return only the survivors
#[inline]
#[must_use]
pub fn dedup(candidates: Vec<CompetitorRecord>) -> Vec<CompetitorRecord> {
    Deduplicator::new().dedup(candidates).survivors
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_model::{DESCRIPTION, EMPTY_SENTINEL, MATCH_PROBABILITY};
    use pretty_assertions::assert_eq;

    fn rec(id: &str, name: &str) -> CompetitorRecord {
        CompetitorRecord::new(id, name, "t")
    }

    fn ids(records: &[CompetitorRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn singletons_survive_unchanged() {
        let input = vec![rec("1", "Acme"), rec("2", "Globex")];
        let out = Deduplicator::new().dedup(input.clone());
        assert_eq!(out.survivors, input);
        assert!(out.dropped.is_empty());
    }

    #[test]
    fn case_and_whitespace_variants_collapse() {
        let input = vec![
            rec("1", "Acme").with_attribute(MATCH_PROBABILITY, "70%"),
            rec("2", "acme ")
                .with_attribute(MATCH_PROBABILITY, "40%")
                .with_attribute(DESCRIPTION, EMPTY_SENTINEL),
        ];
        let out = Deduplicator::new().dedup(input);
        assert_eq!(ids(&out.survivors), vec!["1"]);
        assert_eq!(out.dropped, vec![RecordId::new("2")]);
    }

    #[test]
    fn probability_beats_description() {
        let a = rec("a", "Acme").with_attribute(MATCH_PROBABILITY, "80%");
        let b = rec("b", "Acme")
            .with_attribute(MATCH_PROBABILITY, "60%")
            .with_attribute(DESCRIPTION, "Makes anvils");
        assert_eq!(Deduplicator::compare(&a, &b), (Winner::Incumbent, TieBreak::Score));
        assert_eq!(Deduplicator::compare(&b, &a), (Winner::Challenger, TieBreak::Score));
        assert_eq!(ids(&dedup(vec![b, a])), vec!["a"]);
    }

    #[test]
    fn description_breaks_score_tie() {
        let a = rec("a", "Acme").with_attribute(DESCRIPTION, EMPTY_SENTINEL);
        let b = rec("b", "Acme").with_attribute(DESCRIPTION, "Makes anvils");
        assert_eq!(
            Deduplicator::compare(&a, &b),
            (Winner::Challenger, TieBreak::Description)
        );
    }

    #[test]
    fn key_count_breaks_description_tie() {
        let a = rec("a", "Acme").with_attribute("Focus", "B2B");
        let b = rec("b", "Acme")
            .with_attribute("Focus", "B2B")
            .with_attribute("Technology", "");
        assert_eq!(
            Deduplicator::compare(&a, &b),
            (Winner::Challenger, TieBreak::KeyCount)
        );
    }

    #[test]
    fn full_tie_keeps_earlier_record() {
        let a = rec("a", "Acme").with_attribute("Focus", "B2B");
        let b = rec("b", "ACME").with_attribute("Focus", "B2C");
        assert_eq!(Deduplicator::compare(&a, &b), (Winner::Incumbent, TieBreak::Order));
        assert_eq!(ids(&dedup(vec![a, b])), vec!["a"]);
    }

    #[test]
    fn winner_is_carried_forward_through_group() {
        let input = vec![
            rec("1", "Acme").with_attribute(MATCH_PROBABILITY, "10"),
            rec("2", "Globex"),
            rec("3", "acme").with_attribute(MATCH_PROBABILITY, "90"),
            rec("4", " Acme").with_attribute(MATCH_PROBABILITY, "50"),
        ];
        let out = Deduplicator::new().dedup(input);
        assert_eq!(ids(&out.survivors), vec!["3", "2"]);
        assert_eq!(out.dropped, vec![RecordId::new("1"), RecordId::new("4")]);
    }

    #[test]
    fn groups_keep_first_encounter_order() {
        let input = vec![
            rec("1", "Zeta"),
            rec("2", "Alpha").with_attribute(MATCH_PROBABILITY, "1"),
            rec("3", "zeta").with_attribute(MATCH_PROBABILITY, "99"),
        ];
        assert_eq!(ids(&dedup(input)), vec!["3", "2"]);
    }
}
