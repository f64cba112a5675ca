//! Match Probability ordering

use matrix_model::CompetitorRecord;
use std::cmp::Reverse;

/// Sort records by descending parsed Match Probability
///
/// Stable: equal scores keep their relative input order.
pub fn sort_by_score(records: &mut [CompetitorRecord]) {
    records.sort_by_cached_key(|r| Reverse(r.score()));
}

/// Check the non-increasing score contract
#[must_use]
pub fn is_sorted_by_score(records: &[CompetitorRecord]) -> bool {
    records.windows(2).all(|w| w[0].score() >= w[1].score())
}
