//! Match Probability scoring
//!
//! The score is an AI-written string such as `"82%"`. It is parsed by keeping
//! only ASCII digits, so `"8.5%"` reads as `85`. Missing or digit-free values
//! score 0.

use std::cmp::Ordering;
use std::fmt;

/// Parsed, comparable Match Probability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchScore(u64);

impl MatchScore {
    /// Zero score (missing or unparsable value)
    pub const ZERO: Self = Self(0);

    /// Parse a raw attribute value
    ///
    /// Non-digit characters are discarded. Overlong digit runs saturate
    /// instead of failing.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let value = raw
            .bytes()
            .filter(u8::is_ascii_digit)
            .fold(0u64, |acc, digit| {
                acc.saturating_mul(10).saturating_add(u64::from(digit - b'0'))
            });
        Self(value)
    }

    /// Parse an optional value, treating `None` as zero
    #[inline]
    #[must_use]
    pub fn parse_opt(raw: Option<&str>) -> Self {
        raw.map_or(Self::ZERO, Self::parse)
    }

    /// Raw numeric value
    #[inline]
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    /// Descending comparator for sorting (highest score first)
    #[inline]
    #[must_use]
    pub fn descending(a: Self, b: Self) -> Ordering {
        b.cmp(&a)
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
