//! Model validation errors

use crate::ids::{RecordId, TabId};

/// Errors raised by schema and record validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Attribute already present in the schema (exact match)
    #[error("attribute already exists: {0}")]
    DuplicateAttribute(String),

    /// Attribute not present in the schema
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    /// Attribute names must contain a non-whitespace character
    #[error("attribute name must not be empty")]
    EmptyAttributeName,

    /// Record names are the deduplication key and must be non-empty
    #[error("record {0} has an empty name")]
    EmptyName(RecordId),

    /// Record tagged with a tab other than the one holding it
    #[error("record {record} belongs to tab {actual}, not {expected}")]
    TabMismatch {
        record: RecordId,
        expected: TabId,
        actual: TabId,
    },

    /// Same record id appears twice in one tab
    #[error("duplicate record id in tab: {0}")]
    DuplicateRecordId(RecordId),
}

impl ModelError {
    /// Schema-level validation failure (add/remove attribute)
    #[inline]
    #[must_use]
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateAttribute(_) | Self::AttributeNotFound(_) | Self::EmptyAttributeName
        )
    }
}
