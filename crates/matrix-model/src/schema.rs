//! Per-tab attribute schema
//!
//! An ordered set of attribute (column) names. Order is display order only;
//! merge logic never depends on it.

use crate::error::ModelError;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Ordered, duplicate-free list of attribute names for one tab
///
/// # Invariants
/// - Names are unique (case-sensitive exact match)
/// - Insertion order is preserved across add/remove
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSchema(IndexSet<String>);

impl AttributeSchema {
    /// Create empty schema
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from names, silently dropping repeats
    ///
    /// Used at the persistence boundary where duplicate columns may have
    /// been written by older clients.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Append an attribute
    ///
    /// # Errors
    /// - `ModelError::EmptyAttributeName` if `name` is blank
    /// - `ModelError::DuplicateAttribute` if `name` already exists
    pub fn add(&mut self, name: impl Into<String>) -> Result<(), ModelError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptyAttributeName);
        }
        if self.0.contains(&name) {
            return Err(ModelError::DuplicateAttribute(name));
        }
        self.0.insert(name);
        Ok(())
    }

    /// Remove an attribute, keeping the order of the rest
    ///
    /// # Errors
    /// `ModelError::AttributeNotFound` if `name` is absent
    pub fn remove(&mut self, name: &str) -> Result<(), ModelError> {
        if self.0.shift_remove(name) {
            Ok(())
        } else {
            Err(ModelError::AttributeNotFound(name.to_string()))
        }
    }

    /// Check membership
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Iterate names in display order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of attributes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if schema is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names as an owned list (persisted shape)
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for AttributeSchema {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_names(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_appends_in_order() {
        let mut schema = AttributeSchema::from_names(["Price", "Features"]);
        schema.add("Pricing").unwrap();
        assert_eq!(schema.to_vec(), vec!["Price", "Features", "Pricing"]);
    }

    #[test]
    fn add_rejects_exact_duplicate() {
        let mut schema = AttributeSchema::from_names(["Price"]);
        assert_eq!(
            schema.add("Price"),
            Err(ModelError::DuplicateAttribute("Price".to_string()))
        );
    }

    #[test]
    fn add_is_case_sensitive() {
        let mut schema = AttributeSchema::from_names(["Price"]);
        assert!(schema.add("price").is_ok());
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn add_rejects_blank_name() {
        let mut schema = AttributeSchema::new();
        assert_eq!(schema.add("   "), Err(ModelError::EmptyAttributeName));
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut schema = AttributeSchema::from_names(["A", "B", "C"]);
        schema.remove("B").unwrap();
        assert_eq!(schema.to_vec(), vec!["A", "C"]);
    }

    #[test]
    fn remove_missing_fails() {
        let mut schema = AttributeSchema::from_names(["A"]);
        assert_eq!(
            schema.remove("Z"),
            Err(ModelError::AttributeNotFound("Z".to_string()))
        );
    }

    #[test]
    fn from_names_drops_repeats() {
        let schema = AttributeSchema::from_names(["A", "B", "A"]);
        assert_eq!(schema.to_vec(), vec!["A", "B"]);
    }

    #[test]
    fn serializes_as_plain_list() {
        let schema = AttributeSchema::from_names(["Price", "Features"]);
        assert_eq!(
            serde_json::to_string(&schema).unwrap(),
            r#"["Price","Features"]"#
        );
    }
}
