//! Competitor records
//!
//! A record is identity (`id`, `name`, `tab_id`), a sparse attribute map and
//! a little provenance metadata. Missing attribute keys read the same as an
//! empty value or the literal `"Empty"` sentinel.

use crate::error::ModelError;
use crate::ids::{RecordId, TabId};
use crate::probability::MatchScore;
use crate::schema::AttributeSchema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved AI-only relevance score attribute
pub const MATCH_PROBABILITY: &str = "Match Probability";

/// Free-text description attribute (second tie-break criterion)
pub const DESCRIPTION: &str = "Description";

/// Sentinel the generator writes for cells it could not fill
pub const EMPTY_SENTINEL: &str = "Empty";

/// Ordered attribute name → value map
pub type AttributeMap = IndexMap<String, String>;

/// Who created a record by hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorProfile {
    /// Display name
    pub name: String,
    /// Profile picture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Account id of the creator
    pub user_id: String,
}

/// One competitor row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorRecord {
    /// Stable record id
    pub id: RecordId,
    /// Display name; also the deduplication identity
    pub name: String,
    /// Owning tab
    pub tab_id: TabId,
    /// Attribute values keyed by attribute name
    #[serde(default)]
    pub attributes: AttributeMap,
    /// Provenance ("AI", "Human", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Free-form tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Creator of a hand-added record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_profile: Option<CreatorProfile>,
}

impl CompetitorRecord {
    /// Create record with no attributes
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>, tab_id: impl Into<TabId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tab_id: tab_id.into(),
            attributes: AttributeMap::new(),
            source: None,
            tags: Vec::new(),
            creator_profile: None,
        }
    }

    /// With one attribute value
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// With provenance source (`"AI"`, `"Human"`)
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// With tags
    #[inline]
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Attribute value, if the key is present
    #[inline]
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }

    /// Set an attribute value, returning the previous one
    #[inline]
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.attributes.insert(attribute.into(), value.into())
    }

    /// Parsed Match Probability
    #[inline]
    #[must_use]
    pub fn score(&self) -> MatchScore {
        MatchScore::parse_opt(self.get(MATCH_PROBABILITY))
    }

    /// Description present and not the `"Empty"` sentinel
    #[must_use]
    pub fn has_description(&self) -> bool {
        self.get(DESCRIPTION)
            .is_some_and(|d| !d.is_empty() && d != EMPTY_SENTINEL)
    }

    /// Number of attribute keys present (populated or not)
    #[inline]
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.attributes.len()
    }

    /// Cell is missing, empty or the `"Empty"` sentinel
    #[must_use]
    pub fn is_cell_empty(&self, attribute: &str) -> bool {
        self.get(attribute)
            .map_or(true, |v| v.is_empty() || v == EMPTY_SENTINEL)
    }

    /// Any schema attribute has an empty cell
    #[must_use]
    pub fn has_empty_cells(&self, schema: &AttributeSchema) -> bool {
        schema.iter().any(|attr| self.is_cell_empty(attr))
    }

    /// Deduplication key: trimmed, lowercased name
    #[inline]
    #[must_use]
    pub fn identity_key(&self) -> String {
        normalize_name(&self.name)
    }

    /// Overlay values onto this record; `id` and `name` are untouched
    pub fn overlay<'a, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in values {
            self.attributes.insert(key.clone(), value.clone());
        }
    }

    /// Ensure every schema attribute has a key, defaulting to `""`
    pub fn fill_schema_keys(&mut self, schema: &AttributeSchema) {
        for attr in schema.iter() {
            if !self.attributes.contains_key(attr) {
                self.attributes.insert(attr.to_string(), String::new());
            }
        }
    }

    /// Validate identity fields
    ///
    /// # Errors
    /// `ModelError::EmptyName` if the name is blank
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::EmptyName(self.id.clone()));
        }
        Ok(())
    }
}

/// Normalize a name for identity comparison
#[inline]
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
