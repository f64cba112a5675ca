//! Tabs: one competitor dataset with its own schema
//!
//! Comparable to a sheet in a spreadsheet. Every record held by a tab carries
//! that tab's id.

use crate::error::ModelError;
use crate::ids::{RecordId, TabId};
use crate::record::CompetitorRecord;
use crate::schema::AttributeSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Competitor dataset with its attribute schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Tab id
    pub id: TabId,
    /// Display name
    pub name: String,
    /// Ordered attribute schema
    #[serde(rename = "attributes", default)]
    pub schema: AttributeSchema,
    /// Records, each carrying this tab's id
    #[serde(default)]
    pub competitors: Vec<CompetitorRecord>,
}

impl Tab {
    /// Create empty tab
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<TabId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schema: AttributeSchema::new(),
            competitors: Vec::new(),
        }
    }

    /// With schema
    #[inline]
    #[must_use]
    pub fn with_schema(mut self, schema: AttributeSchema) -> Self {
        self.schema = schema;
        self
    }

    /// With competitors; each record is re-tagged with this tab's id
    #[must_use]
    pub fn with_competitors(mut self, competitors: Vec<CompetitorRecord>) -> Self {
        self.replace_competitors(competitors);
        self
    }

    /// Replace the competitor list, enforcing the tab-id invariant
    pub fn replace_competitors(&mut self, competitors: Vec<CompetitorRecord>) {
        self.competitors = competitors;
        for record in &mut self.competitors {
            if record.tab_id != self.id {
                record.tab_id = self.id.clone();
            }
        }
    }

    /// Find record by id
    #[inline]
    #[must_use]
    pub fn find(&self, id: &RecordId) -> Option<&CompetitorRecord> {
        self.competitors.iter().find(|c| &c.id == id)
    }

    /// Find record by id (mutable)
    #[inline]
    pub fn find_mut(&mut self, id: &RecordId) -> Option<&mut CompetitorRecord> {
        self.competitors.iter_mut().find(|c| &c.id == id)
    }

    /// Find record by exact (un-normalized) name
    #[inline]
    #[must_use]
    pub fn find_by_exact_name(&self, name: &str) -> Option<&CompetitorRecord> {
        self.competitors.iter().find(|c| c.name == name)
    }

    /// Append a record, tagging it with this tab
    pub fn push(&mut self, mut record: CompetitorRecord) {
        record.tab_id = self.id.clone();
        self.competitors.push(record);
    }

    /// Add an attribute and give every record an empty value for it
    ///
    /// # Errors
    /// `ModelError::DuplicateAttribute` / `EmptyAttributeName` from the schema
    pub fn add_attribute(&mut self, name: &str) -> Result<(), ModelError> {
        self.schema.add(name)?;
        for record in &mut self.competitors {
            record.set(name, String::new());
        }
        Ok(())
    }

    /// Remove an attribute from the schema
    ///
    /// Record values for it are left in place; stale keys are tolerated.
    ///
    /// # Errors
    /// `ModelError::AttributeNotFound` if absent
    pub fn remove_attribute(&mut self, name: &str) -> Result<(), ModelError> {
        self.schema.remove(name)
    }

    /// Some record has an empty cell for some schema attribute
    #[must_use]
    pub fn has_empty_cells(&self) -> bool {
        self.competitors
            .iter()
            .any(|c| c.has_empty_cells(&self.schema))
    }

    /// Remove every record whose id is in `ids`, returning the removed ids
    pub fn remove_ids(&mut self, ids: &HashSet<RecordId>) -> Vec<RecordId> {
        let mut removed = Vec::new();
        self.competitors.retain(|c| {
            if ids.contains(&c.id) {
                removed.push(c.id.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Check tab invariants
    ///
    /// # Errors
    /// - `ModelError::TabMismatch` for a record tagged with another tab
    /// - `ModelError::DuplicateRecordId` for a repeated id
    /// - `ModelError::EmptyName` for a nameless record
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::with_capacity(self.competitors.len());
        for record in &self.competitors {
            record.validate()?;
            if record.tab_id != self.id {
                return Err(ModelError::TabMismatch {
                    record: record.id.clone(),
                    expected: self.id.clone(),
                    actual: record.tab_id.clone(),
                });
            }
            if !seen.insert(&record.id) {
                return Err(ModelError::DuplicateRecordId(record.id.clone()));
            }
        }
        Ok(())
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    /// Check if tab has no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }
}
