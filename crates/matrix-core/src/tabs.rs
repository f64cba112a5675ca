//! Tab management
//!
//! [`TabManager`] owns one project's tab set. Every operation validates
//! before it mutates, so a rejected call leaves the tab set untouched.
//! The active tab is passed in explicitly; an unknown id resolves to the
//! first tab.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::persisted::{PersistedAnalysis, PersistedCompetitor, PersistedSubTab};
use matrix_model::{
    AttributeSchema, CompetitorRecord, ProjectId, RecordId, Tab, TabId, MATCH_PROBABILITY,
};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Source tag for hand-added records
pub const SOURCE_HUMAN: &str = "Human";

/// Tag for hand-added records
pub const TAG_MANUAL: &str = "Manual";

/// Conventions used when materializing and flattening tabs
#[derive(Debug, Clone, PartialEq, Eq)]
struct TabDefaults {
    default_tab_id: TabId,
    default_tab_name: String,
    default_schema: AttributeSchema,
    legacy_tab_id: TabId,
    new_competitor_name: String,
}

impl From<&EngineConfig> for TabDefaults {
    fn from(config: &EngineConfig) -> Self {
        Self {
            default_tab_id: config.default_tab_id.clone(),
            default_tab_name: config.default_tab_name.clone(),
            default_schema: config.default_schema(),
            legacy_tab_id: config.legacy_tab_id.clone(),
            new_competitor_name: config.new_competitor_name.clone(),
        }
    }
}

impl TabDefaults {
    fn default_tab(&self, schema: AttributeSchema) -> Tab {
        Tab::new(self.default_tab_id.clone(), self.default_tab_name.clone()).with_schema(schema)
    }
}

/// One project's tabs; never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabManager {
    tabs: Vec<Tab>,
    analysis_summary: String,
    defaults: TabDefaults,
}

impl TabManager {
    /// Create manager over `tabs`
    ///
    /// An empty tab list is replaced by the default tab.
    #[must_use]
    pub fn new(tabs: Vec<Tab>, config: &EngineConfig) -> Self {
        let defaults = TabDefaults::from(config);
        let tabs = if tabs.is_empty() {
            vec![defaults.default_tab(defaults.default_schema.clone())]
        } else {
            tabs
        };
        Self {
            tabs,
            analysis_summary: String::new(),
            defaults,
        }
    }

    /// With analysis summary
    #[inline]
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.analysis_summary = summary.into();
        self
    }

    /// Rebuild the tab view from a persisted snapshot
    ///
    /// # Loading Rules
    /// - `subTabs` present → one tab per entry
    /// - otherwise one default tab, using the legacy attribute list if non-empty
    /// - records without a known `tabId` land in the default tab (or the first tab)
    #[must_use]
    pub fn from_persisted(snapshot: &PersistedAnalysis, config: &EngineConfig) -> Self {
        let defaults = TabDefaults::from(config);

        let mut tabs: Vec<Tab> = if snapshot.sub_tabs.is_empty() {
            let schema = if snapshot.attributes.is_empty() {
                defaults.default_schema.clone()
            } else {
                AttributeSchema::from_names(snapshot.attributes.iter().map(String::as_str))
            };
            vec![defaults.default_tab(schema)]
        } else {
            snapshot
                .sub_tabs
                .iter()
                .map(|sub| {
                    Tab::new(sub.id.clone(), sub.name.clone())
                        .with_schema(AttributeSchema::from_names(sub.attributes.iter().map(String::as_str)))
                })
                .collect()
        };

        let fallback = tabs
            .iter()
            .position(|t| t.id == defaults.default_tab_id)
            .unwrap_or(0);

        let mut seen: HashSet<RecordId> = HashSet::with_capacity(snapshot.competitors.len());
        for stored in &snapshot.competitors {
            if !seen.insert(stored.id.clone()) {
                warn!(record_id = %stored.id, "Duplicate stored record id, keeping first");
                continue;
            }
            let index = stored
                .tab_id
                .as_ref()
                .and_then(|tab_id| tabs.iter().position(|t| &t.id == tab_id))
                .unwrap_or_else(|| {
                    if stored.tab_id.is_some() {
                        debug!(record_id = %stored.id, "Record references unknown tab, moving to default tab");
                    }
                    fallback
                });
            let record = stored.to_record(tabs[index].id.clone());
            tabs[index].push(record);
        }

        Self {
            tabs,
            analysis_summary: snapshot.analysis_summary.clone(),
            defaults,
        }
    }

    /// All tabs, in order
    #[inline]
    #[must_use]
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Tab by id
    #[inline]
    #[must_use]
    pub fn tab(&self, id: &TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| &t.id == id)
    }

    /// Analysis summary
    #[inline]
    #[must_use]
    pub fn analysis_summary(&self) -> &str {
        &self.analysis_summary
    }

    /// Replace the analysis summary
    pub fn set_analysis_summary(&mut self, summary: impl Into<String>) {
        self.analysis_summary = summary.into();
    }

    fn active_index(&self, active: Option<&TabId>) -> usize {
        active
            .and_then(|id| self.tabs.iter().position(|t| &t.id == id))
            .unwrap_or(0)
    }

    /// Resolve the active tab; unknown or missing ids fall back to the first tab
    #[must_use]
    pub fn resolve_active(&self, active: Option<&TabId>) -> &Tab {
        &self.tabs[self.active_index(active)]
    }

    /// Add an attribute to the active tab's schema
    ///
    /// Every record in that tab gets an empty value for it.
    ///
    /// # Errors
    /// `EngineError::DuplicateAttribute` if present, `InvalidRecord` if blank
    pub fn add_attribute(&mut self, active: Option<&TabId>, name: &str) -> Result<(), EngineError> {
        let index = self.active_index(active);
        self.tabs[index].add_attribute(name)?;
        debug!(tab_id = %self.tabs[index].id, attribute = name, "Attribute added");
        Ok(())
    }

    /// Remove an attribute from the active tab's schema
    ///
    /// # Errors
    /// `EngineError::AttributeNotFound` if absent
    pub fn remove_attribute(&mut self, active: Option<&TabId>, name: &str) -> Result<(), EngineError> {
        let index = self.active_index(active);
        self.tabs[index].remove_attribute(name)?;
        debug!(tab_id = %self.tabs[index].id, attribute = name, "Attribute removed");
        Ok(())
    }

    /// Add a blank hand-made record to the active tab, returning its id
    pub fn add_competitor(&mut self, active: Option<&TabId>) -> RecordId {
        let index = self.active_index(active);
        let tab = &mut self.tabs[index];

        let mut record = CompetitorRecord::new(RecordId::generate(), self.defaults.new_competitor_name.clone(), tab.id.clone())
            .with_source(SOURCE_HUMAN)
            .with_tags(vec![TAG_MANUAL.to_string()]);
        record.fill_schema_keys(&tab.schema);

        let id = record.id.clone();
        tab.push(record);
        id
    }

    /// Replace a record by id, wherever it lives
    ///
    /// The record stays in its current tab. `Match Probability` is
    /// generator-owned and may not change; other keys must be in the tab
    /// schema or already present on the record.
    ///
    /// # Errors
    /// - `EngineError::RecordNotFound` if no tab holds the id
    /// - `EngineError::InvalidRecord` for a blank name
    /// - `EngineError::ReservedAttribute` if `Match Probability` changes
    /// - `EngineError::UnknownAttribute` for a key outside the schema
    pub fn update_competitor(&mut self, mut record: CompetitorRecord) -> Result<(), EngineError> {
        record.validate()?;

        let (tab_index, record_index) = self
            .locate(&record.id)
            .ok_or_else(|| EngineError::RecordNotFound(record.id.clone()))?;
        let tab = &self.tabs[tab_index];
        let stored = &tab.competitors[record_index];

        if stored.get(MATCH_PROBABILITY).unwrap_or_default() != record.get(MATCH_PROBABILITY).unwrap_or_default() {
            return Err(EngineError::ReservedAttribute(MATCH_PROBABILITY.to_string()));
        }

        for key in record.attributes.keys() {
            if key != MATCH_PROBABILITY && !tab.schema.contains(key) && !stored.attributes.contains_key(key) {
                return Err(EngineError::UnknownAttribute {
                    tab: tab.id.clone(),
                    name: key.clone(),
                });
            }
        }

        record.tab_id = tab.id.clone();
        self.tabs[tab_index].competitors[record_index] = record;
        Ok(())
    }

    /// Delete one record
    ///
    /// # Errors
    /// `EngineError::RecordNotFound` if no tab holds the id
    pub fn delete_competitor(&mut self, id: &RecordId) -> Result<(), EngineError> {
        let (tab_index, record_index) = self
            .locate(id)
            .ok_or_else(|| EngineError::RecordNotFound(id.clone()))?;
        self.tabs[tab_index].competitors.remove(record_index);
        Ok(())
    }

    /// Delete every record whose id is in `ids`, across all tabs
    ///
    /// Unknown ids are ignored. Returns the ids actually removed.
    pub fn bulk_delete(&mut self, ids: &HashSet<RecordId>) -> Vec<RecordId> {
        self.tabs.iter_mut().flat_map(|tab| tab.remove_ids(ids)).collect()
    }

    /// Append records to the active tab (bulk import)
    ///
    /// Blank or colliding ids get fresh ones; every record gets the tab's
    /// schema keys. Returns the ids in input order.
    ///
    /// # Errors
    /// `EngineError::InvalidRecord` if any record has a blank name; nothing is added
    pub fn bulk_add(
        &mut self,
        active: Option<&TabId>,
        records: Vec<CompetitorRecord>,
    ) -> Result<Vec<RecordId>, EngineError> {
        for record in &records {
            record.validate()?;
        }

        let mut taken: HashSet<RecordId> = self
            .tabs
            .iter()
            .flat_map(|t| t.competitors.iter().map(|c| c.id.clone()))
            .collect();

        let index = self.active_index(active);
        let tab = &mut self.tabs[index];
        let mut ids = Vec::with_capacity(records.len());
        for mut record in records {
            if record.id.as_str().trim().is_empty() || taken.contains(&record.id) {
                record.id = RecordId::generate();
            }
            taken.insert(record.id.clone());
            record.fill_schema_keys(&tab.schema);
            ids.push(record.id.clone());
            tab.push(record);
        }
        Ok(ids)
    }

    /// Delete a tab with its records
    ///
    /// # Errors
    /// - `EngineError::TabNotFound` if absent
    /// - `EngineError::LastTab` if it is the only tab
    pub fn delete_tab(&mut self, id: &TabId) -> Result<(), EngineError> {
        let index = self
            .tabs
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| EngineError::TabNotFound(id.clone()))?;
        if self.tabs.len() == 1 {
            return Err(EngineError::LastTab);
        }
        self.tabs.remove(index);
        Ok(())
    }

    /// Replace the tab with the same id
    ///
    /// # Errors
    /// `EngineError::TabNotFound` if absent
    pub fn replace_tab(&mut self, tab: Tab) -> Result<(), EngineError> {
        let slot = self
            .tabs
            .iter_mut()
            .find(|t| t.id == tab.id)
            .ok_or_else(|| EngineError::TabNotFound(tab.id.clone()))?;
        *slot = tab;
        Ok(())
    }

    /// Replace the whole tab set; an empty set materializes the default tab
    pub fn replace_all(&mut self, tabs: Vec<Tab>) {
        self.tabs = if tabs.is_empty() {
            vec![self.defaults.default_tab(self.defaults.default_schema.clone())]
        } else {
            tabs
        };
    }

    /// Legacy flat attribute list
    ///
    /// Taken from the legacy tab, or the first tab if it is absent.
    #[must_use]
    pub fn legacy_attributes(&self) -> Vec<String> {
        self.tab(&self.defaults.legacy_tab_id)
            .unwrap_or(&self.tabs[0])
            .schema
            .to_vec()
    }

    /// Flatten into the persisted snapshot shape
    #[must_use]
    pub fn flatten(&self, project_id: &ProjectId) -> PersistedAnalysis {
        PersistedAnalysis {
            project_id: project_id.clone(),
            attributes: self.legacy_attributes(),
            analysis_summary: self.analysis_summary.clone(),
            sub_tabs: self
                .tabs
                .iter()
                .map(|t| PersistedSubTab {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    attributes: t.schema.to_vec(),
                })
                .collect(),
            competitors: self
                .tabs
                .iter()
                .flat_map(|t| t.competitors.iter().map(PersistedCompetitor::from_record))
                .collect(),
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    fn locate(&self, id: &RecordId) -> Option<(usize, usize)> {
        self.tabs.iter().enumerate().find_map(|(tab_index, tab)| {
            tab.competitors
                .iter()
                .position(|c| &c.id == id)
                .map(|record_index| (tab_index, record_index))
        })
    }
}
