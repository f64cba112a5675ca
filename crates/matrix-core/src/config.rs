//! Engine configuration
//!
//! Defaults match the conventions of the persisted project shape: a
//! `tab_general` default tab and a `tab_competitors` legacy view.

use crate::error::EngineError;
use matrix_model::{AttributeSchema, TabId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How persistence intents are dispatched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    /// Save is awaited inside the mutation; failures reach the caller
    #[default]
    Inline,
    /// Save is queued to an ordered background worker
    Queued,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Id of the tab materialized when a project has none
    pub default_tab_id: TabId,
    /// Name of the materialized default tab
    pub default_tab_name: String,
    /// Schema of the materialized default tab
    pub default_attributes: Vec<String>,
    /// Tab whose schema feeds the legacy flat attribute list
    pub legacy_tab_id: TabId,
    /// Name given to manually added competitors
    pub new_competitor_name: String,
    /// Generation collaborator timeout in seconds (0 disables)
    pub generation_timeout_secs: u64,
    /// Persistence dispatch mode
    pub persistence: PersistenceMode,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML; missing keys take defaults
    ///
    /// # Errors
    /// `EngineError::Config` on malformed TOML or invalid values
    pub fn from_toml_str(raw: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(raw).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values
    ///
    /// # Errors
    /// `EngineError::Config` for blank tab ids or names
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.default_tab_id.as_str().trim().is_empty() {
            return Err(EngineError::Config("default_tab_id must not be blank".into()));
        }
        if self.default_tab_name.trim().is_empty() {
            return Err(EngineError::Config("default_tab_name must not be blank".into()));
        }
        if self.legacy_tab_id.as_str().trim().is_empty() {
            return Err(EngineError::Config("legacy_tab_id must not be blank".into()));
        }
        if self.new_competitor_name.trim().is_empty() {
            return Err(EngineError::Config("new_competitor_name must not be blank".into()));
        }
        if self.default_attributes.iter().any(|a| a.trim().is_empty()) {
            return Err(EngineError::Config("default_attributes must not contain blank names".into()));
        }
        Ok(())
    }

    /// With default tab
    #[inline]
    #[must_use]
    pub fn with_default_tab(mut self, id: impl Into<TabId>, name: impl Into<String>) -> Self {
        self.default_tab_id = id.into();
        self.default_tab_name = name.into();
        self
    }

    /// With default attributes
    #[inline]
    #[must_use]
    pub fn with_default_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_attributes = names.into_iter().map(Into::into).collect();
        self
    }

    /// With legacy tab id
    #[inline]
    #[must_use]
    pub fn with_legacy_tab(mut self, id: impl Into<TabId>) -> Self {
        self.legacy_tab_id = id.into();
        self
    }

    /// With generation timeout (0 disables)
    #[inline]
    #[must_use]
    pub fn with_generation_timeout_secs(mut self, secs: u64) -> Self {
        self.generation_timeout_secs = secs;
        self
    }

    /// With persistence mode
    #[inline]
    #[must_use]
    pub fn with_persistence(mut self, mode: PersistenceMode) -> Self {
        self.persistence = mode;
        self
    }

    /// Generation timeout, if enabled
    #[inline]
    #[must_use]
    pub fn generation_timeout(&self) -> Option<Duration> {
        (self.generation_timeout_secs > 0).then(|| Duration::from_secs(self.generation_timeout_secs))
    }

    /// Schema of the materialized default tab
    #[must_use]
    pub fn default_schema(&self) -> AttributeSchema {
        AttributeSchema::from_names(self.default_attributes.iter().map(String::as_str))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_tab_id: TabId::new("tab_general"),
            default_tab_name: "General".to_string(),
            default_attributes: vec!["Price".to_string(), "Features".to_string()],
            legacy_tab_id: TabId::new("tab_competitors"),
            new_competitor_name: "New Competitor".to_string(),
            generation_timeout_secs: 300,
            persistence: PersistenceMode::Inline,
        }
    }
}
