//! Persisted project shape
//!
//! The document store keeps a single flattened snapshot per project: all
//! records in one list tagged with their tab id, tab metadata without
//! records, and a legacy flat attribute list. Record attributes travel as a
//! JSON-encoded string in `attributesData`.

use matrix_model::{AttributeMap, CompetitorRecord, CreatorProfile, ProjectId, RecordId, TabId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Keys that belong to the record envelope, never to `attributesData`
const RESERVED_KEYS: [&str; 3] = ["id", "name", "tabId"];

/// Flattened project snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAnalysis {
    /// Owning project
    pub project_id: ProjectId,
    /// Legacy flat attribute list
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Narrative summary
    #[serde(default)]
    pub analysis_summary: String,
    /// Tab metadata
    #[serde(default)]
    pub sub_tabs: Vec<PersistedSubTab>,
    /// Every record of every tab
    #[serde(default)]
    pub competitors: Vec<PersistedCompetitor>,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub updated_at: i64,
}

impl PersistedAnalysis {
    /// Empty snapshot for a project
    #[inline]
    #[must_use]
    pub fn empty(project_id: impl Into<ProjectId>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Self::default()
        }
    }
}

/// Tab metadata without records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSubTab {
    /// Tab id
    pub id: TabId,
    /// Tab name
    pub name: String,
    /// Schema, in order
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// Stored competitor row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCompetitor {
    /// Record id
    pub id: RecordId,
    /// Display name
    pub name: String,
    /// Owning tab; absent on rows written before tabs existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
    /// JSON object string of attribute values
    #[serde(default)]
    pub attributes_data: String,
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

impl PersistedCompetitor {
    /// Flatten a record
    #[must_use]
    pub fn from_record(record: &CompetitorRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            tab_id: Some(record.tab_id.clone()),
            attributes_data: encode_attributes(&record.attributes),
            source: record.source.clone(),
            tags: record.tags.clone(),
            creator_profile: record.creator_profile.clone(),
        }
    }

    /// Rebuild a record in `tab_id`, decoding `attributesData` leniently
    #[must_use]
    pub fn to_record(&self, tab_id: TabId) -> CompetitorRecord {
        CompetitorRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            tab_id,
            attributes: decode_attributes(&self.attributes_data),
            source: self.source.clone(),
            tags: self.tags.clone(),
            creator_profile: self.creator_profile.clone(),
        }
    }
}

/// Encode attributes as a JSON object string, preserving order
#[must_use]
pub fn encode_attributes(attributes: &AttributeMap) -> String {
    let object: Map<String, Value> = attributes
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(object).to_string()
}

/// Decode an `attributesData` string
///
/// Malformed input yields an empty map. Non-string values are stringified,
/// `null` reads as `""`, and envelope keys (`id`, `name`, `tabId`) are
/// dropped.
#[must_use]
pub fn decode_attributes(raw: &str) -> AttributeMap {
    if raw.trim().is_empty() {
        return AttributeMap::new();
    }

    let object = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            warn!(kind = json_kind(&other), "attributesData is not an object, ignoring");
            return AttributeMap::new();
        }
        Err(e) => {
            warn!(error = %e, "Malformed attributesData, ignoring");
            return AttributeMap::new();
        }
    };

    object
        .into_iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
