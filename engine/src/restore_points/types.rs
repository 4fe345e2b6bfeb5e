use super::state_paths::{
    DEFAULT_BAR, created_at_from_millis, is_trusted_restore_point_id, normalize_bar_name,
    normalize_created_at, normalize_snapshot_timestamp, restore_point_id_millis,
    timestamp_from_millis,
};
use crate::layout::DEFAULT_THEME_NAME;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MANIFEST_VERSION: u32 = 1;

/// How a restore point came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestorePointType {
    Automatic,
    Manual,
}

impl RestorePointType {
    /// Maps the spellings found in older manifests onto the two kinds.
    /// Anything that is not clearly manual is treated as automatic.
    pub fn normalize(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" | "user" => RestorePointType::Manual,
            _ => RestorePointType::Automatic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RestorePointType::Automatic => "automatic",
            RestorePointType::Manual => "manual",
        }
    }
}

/// A validated manifest record.
///
/// Only [`RestorePointEntry::from_value`] and [`RestorePointEntry::standardize`]
/// produce entries that reach the manifest; both reject untrusted ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePointEntry {
    pub id: String,
    pub created_at: String,
    pub timestamp: String,
    pub source_theme: String,
    #[serde(rename = "type")]
    pub kind: RestorePointType,
    pub default_theme_bar: String,
    pub default_bar_manual: bool,
    pub selected_folders: Vec<String>,
}

fn string_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn bool_field(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

/// Trimmed, non-empty folder names in their original order.
pub fn normalize_folders<S: AsRef<str>>(folders: &[S]) -> Vec<String> {
    folders
        .iter()
        .map(|f| f.as_ref().trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn folders_field(value: &Value) -> Vec<String> {
    match value.get("selectedFolders") {
        Some(Value::Array(items)) => {
            let strings: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            normalize_folders(&strings)
        }
        Some(Value::String(joined)) => {
            let parts: Vec<&str> = joined.split(',').collect();
            normalize_folders(&parts)
        }
        _ => Vec::new(),
    }
}

impl RestorePointEntry {
    /// Standardizes a raw JSON record into an entry.
    ///
    /// Returns `None` when the record has no trusted id. Every other field is
    /// repaired: missing timestamps are filled from the other representation
    /// (then from the id), unknown kinds become automatic, empty strings fall
    /// back to their defaults.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id").and_then(Value::as_str)?;
        if !is_trusted_restore_point_id(id) {
            return None;
        }

        let raw_created = string_field(value, "createdAt");
        let raw_timestamp = string_field(value, "timestamp");
        let id_millis = restore_point_id_millis(id);

        let created_at = match (raw_created.or(raw_timestamp), id_millis) {
            (Some(raw), _) => normalize_created_at(raw),
            (None, Some(ms)) => created_at_from_millis(ms),
            (None, None) => normalize_created_at(""),
        };
        let timestamp = match (raw_timestamp.or(raw_created), id_millis) {
            (Some(raw), _) => normalize_snapshot_timestamp(raw),
            (None, Some(ms)) => timestamp_from_millis(ms),
            (None, None) => normalize_snapshot_timestamp(""),
        };

        Some(Self {
            id: id.to_string(),
            created_at,
            timestamp,
            source_theme: string_field(value, "sourceTheme")
                .unwrap_or(DEFAULT_THEME_NAME)
                .to_string(),
            kind: RestorePointType::normalize(string_field(value, "type").unwrap_or("")),
            default_theme_bar: normalize_bar_name(
                string_field(value, "defaultThemeBar").unwrap_or(DEFAULT_BAR),
            ),
            default_bar_manual: bool_field(value, "defaultBarManual"),
            selected_folders: folders_field(value),
        })
    }

    /// Round-trips the entry through [`RestorePointEntry::from_value`].
    pub fn standardize(&self) -> Option<Self> {
        serde_json::to_value(self)
            .ok()
            .and_then(|value| Self::from_value(&value))
    }

    /// Synthesized entry for a restore-point directory the manifest lost.
    pub fn fallback_for_id(id: &str) -> Option<Self> {
        let millis = restore_point_id_millis(id)?;
        if !is_trusted_restore_point_id(id) {
            return None;
        }
        Some(Self {
            id: id.to_string(),
            created_at: created_at_from_millis(millis),
            timestamp: timestamp_from_millis(millis),
            source_theme: DEFAULT_THEME_NAME.to_string(),
            kind: RestorePointType::Automatic,
            default_theme_bar: DEFAULT_BAR.to_string(),
            default_bar_manual: false,
            selected_folders: Vec::new(),
        })
    }

    /// Creation time encoded in the id.
    pub fn id_millis(&self) -> i64 {
        restore_point_id_millis(&self.id).unwrap_or_default()
    }
}

/// The manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePointsState {
    pub version: u32,
    pub active_id: Option<String>,
    pub points: Vec<RestorePointEntry>,
}

impl Default for RestorePointsState {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            active_id: None,
            points: Vec::new(),
        }
    }
}

impl RestorePointsState {
    pub fn new(points: Vec<RestorePointEntry>, active_id: Option<String>) -> Self {
        let mut state = Self {
            version: MANIFEST_VERSION,
            active_id,
            points,
        };
        state.normalize();
        state
    }

    pub fn find(&self, id: &str) -> Option<&RestorePointEntry> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Sorts newest first, drops duplicate ids (first occurrence wins) and
    /// re-points `active_id` at an existing entry.
    pub fn normalize(&mut self) {
        self.version = MANIFEST_VERSION;

        let mut seen = std::collections::HashSet::new();
        self.points.retain(|p| seen.insert(p.id.clone()));
        self.points
            .sort_by(|a, b| b.id_millis().cmp(&a.id_millis()).then_with(|| b.id.cmp(&a.id)));

        self.heal_active_id();
    }

    /// An `active_id` that references nothing falls back to the first point.
    pub fn heal_active_id(&mut self) {
        let valid = self
            .active_id
            .as_deref()
            .is_some_and(|id| is_trusted_restore_point_id(id) && self.contains(id));
        if !valid {
            self.active_id = self.points.first().map(|p| p.id.clone());
        }
    }
}

/// Node kinds produced by the snapshot tree walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeNodeType {
    File,
    Folder,
    Truncated,
}

/// One entry of a snapshot tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePointTreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: TreeNodeType,
    pub size: u64,
    pub size_label: String,
    pub children: Vec<RestorePointTreeNode>,
}

impl RestorePointTreeNode {
    /// Number of nodes in this subtree, itself included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID: &str = "rp-1700000000000-abc123";

    #[test]
    fn test_from_value_rejects_untrusted_ids() {
        for id in ["", "rp-1-abc123", "rp-1700000000000-ABC123", "../rp-1700000000000-abc123"] {
            assert!(RestorePointEntry::from_value(&json!({ "id": id })).is_none());
        }
        assert!(RestorePointEntry::from_value(&json!({ "id": 5 })).is_none());
        assert!(RestorePointEntry::from_value(&json!({})).is_none());
    }

    #[test]
    fn test_from_value_fills_defaults() {
        let entry = RestorePointEntry::from_value(&json!({ "id": ID })).unwrap();
        assert_eq!(entry.source_theme, "default");
        assert_eq!(entry.kind, RestorePointType::Automatic);
        assert_eq!(entry.default_theme_bar, "none");
        assert!(!entry.default_bar_manual);
        assert!(entry.selected_folders.is_empty());
        assert_eq!(entry.created_at, created_at_from_millis(1_700_000_000_000));
        assert_eq!(entry.timestamp, timestamp_from_millis(1_700_000_000_000));
    }

    #[test]
    fn test_type_spellings_normalize() {
        for (raw, kind) in [
            ("manual", RestorePointType::Manual),
            ("MANUAL", RestorePointType::Manual),
            ("auto", RestorePointType::Automatic),
            ("automated", RestorePointType::Automatic),
            ("scheduled", RestorePointType::Automatic),
            ("", RestorePointType::Automatic),
        ] {
            assert_eq!(RestorePointType::normalize(raw), kind, "{raw}");
        }
    }

    #[test]
    fn test_folders_are_trimmed_not_deduplicated() {
        let entry = RestorePointEntry::from_value(&json!({
            "id": ID,
            "selectedFolders": [" waybar ", "", "hypr", "waybar", 7]
        }))
        .unwrap();
        assert_eq!(entry.selected_folders, vec!["waybar", "hypr", "waybar"]);
    }

    #[test]
    fn test_folders_accept_comma_string() {
        let entry = RestorePointEntry::from_value(&json!({
            "id": ID,
            "selectedFolders": "waybar, kitty,,"
        }))
        .unwrap();
        assert_eq!(entry.selected_folders, vec!["waybar", "kitty"]);
    }

    #[test]
    fn test_standardize_is_idempotent() {
        let entry = RestorePointEntry::from_value(&json!({
            "id": ID,
            "createdAt": "2024-02-03 04:05",
            "type": "manual",
            "sourceTheme": "nord",
            "defaultThemeBar": "Waybar",
            "defaultBarManual": "true"
        }))
        .unwrap();
        assert_eq!(entry.default_theme_bar, "waybar");
        assert!(entry.default_bar_manual);
        assert_eq!(entry.standardize().unwrap(), entry);
    }

    #[test]
    fn test_state_heals_active_id() {
        let older = RestorePointEntry::fallback_for_id("rp-1600000000000-aaaaaa").unwrap();
        let newer = RestorePointEntry::fallback_for_id("rp-1700000000000-bbbbbb").unwrap();

        let state = RestorePointsState::new(
            vec![older.clone(), newer.clone()],
            Some("rp-1500000000000-cccccc".to_string()),
        );
        assert_eq!(state.points[0].id, newer.id);
        assert_eq!(state.active_id.as_deref(), Some(newer.id.as_str()));

        let empty = RestorePointsState::new(Vec::new(), Some(newer.id.clone()));
        assert!(empty.active_id.is_none());
    }

    #[test]
    fn test_state_drops_duplicate_ids() {
        let a = RestorePointEntry::fallback_for_id(ID).unwrap();
        let mut b = a.clone();
        b.source_theme = "other".to_string();
        let state = RestorePointsState::new(vec![a.clone(), b], None);
        assert_eq!(state.points, vec![a]);
    }
}
