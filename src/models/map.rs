use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::constants::{MAX_MAP_NAME_LEN, MAX_TAG_KEY_LEN};

/// String tags attached to a map, stored as a JSON object
pub type MapTags = BTreeMap<String, String>;

/// Check tags submitted for merging into a map
pub fn validate_tags(tags: &MapTags) -> Result<(), &'static str> {
    if tags.is_empty() {
        return Err("At least one tag must be specified");
    }
    for key in tags.keys() {
        if key.trim().is_empty() {
            return Err("Tag keys must not be blank");
        }
        if key.len() > MAX_TAG_KEY_LEN {
            return Err("Tag key is too long");
        }
    }
    Ok(())
}

/// Row of the shared `maps` registry
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MapRecord {
    pub id: i64,
    pub display_name: String,
    pub user_id: i64,
    pub public: bool,
    pub created_at: DateTime<Utc>,
}

impl MapRecord {
    /// Check a display name for a new map.
    ///
    /// All-digit names are refused: the resolver reads them as ids, so such a
    /// map could never be found by name.
    pub fn validate_name(name: &str) -> Result<(), &'static str> {
        if name.trim().is_empty() {
            return Err("Map name must not be blank");
        }
        if name.len() > MAX_MAP_NAME_LEN {
            return Err("Map name is too long");
        }
        if name.bytes().all(|b| b.is_ascii_digit()) {
            return Err("Map name must not be a number");
        }
        Ok(())
    }
}

/// Element counts read from a map's own tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ElementCounts {
    pub nodes: i64,
    pub ways: i64,
    pub relations: i64,
}

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
