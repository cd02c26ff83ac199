//! Legacy two-bucket response format for mobile clients that predate the
//! current schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{PublicConfigRecord, StyleKind};

/// Records that predate the metadata convention and cannot be
/// retrofitted reliably. Matched against `name`, exact and
/// case-insensitive.
const KNOWN_OVERLAY_NAMES: [&str; 5] = [
    "kataster",
    "kataster bev",
    "flawi",
    "gefahrenzonen",
    "contour lines",
];

/// Dictionary keys that deployed clients look up verbatim. Checked
/// before the generic stripping so renames of the stripping rule can
/// never break them.
const KEY_ALIASES: [(&str, &str); 2] = [("Global", "Global"), ("Global 2", "Global2")];

/// The legacy response shape: two name-keyed buckets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyMapConfig {
    #[serde(rename = "backgroundMaps")]
    pub background_maps: BTreeMap<String, LegacyMapEntry>,
    #[serde(rename = "overlayMaps")]
    pub overlay_maps: BTreeMap<String, LegacyMapEntry>,
}

/// One entry in a legacy bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyMapEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    #[serde(rename = "type")]
    pub kind: StyleKind,
    pub style: String,
    pub metadata: Value,
}

impl From<&PublicConfigRecord> for LegacyMapEntry {
    fn from(record: &PublicConfigRecord) -> Self {
        Self {
            name: record.name.clone(),
            label: record.label.clone(),
            country: record.country.clone(),
            flag: record.flag.clone(),
            kind: record.kind,
            style: record.style.clone(),
            metadata: record.metadata.clone(),
        }
    }
}

/// Reshape sanitized records into the two-bucket legacy structure.
pub fn to_legacy_format(records: &[PublicConfigRecord]) -> LegacyMapConfig {
    let mut out = LegacyMapConfig::default();
    for record in records {
        let entry = LegacyMapEntry::from(record);
        let key = legacy_key(&record.name);
        if is_overlay(record) {
            out.overlay_maps.insert(key, entry);
        } else {
            out.background_maps.insert(key, entry);
        }
    }
    out
}

/// Classify a record as overlay.
///
/// Priority order is load-bearing for deployed clients and must not be
/// reordered: explicit `metadata.isOverlay`, then `metadata.category`,
/// then the known-name list. Absent all three, background.
fn is_overlay(record: &PublicConfigRecord) -> bool {
    if let Some(flag) = record.metadata.get("isOverlay").and_then(Value::as_bool) {
        return flag;
    }
    if let Some(category) = record.metadata.get("category").and_then(Value::as_str) {
        return category.eq_ignore_ascii_case("overlay");
    }
    KNOWN_OVERLAY_NAMES
        .iter()
        .any(|n| record.name.eq_ignore_ascii_case(n))
}

/// Derive the dictionary key for a record name: hardcoded aliases first,
/// then all non-alphanumeric characters removed.
pub fn legacy_key(name: &str) -> String {
    for (alias, key) in KEY_ALIASES {
        if name == alias {
            return key.to_string();
        }
    }
    name.chars().filter(|c| c.is_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn rec(name: &str, metadata: Value) -> PublicConfigRecord {
        PublicConfigRecord {
            id: Uuid::nil(),
            name: name.to_string(),
            label: Some(name.to_string()),
            country: None,
            flag: None,
            kind: StyleKind::VectorStyle,
            style: format!("https://maps.example.org/api/styles/{}.json", name),
            layers: None,
            metadata,
        }
    }

    #[test]
    fn test_explicit_is_overlay_flag() {
        let out = to_legacy_format(&[rec("Kataster BEV", json!({"isOverlay": true}))]);
        assert!(out.overlay_maps.contains_key("KatasterBEV"));
        assert!(out.background_maps.is_empty());
    }

    #[test]
    fn test_is_overlay_false_beats_known_name_list() {
        // Explicit flag wins even when the name is on the overlay list
        let out = to_legacy_format(&[rec("Kataster", json!({"isOverlay": false}))]);
        assert!(out.background_maps.contains_key("Kataster"));
        assert!(out.overlay_maps.is_empty());
    }

    #[test]
    fn test_category_classification() {
        let out = to_legacy_format(&[rec("Zoning", json!({"category": "overlay"}))]);
        assert!(out.overlay_maps.contains_key("Zoning"));

        let out = to_legacy_format(&[rec("Terrain", json!({"category": "background"}))]);
        assert!(out.background_maps.contains_key("Terrain"));
    }

    #[test]
    fn test_known_name_fallback() {
        let out = to_legacy_format(&[rec("Gefahrenzonen", json!({}))]);
        assert!(out.overlay_maps.contains_key("Gefahrenzonen"));

        let out = to_legacy_format(&[rec("GEFAHRENZONEN", json!({}))]);
        assert_eq!(out.overlay_maps.len(), 1);
    }

    #[test]
    fn test_default_is_background() {
        let out = to_legacy_format(&[rec("Terrain v2", json!({}))]);
        assert!(out.background_maps.contains_key("Terrainv2"));
        assert!(out.overlay_maps.is_empty());
    }

    #[test]
    fn test_key_stripping() {
        assert_eq!(legacy_key("Kataster BEV"), "KatasterBEV");
        assert_eq!(legacy_key("Ortho (2023)"), "Ortho2023");
        assert_eq!(legacy_key("südtirol"), "südtirol");
    }

    #[test]
    fn test_hardcoded_aliases() {
        assert_eq!(legacy_key("Global"), "Global");
        assert_eq!(legacy_key("Global 2"), "Global2");
        // aliasing takes precedence over stripping, even where both
        // would agree
        let out = to_legacy_format(&[rec("Global 2", json!({}))]);
        assert!(out.background_maps.contains_key("Global2"));
    }

    #[test]
    fn test_alias_only_matches_exact_name() {
        // a record whose label is "Global" but whose name differs must
        // not collide with the alias
        assert_eq!(legacy_key("Global Imagery"), "GlobalImagery");
    }

    #[test]
    fn test_buckets_hold_full_entries() {
        let out = to_legacy_format(&[rec("Global", json!({"attribution": "© MapTiler"}))]);
        let entry = out.background_maps.get("Global").unwrap();
        assert_eq!(entry.name, "Global");
        assert_eq!(entry.metadata, json!({"attribution": "© MapTiler"}));

        let json = serde_json::to_value(&out).unwrap();
        assert!(json.get("backgroundMaps").is_some());
        assert!(json.get("overlayMaps").is_some());
        assert_eq!(
            json["backgroundMaps"]["Global"]["type"],
            json!("vector_style")
        );
    }
}
