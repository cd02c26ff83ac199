//! Common record fixtures for mapstyle tests.
//!
//! These model the record shapes actually found in the production
//! dataset, including the legacy rows with drifted fields.

use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use mapstyle_common::{MapConfigRecord, StyleKind};

fn base(name: &str) -> MapConfigRecord {
    MapConfigRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        label: Some(name.to_string()),
        country: Some("AT".into()),
        flag: Some("🇦🇹".into()),
        kind: StyleKind::VectorStyle,
        style: String::new(),
        original_style: None,
        layers: None,
        metadata: json!({}),
        is_active: true,
        is_public: true,
        created_at: Utc.with_ymd_and_hms(2021, 3, 14, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

/// A MapTiler-backed basemap with an embedded (stale) key.
pub fn maptiler_basemap() -> MapConfigRecord {
    let mut rec = base("Global");
    rec.country = Some("INT".into());
    rec.flag = Some("🌍".into());
    rec.style = "https://api.maptiler.com/maps/streets-v2/style.json?key=STALE123".into();
    rec.metadata = json!({
        "provider": "maptiler",
        "attribution": "© MapTiler © OpenStreetMap contributors",
        "isOfficial": true,
    });
    rec
}

/// The cadastral overlay served from a locally cached document.
pub fn cadastral_overlay() -> MapConfigRecord {
    let mut rec = base("Kataster BEV");
    rec.style = "https://kataster.bev.gv.at/styles/kataster/style_basic.json".into();
    rec.metadata = json!({
        "isOverlay": true,
        "overlayType": "cadastral",
        "attribution": "© BEV",
    });
    rec
}

/// A legacy row: style rewritten in place to a proxy path, original kept
/// in `original_style`, the way older admin tooling sanitized records.
pub fn legacy_proxied_record() -> MapConfigRecord {
    let mut rec = base("Global 2");
    rec.style = "/api/proxy/style/Global 2".into();
    rec.original_style =
        Some("https://api.maptiler.com/maps/outdoor-v2/style.json?key=OLD".into());
    rec.metadata = json!({"provider": "maptiler"});
    rec
}

/// A record violating the intended invariant: no style at all.
pub fn empty_style_record() -> MapConfigRecord {
    base("Orphan")
}

/// A representative public record set, in serving order.
pub fn sample_records() -> Vec<MapConfigRecord> {
    vec![
        maptiler_basemap(),
        cadastral_overlay(),
        legacy_proxied_record(),
        empty_style_record(),
    ]
}
