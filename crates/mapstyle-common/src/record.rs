//! Map-config records and related entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of style kinds a record can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    /// Vector-tile style document (MapLibre/Mapbox style JSON).
    VectorStyle,
    /// Raster tiles / WMTS.
    Raster,
    /// OGC WMS endpoint.
    Wms,
}

impl StyleKind {
    /// Parse the `type` column. Legacy rows carry several spellings;
    /// anything unrecognized is treated as a vector style rather than
    /// rejected.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "raster" | "wmts" | "xyz" => StyleKind::Raster,
            "wms" => StyleKind::Wms,
            _ => StyleKind::VectorStyle,
        }
    }
}

impl Default for StyleKind {
    fn default() -> Self {
        StyleKind::VectorStyle
    }
}

/// One entry of a record's `layers` array.
///
/// The shape is open (it mirrors whatever the style document needs); the
/// only field the server interprets is the `private` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Private entries are dropped from sanitized output.
    #[serde(default, skip_serializing)]
    pub private: bool,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Canonical internal record shape, produced by row normalization at the
/// datastore boundary. The historical `style` / `style_url` /
/// `public_style_url` column drift is already resolved here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfigRecord {
    pub id: Uuid,
    pub name: String,
    pub label: Option<String>,
    pub country: Option<String>,
    pub flag: Option<String>,

    pub kind: StyleKind,

    /// Canonical style URL or path. May be empty on legacy rows; the
    /// sanitizer degrades instead of rejecting.
    pub style: String,

    /// Pre-sanitization backup of the style URL, kept by older tooling
    /// that rewrote `style` in place.
    pub original_style: Option<String>,

    pub layers: Option<Vec<LayerEntry>>,

    /// Open metadata object. Known hints: isOverlay, overlayType,
    /// category, provider, selectLayer, attribution.
    pub metadata: serde_json::Value,

    pub is_active: bool,
    pub is_public: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MapConfigRecord {
    /// The URL the sanitizer should start from. Records that were
    /// sanitized in place by older tooling carry a proxy path in `style`
    /// and the real upstream URL in `original_style`.
    pub fn upstream_source(&self) -> &str {
        if self.style.starts_with("/api/proxy/") {
            if let Some(orig) = self.original_style.as_deref() {
                if !orig.trim().is_empty() {
                    return orig;
                }
            }
        }
        &self.style
    }
}

/// The record shape served to clients after sanitization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicConfigRecord {
    pub id: Uuid,
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

    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<LayerEntry>>,

    /// Projected onto the non-sensitive allow-list.
    pub metadata: serde_json::Value,
}

/// Association of a basemap with an ordered set of overlays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerGroup {
    pub id: Uuid,
    pub name: String,
    pub basemap: String,
    pub overlays: Vec<LayerGroupOverlay>,
}

/// One overlay association within a layer group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerGroupOverlay {
    pub overlay: String,
    pub display_order: i32,
    pub default_visible: bool,
    pub opacity: f32,
}
