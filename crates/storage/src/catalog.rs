//! Map-config catalog using PostgreSQL.
//!
//! Row normalization happens here, at the datastore boundary: the
//! historical `style` / `style_url` / `public_style_url` column drift
//! and the partially-abandoned `map_category` column are resolved into
//! the canonical record shape before anything downstream sees them.

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use mapstyle_common::{
    ConfigError, ConfigResult, LayerEntry, LayerGroup, LayerGroupOverlay, MapConfigRecord,
    StyleKind,
};

/// Database connection pool and catalog operations.
pub struct ConfigCatalog {
    pool: PgPool,
}

impl ConfigCatalog {
    /// Create a new catalog connection from database URL.
    pub async fn connect(database_url: &str) -> ConfigResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| ConfigError::Database(format!("Connection failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> ConfigResult<()> {
        // Split SQL statements and execute them individually
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| ConfigError::Database(format!("Migration failed: {}", e)))?;
            }
        }

        Ok(())
    }

    /// Connectivity probe for readiness checks.
    pub async fn ping(&self) -> ConfigResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ConfigError::Database(format!("Ping failed: {}", e)))?;
        Ok(())
    }

    /// List all active, public records in serving order.
    pub async fn list_public_configs(&self) -> ConfigResult<Vec<MapConfigRecord>> {
        let rows = sqlx::query_as::<_, MapConfigRow>(
            "SELECT id, name, label, country, flag, type, \
             style, style_url, public_style_url, original_style, \
             layers, metadata, map_category, is_active, is_public, \
             created_at, updated_at \
             FROM map_configs \
             WHERE is_active = TRUE AND is_public = TRUE \
             ORDER BY country, label",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ConfigError::Database(format!("Query failed: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.normalize()).collect())
    }

    /// Find one active record by name.
    pub async fn find_by_name(&self, name: &str) -> ConfigResult<Option<MapConfigRecord>> {
        let row = sqlx::query_as::<_, MapConfigRow>(
            "SELECT id, name, label, country, flag, type, \
             style, style_url, public_style_url, original_style, \
             layers, metadata, map_category, is_active, is_public, \
             created_at, updated_at \
             FROM map_configs \
             WHERE name = $1 AND is_active = TRUE \
             ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ConfigError::Database(format!("Query failed: {}", e)))?;

        Ok(row.map(|r| r.normalize()))
    }

    /// List layer groups with their ordered overlay associations.
    pub async fn list_layer_groups(&self) -> ConfigResult<Vec<LayerGroup>> {
        let groups = sqlx::query_as::<_, LayerGroupRow>(
            "SELECT id, name, basemap_name FROM layer_groups ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ConfigError::Database(format!("Query failed: {}", e)))?;

        let overlays = sqlx::query_as::<_, LayerGroupOverlayRow>(
            "SELECT group_id, overlay_name, display_order, default_visible, opacity \
             FROM layer_group_overlays \
             ORDER BY group_id, display_order",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ConfigError::Database(format!("Query failed: {}", e)))?;

        let mut out: Vec<LayerGroup> = groups
            .into_iter()
            .map(|g| LayerGroup {
                id: g.id,
                name: g.name,
                basemap: g.basemap_name,
                overlays: Vec::new(),
            })
            .collect();

        for row in overlays {
            if let Some(group) = out.iter_mut().find(|g| g.id == row.group_id) {
                group.overlays.push(LayerGroupOverlay {
                    overlay: row.overlay_name,
                    display_order: row.display_order,
                    default_visible: row.default_visible,
                    opacity: row.opacity,
                });
            }
        }

        Ok(out)
    }
}

/// Raw row shape, carrying every historical column spelling.
#[derive(Debug, FromRow)]
struct MapConfigRow {
    id: Uuid,
    name: String,
    label: Option<String>,
    country: Option<String>,
    flag: Option<String>,
    #[sqlx(rename = "type")]
    kind: Option<String>,
    style: Option<String>,
    style_url: Option<String>,
    public_style_url: Option<String>,
    original_style: Option<String>,
    layers: Option<serde_json::Value>,
    metadata: Option<serde_json::Value>,
    map_category: Option<String>,
    is_active: bool,
    is_public: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MapConfigRow {
    /// Produce the canonical record: first populated style field wins,
    /// `map_category` folds into metadata when the metadata carries no
    /// overlay classification of its own.
    fn normalize(self) -> MapConfigRecord {
        let style = [&self.style, &self.style_url, &self.public_style_url]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or("")
            .to_string();

        let mut metadata = match self.metadata {
            Some(serde_json::Value::Object(map)) => serde_json::Value::Object(map),
            _ => serde_json::Value::Object(serde_json::Map::new()),
        };

        if let Some(category) = self.map_category.as_deref() {
            let category = category.trim();
            let has_classification = metadata.get("isOverlay").is_some()
                || metadata.get("category").is_some();
            if !category.is_empty() && !has_classification {
                if let Some(map) = metadata.as_object_mut() {
                    map.insert(
                        "category".to_string(),
                        serde_json::Value::String(category.to_ascii_lowercase()),
                    );
                }
            }
        }

        let layers = self
            .layers
            .and_then(|v| serde_json::from_value::<Vec<LayerEntry>>(v).ok());

        MapConfigRecord {
            id: self.id,
            name: self.name,
            label: self.label,
            country: self.country,
            flag: self.flag,
            kind: self.kind.as_deref().map(StyleKind::parse).unwrap_or_default(),
            style,
            original_style: self
                .original_style
                .filter(|s| !s.trim().is_empty()),
            layers,
            metadata,
            is_active: self.is_active,
            is_public: self.is_public,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LayerGroupRow {
    id: Uuid,
    name: String,
    basemap_name: String,
}

#[derive(Debug, FromRow)]
struct LayerGroupOverlayRow {
    group_id: Uuid,
    overlay_name: String,
    display_order: i32,
    default_visible: bool,
    opacity: f32,
}

/// Database schema SQL.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS map_configs (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    label VARCHAR(200),
    country VARCHAR(100),
    flag VARCHAR(20),
    type VARCHAR(50),
    style TEXT,
    style_url TEXT,
    public_style_url TEXT,
    original_style TEXT,
    layers JSONB,
    metadata JSONB,
    map_category VARCHAR(50),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    is_public BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_map_configs_name ON map_configs(name);
CREATE INDEX IF NOT EXISTS idx_map_configs_active_public ON map_configs(is_active, is_public);

CREATE TABLE IF NOT EXISTS layer_groups (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    basemap_name VARCHAR(200) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS layer_group_overlays (
    group_id UUID NOT NULL REFERENCES layer_groups(id) ON DELETE CASCADE,
    overlay_name VARCHAR(200) NOT NULL,
    display_order INTEGER NOT NULL DEFAULT 0,
    default_visible BOOLEAN NOT NULL DEFAULT TRUE,
    opacity REAL NOT NULL DEFAULT 1.0,

    PRIMARY KEY(group_id, overlay_name)
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> MapConfigRow {
        MapConfigRow {
            id: Uuid::nil(),
            name: "Global".into(),
            label: Some("Global".into()),
            country: Some("INT".into()),
            flag: None,
            kind: Some("vector".into()),
            style: None,
            style_url: None,
            public_style_url: None,
            original_style: None,
            layers: None,
            metadata: None,
            map_category: None,
            is_active: true,
            is_public: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_picks_first_populated_style_field() {
        let mut r = row();
        r.style = Some("  ".into());
        r.style_url = Some("https://a.example.org/s.json".into());
        r.public_style_url = Some("https://b.example.org/s.json".into());
        assert_eq!(r.normalize().style, "https://a.example.org/s.json");

        let mut r = row();
        r.public_style_url = Some("https://b.example.org/s.json".into());
        assert_eq!(r.normalize().style, "https://b.example.org/s.json");

        let r = row();
        assert_eq!(r.normalize().style, "");
    }

    #[test]
    fn test_normalize_folds_map_category() {
        let mut r = row();
        r.map_category = Some("Overlay".into());
        let rec = r.normalize();
        assert_eq!(rec.metadata.get("category"), Some(&json!("overlay")));
    }

    #[test]
    fn test_normalize_metadata_classification_wins_over_column() {
        let mut r = row();
        r.metadata = Some(json!({"isOverlay": false}));
        r.map_category = Some("overlay".into());
        let rec = r.normalize();
        assert_eq!(rec.metadata.get("isOverlay"), Some(&json!(false)));
        assert!(rec.metadata.get("category").is_none());
    }

    #[test]
    fn test_normalize_non_object_metadata_becomes_empty() {
        let mut r = row();
        r.metadata = Some(json!("corrupted"));
        let rec = r.normalize();
        assert_eq!(rec.metadata, json!({}));
    }

    #[test]
    fn test_normalize_layers_tolerates_bad_json() {
        let mut r = row();
        r.layers = Some(json!([{"id": "a"}, {"id": "b", "private": true}]));
        let rec = r.normalize();
        let layers = rec.layers.unwrap();
        assert_eq!(layers.len(), 2);
        assert!(layers[1].private);

        let mut r = row();
        r.layers = Some(json!("not an array"));
        assert!(r.normalize().layers.is_none());
    }

    #[test]
    fn test_normalize_blank_original_style_dropped() {
        let mut r = row();
        r.original_style = Some("   ".into());
        assert!(r.normalize().original_style.is_none());

        let mut r = row();
        r.original_style = Some("https://a/s.json".into());
        assert_eq!(r.normalize().original_style.as_deref(), Some("https://a/s.json"));
    }

    #[test]
    fn test_normalize_kind() {
        let mut r = row();
        r.kind = Some("wmts".into());
        assert_eq!(r.normalize().kind, StyleKind::Raster);

        let mut r = row();
        r.kind = None;
        assert_eq!(r.normalize().kind, StyleKind::VectorStyle);
    }
}
