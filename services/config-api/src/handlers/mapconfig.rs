//! The map-config endpoint: the full sanitized record set in either the
//! current or the legacy response shape.

use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    response::Response,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{instrument, warn};

use mapstyle_common::{to_legacy_format, LayerGroup, PublicConfigRecord};

use crate::handlers::common::{caller_authorized, json_response, parse_pretty, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MapConfigQuery {
    pub format: Option<String>,
    pub pretty: Option<String>,
}

/// The current response shape.
#[derive(Debug, Serialize)]
pub struct MapConfigResponse {
    pub version: String,
    pub timestamp: String,
    pub configs: Vec<PublicConfigRecord>,
    #[serde(rename = "layerGroups")]
    pub layer_groups: Vec<LayerGroup>,
}

// ============================================================================
// Handler
// ============================================================================

/// GET /api/public/mapconfig?format=json|legacy&pretty=0|1
#[instrument(skip(state, headers))]
pub async fn mapconfig_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<MapConfigQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    state.metrics.mapconfig_requests.fetch_add(1, Ordering::Relaxed);

    let authorized = caller_authorized(&headers, &state.config)?;
    let pretty = parse_pretty(query.pretty.as_deref())?;

    let records = state.catalog.list_public_configs().await?;

    // Overlay relationships failing to load must not fail the whole
    // response: degrade to an empty set.
    let layer_groups = match state.catalog.list_layer_groups().await {
        Ok(groups) => groups,
        Err(e) => {
            warn!(error = %e, "Layer group query failed, serving empty set");
            Vec::new()
        }
    };

    let configs: Vec<PublicConfigRecord> = records
        .iter()
        .map(|r| {
            state
                .sanitizer
                .sanitize(r, authorized, state.has_local_style(&r.name))
        })
        .collect();

    match query.format.as_deref().unwrap_or("json") {
        "legacy" => Ok(json_response(&to_legacy_format(&configs), pretty)),
        "json" => Ok(json_response(
            &MapConfigResponse {
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                configs,
                layer_groups,
            },
            pretty,
        )),
        other => Err(ApiError::bad_request(format!("Unknown format: {}", other))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mapstyle_common::{ConfigSanitizer, ProviderCredentials};
    use test_utils::sample_records;

    fn sanitized_set() -> Vec<PublicConfigRecord> {
        let sanitizer = ConfigSanitizer::new(
            ProviderCredentials::new(Some("MTKEY".into()), None),
            "https://maps.example.org",
        );
        sample_records()
            .iter()
            .map(|r| sanitizer.sanitize(r, false, r.name == "Kataster BEV"))
            .collect()
    }

    #[test]
    fn test_response_serialization_shape() {
        let response = MapConfigResponse {
            version: "0.1.0".into(),
            timestamp: "2024-06-01T12:00:00Z".into(),
            configs: sanitized_set(),
            layer_groups: Vec::new(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("layerGroups").is_some());
        assert!(json.get("configs").unwrap().is_array());

        let configs = json["configs"].as_array().unwrap();
        assert_eq!(configs.len(), 4);
        for config in configs {
            let style = config["style"].as_str().unwrap();
            assert!(!style.contains(' '), "unescaped space in {}", style);
            assert!(!style.contains("STALE123"), "leaked key in {}", style);
            assert!(!style.contains("key=OLD"), "leaked key in {}", style);
        }
    }

    #[test]
    fn test_no_credential_fields_in_serialized_output() {
        let json = serde_json::to_string(&sanitized_set()).unwrap();
        for forbidden in ["api_keys", "tokens", "internal_urls", "credentials"] {
            assert!(!json.contains(forbidden), "leaked field: {}", forbidden);
        }
    }

    #[test]
    fn test_legacy_format_from_sanitized_set() {
        let legacy = to_legacy_format(&sanitized_set());
        assert!(legacy.overlay_maps.contains_key("KatasterBEV"));
        assert!(legacy.background_maps.contains_key("Global"));
        assert!(legacy.background_maps.contains_key("Global2"));
    }
}
