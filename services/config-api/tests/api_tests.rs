//! Tests for the config-api HTTP components.
//!
//! These focus on response shapes, the error body contract, and the
//! sanitization pipeline as the handlers drive it, without requiring a
//! database connection.

use axum::body::to_bytes;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use serde_json::Value;

use config_api::handlers::ApiError;
use config_api::ratelimit::FixedWindowLimiter;
use mapstyle_common::{
    strip_keys, to_legacy_format, ConfigError, ConfigSanitizer, ProviderCredentials,
    PublicConfigRecord,
};
use test_utils::{cadastral_overlay, maptiler_basemap, sample_records};

fn sanitizer() -> ConfigSanitizer {
    ConfigSanitizer::new(
        ProviderCredentials::new(Some("MTKEY".into()), None),
        "https://maps.example.org",
    )
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Error body contract
// ============================================================================

#[tokio::test]
async fn test_error_body_shape() {
    let response = ApiError::bad_request("Unknown format: xml").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["message"], "Unknown format: xml");
}

#[tokio::test]
async fn test_not_found_maps_from_config_error() {
    let response = ApiError::from(ConfigError::StyleNotFound("Nope".into())).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"], "style_not_found");
}

#[tokio::test]
async fn test_rate_limit_body_carries_retry_after() {
    let response = ApiError::rate_limited(17).into_response();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "17");

    let body = body_json(response).await;
    assert_eq!(body["error"], "rate_limit_exceeded");
    assert_eq!(body["retryAfter"], 17);
}

#[tokio::test]
async fn test_database_failure_is_500_with_json_body() {
    let response = ApiError::from(ConfigError::Database("connection refused".into()))
        .into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "database_error");
}

// ============================================================================
// Sanitization pipeline as the handlers drive it
// ============================================================================

fn sanitized(authorized: bool) -> Vec<PublicConfigRecord> {
    let s = sanitizer();
    sample_records()
        .iter()
        .map(|r| s.sanitize(r, authorized, r.name == "Kataster BEV"))
        .collect()
}

#[test]
fn test_anonymous_set_carries_no_credentials() {
    let json = serde_json::to_string(&sanitized(false)).unwrap();
    assert!(!json.contains("STALE123"));
    assert!(!json.contains("key=OLD"));
    assert!(!json.contains("MTKEY"));
}

#[test]
fn test_authorized_set_gets_fresh_maptiler_key() {
    let configs = sanitized(true);
    let global = configs.iter().find(|c| c.name == "Global").unwrap();
    assert_eq!(
        global.style,
        "https://api.maptiler.com/maps/streets-v2/style.json?key=MTKEY"
    );
    // the stale embedded key is gone even for authorized callers
    assert!(!global.style.contains("STALE123"));
}

#[test]
fn test_spec_example_strip_then_detect() {
    let url = "https://api.maptiler.com/maps/streets-v2/style.json?key=ABC123";
    let stripped = strip_keys(url);
    assert_eq!(
        stripped,
        "https://api.maptiler.com/maps/streets-v2/style.json"
    );
    assert_eq!(
        mapstyle_common::detect_provider(&stripped),
        Some(mapstyle_common::Provider::MapTiler)
    );
}

#[test]
fn test_cadastral_record_resolves_to_local_document() {
    let out = sanitizer().sanitize(&cadastral_overlay(), false, true);
    assert_eq!(
        out.style,
        "https://maps.example.org/api/styles/Kataster%20BEV.json"
    );
}

#[test]
fn test_legacy_buckets_match_spec_examples() {
    let legacy = to_legacy_format(&sanitized(false));

    // {name: "Kataster BEV", metadata: {isOverlay: true}} lands in
    // overlayMaps["KatasterBEV"]
    assert!(legacy.overlay_maps.contains_key("KatasterBEV"));

    // "Global 2" keys as exactly "Global2" via the hardcoded alias
    assert!(legacy.background_maps.contains_key("Global2"));
    assert!(legacy.background_maps.contains_key("Global"));

    let serialized = serde_json::to_value(&legacy).unwrap();
    assert!(serialized.get("backgroundMaps").is_some());
    assert!(serialized.get("overlayMaps").is_some());
}

#[test]
fn test_public_record_serializes_type_field() {
    let out = sanitizer().sanitize(&maptiler_basemap(), false, false);
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["type"], "vector_style");
    assert!(json.get("kind").is_none());
}

// ============================================================================
// Rate limiter behavior
// ============================================================================

#[test]
fn test_limiter_default_window_allows_burst_of_100() {
    let limiter = FixedWindowLimiter::new(100);
    let ip = std::net::IpAddr::from([10, 0, 0, 1]);
    for _ in 0..100 {
        assert!(limiter.check(ip).is_ok());
    }
    let err = limiter.check(ip).unwrap_err();
    assert!(err.retry_after_secs >= 1);
}
