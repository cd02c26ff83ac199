//! Per-style document resolution and the credential-injecting proxy.

use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, instrument};

use mapstyle_common::{detect_provider, inject_key, strip_keys, ConfigError, Provider};

use crate::handlers::common::{caller_authorized, json_response, validate_style_name, ApiError};
use crate::state::AppState;

// ============================================================================
// Style Documents
// ============================================================================

/// GET /api/styles/:file - Resolve one style document by record name.
///
/// Resolution order: the locally hosted document wins; otherwise the
/// caller is redirected to the record's sanitized URL.
#[instrument(skip(state, headers))]
pub async fn style_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    state.metrics.style_requests.fetch_add(1, Ordering::Relaxed);

    let Some(name) = file.strip_suffix(".json") else {
        return Err(ApiError::bad_request("Style file must end in .json"));
    };
    validate_style_name(name)?;

    if let Some(path) = state.local_style_path(name) {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Internal(format!("Failed to read style: {}", e)))?;
        let document: Value = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Internal(format!("Corrupt local style: {}", e)))?;
        return Ok(json_response(&document, false));
    }

    let authorized = caller_authorized(&headers, &state.config)?;

    let record = state
        .catalog
        .find_by_name(name)
        .await?
        .ok_or_else(|| ApiError::from(ConfigError::StyleNotFound(name.to_string())))?;

    let sanitized = state.sanitizer.sanitize(&record, authorized, false);

    // A synthesized default path points right back here; without a
    // local document there is nothing to serve.
    if sanitized.style == state.sanitizer.default_style_url(name) {
        return Err(ConfigError::StyleNotFound(name.to_string()).into());
    }

    info!(name = %name, target = %sanitized.style, "Redirecting style request");
    Ok(Redirect::temporary(&sanitized.style).into_response())
}

// ============================================================================
// Style Proxy
// ============================================================================

/// GET /api/proxy/style/:name - Fetch a commercial provider's style
/// document with the operator credential injected server-side, so the
/// credential never reaches the client.
#[instrument(skip(state))]
pub async fn style_proxy_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    state.metrics.proxy_requests.fetch_add(1, Ordering::Relaxed);
    validate_style_name(&name)?;

    let record = state
        .catalog
        .find_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::from(ConfigError::ConfigNotFound(name.clone())))?;

    let source = strip_keys(record.upstream_source().trim());

    let provider = record
        .metadata
        .get("provider")
        .and_then(Value::as_str)
        .and_then(Provider::from_hint)
        .or_else(|| detect_provider(&source));

    let Some(provider) = provider.filter(Provider::is_commercial) else {
        return Err(ApiError::bad_request(
            "Style is not served through the proxy",
        ));
    };

    if !source.contains("://") {
        // An in-place-sanitized row with no upstream backup: nothing to
        // forward to.
        return Err(ConfigError::StyleNotFound(name.clone()).into());
    }

    let url = inject_key(&source, Some(provider), &state.credentials);

    let response = state.http.get(&url).send().await.map_err(|e| {
        state.metrics.upstream_errors.fetch_add(1, Ordering::Relaxed);
        ApiError::bad_gateway(format!("Upstream fetch failed: {}", e))
    })?;

    if !response.status().is_success() {
        state.metrics.upstream_errors.fetch_add(1, Ordering::Relaxed);
        return Err(ApiError::bad_gateway(format!(
            "Upstream returned {}",
            response.status()
        )));
    }

    let document: Value = response
        .json()
        .await
        .map_err(|e| ApiError::bad_gateway(format!("Upstream returned invalid JSON: {}", e)))?;

    Ok(json_response(&scrub_document(document), false))
}

/// Strip credential parameters from every URL inside a fetched style
/// document before it leaves the proxy.
fn scrub_document(value: Value) -> Value {
    match value {
        Value::String(s) if s.contains("://") => Value::String(strip_keys(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(scrub_document).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, scrub_document(v)))
                .collect(),
        ),
        other => other,
    }
}

// ============================================================================
// Tests
// ============================================================================
