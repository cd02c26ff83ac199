//! Common utilities shared across the API handlers.

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use mapstyle_common::ConfigError;

use crate::config::ServiceConfig;

// ============================================================================
// Error Responses
// ============================================================================

/// API error rendered as the standard `{error, message}` JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: Option<String>,
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request".into(),
            message: Some(message.into()),
            retry_after: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "unauthorized".into(),
            message: Some(message.into()),
            retry_after: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "not_found".into(),
            message: Some(message.into()),
            retry_after: None,
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            code: "upstream_error".into(),
            message: Some(message.into()),
            retry_after: None,
        }
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            code: "rate_limit_exceeded".into(),
            message: Some(format!(
                "Rate limit exceeded. Retry after {} seconds.",
                retry_after_secs
            )),
            retry_after: Some(retry_after_secs),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        }
        let retry_after = match &err {
            ConfigError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        Self {
            status,
            code: err.error_code().to_string(),
            message: Some(err.to_string()),
            retry_after,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({ "error": self.code });
        if let Some(message) = &self.message {
            body["message"] = serde_json::Value::String(message.clone());
        }
        if let Some(secs) = self.retry_after {
            body["retryAfter"] = serde_json::Value::from(secs);
        }

        let mut response = (self.status, axum::Json(body)).into_response();
        if let Some(secs) = self.retry_after {
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

// ============================================================================
// Caller Authorization
// ============================================================================

/// Check the `X-App-Token` header against the configured internal
/// tokens. No header means an anonymous caller; a header that matches
/// nothing is a hard 401.
pub fn caller_authorized(headers: &HeaderMap, config: &ServiceConfig) -> Result<bool, ApiError> {
    let Some(value) = headers.get("x-app-token") else {
        return Ok(false);
    };
    let token = value
        .to_str()
        .map_err(|_| ApiError::unauthorized("Malformed X-App-Token header"))?;
    if config.app_tokens.iter().any(|t| t == token) {
        Ok(true)
    } else {
        Err(ApiError::unauthorized("Unrecognized app token"))
    }
}

// ============================================================================
// JSON Rendering
// ============================================================================

/// Serialize a response body, honoring the `pretty` query flag.
pub fn json_response<T: Serialize>(value: &T, pretty: bool) -> Response {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };

    match rendered {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap(),
        Err(e) => ApiError::from(ConfigError::Internal(format!("Serialization failed: {}", e)))
            .into_response(),
    }
}

/// Parse the `pretty=0|1` query parameter.
pub fn parse_pretty(value: Option<&str>) -> Result<bool, ApiError> {
    match value {
        None => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some("0") | Some("false") => Ok(false),
        Some(other) => Err(ApiError::bad_request(format!(
            "Invalid pretty value: {}",
            other
        ))),
    }
}

/// Validate a record name taken from the request path.
pub fn validate_style_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::bad_request("Empty style name"));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(ApiError::bad_request("Invalid style name"));
    }
    Ok(())
}
