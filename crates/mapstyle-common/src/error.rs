//! Error types for the mapstyle services.

use thiserror::Error;

/// Result type alias using ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for map-config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Config not found: {0}")]
    ConfigNotFound(String),

    #[error("Style not found: {0}")]
    StyleNotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // === Data Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ConfigError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ConfigError::MissingParameter(_) | ConfigError::InvalidParameter { .. } => 400,

            ConfigError::Unauthorized(_) => 401,
            ConfigError::Forbidden(_) => 403,

            ConfigError::ConfigNotFound(_) | ConfigError::StyleNotFound(_) => 404,

            ConfigError::RateLimited { .. } => 429,

            ConfigError::UpstreamFetch(_) => 502,

            _ => 500,
        }
    }

    /// Get a stable machine-readable code for the JSON error body.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::MissingParameter(_) => "missing_parameter",
            ConfigError::InvalidParameter { .. } => "invalid_parameter",
            ConfigError::ConfigNotFound(_) => "config_not_found",
            ConfigError::StyleNotFound(_) => "style_not_found",
            ConfigError::Unauthorized(_) => "unauthorized",
            ConfigError::Forbidden(_) => "forbidden",
            ConfigError::RateLimited { .. } => "rate_limit_exceeded",
            ConfigError::Database(_) => "database_error",
            ConfigError::UpstreamFetch(_) => "upstream_error",
            ConfigError::Internal(_) => "internal_error",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Internal(format!("JSON error: {}", err))
    }
}
