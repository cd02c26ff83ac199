//! HTTP request handlers for the map-config API.
//!
//! This module is organized into submodules:
//! - `mapconfig`: the sanitized record set in current and legacy shapes
//! - `styles`: per-style document resolution and the credential proxy
//! - `metrics`: health checks and Prometheus metrics
//! - `common`: shared utilities (error body, caller auth, JSON helpers)

pub mod common;
pub mod mapconfig;
pub mod metrics;
pub mod styles;

pub use common::{caller_authorized, json_response, parse_pretty, validate_style_name, ApiError};

pub use mapconfig::{mapconfig_handler, MapConfigQuery, MapConfigResponse};

pub use styles::{style_handler, style_proxy_handler};

pub use metrics::{health_handler, metrics_handler, ready_handler};
