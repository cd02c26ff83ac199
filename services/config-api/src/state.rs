//! Application state and shared resources.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use mapstyle_common::{ConfigSanitizer, ProviderCredentials};
use storage::ConfigCatalog;

use crate::config::ServiceConfig;
use crate::metrics::MetricsCollector;
use crate::ratelimit::FixedWindowLimiter;

/// Shared application state.
pub struct AppState {
    pub config: ServiceConfig,
    pub catalog: ConfigCatalog,
    pub sanitizer: ConfigSanitizer,
    pub credentials: ProviderCredentials,
    pub limiter: FixedWindowLimiter,
    pub http: reqwest::Client,
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    pub async fn new() -> Result<Self> {
        let config = ServiceConfig::from_env();

        let catalog = ConfigCatalog::connect(&config.database_url).await?;

        let credentials = ProviderCredentials::new(
            config.maptiler_api_key.clone(),
            config.maxar_api_key.clone(),
        );
        let sanitizer = ConfigSanitizer::new(credentials.clone(), config.public_base_url.clone());
        let limiter = FixedWindowLimiter::new(config.rate_limit_per_minute);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            config,
            catalog,
            sanitizer,
            credentials,
            limiter,
            http,
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    /// Path of the locally hosted style document for a record name, if
    /// one exists. Names carrying path separators never resolve.
    pub fn local_style_path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return None;
        }
        let path = self.config.styles_dir.join(format!("{}.json", name));
        path.is_file().then_some(path)
    }

    pub fn has_local_style(&self, name: &str) -> bool {
        self.local_style_path(name).is_some()
    }
}
