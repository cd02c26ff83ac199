//! Common types and the sanitization pipeline shared across mapstyle services.

pub mod error;
pub mod keys;
pub mod legacy;
pub mod provider;
pub mod record;
pub mod sanitize;

pub use error::{ConfigError, ConfigResult};
pub use keys::{inject_key, strip_keys, ProviderCredentials};
pub use legacy::{legacy_key, to_legacy_format, LegacyMapConfig, LegacyMapEntry};
pub use provider::{detect_provider, Provider};
pub use record::{
    LayerEntry, LayerGroup, LayerGroupOverlay, MapConfigRecord, PublicConfigRecord, StyleKind,
};
pub use sanitize::ConfigSanitizer;
