//! Record sanitization: the routine that turns raw datastore records
//! into the shape served to clients.
//!
//! The sanitizer is a pure function of the record, a caller-authorization
//! flag, and the provider credential table it is given at construction.
//! It never performs I/O and never fails: malformed input degrades to a
//! synthesized default path.

use serde_json::Value;

use crate::keys::{inject_key, strip_keys, ProviderCredentials};
use crate::provider::{detect_provider, Provider};
use crate::record::{LayerEntry, MapConfigRecord, PublicConfigRecord};

/// Metadata keys allowed through to clients. Everything else is dropped,
/// which is what prevents credential or internal-URL leakage through the
/// metadata side-channel.
pub const METADATA_ALLOW_LIST: [&str; 10] = [
    "attribution",
    "description",
    "version",
    "isOverlay",
    "overlayType",
    "category",
    "provider",
    "isOfficial",
    "optimizedFor",
    "coloring",
];

/// Sanitizes raw map-config records for serving.
#[derive(Debug, Clone)]
pub struct ConfigSanitizer {
    creds: ProviderCredentials,
    /// Serving domain used to render same-origin paths absolute.
    base_url: String,
}

impl ConfigSanitizer {
    pub fn new(creds: ProviderCredentials, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { creds, base_url }
    }

    /// Sanitize one record.
    ///
    /// `has_local_style` tells the sanitizer whether a locally hosted
    /// style document exists for this record's name; the caller computes
    /// it so this function stays free of I/O.
    ///
    /// Every same-origin output is rendered absolute against the serving
    /// domain, which makes sanitization a fixed point: feeding any output
    /// back through yields the same URL.
    pub fn sanitize(
        &self,
        record: &MapConfigRecord,
        caller_authorized: bool,
        has_local_style: bool,
    ) -> PublicConfigRecord {
        let canonical = strip_keys(record.upstream_source().trim());

        let style = if canonical.starts_with("/api/proxy/") {
            // In-place-sanitized legacy row with no usable backup URL:
            // already proxied, nothing left to resolve for either caller
            // class.
            self.absolutize(&canonical)
        } else {
            let provider =
                provider_hint(&record.metadata).or_else(|| detect_provider(&canonical));

            match provider {
                Some(p) if p.is_commercial() => {
                    if caller_authorized {
                        inject_key(&canonical, Some(p), &self.creds)
                    } else {
                        // Default path for anonymous callers: the proxy
                        // guarantees no credential reaches them.
                        self.absolutize(&format!("/api/proxy/style/{}", record.name))
                    }
                }
                Some(Provider::KatasterBev) => {
                    // Cadastral tiles are served from locally cached
                    // documents when available; never keyed through here.
                    if has_local_style {
                        self.absolutize(&format!("/api/styles/{}.json", record.name))
                    } else {
                        canonical
                    }
                }
                _ => {
                    if canonical.is_empty() {
                        self.absolutize(&format!("/api/styles/{}.json", record.name))
                    } else if canonical.starts_with('/') {
                        self.absolutize(&canonical)
                    } else {
                        canonical
                    }
                }
            }
        };

        // The dataset has historically contained unescaped spaces in
        // filenames; this pass applies to every branch above.
        let style = escape_spaces(&style);

        PublicConfigRecord {
            id: record.id,
            name: record.name.clone(),
            label: record.label.clone(),
            country: record.country.clone(),
            flag: record.flag.clone(),
            kind: record.kind,
            style,
            layers: record.layers.as_ref().map(|l| public_layers(l)),
            metadata: project_metadata(&record.metadata),
        }
    }

    /// The synthesized default path for a record with no resolvable
    /// style. Exposed so handlers can recognize self-referential
    /// resolutions.
    pub fn default_style_url(&self, name: &str) -> String {
        escape_spaces(&self.absolutize(&format!("/api/styles/{}.json", name)))
    }

    fn absolutize(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Resolve an explicit `metadata.provider` override.
fn provider_hint(metadata: &Value) -> Option<Provider> {
    metadata
        .get("provider")
        .and_then(Value::as_str)
        .and_then(Provider::from_hint)
}

/// Drop layer entries flagged private.
fn public_layers(layers: &[LayerEntry]) -> Vec<LayerEntry> {
    layers.iter().filter(|l| !l.private).cloned().collect()
}

/// Project metadata onto the allow-list, preserving value contents.
/// Non-object metadata becomes an empty object.
fn project_metadata(metadata: &Value) -> Value {
    let mut out = serde_json::Map::new();
    if let Value::Object(map) = metadata {
        for key in METADATA_ALLOW_LIST {
            if let Some(v) = map.get(key) {
                out.insert(key.to_string(), v.clone());
            }
        }
    }
    Value::Object(out)
}

fn escape_spaces(url: &str) -> String {
    url.replace(' ', "%20")
}
