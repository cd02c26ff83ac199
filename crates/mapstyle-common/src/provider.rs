//! Provider classification for style URLs.

use serde::{Deserialize, Serialize};

/// Known tile/style providers, matched by hostname pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Vector-basemap vendor (MapTiler).
    MapTiler,
    /// Commercial imagery vendor (Maxar).
    Maxar,
    /// National cadastral service (Austrian BEV).
    KatasterBev,
}

impl Provider {
    /// The query parameter each provider expects its credential in.
    /// This is a fixed mapping, not inferred. The cadastral service
    /// never receives a key through this path.
    pub fn key_param(&self) -> Option<&'static str> {
        match self {
            Provider::MapTiler => Some("key"),
            Provider::Maxar => Some("apikey"),
            Provider::KatasterBev => None,
        }
    }

    /// Commercial providers are the ones whose credentials must never
    /// reach an unauthenticated client.
    pub fn is_commercial(&self) -> bool {
        matches!(self, Provider::MapTiler | Provider::Maxar)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::MapTiler => "maptiler",
            Provider::Maxar => "maxar",
            Provider::KatasterBev => "kataster_bev",
        }
    }

    /// Resolve an explicit `metadata.provider` hint. Hints are free
    /// text written by several generations of admin tooling, so this is
    /// deliberately loose.
    pub fn from_hint(hint: &str) -> Option<Provider> {
        let h = hint.trim().to_ascii_lowercase();
        if h.is_empty() {
            return None;
        }
        if h.contains("maptiler") {
            Some(Provider::MapTiler)
        } else if h.contains("maxar") {
            Some(Provider::Maxar)
        } else if h.contains("kataster") || h.contains("bev") {
            Some(Provider::KatasterBev)
        } else {
            None
        }
    }
}

/// Classify a style URL by hostname pattern.
///
/// Returns `None` for empty input, relative paths, and unrecognized
/// hosts. Never panics on malformed input.
pub fn detect_provider(url: &str) -> Option<Provider> {
    let host = extract_host(url)?;

    if host.contains("maptiler.com") {
        Some(Provider::MapTiler)
    } else if host.contains("maxar.com") || host.contains("securewatch") {
        Some(Provider::Maxar)
    } else if host.contains("bev.gv.at") || host.contains("kataster.bev") {
        Some(Provider::KatasterBev)
    } else {
        None
    }
}

/// Extract the lowercased host portion of a URL, or `None` when the
/// input has no scheme://host shape.
fn extract_host(url: &str) -> Option<String> {
    let rest = url.split_once("://")?.1;
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .trim();
    if host.is_empty() {
        return None;
    }
    // Drop userinfo and port
    let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    Some(host.to_ascii_lowercase())
}
