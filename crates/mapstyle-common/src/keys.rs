//! Credential stripping and injection for style URLs.

use crate::provider::{detect_provider, Provider};

/// Query parameter names that carry credentials, matched
/// case-insensitively.
const CREDENTIAL_PARAMS: [&str; 5] = ["key", "apikey", "api_key", "x-api-key", "token"];

/// Remove credential query parameters from a URL string.
///
/// Collapses the resulting separator punctuation (no dangling `?` or
/// `&`, no `&&`) and preserves any fragment. Idempotent. Empty input is
/// returned unchanged.
pub fn strip_keys(url: &str) -> String {
    if url.is_empty() {
        return url.to_string();
    }

    let (without_fragment, fragment) = match url.split_once('#') {
        Some((u, f)) => (u, Some(f)),
        None => (url, None),
    };

    let stripped = match without_fragment.split_once('?') {
        None => without_fragment.to_string(),
        Some((base, query)) => {
            let kept: Vec<&str> = query
                .split('&')
                .filter(|pair| !pair.is_empty() && !is_credential_pair(pair))
                .collect();
            if kept.is_empty() {
                base.to_string()
            } else {
                format!("{}?{}", base, kept.join("&"))
            }
        }
    };

    match fragment {
        Some(f) => format!("{}#{}", stripped, f),
        None => stripped,
    }
}

fn is_credential_pair(pair: &str) -> bool {
    let name = pair.split('=').next().unwrap_or(pair);
    CREDENTIAL_PARAMS
        .iter()
        .any(|p| name.eq_ignore_ascii_case(p))
}

/// Operator-held credentials, read once from process configuration.
/// Absence of a credential is not an error: injection fails open.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    maptiler: Option<String>,
    maxar: Option<String>,
}

impl ProviderCredentials {
    pub fn new(maptiler: Option<String>, maxar: Option<String>) -> Self {
        let nonempty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            maptiler: nonempty(maptiler),
            maxar: nonempty(maxar),
        }
    }

    pub fn get(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::MapTiler => self.maptiler.as_deref(),
            Provider::Maxar => self.maxar.as_deref(),
            Provider::KatasterBev => None,
        }
    }
}

/// Append the operator credential for a provider to a URL.
///
/// The URL is stripped first so repeated calls never duplicate the
/// parameter. When the provider is unknown or has no configured
/// credential, the keyless URL is returned unchanged (fail open: missing
/// configuration degrades to "no key" rather than blocking the
/// response).
pub fn inject_key(url: &str, provider: Option<Provider>, creds: &ProviderCredentials) -> String {
    let clean = strip_keys(url);

    let provider = provider.or_else(|| detect_provider(&clean));
    let Some(provider) = provider else {
        return clean;
    };
    let Some(param) = provider.key_param() else {
        return clean;
    };
    let Some(secret) = creds.get(provider) else {
        return clean;
    };

    match clean.find('#') {
        Some(idx) => {
            let (base, fragment) = clean.split_at(idx);
            let sep = if base.contains('?') { '&' } else { '?' };
            format!("{}{}{}={}{}", base, sep, param, secret, fragment)
        }
        None => {
            let sep = if clean.contains('?') { '&' } else { '?' };
            format!("{}{}{}={}", clean, sep, param, secret)
        }
    }
}
