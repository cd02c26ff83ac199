//! Request counters exposed at the Prometheus endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide request counters.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    pub mapconfig_requests: AtomicU64,
    pub style_requests: AtomicU64,
    pub proxy_requests: AtomicU64,
    pub rate_limited: AtomicU64,
    pub upstream_errors: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render all counters in Prometheus text exposition format.
    pub fn render_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# HELP mapconfig_requests_total Total map-config requests\n# TYPE mapconfig_requests_total counter\nmapconfig_requests_total {}\n",
            self.mapconfig_requests.load(Ordering::Relaxed)
        ));
        output.push_str(&format!(
            "# HELP style_requests_total Total style document requests\n# TYPE style_requests_total counter\nstyle_requests_total {}\n",
            self.style_requests.load(Ordering::Relaxed)
        ));
        output.push_str(&format!(
            "# HELP proxy_requests_total Total style proxy requests\n# TYPE proxy_requests_total counter\nproxy_requests_total {}\n",
            self.proxy_requests.load(Ordering::Relaxed)
        ));
        output.push_str(&format!(
            "# HELP rate_limited_total Requests rejected by the IP throttle\n# TYPE rate_limited_total counter\nrate_limited_total {}\n",
            self.rate_limited.load(Ordering::Relaxed)
        ));
        output.push_str(&format!(
            "# HELP upstream_errors_total Failed upstream style fetches\n# TYPE upstream_errors_total counter\nupstream_errors_total {}\n",
            self.upstream_errors.load(Ordering::Relaxed)
        ));

        output
    }
}
