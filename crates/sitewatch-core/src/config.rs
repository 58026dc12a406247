// ── Runtime engine configuration ──
//
// Describes *where* the backend lives and how patient to be with it.
// The dashboard shell (or sitewatch-config) constructs an `EngineConfig`
// and hands it in; core never reads config files.

use std::time::Duration;

use url::Url;

/// Configuration for a single engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Backend root URL (e.g. `https://monitor.example.com`).
    pub backend_url: Url,
    /// Per-request timeout for ordinary API calls.
    pub timeout: Duration,
    /// Deadline for the availability probe. Short, so a hung backend
    /// degrades to fallback mode promptly instead of freezing the UI.
    pub probe_timeout: Duration,
    /// Recipients for certificate expiry alert batches.
    pub alert_recipients: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3001"
                .parse()
                .expect("default backend URL is valid"),
            timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(2),
            alert_recipients: Vec::new(),
        }
    }
}
