// Shared transport configuration for building reqwest::Client instances.
//
// The request timeout here bounds every ordinary API call; the much
// shorter availability probe applies its own deadline on top.

use std::time::Duration;

/// Transport configuration for building the backend HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout for ordinary API calls.
    pub timeout: Duration,
    /// Deadline for the lightweight availability probe. Kept short so a
    /// hung backend degrades to fallback mode promptly.
    pub probe_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("sitewatch/0.1.0")
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
