use thiserror::Error;

/// Top-level error type for the `sitewatch-api` crate.
///
/// Covers every failure mode of the backend API surface: authentication,
/// transport, structured API rejections, and response decoding.
/// `sitewatch-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, account locked, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Bearer token expired or was revoked (HTTP 401 on an authed request).
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Backend API ─────────────────────────────────────────────────
    /// Structured rejection from the backend. The message is extracted
    /// from the conventional `{message}`/`{title}` JSON body when present,
    /// else the raw response text.
    #[error("API error (HTTP {status}): {message}")]
    Api { message: String, status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the credential is expired,
    /// missing, or rejected -- re-authentication is required.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::SessionExpired)
    }

    /// Returns `true` for network-class failures: the backend was
    /// unreachable or did not answer in time. These are the failures the
    /// source selector absorbs by switching to fallback data.
    pub fn is_network(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the backend rejected a create/update
    /// (duplicate, constraint violation, malformed payload).
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { status, .. } if matches!(status, 400 | 409 | 422))
    }

    /// Returns `true` for 5xx responses -- the backend answered but is
    /// broken, which the dashboard treats the same as an outage.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 500)
    }

    /// Returns `true` if this is a "not found" rejection.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
