// ── Core error types ──
//
// User-facing errors from sitewatch-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<sitewatch_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connectivity ─────────────────────────────────────────────────
    /// Backend unreachable. Read paths recover from this internally by
    /// switching to fallback data; it is only surfaced when a mutation
    /// required live confirmation and had to be rolled back.
    #[error("Backend unreachable: {reason}")]
    Network { reason: String },

    /// Credential missing, expired, or rejected. Never masked by
    /// fallback -- the user has to log in again.
    #[error("Authentication required: {message}")]
    Auth { message: String },

    // ── Mutation errors ──────────────────────────────────────────────
    /// Input rejected before any optimistic apply or network call.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The backend rejected a create/update; the optimistic change was
    /// rolled back. Carries the server's reason verbatim.
    #[error("Rejected by backend: {message}")]
    Conflict { message: String },

    /// Another mutation for the same entity is still in flight.
    #[error("Operation already in progress for {id}")]
    Busy { id: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn site_not_found(id: &crate::model::EntityId) -> Self {
        Self::NotFound {
            entity: "site".into(),
            id: id.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sitewatch_api::Error> for CoreError {
    fn from(err: sitewatch_api::Error) -> Self {
        if err.is_network() {
            return CoreError::Network {
                reason: err.to_string(),
            };
        }

        match err {
            sitewatch_api::Error::Authentication { message } => CoreError::Auth { message },
            sitewatch_api::Error::SessionExpired => CoreError::Auth {
                message: "session expired -- please log in again".into(),
            },
            sitewatch_api::Error::Api { message, status } if matches!(status, 400 | 409 | 422) => {
                CoreError::Conflict { message }
            }
            sitewatch_api::Error::Api { message, status: 404 } => CoreError::NotFound {
                entity: "resource".into(),
                id: message,
            },
            sitewatch_api::Error::Api { message, status } => CoreError::Api {
                message,
                status: Some(status),
            },
            sitewatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid backend URL: {e}"),
            },
            sitewatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("deserialization error: {message}"))
            }
            sitewatch_api::Error::Transport(e) => CoreError::Api {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            sitewatch_api::Error::Timeout { timeout_secs } => CoreError::Network {
                reason: format!("request timed out after {timeout_secs}s"),
            },
        }
    }
}
