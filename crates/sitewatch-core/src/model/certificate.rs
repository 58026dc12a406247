// ── Certificate domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

/// Certificate urgency tier.
///
/// Always derived from `days_remaining` by [`classify`](crate::classify::classify);
/// the store re-runs the classifier on every upsert, so a stored
/// certificate never carries a status inconsistent with its expiry data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Valid,
    Expiring,
    Critical,
    Expired,
    /// Reported by the backend when the chain fails validation.
    /// Accepted on the wire, normalized through the classifier locally.
    Invalid,
    /// No expiry data could be obtained.
    Error,
}

impl CertificateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Expiring => "expiring",
            Self::Critical => "critical",
            Self::Expired => "expired",
            Self::Invalid => "invalid",
            Self::Error => "error",
        }
    }
}

/// Tier counts for the dashboard's summary strip. Derived exclusively
/// through the classifier, so it can never disagree with badge colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSummary {
    pub total: usize,
    pub valid: usize,
    pub expiring: usize,
    pub critical: usize,
    pub expired: usize,
    pub invalid: usize,
    pub errors: usize,
}

/// The TLS certificate tracked for a site (at most one per site).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: EntityId,
    pub site_id: EntityId,
    pub domain: String,
    /// `None` means expiry is unknown (probe failed or not yet run).
    pub expires_at: Option<DateTime<Utc>>,
    pub issuer: Option<String>,
    /// Whole days until expiry (ceiling), negative once expired.
    /// Derived -- see [`days_until`](crate::classify::days_until).
    pub days_remaining: Option<i64>,
    pub status: CertificateStatus,
    /// Whether an expiry alert email has been dispatched for the current
    /// condition.
    pub alert_sent: bool,
    pub last_alert_at: Option<DateTime<Utc>>,
    pub last_checked_at: DateTime<Utc>,
}
