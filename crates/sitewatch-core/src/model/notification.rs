// ── Notification domain types ──
//
// Notifications are immutable once created except for the read flag.
// A changed underlying condition produces a NEW notification rather than
// mutating an old one, so the feed doubles as an audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::certificate::CertificateStatus;
use super::entity_id::EntityId;
use super::site::SiteStatus;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Rolled-up worst-case severity for the top bar's single-glance badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Good,
    Warning,
    Critical,
}

/// Per-type metadata. Each variant declares exactly the fields valid for
/// that notification type -- no optional-field bags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NotificationKind {
    CertificateExpiry {
        certificate_id: EntityId,
        site_url: String,
        expires_at: Option<DateTime<Utc>>,
        days_remaining: Option<i64>,
        issuer: Option<String>,
        status: CertificateStatus,
    },
    Availability {
        site_id: EntityId,
        url: String,
        status: SiteStatus,
    },
    Maintenance {
        site_id: Option<EntityId>,
    },
    Security {
        site_id: Option<EntityId>,
    },
    Performance {
        site_id: Option<EntityId>,
    },
    General,
}

impl NotificationKind {
    /// The certificate this notification is keyed to, if any.
    pub fn certificate_id(&self) -> Option<&EntityId> {
        match self {
            Self::CertificateExpiry { certificate_id, .. } => Some(certificate_id),
            _ => None,
        }
    }

    pub fn is_certificate_expiry(&self) -> bool {
        matches!(self, Self::CertificateExpiry { .. })
    }
}

/// One entry in the notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: EntityId,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    /// Optional deep-link into the dashboard.
    pub link: Option<String>,
    pub kind: NotificationKind,
}
