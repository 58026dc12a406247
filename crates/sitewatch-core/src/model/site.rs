// ── Site domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

/// Operational status from the most recent availability probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Up,
    Down,
    Maintenance,
    /// Never probed, or the probe result was unusable.
    #[default]
    Unknown,
}

/// A monitored site.
///
/// Owned exclusively by the [`EntityStore`](crate::store::EntityStore);
/// mutated only through coordinator actions or a full-refresh
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: EntityId,
    /// Human-friendly display name.
    pub name: String,
    /// Canonical URL, scheme-normalized at validation time.
    pub url: String,
    /// Whether monitoring is enabled for this site.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    /// When this site was last probed. `None` until the first check.
    pub last_checked: Option<DateTime<Utc>>,
    pub status: SiteStatus,
}
