// ── Unified domain model ──
//
// Every type in this module is the canonical representation of a
// monitored entity. Wire DTOs from sitewatch-api are converted into these
// once, at the store boundary; consumers (dashboard screens) only ever
// see this shape.

pub mod certificate;
pub mod entity_id;
pub mod notification;
pub mod site;
pub mod user;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use sitewatch_core::model::*` gives you everything.

pub use entity_id::EntityId;

pub use site::{Site, SiteStatus};

pub use certificate::{Certificate, CertificateStatus, CertificateSummary};

pub use notification::{
    Notification, NotificationKind, NotificationPriority, OverallStatus,
};

pub use user::UserProfile;
