// sitewatch-core: monitoring state & alert-aggregation engine between
// sitewatch-api and the dashboard UI.

pub mod classify;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod model;
pub mod mutate;
pub mod notify;
pub mod session;
pub mod source;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::{classify, days_until, notification_priority};
pub use config::EngineConfig;
pub use engine::{AlertDispatch, Engine, RefreshOutcome, RefreshSummary};
pub use error::CoreError;
pub use fallback::FallbackProvider;
pub use mutate::{NewSite, SiteChanges};
pub use notify::NotificationFeed;
pub use session::{MemorySessionStore, SessionStore};
pub use source::{DataSourceMode, Resource, Sourced};
pub use store::EntityStore;
pub use stream::EntityStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Certificate, CertificateStatus, EntityId, Notification, NotificationKind,
    NotificationPriority, OverallStatus, Site, SiteStatus, UserProfile,
};
