// ── Notification feed ──
//
// Converts classifier output and raw events into an append-only,
// de-duplicated notification stream with read/unread state and the
// good/warning/critical rollup for the top bar.
//
// Dedup invariant: a derived certificate notification is keyed by
// (certificate id, status). Reconcile tracks the last-seen status per
// certificate -- including Valid, which emits nothing -- and only emits
// when the status differs, so polling with unchanged data never spams
// duplicates.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::watch;
use tracing::debug;

use crate::classify::notification_priority;
use crate::model::{
    Certificate, CertificateStatus, EntityId, Notification, NotificationKind,
    NotificationPriority, OverallStatus, Site, SiteStatus,
};
use crate::stream::EntityStream;

struct FeedState {
    /// Newest first.
    entries: Vec<Arc<Notification>>,
    /// Last-seen tier per certificate (the dedup key's status half).
    last_certificate_status: HashMap<EntityId, CertificateStatus>,
    /// Last-seen operational status per site, for availability dedup.
    last_site_status: HashMap<EntityId, SiteStatus>,
}

/// The process-wide notification feed.
///
/// Writers: `reconcile` and the explicit mark/remove/add operations.
/// Every mutation runs under one write lock and republishes the snapshot,
/// so readers never observe a half-applied pass.
pub struct NotificationFeed {
    state: RwLock<FeedState>,
    snapshot: watch::Sender<Arc<Vec<Arc<Notification>>>>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            state: RwLock::new(FeedState {
                entries: Vec::new(),
                last_certificate_status: HashMap::new(),
                last_site_status: HashMap::new(),
            }),
            snapshot,
        }
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Regenerate derived notifications from the current inventory.
    /// Returns only the notifications emitted by THIS pass; a repeated
    /// call with unchanged input returns an empty vec.
    pub fn reconcile(
        &self,
        sites: &[Arc<Site>],
        certificates: &[Arc<Certificate>],
    ) -> Vec<Arc<Notification>> {
        let mut state = self.state.write().expect("feed lock poisoned");
        let mut emitted = Vec::new();

        let site_urls: HashMap<&EntityId, &str> =
            sites.iter().map(|s| (&s.id, s.url.as_str())).collect();

        // Certificates: emit on tier transitions only.
        for cert in certificates {
            let previous = state.last_certificate_status.get(&cert.id).copied();
            if previous == Some(cert.status) {
                continue;
            }
            state
                .last_certificate_status
                .insert(cert.id.clone(), cert.status);

            if let Some(priority) = notification_priority(cert.status) {
                let site_url = site_urls
                    .get(&cert.site_id)
                    .map_or_else(|| cert.domain.clone(), ToString::to_string);
                let n = Arc::new(certificate_notification(cert, site_url, priority));
                state.entries.insert(0, Arc::clone(&n));
                emitted.push(n);
            }
        }

        // Sites: a transition to Down raises an availability alert.
        for site in sites {
            let previous = state.last_site_status.get(&site.id).copied();
            state.last_site_status.insert(site.id.clone(), site.status);

            if site.status == SiteStatus::Down && previous != Some(SiteStatus::Down) {
                let n = Arc::new(availability_notification(site));
                state.entries.insert(0, Arc::clone(&n));
                emitted.push(n);
            }
        }

        // Forget dedup state for certificates that left the inventory,
        // so a re-added certificate alerts again.
        let live: HashSet<&EntityId> = certificates.iter().map(|c| &c.id).collect();
        state
            .last_certificate_status
            .retain(|id, _| live.contains(id));

        if !emitted.is_empty() {
            debug!(count = emitted.len(), "reconcile emitted notifications");
            self.publish(&state);
        }
        emitted
    }

    /// Append a non-derived notification (maintenance, security, manual).
    pub fn add(
        &self,
        kind: NotificationKind,
        priority: NotificationPriority,
        title: impl Into<String>,
        message: impl Into<String>,
        link: Option<String>,
    ) -> Arc<Notification> {
        let mut state = self.state.write().expect("feed lock poisoned");

        let n = Arc::new(Notification {
            id: EntityId::local(),
            priority,
            title: title.into(),
            message: message.into(),
            created_at: Utc::now(),
            read: false,
            link,
            kind,
        });
        state.entries.insert(0, Arc::clone(&n));
        self.publish(&state);
        n
    }

    // ── Read state ───────────────────────────────────────────────────

    /// Mark one notification read. Returns `false` if it doesn't exist.
    pub fn mark_read(&self, id: &EntityId) -> bool {
        let mut state = self.state.write().expect("feed lock poisoned");

        let Some(entry) = state.entries.iter_mut().find(|n| &n.id == id) else {
            return false;
        };
        if !entry.read {
            let mut updated = (**entry).clone();
            updated.read = true;
            *entry = Arc::new(updated);
        }
        self.publish(&state);
        true
    }

    pub fn mark_all_read(&self) {
        let mut state = self.state.write().expect("feed lock poisoned");
        for entry in &mut state.entries {
            if !entry.read {
                let mut updated = (**entry).clone();
                updated.read = true;
                *entry = Arc::new(updated);
            }
        }
        self.publish(&state);
    }

    // ── Removal ──────────────────────────────────────────────────────

    /// Dismiss one notification. Returns `false` if it doesn't exist.
    pub fn remove(&self, id: &EntityId) -> bool {
        let mut state = self.state.write().expect("feed lock poisoned");
        let before = state.entries.len();
        state.entries.retain(|n| &n.id != id);
        let removed = state.entries.len() != before;
        if removed {
            self.publish(&state);
        }
        removed
    }

    /// Drop every notification keyed to a certificate, along with its
    /// dedup state. Used when a site (and thus its cert) is deleted.
    pub fn remove_for_certificate(&self, certificate_id: &EntityId) {
        let mut state = self.state.write().expect("feed lock poisoned");
        state
            .entries
            .retain(|n| n.kind.certificate_id() != Some(certificate_id));
        state.last_certificate_status.remove(certificate_id);
        self.publish(&state);
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The feed, newest first.
    pub fn feed(&self) -> Arc<Vec<Arc<Notification>>> {
        self.snapshot.borrow().clone()
    }

    pub fn unread_count(&self) -> usize {
        let state = self.state.read().expect("feed lock poisoned");
        state.entries.iter().filter(|n| !n.read).count()
    }

    /// Worst-case severity across UNREAD notifications.
    ///
    /// Precedence is exact: an unread critical certificate-expiry beats
    /// everything; otherwise any unread high-or-worse yields Warning;
    /// otherwise Good. Read notifications never influence the badge.
    pub fn overall_status(&self) -> OverallStatus {
        let state = self.state.read().expect("feed lock poisoned");

        let mut warning = false;
        for n in &state.entries {
            if n.read {
                continue;
            }
            if n.priority == NotificationPriority::Critical && n.kind.is_certificate_expiry() {
                return OverallStatus::Critical;
            }
            if n.priority >= NotificationPriority::High {
                warning = true;
            }
        }

        if warning {
            OverallStatus::Warning
        } else {
            OverallStatus::Good
        }
    }

    /// Subscribe to feed changes.
    pub fn subscribe(&self) -> EntityStream<Notification> {
        EntityStream::new(self.snapshot.subscribe())
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn publish(&self, state: &FeedState) {
        let snap = Arc::new(state.entries.clone());
        self.snapshot.send_modify(|s| *s = snap);
    }
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new()
    }
}

// ── Notification builders ────────────────────────────────────────────

fn certificate_notification(
    cert: &Certificate,
    site_url: String,
    priority: NotificationPriority,
) -> Notification {
    let (title, message) = match (cert.status, cert.days_remaining) {
        (CertificateStatus::Expired, Some(d)) => (
            "Certificate expired",
            format!("Certificate for {} expired {} days ago", cert.domain, -d),
        ),
        (CertificateStatus::Critical, Some(0)) => (
            "Certificate expires today",
            format!("Certificate for {} expires today", cert.domain),
        ),
        (CertificateStatus::Critical, Some(d)) => (
            "Certificate expires soon",
            format!("Certificate for {} expires in {d} days", cert.domain),
        ),
        (CertificateStatus::Expiring, Some(d)) => (
            "Certificate expiring",
            format!("Certificate for {} expires in {d} days", cert.domain),
        ),
        (CertificateStatus::Invalid, _) => (
            "Certificate invalid",
            format!("Certificate for {} failed validation", cert.domain),
        ),
        _ => (
            "Certificate check failed",
            format!("No expiry data for {}", cert.domain),
        ),
    };

    Notification {
        id: EntityId::local(),
        priority,
        title: title.into(),
        message,
        created_at: Utc::now(),
        read: false,
        link: Some(format!("/certificates/{}", cert.id)),
        kind: NotificationKind::CertificateExpiry {
            certificate_id: cert.id.clone(),
            site_url,
            expires_at: cert.expires_at,
            days_remaining: cert.days_remaining,
            issuer: cert.issuer.clone(),
            status: cert.status,
        },
    }
}

fn availability_notification(site: &Site) -> Notification {
    Notification {
        id: EntityId::local(),
        priority: NotificationPriority::High,
        title: "Site down".into(),
        message: format!("{} is not responding", site.name),
        created_at: Utc::now(),
        read: false,
        link: Some(format!("/sites/{}", site.id)),
        kind: NotificationKind::Availability {
            site_id: site.id.clone(),
            url: site.url.clone(),
            status: site.status,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;

    fn site(id: &str, status: SiteStatus) -> Arc<Site> {
        Arc::new(Site {
            id: id.into(),
            name: format!("site-{id}"),
            url: format!("https://{id}.example.com"),
            active: true,
            created_at: Utc::now(),
            last_checked: None,
            status,
        })
    }

    fn cert(id: &str, site_id: &str, days: i64) -> Arc<Certificate> {
        let now = Utc::now();
        Arc::new(Certificate {
            id: id.into(),
            site_id: site_id.into(),
            domain: format!("{site_id}.example.com"),
            expires_at: Some(now + Duration::days(days)),
            issuer: Some("Test CA".into()),
            days_remaining: Some(days),
            status: crate::classify::classify(Some(days)),
            alert_sent: false,
            last_alert_at: None,
            last_checked_at: now,
        })
    }

    #[test]
    fn critical_certificate_emits_critical_expiry_notification() {
        let feed = NotificationFeed::new();
        let emitted = feed.reconcile(&[site("s1", SiteStatus::Up)], &[cert("c1", "s1", 3)]);

        assert_eq!(emitted.len(), 1);
        let n = &emitted[0];
        assert_eq!(n.priority, NotificationPriority::Critical);
        assert!(n.kind.is_certificate_expiry());
        match &n.kind {
            NotificationKind::CertificateExpiry {
                days_remaining,
                site_url,
                ..
            } => {
                assert_eq!(*days_remaining, Some(3));
                assert_eq!(site_url, "https://s1.example.com");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn reconcile_is_idempotent() {
        let feed = NotificationFeed::new();
        let sites = [site("s1", SiteStatus::Up)];
        let certs = [cert("c1", "s1", 15)];

        let first = feed.reconcile(&sites, &certs);
        let second = feed.reconcile(&sites, &certs);

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].priority, NotificationPriority::High);
        assert!(second.is_empty());
        assert_eq!(feed.feed().len(), 1);
    }

    #[test]
    fn tier_transition_emits_a_new_notification() {
        let feed = NotificationFeed::new();
        let sites = [site("s1", SiteStatus::Up)];

        feed.reconcile(&sites, &[cert("c1", "s1", 15)]);
        let emitted = feed.reconcile(&sites, &[cert("c1", "s1", 3)]);

        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].priority, NotificationPriority::Critical);
        // history preserved: both notifications remain in the feed
        assert_eq!(feed.feed().len(), 2);
    }

    #[test]
    fn recovery_to_valid_emits_nothing_but_rearms() {
        let feed = NotificationFeed::new();
        let sites = [site("s1", SiteStatus::Up)];

        assert_eq!(feed.reconcile(&sites, &[cert("c1", "s1", 3)]).len(), 1);
        // renewed -- valid emits nothing
        assert!(feed.reconcile(&sites, &[cert("c1", "s1", 90)]).is_empty());
        // regression alerts again
        assert_eq!(feed.reconcile(&sites, &[cert("c1", "s1", 3)]).len(), 1);
    }

    #[test]
    fn site_down_raises_availability_alert_once() {
        let feed = NotificationFeed::new();

        let first = feed.reconcile(&[site("s1", SiteStatus::Down)], &[]);
        let second = feed.reconcile(&[site("s1", SiteStatus::Down)], &[]);

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].priority, NotificationPriority::High);
        assert!(matches!(
            first[0].kind,
            NotificationKind::Availability { .. }
        ));
        assert!(second.is_empty());
    }

    #[test]
    fn mark_all_read_yields_good_rollup() {
        let feed = NotificationFeed::new();
        feed.reconcile(
            &[site("s1", SiteStatus::Down)],
            &[cert("c1", "s1", 3), cert("c2", "s2", -10)],
        );
        assert_eq!(feed.overall_status(), OverallStatus::Critical);

        feed.mark_all_read();

        assert_eq!(feed.unread_count(), 0);
        assert_eq!(feed.overall_status(), OverallStatus::Good);
    }

    #[test]
    fn rollup_precedence_critical_beats_warning() {
        let feed = NotificationFeed::new();

        // only a high-priority (expiring) notification -> warning
        feed.reconcile(&[site("s1", SiteStatus::Up)], &[cert("c1", "s1", 15)]);
        assert_eq!(feed.overall_status(), OverallStatus::Warning);

        // add a critical certificate-expiry -> critical wins
        feed.reconcile(&[site("s1", SiteStatus::Up)], &[cert("c2", "s1", 2)]);
        assert_eq!(feed.overall_status(), OverallStatus::Critical);
    }

    #[test]
    fn non_certificate_critical_only_warns() {
        let feed = NotificationFeed::new();
        feed.add(
            NotificationKind::Security { site_id: None },
            NotificationPriority::Critical,
            "Suspicious login",
            "New login from unrecognized device",
            None,
        );

        assert_eq!(feed.overall_status(), OverallStatus::Warning);
    }

    #[test]
    fn mark_read_single() {
        let feed = NotificationFeed::new();
        let emitted = feed.reconcile(&[site("s1", SiteStatus::Up)], &[cert("c1", "s1", 3)]);

        assert_eq!(feed.unread_count(), 1);
        assert!(feed.mark_read(&emitted[0].id));
        assert_eq!(feed.unread_count(), 0);
        assert!(!feed.mark_read(&"nope".into()));
    }

    #[test]
    fn remove_for_certificate_leaves_no_orphans() {
        let feed = NotificationFeed::new();
        feed.reconcile(
            &[site("s1", SiteStatus::Up)],
            &[cert("c1", "s1", 3), cert("c2", "s2", 2)],
        );
        assert_eq!(feed.feed().len(), 2);

        feed.remove_for_certificate(&"c1".into());

        let remaining = feed.feed();
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            remaining[0].kind.certificate_id(),
            Some(&"c2".into())
        );
    }

    #[test]
    fn feed_is_newest_first() {
        let feed = NotificationFeed::new();
        feed.reconcile(&[site("s1", SiteStatus::Up)], &[cert("c1", "s1", 15)]);
        feed.reconcile(&[site("s1", SiteStatus::Up)], &[cert("c1", "s1", 3)]);

        let entries = feed.feed();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].created_at >= entries[1].created_at);
        assert_eq!(entries[0].priority, NotificationPriority::Critical);
    }

    #[test]
    fn departed_certificate_rearms_after_readd() {
        let feed = NotificationFeed::new();
        let sites = [site("s1", SiteStatus::Up)];

        assert_eq!(feed.reconcile(&sites, &[cert("c1", "s1", 3)]).len(), 1);
        // certificate gone from the inventory -> dedup state pruned
        feed.reconcile(&sites, &[]);
        // back again with the same tier -> alerts again
        assert_eq!(feed.reconcile(&sites, &[cert("c1", "s1", 3)]).len(), 1);
    }
}
