// ── Canonical entity store ──
//
// Owns the Site and Certificate inventories. Single-writer discipline:
// only the mutation coordinator and the refresh/reconcile path call the
// mutating operations; UI consumers hold snapshots or subscriptions.

use std::sync::Arc;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use super::collection::EntityCollection;
use crate::classify::{classify, days_until};
use crate::model::{Certificate, CertificateStatus, CertificateSummary, EntityId, Site};
use crate::stream::EntityStream;

/// Canonical in-memory store for monitored sites and their certificates.
///
/// Every public mutation runs inside a single critical section (the write
/// gate), so concurrent callers never observe a partial update -- a
/// cascade delete is atomic from any reader's point of view.
pub struct EntityStore {
    sites: EntityCollection<Site>,
    certificates: EntityCollection<Certificate>,
    /// site id -> certificate id (a site has at most one tracked cert).
    cert_by_site: DashMap<EntityId, EntityId>,
    /// Serializes multi-step mutations.
    write_gate: Mutex<()>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl EntityStore {
    pub fn new() -> Self {
        let (last_refresh, _) = watch::channel(None);
        Self {
            sites: EntityCollection::new(),
            certificates: EntityCollection::new(),
            cert_by_site: DashMap::new(),
            write_gate: Mutex::new(()),
            last_refresh,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn sites(&self) -> Arc<Vec<Arc<Site>>> {
        self.sites.snapshot()
    }

    pub fn certificates(&self) -> Arc<Vec<Arc<Certificate>>> {
        self.certificates.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn site_by_id(&self, id: &EntityId) -> Option<Arc<Site>> {
        self.sites.get(id)
    }

    pub fn certificate_by_id(&self, id: &EntityId) -> Option<Arc<Certificate>> {
        self.certificates.get(id)
    }

    pub fn certificate_for_site(&self, site_id: &EntityId) -> Option<Arc<Certificate>> {
        let cert_id = self.cert_by_site.get(site_id)?.value().clone();
        self.certificates.get(&cert_id)
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn certificate_count(&self) -> usize {
        self.certificates.len()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Insert or update a site. Returns `true` if the id was new.
    pub fn upsert_site(&self, site: Site) -> bool {
        let _gate = self.write_gate.lock().expect("write gate poisoned");
        self.sites.upsert(site.id.clone(), site)
    }

    /// Remove a site, cascading to its tracked certificate.
    ///
    /// Returns what was removed so the caller can restore it on rollback
    /// or purge notifications keyed to the certificate.
    pub fn remove_site(&self, id: &EntityId) -> Option<(Arc<Site>, Option<Arc<Certificate>>)> {
        let _gate = self.write_gate.lock().expect("write gate poisoned");

        let site = self.sites.remove(id)?;
        let cert = self
            .cert_by_site
            .remove(id)
            .and_then(|(_, cert_id)| self.certificates.remove(&cert_id));

        debug!(site = %id, cascaded = cert.is_some(), "removed site");
        Some((site, cert))
    }

    /// Insert or update a certificate, re-deriving `days_remaining` and
    /// `status` through the classifier first. A stored certificate can
    /// never disagree with its own expiry data.
    pub fn upsert_certificate(&self, cert: Certificate) -> bool {
        let _gate = self.write_gate.lock().expect("write gate poisoned");
        self.apply_certificate(cert, Utc::now())
    }

    /// Re-insert a previously stored certificate verbatim (rollback path).
    pub(crate) fn restore_certificate(&self, cert: Certificate) {
        let _gate = self.write_gate.lock().expect("write gate poisoned");
        self.index_certificate(&cert);
        self.certificates.upsert(cert.id.clone(), cert);
    }

    /// Replace the full inventory with an authoritative snapshot.
    /// Certificates are re-classified on the way in.
    pub fn replace_all(&self, sites: Vec<Site>, certificates: Vec<Certificate>) {
        let _gate = self.write_gate.lock().expect("write gate poisoned");
        let now = Utc::now();

        self.sites.clear();
        self.certificates.clear();
        self.cert_by_site.clear();

        for site in sites {
            self.sites.upsert(site.id.clone(), site);
        }
        for cert in certificates {
            self.apply_certificate(cert, now);
        }

        let _ = self.last_refresh.send(Some(now));
        debug!(
            sites = self.sites.len(),
            certificates = self.certificates.len(),
            "full inventory replaced"
        );
    }

    /// Tier counts over the current certificate inventory.
    pub fn certificate_summary(&self) -> CertificateSummary {
        let mut summary = CertificateSummary::default();
        for cert in self.certificates.snapshot().iter() {
            summary.total += 1;
            match cert.status {
                CertificateStatus::Valid => summary.valid += 1,
                CertificateStatus::Expiring => summary.expiring += 1,
                CertificateStatus::Critical => summary.critical += 1,
                CertificateStatus::Expired => summary.expired += 1,
                CertificateStatus::Invalid => summary.invalid += 1,
                CertificateStatus::Error => summary.errors += 1,
            }
        }
        summary
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_sites(&self) -> EntityStream<Site> {
        EntityStream::new(self.sites.subscribe())
    }

    pub fn subscribe_certificates(&self) -> EntityStream<Certificate> {
        EntityStream::new(self.certificates.subscribe())
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Classify-then-store. `Invalid` is the one status the classifier
    /// cannot produce: it is a server-asserted chain verdict, kept as-is.
    fn apply_certificate(&self, mut cert: Certificate, now: DateTime<Utc>) -> bool {
        cert.days_remaining = days_until(cert.expires_at, now);
        if cert.status != CertificateStatus::Invalid {
            cert.status = classify(cert.days_remaining);
        }

        self.index_certificate(&cert);
        self.certificates.upsert(cert.id.clone(), cert)
    }

    /// Maintain the one-cert-per-site index, evicting a superseded
    /// certificate when a site's tracked cert changes identity.
    fn index_certificate(&self, cert: &Certificate) {
        if let Some(previous) = self
            .cert_by_site
            .insert(cert.site_id.clone(), cert.id.clone())
        {
            if previous != cert.id && self.certificates.contains(&previous) {
                self.certificates.remove(&previous);
            }
        }
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::SiteStatus;

    fn site(id: &str, name: &str) -> Site {
        Site {
            id: id.into(),
            name: name.into(),
            url: format!("https://{name}.example.com"),
            active: true,
            created_at: Utc::now(),
            last_checked: None,
            status: SiteStatus::Unknown,
        }
    }

    fn cert(id: &str, site_id: &str, days: i64) -> Certificate {
        let now = Utc::now();
        Certificate {
            id: id.into(),
            site_id: site_id.into(),
            domain: "example.com".into(),
            expires_at: Some(now + Duration::days(days)),
            issuer: Some("Test CA".into()),
            days_remaining: None,
            // deliberately wrong; the store must re-derive
            status: CertificateStatus::Valid,
            alert_sent: false,
            last_alert_at: None,
            last_checked_at: now,
        }
    }

    #[test]
    fn upsert_certificate_reclassifies() {
        let store = EntityStore::new();
        store.upsert_certificate(cert("c1", "s1", 3));

        let stored = store.certificate_by_id(&"c1".into()).unwrap();
        assert_eq!(stored.days_remaining, Some(3));
        assert_eq!(stored.status, CertificateStatus::Critical);
    }

    #[test]
    fn server_asserted_invalid_survives_upsert() {
        let store = EntityStore::new();
        let mut c = cert("c1", "s1", 90);
        c.status = CertificateStatus::Invalid;
        store.upsert_certificate(c);

        let stored = store.certificate_by_id(&"c1".into()).unwrap();
        assert_eq!(stored.status, CertificateStatus::Invalid);
    }

    #[test]
    fn remove_site_cascades_to_certificate() {
        let store = EntityStore::new();
        store.upsert_site(site("s1", "main"));
        store.upsert_certificate(cert("c1", "s1", 42));

        let (removed_site, removed_cert) = store.remove_site(&"s1".into()).unwrap();
        assert_eq!(removed_site.name, "main");
        assert_eq!(removed_cert.unwrap().id, "c1".into());

        assert_eq!(store.site_count(), 0);
        assert_eq!(store.certificate_count(), 0);
        assert!(store.certificate_for_site(&"s1".into()).is_none());
    }

    #[test]
    fn a_site_tracks_at_most_one_certificate() {
        let store = EntityStore::new();
        store.upsert_certificate(cert("c1", "s1", 42));
        store.upsert_certificate(cert("c2", "s1", 42));

        assert_eq!(store.certificate_count(), 1);
        assert_eq!(
            store.certificate_for_site(&"s1".into()).unwrap().id,
            "c2".into()
        );
    }

    #[test]
    fn replace_all_swaps_the_inventory() {
        let store = EntityStore::new();
        store.upsert_site(site("old", "old"));
        store.upsert_certificate(cert("c-old", "old", 5));

        store.replace_all(
            vec![site("s1", "one"), site("s2", "two")],
            vec![cert("c1", "s1", 60)],
        );

        assert_eq!(store.site_count(), 2);
        assert_eq!(store.certificate_count(), 1);
        assert!(store.site_by_id(&"old".into()).is_none());
        assert!(store.last_refresh().is_some());

        // re-classified on the way in
        let c = store.certificate_by_id(&"c1".into()).unwrap();
        assert_eq!(c.status, CertificateStatus::Valid);
    }

    #[test]
    fn summary_counts_follow_the_classifier() {
        let store = EntityStore::new();
        store.upsert_certificate(cert("c1", "s1", 90));
        store.upsert_certificate(cert("c2", "s2", 15));
        store.upsert_certificate(cert("c3", "s3", 2));
        store.upsert_certificate(cert("c4", "s4", -30));

        let summary = store.certificate_summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.valid, 1);
        assert_eq!(summary.expiring, 1);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.errors, 0);
    }

    #[test]
    fn restore_certificate_is_verbatim() {
        let store = EntityStore::new();
        store.upsert_site(site("s1", "main"));
        store.upsert_certificate(cert("c1", "s1", 3));
        let stored = store.certificate_by_id(&"c1".into()).unwrap();

        store.remove_site(&"s1".into());
        store.restore_certificate((*stored).clone());

        let restored = store.certificate_by_id(&"c1".into()).unwrap();
        assert_eq!(*restored, *stored);
    }
}
