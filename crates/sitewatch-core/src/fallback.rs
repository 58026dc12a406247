// ── Fallback data provider ──
//
// Deterministic local snapshot used whenever the source selector is in
// fallback mode. Identifiers are minted once per provider instance and
// reused on every call, so optimistic UI updates never visually "jump"
// between refreshes within a session.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::classify::{classify, days_until};
use crate::model::{Certificate, CertificateStatus, EntityId, Site, SiteStatus};

/// Simulated network latency for synthetic check results.
const CHECK_LATENCY: Duration = Duration::from_millis(150);

/// Demo fleet: (name, host, site status, days until expiry).
/// Days are chosen to exercise every tier the dashboard renders.
const DEMO_SITES: &[(&str, &str, SiteStatus, Option<i64>)] = &[
    ("Main Website", "example.com", SiteStatus::Up, Some(92)),
    ("API Service", "api.example.com", SiteStatus::Up, Some(21)),
    ("Status Page", "status.example.com", SiteStatus::Up, Some(3)),
    ("Legacy Portal", "legacy.example.com", SiteStatus::Down, Some(-4)),
    ("Staging", "staging.example.com", SiteStatus::Unknown, None),
];

/// Deterministic Site/Certificate snapshot generator.
pub struct FallbackProvider {
    sites: Vec<Site>,
    certificates: Vec<Certificate>,
    /// Synthetic certificates minted for sites outside the demo fleet
    /// (e.g. optimistically added ones). Keyed by site id so a repeated
    /// check returns the same certificate identity.
    synthetic: DashMap<EntityId, Certificate>,
}

impl FallbackProvider {
    pub fn new() -> Self {
        let now = Utc::now();
        let mut sites = Vec::with_capacity(DEMO_SITES.len());
        let mut certificates = Vec::with_capacity(DEMO_SITES.len());

        for (name, host, status, days) in DEMO_SITES {
            let site_id = EntityId::local();
            let expires_at = days.map(|d| now + ChronoDuration::days(d));
            let days_remaining = days_until(expires_at, now);

            certificates.push(Certificate {
                id: EntityId::local(),
                site_id: site_id.clone(),
                domain: (*host).to_owned(),
                expires_at,
                issuer: days.is_some().then(|| "Let's Encrypt".to_owned()),
                days_remaining,
                status: classify(days_remaining),
                alert_sent: false,
                last_alert_at: None,
                last_checked_at: now,
            });

            sites.push(Site {
                id: site_id,
                name: (*name).to_owned(),
                url: format!("https://{host}"),
                active: true,
                created_at: now - ChronoDuration::days(30),
                last_checked: Some(now),
                status: *status,
            });
        }

        Self {
            sites,
            certificates,
            synthetic: DashMap::new(),
        }
    }

    /// The demo site snapshot (ids stable across calls).
    pub fn sites(&self) -> Vec<Site> {
        self.sites.clone()
    }

    /// The demo certificate snapshot (ids stable across calls).
    pub fn certificates(&self) -> Vec<Certificate> {
        self.certificates.clone()
    }

    /// Synthetic check result for a site, with simulated latency.
    ///
    /// Demo-fleet sites return their seeded certificate; any other site
    /// gets a healthy synthetic certificate whose identity is stable for
    /// the lifetime of this provider.
    pub async fn check(&self, site: &Site) -> Certificate {
        tokio::time::sleep(CHECK_LATENCY).await;

        let now = Utc::now();
        let mut cert = self
            .certificates
            .iter()
            .find(|c| c.site_id == site.id)
            .cloned()
            .unwrap_or_else(|| self.synthetic_for(site));

        cert.last_checked_at = now;
        cert.days_remaining = days_until(cert.expires_at, now);
        if cert.status != CertificateStatus::Invalid {
            cert.status = classify(cert.days_remaining);
        }

        debug!(site = %site.id, status = cert.status.as_str(), "synthetic check");
        cert
    }

    fn synthetic_for(&self, site: &Site) -> Certificate {
        self.synthetic
            .entry(site.id.clone())
            .or_insert_with(|| {
                let now = Utc::now();
                let expires_at = Some(now + ChronoDuration::days(90));
                let days_remaining = days_until(expires_at, now);
                Certificate {
                    id: EntityId::local(),
                    site_id: site.id.clone(),
                    domain: host_of(&site.url),
                    expires_at,
                    issuer: Some("Let's Encrypt".to_owned()),
                    days_remaining,
                    status: classify(days_remaining),
                    alert_sent: false,
                    last_alert_at: None,
                    last_checked_at: now,
                }
            })
            .clone()
    }
}

impl Default for FallbackProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort host extraction for synthetic certificate domains.
fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToOwned::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_stable_across_calls() {
        let provider = FallbackProvider::new();

        let a = provider.sites();
        let b = provider.sites();
        assert_eq!(a, b);

        let ca = provider.certificates();
        let cb = provider.certificates();
        assert_eq!(ca, cb);
    }

    #[test]
    fn snapshot_spans_the_tiers() {
        let provider = FallbackProvider::new();
        let statuses: Vec<CertificateStatus> =
            provider.certificates().iter().map(|c| c.status).collect();

        assert!(statuses.contains(&CertificateStatus::Valid));
        assert!(statuses.contains(&CertificateStatus::Expiring));
        assert!(statuses.contains(&CertificateStatus::Critical));
        assert!(statuses.contains(&CertificateStatus::Expired));
        assert!(statuses.contains(&CertificateStatus::Error));
    }

    #[test]
    fn certificates_belong_to_sites() {
        let provider = FallbackProvider::new();
        let sites = provider.sites();

        for cert in provider.certificates() {
            assert!(sites.iter().any(|s| s.id == cert.site_id));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn synthetic_check_identity_is_stable() {
        let provider = FallbackProvider::new();
        let unknown = Site {
            id: EntityId::local(),
            name: "Fresh".into(),
            url: "https://fresh.example.com".into(),
            active: true,
            created_at: Utc::now(),
            last_checked: None,
            status: SiteStatus::Unknown,
        };

        let first = provider.check(&unknown).await;
        let second = provider.check(&unknown).await;

        assert_eq!(first.id, second.id);
        assert_eq!(first.domain, "fresh.example.com");
        assert_eq!(first.status, CertificateStatus::Valid);
    }

    #[tokio::test(start_paused = true)]
    async fn demo_site_check_returns_seeded_certificate() {
        let provider = FallbackProvider::new();
        let sites = provider.sites();
        let seeded = provider.certificates();

        let checked = provider.check(&sites[2]).await;
        assert_eq!(checked.id, seeded[2].id);
        assert_eq!(checked.status, CertificateStatus::Critical);
    }
}
