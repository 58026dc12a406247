// ── API-to-domain type conversions ──
//
// Bridges raw `sitewatch_api` response types into canonical
// `sitewatch_core::model` domain types. Each `From` impl normalizes field
// names, parses status strings into strong types, and fills sensible
// defaults for missing optional data.

use chrono::Utc;

use sitewatch_api::types::{CertificateDto, SiteDto, UserDto};

use crate::classify::classify;
use crate::model::{Certificate, CertificateStatus, EntityId, Site, SiteStatus, UserProfile};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse the backend's site status string; anything unrecognized (or
/// absent) reads as unknown.
fn parse_site_status(raw: Option<&str>) -> SiteStatus {
    match raw {
        Some("up") => SiteStatus::Up,
        Some("down") => SiteStatus::Down,
        Some("maintenance") => SiteStatus::Maintenance,
        _ => SiteStatus::Unknown,
    }
}

/// Parse the backend's certificate status string. Used only to preserve a
/// server-asserted `invalid` verdict; every other value is re-derived from
/// the expiry data by the classifier on upsert.
fn parse_certificate_status(raw: Option<&str>, days_remaining: Option<i64>) -> CertificateStatus {
    match raw {
        Some("invalid") => CertificateStatus::Invalid,
        _ => classify(days_remaining),
    }
}

// ── Site ───────────────────────────────────────────────────────────

impl From<SiteDto> for Site {
    fn from(dto: SiteDto) -> Self {
        Site {
            id: EntityId::from(dto.id),
            name: dto.name,
            url: dto.url,
            active: dto.active,
            created_at: dto.created_at.unwrap_or_else(Utc::now),
            last_checked: dto.last_checked,
            status: parse_site_status(dto.status.as_deref()),
        }
    }
}

// ── Certificate ────────────────────────────────────────────────────

impl From<CertificateDto> for Certificate {
    fn from(dto: CertificateDto) -> Self {
        let status = parse_certificate_status(dto.status.as_deref(), dto.days_remaining);
        Certificate {
            id: EntityId::from(dto.id),
            site_id: EntityId::from(dto.site_id),
            domain: dto.domain,
            expires_at: dto.expiry_date,
            issuer: dto.issuer,
            days_remaining: dto.days_remaining,
            status,
            alert_sent: dto.alert_sent,
            last_alert_at: dto.last_alert_at,
            last_checked_at: dto.last_checked.unwrap_or_else(Utc::now),
        }
    }
}

// ── User ───────────────────────────────────────────────────────────

impl From<UserDto> for UserProfile {
    fn from(dto: UserDto) -> Self {
        UserProfile {
            id: dto.id,
            email: dto.email,
            name: dto.name,
        }
    }
}
