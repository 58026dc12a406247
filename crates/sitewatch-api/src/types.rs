// Wire types for the sitewatch backend API.
//
// These mirror the backend's JSON payloads verbatim (camelCase fields,
// loose optionality). `sitewatch-core` converts them into the canonical
// domain model; nothing above the api crate touches these directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Sites ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDto {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub last_checked: Option<DateTime<Utc>>,
    /// Operational status as reported: "up", "down", "maintenance".
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSiteRequest {
    pub name: String,
    pub url: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSiteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

// ── Certificates ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDto {
    pub id: String,
    pub site_id: String,
    pub domain: String,
    pub expiry_date: Option<DateTime<Utc>>,
    pub issuer: Option<String>,
    pub days_remaining: Option<i64>,
    /// Status as reported: "valid", "expiring", "critical", "expired",
    /// "invalid", "error". Re-derived locally on upsert.
    pub status: Option<String>,
    #[serde(default)]
    pub alert_sent: bool,
    pub last_alert_at: Option<DateTime<Utc>>,
    pub last_checked: Option<DateTime<Utc>>,
}

/// Tier counts from `GET /api/certificates/summary`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSummaryDto {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub valid: u32,
    #[serde(default)]
    pub expiring: u32,
    #[serde(default)]
    pub critical: u32,
    #[serde(default)]
    pub expired: u32,
    #[serde(default)]
    pub errors: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBulkRequest {
    pub site_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAlertsRequest {
    pub certificate_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
}

/// Result of an alert dispatch batch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDispatchDto {
    #[serde(default)]
    pub sent: u32,
    #[serde(default)]
    pub failed: u32,
}

// ── Auth ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

// ── Error body ──────────────────────────────────────────────────────

/// Conventional error body: `{message}` preferred, `{title}` as fallback.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

fn default_true() -> bool {
    true
}
