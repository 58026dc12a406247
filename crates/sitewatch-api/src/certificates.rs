// Certificate endpoints
//
// Checks are site-scoped (a site has at most one tracked certificate);
// everything else operates on certificate ids.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::{
    AlertDispatchDto, CertificateDto, CertificateSummaryDto, CheckBulkRequest, SendAlertsRequest,
};

impl ApiClient {
    /// List all tracked certificates.
    ///
    /// `GET /api/certificates`
    pub async fn list_certificates(&self) -> Result<Vec<CertificateDto>, Error> {
        debug!("listing certificates");
        self.get("api/certificates").await
    }

    /// Fetch a single certificate by id.
    ///
    /// `GET /api/certificates/{id}`
    pub async fn get_certificate(&self, id: &str) -> Result<CertificateDto, Error> {
        self.get(&format!("api/certificates/{id}")).await
    }

    /// Tier counts across all tracked certificates.
    ///
    /// `GET /api/certificates/summary`
    pub async fn certificate_summary(&self) -> Result<CertificateSummaryDto, Error> {
        self.get("api/certificates/summary").await
    }

    /// Run a fresh expiry check for one site's certificate. Returns the
    /// re-checked certificate.
    ///
    /// `POST /api/certificates/check/{site_id}`
    pub async fn check_certificate(&self, site_id: &str) -> Result<CertificateDto, Error> {
        debug!(%site_id, "checking certificate");
        self.post(&format!("api/certificates/check/{site_id}"), &serde_json::json!({}))
            .await
    }

    /// Re-check every tracked certificate.
    ///
    /// `POST /api/certificates/check-all`
    pub async fn check_all_certificates(&self) -> Result<Vec<CertificateDto>, Error> {
        debug!("checking all certificates");
        self.post("api/certificates/check-all", &serde_json::json!({}))
            .await
    }

    /// Re-check a batch of sites' certificates.
    ///
    /// `POST /api/certificates/check-bulk`
    pub async fn check_certificates_bulk(
        &self,
        req: &CheckBulkRequest,
    ) -> Result<Vec<CertificateDto>, Error> {
        debug!(count = req.site_ids.len(), "bulk certificate check");
        self.post("api/certificates/check-bulk", req).await
    }

    /// Dispatch expiry alert emails for a batch of certificates.
    ///
    /// `POST /api/certificates/send-alerts`
    pub async fn send_alerts(&self, req: &SendAlertsRequest) -> Result<AlertDispatchDto, Error> {
        debug!(count = req.certificate_ids.len(), "sending alerts");
        self.post("api/certificates/send-alerts", req).await
    }
}
