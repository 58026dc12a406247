// Site endpoints

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::{NewSiteRequest, SiteDto, UpdateSiteRequest};

impl ApiClient {
    /// List all monitored sites.
    ///
    /// `GET /api/sites`
    pub async fn list_sites(&self) -> Result<Vec<SiteDto>, Error> {
        debug!("listing sites");
        self.get("api/sites").await
    }

    /// Fetch a single site by id.
    ///
    /// `GET /api/sites/{id}`
    pub async fn get_site(&self, id: &str) -> Result<SiteDto, Error> {
        self.get(&format!("api/sites/{id}")).await
    }

    /// Register a new site for monitoring. Returns the canonical entity
    /// with the server-assigned id.
    ///
    /// `POST /api/sites`
    pub async fn create_site(&self, req: &NewSiteRequest) -> Result<SiteDto, Error> {
        debug!(name = %req.name, "creating site");
        self.post("api/sites", req).await
    }

    /// Update an existing site. Returns the canonical updated entity.
    ///
    /// `PUT /api/sites/{id}`
    pub async fn update_site(&self, id: &str, req: &UpdateSiteRequest) -> Result<SiteDto, Error> {
        debug!(%id, "updating site");
        self.put(&format!("api/sites/{id}"), req).await
    }

    /// Remove a site (and its tracked certificate, server-side).
    ///
    /// `DELETE /api/sites/{id}`
    pub async fn delete_site(&self, id: &str) -> Result<(), Error> {
        debug!(%id, "deleting site");
        self.delete(&format!("api/sites/{id}")).await
    }
}
