// Backend HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token injection,
// and error-body extraction. Endpoint groups (sites, certificates, auth)
// are implemented as inherent methods in separate files to keep this
// module focused on transport mechanics.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::ApiMessage;

/// Async client for the sitewatch backend.
///
/// All endpoints live under `/api/`. Requests carry an
/// `Authorization: Bearer` header whenever a token is armed; the token is
/// swapped at runtime on login/logout without rebuilding the client.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    probe_timeout: Duration,
    /// Bearer credential. Armed after login (or from the session store at
    /// startup), cleared on logout or session expiry.
    token: RwLock<Option<SecretString>>,
}

impl ApiClient {
    /// Create a client for the given backend root (e.g. `https://monitor.example.com`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url),
            probe_timeout: transport.probe_timeout,
            token: RwLock::new(None),
        })
    }

    /// Wrap a pre-built `reqwest::Client` (caller manages timeouts).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
            probe_timeout: Duration::from_secs(2),
            token: RwLock::new(None),
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Token management ─────────────────────────────────────────────

    /// Arm the bearer credential used on subsequent requests.
    pub fn set_token(&self, token: SecretString) {
        debug!("arming bearer credential");
        *self.token.write().expect("token lock poisoned") = Some(token);
    }

    /// Drop the bearer credential (logout / session expiry).
    pub fn clear_token(&self) {
        debug!("clearing bearer credential");
        *self.token.write().expect("token lock poisoned") = None;
    }

    /// Whether a bearer credential is currently armed.
    pub fn has_token(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    /// Apply the armed token (if any) to a request builder.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.token.read().expect("token lock poisoned");
        match guard.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"api/sites"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Url {
        // base_url always ends with `/`, so joining `api/...` works.
        self.base_url
            .join(path)
            .expect("path should be a valid relative URL")
    }

    // ── Availability probe ───────────────────────────────────────────

    /// Lightweight reachability check against `GET /api/health`.
    ///
    /// Bounded by the probe timeout so a hung backend answers "unreachable"
    /// within a couple of seconds instead of stalling the caller. Never
    /// errors -- any failure means "not reachable".
    pub async fn probe(&self) -> bool {
        let url = self.url("api/health");
        trace!("probing {url}");

        let request = self.http.get(url).send();
        match tokio::time::timeout(self.probe_timeout, request).await {
            Ok(Ok(resp)) => resp.status().is_success(),
            Ok(Err(_)) | Err(_) => false,
        }
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.authorize(self.http.get(url)).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url).json(body)).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post_empty<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url).json(body)).send().await?;
        self.handle_empty(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("PUT {url}");

        let resp = self.authorize(self.http.put(url).json(body)).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path);
        debug!("DELETE {url}");

        let resp = self.authorize(self.http.delete(url)).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview = &body[..body.len().min(200)];
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(parse_error(status, resp).await)
        }
    }
}

/// Classify a non-2xx response.
///
/// 401 means the session is gone -- surfaced as its own variant so the
/// engine can clear the cached credential instead of falling back. All
/// other statuses carry a human-readable message extracted from the
/// conventional `{message}`/`{title}` body when present, else raw text.
async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
    if status == StatusCode::UNAUTHORIZED {
        return Error::SessionExpired;
    }

    let raw = resp.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ApiMessage>(&raw)
        .ok()
        .and_then(|m| m.message.or(m.title))
        .unwrap_or_else(|| {
            if raw.is_empty() {
                status.to_string()
            } else {
                raw
            }
        });

    Error::Api {
        message,
        status: status.as_u16(),
    }
}

/// Ensure the base URL path ends with `/` so relative joins behave.
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
