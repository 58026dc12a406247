// ── Engine ──
//
// The explicitly constructed composition root for the monitoring state
// engine: api client, entity store, notification feed, source selector,
// fallback provider, and session store, wired together behind one handle.
//
// Single-writer discipline: only the mutation entry points here and the
// refresh path write to the store and feed. Everything the UI renders
// comes from read-only snapshots or subscriptions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use secrecy::SecretString;
use tracing::{debug, info, warn};

use sitewatch_api::types::{
    CheckBulkRequest, NewSiteRequest, SendAlertsRequest, UpdateSiteRequest,
};
use sitewatch_api::{ApiClient, TransportConfig};

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::fallback::FallbackProvider;
use crate::model::{Certificate, CertificateSummary, EntityId, Site, SiteStatus, UserProfile};
use crate::mutate::{NewSite, PendingMutations, SiteChanges};
use crate::notify::NotificationFeed;
use crate::session::{SessionStore, keys};
use crate::source::{DataSourceMode, Resource, SourceSelector, Sourced};
use crate::store::EntityStore;

// ── Refresh results ──────────────────────────────────────────────────

/// Outcome of a [`refresh`](Engine::refresh) call.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The fetched snapshot was applied to the store.
    Applied(RefreshSummary),
    /// A newer refresh started while this one was in flight; its result
    /// was discarded so stale data never clobbers fresher data.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct RefreshSummary {
    pub sites_mode: DataSourceMode,
    pub certificates_mode: DataSourceMode,
    pub site_count: usize,
    pub certificate_count: usize,
    pub new_notifications: usize,
}

/// Result of an alert dispatch batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertDispatch {
    pub sent: u32,
    pub failed: u32,
}

// ── Engine ───────────────────────────────────────────────────────────

/// The main entry point for dashboard consumers.
///
/// Cheaply cloneable via `Arc<EngineInner>`. One engine per backend;
/// construct it where the UI tree is composed and pass it down.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    api: Arc<ApiClient>,
    store: EntityStore,
    feed: NotificationFeed,
    selector: SourceSelector,
    fallback: FallbackProvider,
    session: Arc<dyn SessionStore>,
    pending: PendingMutations,
    /// Monotonic refresh token; see [`RefreshOutcome::Superseded`].
    refresh_seq: AtomicU64,
}

impl Engine {
    /// Build an engine from configuration and a session store.
    ///
    /// If the session store holds a token from an earlier session, the
    /// api client is armed with it immediately.
    pub fn new(config: EngineConfig, session: Arc<dyn SessionStore>) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
            probe_timeout: config.probe_timeout,
        };
        let api = Arc::new(
            ApiClient::new(config.backend_url.clone(), &transport).map_err(CoreError::from)?,
        );

        if let Some(token) = session.get(keys::TOKEN) {
            api.set_token(SecretString::from(token));
        }

        Ok(Self {
            inner: Arc::new(EngineInner {
                selector: SourceSelector::new(Arc::clone(&api)),
                api,
                config,
                store: EntityStore::new(),
                feed: NotificationFeed::new(),
                fallback: FallbackProvider::new(),
                session,
                pending: PendingMutations::default(),
                refresh_seq: AtomicU64::new(0),
            }),
        })
    }

    // ── Read-only observation ────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.inner.store
    }

    pub fn notifications(&self) -> &NotificationFeed {
        &self.inner.feed
    }

    /// The source mode recorded for a resource during the current cycle.
    pub fn source_mode(&self, resource: Resource) -> Option<DataSourceMode> {
        self.inner.selector.mode(resource)
    }

    /// Tier counts over the stored certificates.
    pub fn certificate_summary(&self) -> CertificateSummary {
        self.inner.store.certificate_summary()
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Fetch the authoritative inventory and reconcile local state.
    ///
    /// The single refresh entry point: every surface that needs fresh
    /// data calls this. Each call takes a monotonically increasing token;
    /// if a newer refresh starts while this one is awaiting the network,
    /// this one's result is discarded.
    pub async fn refresh(&self) -> Result<RefreshOutcome, CoreError> {
        let token = self.inner.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(token, "refresh started");
        self.inner.selector.reset();

        let api = &self.inner.api;
        let fallback = &self.inner.fallback;

        let sites = self
            .inner
            .selector
            .with_source(
                Resource::Sites,
                || async {
                    api.list_sites()
                        .await
                        .map(|v| v.into_iter().map(Site::from).collect::<Vec<_>>())
                },
                || fallback.sites(),
            )
            .await
            .map_err(|e| self.on_error(e))?;

        let certificates = self
            .inner
            .selector
            .with_source(
                Resource::Certificates,
                || async {
                    api.list_certificates()
                        .await
                        .map(|v| v.into_iter().map(Certificate::from).collect::<Vec<_>>())
                },
                || fallback.certificates(),
            )
            .await
            .map_err(|e| self.on_error(e))?;

        if self.inner.refresh_seq.load(Ordering::SeqCst) != token {
            debug!(token, "refresh superseded -- discarding result");
            return Ok(RefreshOutcome::Superseded);
        }

        self.inner
            .store
            .replace_all(sites.value, certificates.value);
        let emitted = self.reconcile();

        let summary = RefreshSummary {
            sites_mode: sites.mode,
            certificates_mode: certificates.mode,
            site_count: self.inner.store.site_count(),
            certificate_count: self.inner.store.certificate_count(),
            new_notifications: emitted,
        };
        info!(
            sites = summary.site_count,
            certificates = summary.certificate_count,
            notifications = summary.new_notifications,
            "refresh complete"
        );
        Ok(RefreshOutcome::Applied(summary))
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Register a new site.
    ///
    /// Optimistic: the site appears in the store immediately under a
    /// local id. Live confirmation swaps in the canonical entity;
    /// offline, the optimistic site stands (additive action) and the
    /// mutation still confirms.
    pub async fn add_site(&self, new: NewSite) -> Result<Sourced<Arc<Site>>, CoreError> {
        let (name, url) = new.validated()?;

        let optimistic = Site {
            id: EntityId::local(),
            name: name.clone(),
            url: url.clone(),
            active: true,
            created_at: Utc::now(),
            last_checked: None,
            status: SiteStatus::Unknown,
        };
        let optimistic_id = optimistic.id.clone();
        let _guard = self.inner.pending.begin(&optimistic_id)?;

        self.inner.store.upsert_site(optimistic);

        let api = &self.inner.api;
        let req = NewSiteRequest {
            name,
            url,
            active: true,
        };
        let result = self
            .inner
            .selector
            .with_source(
                Resource::Sites,
                || async { api.create_site(&req).await.map(Some) },
                || None,
            )
            .await;

        match result {
            Ok(Sourced {
                value: Some(dto),
                mode,
            }) => {
                let canonical = Site::from(dto);
                if canonical.id != optimistic_id {
                    self.inner.store.remove_site(&optimistic_id);
                }
                let id = canonical.id.clone();
                self.inner.store.upsert_site(canonical);
                debug!(site = %id, "site create confirmed");
                Ok(Sourced {
                    value: self.stored_site(&id)?,
                    mode,
                })
            }
            Ok(Sourced { value: None, mode }) => {
                // Additive action with no server to contradict it: the
                // optimistic entity is the confirmed result.
                debug!(site = %optimistic_id, "site create confirmed against fallback");
                Ok(Sourced {
                    value: self.stored_site(&optimistic_id)?,
                    mode,
                })
            }
            Err(e) => {
                self.inner.store.remove_site(&optimistic_id);
                Err(self.on_error(e))
            }
        }
    }

    /// Edit an existing site. Requires live confirmation; offline, the
    /// optimistic change is reverted and an error reported.
    pub async fn edit_site(
        &self,
        id: &EntityId,
        changes: SiteChanges,
    ) -> Result<Sourced<Arc<Site>>, CoreError> {
        let changes = changes.validated()?;
        let _guard = self.inner.pending.begin(id)?;
        let prior = self
            .inner
            .store
            .site_by_id(id)
            .ok_or_else(|| CoreError::site_not_found(id))?;

        let mut optimistic = (*prior).clone();
        if let Some(ref name) = changes.name {
            optimistic.name.clone_from(name);
        }
        if let Some(ref url) = changes.url {
            optimistic.url.clone_from(url);
        }
        if let Some(active) = changes.active {
            optimistic.active = active;
        }
        self.inner.store.upsert_site(optimistic);

        let api = &self.inner.api;
        let req = UpdateSiteRequest {
            name: changes.name,
            url: changes.url,
            active: changes.active,
        };
        let result = self
            .inner
            .selector
            .with_source(
                Resource::Sites,
                || async { api.update_site(id.as_str(), &req).await.map(Some) },
                || None,
            )
            .await;

        match result {
            Ok(Sourced {
                value: Some(dto),
                mode,
            }) => {
                let canonical = Site::from(dto);
                let canonical_id = canonical.id.clone();
                self.inner.store.upsert_site(canonical);
                debug!(site = %id, "site edit confirmed");
                Ok(Sourced {
                    value: self.stored_site(&canonical_id)?,
                    mode,
                })
            }
            Ok(Sourced { value: None, .. }) => {
                self.inner.store.upsert_site((*prior).clone());
                Err(CoreError::Network {
                    reason: "backend unreachable -- edit not saved".into(),
                })
            }
            Err(e) => {
                self.inner.store.upsert_site((*prior).clone());
                Err(self.on_error(e))
            }
        }
    }

    /// Delete a site, cascading to its certificate and any notifications
    /// keyed to it. Requires live confirmation; offline, the removal is
    /// reverted and an error reported.
    pub async fn delete_site(&self, id: &EntityId) -> Result<Sourced<()>, CoreError> {
        let _guard = self.inner.pending.begin(id)?;
        let (site, cert) = self
            .inner
            .store
            .remove_site(id)
            .ok_or_else(|| CoreError::site_not_found(id))?;

        let api = &self.inner.api;
        let result = self
            .inner
            .selector
            .with_source(
                Resource::Sites,
                || async { api.delete_site(id.as_str()).await.map(Some) },
                || None,
            )
            .await;

        let restore = || {
            self.inner.store.upsert_site((*site).clone());
            if let Some(ref cert) = cert {
                self.inner.store.restore_certificate((**cert).clone());
            }
        };

        match result {
            Ok(Sourced {
                value: Some(()),
                mode,
            }) => {
                if let Some(ref cert) = cert {
                    self.inner.feed.remove_for_certificate(&cert.id);
                }
                info!(site = %id, "site delete confirmed");
                Ok(Sourced { value: (), mode })
            }
            // Already gone server-side: the delete is effectively confirmed.
            Err(CoreError::NotFound { .. }) => {
                if let Some(ref cert) = cert {
                    self.inner.feed.remove_for_certificate(&cert.id);
                }
                Ok(Sourced {
                    value: (),
                    mode: DataSourceMode::Live,
                })
            }
            Ok(Sourced { value: None, .. }) => {
                restore();
                Err(CoreError::Network {
                    reason: "backend unreachable -- delete not confirmed".into(),
                })
            }
            Err(e) => {
                restore();
                Err(self.on_error(e))
            }
        }
    }

    /// Run a fresh certificate check for one site.
    ///
    /// Idempotent action: confirms in both modes. Offline, the fallback
    /// provider supplies a deterministic synthetic result.
    pub async fn check_certificate(
        &self,
        site_id: &EntityId,
    ) -> Result<Sourced<Arc<Certificate>>, CoreError> {
        let _guard = self.inner.pending.begin(site_id)?;
        let site = self
            .inner
            .store
            .site_by_id(site_id)
            .ok_or_else(|| CoreError::site_not_found(site_id))?;

        let api = &self.inner.api;
        let result = self
            .inner
            .selector
            .with_source(
                Resource::Certificates,
                || async { api.check_certificate(site_id.as_str()).await.map(Some) },
                || None,
            )
            .await;

        let (cert, mode) = match result {
            Ok(Sourced {
                value: Some(dto),
                mode,
            }) => (Certificate::from(dto), mode),
            Ok(Sourced { value: None, mode }) => (self.inner.fallback.check(&site).await, mode),
            Err(e) => return Err(self.on_error(e)),
        };

        let cert_id = cert.id.clone();
        self.inner.store.upsert_certificate(cert);

        let mut probed = (*site).clone();
        probed.last_checked = Some(Utc::now());
        self.inner.store.upsert_site(probed);

        self.reconcile();
        debug!(site = %site_id, "certificate check confirmed");

        let stored = self
            .inner
            .store
            .certificate_by_id(&cert_id)
            .ok_or_else(|| CoreError::Internal("checked certificate vanished".into()))?;
        Ok(Sourced {
            value: stored,
            mode,
        })
    }

    /// Re-check every tracked certificate. Returns how many were updated.
    pub async fn check_all_certificates(&self) -> Result<Sourced<usize>, CoreError> {
        let api = &self.inner.api;
        let result = self
            .inner
            .selector
            .with_source(
                Resource::Certificates,
                || async { api.check_all_certificates().await.map(Some) },
                || None,
            )
            .await;

        let (count, mode) = match result {
            Ok(Sourced {
                value: Some(dtos),
                mode,
            }) => {
                let count = dtos.len();
                for dto in dtos {
                    self.inner.store.upsert_certificate(Certificate::from(dto));
                }
                (count, mode)
            }
            Ok(Sourced { value: None, mode }) => {
                let sites = self.inner.store.sites();
                for site in sites.iter() {
                    let cert = self.inner.fallback.check(site).await;
                    self.inner.store.upsert_certificate(cert);
                }
                (sites.len(), mode)
            }
            Err(e) => return Err(self.on_error(e)),
        };

        self.reconcile();
        Ok(Sourced { value: count, mode })
    }

    /// Re-check a batch of sites' certificates.
    pub async fn check_certificates(
        &self,
        site_ids: &[EntityId],
    ) -> Result<Sourced<usize>, CoreError> {
        let _guards = site_ids
            .iter()
            .map(|id| self.inner.pending.begin(id))
            .collect::<Result<Vec<_>, _>>()?;

        let api = &self.inner.api;
        let req = CheckBulkRequest {
            site_ids: site_ids.iter().map(ToString::to_string).collect(),
        };
        let result = self
            .inner
            .selector
            .with_source(
                Resource::Certificates,
                || async { api.check_certificates_bulk(&req).await.map(Some) },
                || None,
            )
            .await;

        let (count, mode) = match result {
            Ok(Sourced {
                value: Some(dtos),
                mode,
            }) => {
                let count = dtos.len();
                for dto in dtos {
                    self.inner.store.upsert_certificate(Certificate::from(dto));
                }
                (count, mode)
            }
            Ok(Sourced { value: None, mode }) => {
                let mut count = 0;
                for id in site_ids {
                    if let Some(site) = self.inner.store.site_by_id(id) {
                        let cert = self.inner.fallback.check(&site).await;
                        self.inner.store.upsert_certificate(cert);
                        count += 1;
                    }
                }
                (count, mode)
            }
            Err(e) => return Err(self.on_error(e)),
        };

        self.reconcile();
        Ok(Sourced { value: count, mode })
    }

    /// Dispatch expiry alert emails for a batch of certificates.
    ///
    /// External side effect: requires the live backend. Offline, nothing
    /// is marked and an error is reported.
    pub async fn send_alerts(
        &self,
        certificate_ids: &[EntityId],
    ) -> Result<Sourced<AlertDispatch>, CoreError> {
        let _guards = certificate_ids
            .iter()
            .map(|id| self.inner.pending.begin(id))
            .collect::<Result<Vec<_>, _>>()?;

        let api = &self.inner.api;
        let req = SendAlertsRequest {
            certificate_ids: certificate_ids.iter().map(ToString::to_string).collect(),
            recipients: self.inner.config.alert_recipients.clone(),
        };
        let result = self
            .inner
            .selector
            .with_source(
                Resource::Certificates,
                || async { api.send_alerts(&req).await.map(Some) },
                || None,
            )
            .await;

        match result {
            Ok(Sourced {
                value: Some(dispatch),
                mode,
            }) => {
                let now = Utc::now();
                for id in certificate_ids {
                    if let Some(cert) = self.inner.store.certificate_by_id(id) {
                        let mut updated = (*cert).clone();
                        updated.alert_sent = true;
                        updated.last_alert_at = Some(now);
                        self.inner.store.upsert_certificate(updated);
                    }
                }
                info!(sent = dispatch.sent, failed = dispatch.failed, "alerts dispatched");
                Ok(Sourced {
                    value: AlertDispatch {
                        sent: dispatch.sent,
                        failed: dispatch.failed,
                    },
                    mode,
                })
            }
            Ok(Sourced { value: None, .. }) => Err(CoreError::Network {
                reason: "backend unreachable -- alerts not dispatched".into(),
            }),
            Err(e) => Err(self.on_error(e)),
        }
    }

    // ── Auth ─────────────────────────────────────────────────────────

    /// Authenticate and persist the session.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserProfile, CoreError> {
        let session = self
            .inner
            .api
            .login(email, password)
            .await
            .map_err(CoreError::from)?;

        self.persist_session(&session);
        info!(%email, "logged in");
        Ok(session.user.into())
    }

    /// Create an account and persist the resulting session.
    pub async fn signup(
        &self,
        email: &str,
        password: &SecretString,
        name: Option<&str>,
    ) -> Result<UserProfile, CoreError> {
        let session = self
            .inner
            .api
            .signup(email, password, name)
            .await
            .map_err(CoreError::from)?;

        self.persist_session(&session);
        info!(%email, "account created");
        Ok(session.user.into())
    }

    /// Request a password-reset email.
    pub async fn forgot_password(&self, email: &str) -> Result<(), CoreError> {
        self.inner
            .api
            .forgot_password(email)
            .await
            .map_err(CoreError::from)
    }

    /// Drop the credential and cached profile.
    pub fn logout(&self) {
        self.inner.api.clear_token();
        self.inner.session.remove(keys::TOKEN);
        self.inner.session.remove(keys::USER_PROFILE);
        info!("logged out");
    }

    /// The cached user profile, if a session exists.
    pub fn current_user(&self) -> Option<UserProfile> {
        let json = self.inner.session.get(keys::USER_PROFILE)?;
        serde_json::from_str(&json).ok()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.api.has_token()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Regenerate the notification feed from current store snapshots.
    /// Returns how many notifications this pass emitted.
    fn reconcile(&self) -> usize {
        let sites = self.inner.store.sites();
        let certificates = self.inner.store.certificates();
        self.inner.feed.reconcile(&sites, &certificates).len()
    }

    fn stored_site(&self, id: &EntityId) -> Result<Arc<Site>, CoreError> {
        self.inner
            .store
            .site_by_id(id)
            .ok_or_else(|| CoreError::Internal("stored site vanished".into()))
    }

    fn persist_session(&self, session: &sitewatch_api::types::SessionDto) {
        self.inner.session.set(keys::TOKEN, &session.token);
        if let Ok(json) = serde_json::to_string(&session.user) {
            self.inner.session.set(keys::USER_PROFILE, &json);
        }
        self.inner
            .api
            .set_token(SecretString::from(session.token.clone()));
    }

    /// Session-expired responses clear the cached credential so the UI
    /// can redirect to login instead of silently retrying.
    fn on_error(&self, err: CoreError) -> CoreError {
        if matches!(err, CoreError::Auth { .. }) {
            warn!("authentication failure -- clearing cached session");
            self.inner.api.clear_token();
            self.inner.session.remove(keys::TOKEN);
            self.inner.session.remove(keys::USER_PROFILE);
        }
        err
    }
}
