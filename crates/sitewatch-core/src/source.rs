// ── Source selection ──
//
// THE one place where live-vs-fallback policy lives: one probe per
// refresh cycle, one timeout, one error classification. Callers hand in
// a live call and a fallback thunk and get displayable data either way.
//
// Auth failures are the deliberate exception: they are surfaced instead
// of masked, because they mean the user has to act, not that the backend
// is down.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use sitewatch_api::ApiClient;

use crate::error::CoreError;

/// Which source satisfied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceMode {
    Live,
    Fallback,
}

/// Logical datasets with independently tracked source modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Sites,
    Certificates,
}

/// A value together with the source that produced it.
#[derive(Debug, Clone)]
pub struct Sourced<T> {
    pub value: T,
    pub mode: DataSourceMode,
}

/// Decides, per logical resource, whether to go through the live backend
/// or the local fallback snapshot.
///
/// Mode is never sticky: [`reset`](Self::reset) runs at the top of every
/// refresh cycle, so a recovered backend is picked up on the next
/// user-initiated or action-triggered refresh.
pub struct SourceSelector {
    api: Arc<ApiClient>,
    modes: DashMap<Resource, DataSourceMode>,
    /// Probe result cached for the current refresh cycle.
    probe_cache: Mutex<Option<bool>>,
}

impl SourceSelector {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            modes: DashMap::new(),
            probe_cache: Mutex::new(None),
        }
    }

    /// Forget cached modes and the probe result. Called at the top of
    /// every refresh so each cycle re-evaluates reachability.
    pub fn reset(&self) {
        self.modes.clear();
        if let Ok(mut cache) = self.probe_cache.try_lock() {
            *cache = None;
        }
    }

    /// The mode last recorded for a resource, if any call touched it
    /// this cycle.
    pub fn mode(&self, resource: Resource) -> Option<DataSourceMode> {
        self.modes.get(&resource).map(|r| *r.value())
    }

    /// Run `live` against the backend if it is reachable and we hold a
    /// credential; otherwise (or on a network-class failure) substitute
    /// `fallback`. Never errors for a plain network failure -- the caller
    /// always receives displayable data. Auth failures propagate.
    pub async fn with_source<T, L, Fut, F>(
        &self,
        resource: Resource,
        live: L,
        fallback: F,
    ) -> Result<Sourced<T>, CoreError>
    where
        L: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, sitewatch_api::Error>>,
        F: FnOnce() -> T,
    {
        // No credential at all: demo mode, no point probing.
        if !self.api.has_token() {
            debug!(?resource, "no credential -- using fallback data");
            return Ok(self.substitute(resource, fallback));
        }

        if !self.probe().await {
            debug!(?resource, "backend unreachable -- using fallback data");
            return Ok(self.substitute(resource, fallback));
        }

        match live().await {
            Ok(value) => {
                self.modes.insert(resource, DataSourceMode::Live);
                Ok(Sourced {
                    value,
                    mode: DataSourceMode::Live,
                })
            }
            Err(e) if e.is_auth() => Err(CoreError::from(e)),
            Err(e) if e.is_network() || e.is_server_error() => {
                warn!(?resource, error = %e, "live call failed -- using fallback data");
                Ok(self.substitute(resource, fallback))
            }
            Err(e) => Err(CoreError::from(e)),
        }
    }

    /// Probe once per cycle; concurrent callers share the cached result.
    async fn probe(&self) -> bool {
        let mut cache = self.probe_cache.lock().await;
        if let Some(reachable) = *cache {
            return reachable;
        }
        let reachable = self.api.probe().await;
        *cache = Some(reachable);
        reachable
    }

    fn substitute<T>(&self, resource: Resource, fallback: impl FnOnce() -> T) -> Sourced<T> {
        self.modes.insert(resource, DataSourceMode::Fallback);
        Sourced {
            value: fallback(),
            mode: DataSourceMode::Fallback,
        }
    }
}
