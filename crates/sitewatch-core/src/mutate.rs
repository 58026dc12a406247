// ── Mutation coordination primitives ──
//
// Pre-mutation validation and the per-identifier busy guard. The state
// machine itself (optimistic apply -> confirm or rollback) lives in the
// engine's mutation entry points; this module supplies the pieces that
// keep it honest: nothing invalid reaches the network path, and no two
// mutations race on the same entity.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use url::Url;

use crate::error::CoreError;
use crate::model::EntityId;

// ── Mutation inputs ──────────────────────────────────────────────────

/// Input for an add-site mutation, as typed by the user.
#[derive(Debug, Clone)]
pub struct NewSite {
    pub name: String,
    pub url: String,
}

/// Partial update for an edit-site mutation.
#[derive(Debug, Clone, Default)]
pub struct SiteChanges {
    pub name: Option<String>,
    pub url: Option<String>,
    pub active: Option<bool>,
}

// ── Validation ───────────────────────────────────────────────────────

/// Normalize and validate a user-supplied site URL.
///
/// Scheme-less input ("example.com") is promoted to https. Rejects empty
/// input and anything `url` cannot parse into a host-bearing http(s) URL.
pub(crate) fn normalize_url(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation {
            field: "url".into(),
            reason: "must not be empty".into(),
        });
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&candidate).map_err(|e| CoreError::Validation {
        field: "url".into(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(CoreError::Validation {
            field: "url".into(),
            reason: format!("not a valid http(s) URL: {trimmed}"),
        });
    }

    Ok(parsed.to_string())
}

pub(crate) fn validate_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation {
            field: "name".into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(trimmed.to_owned())
}

impl NewSite {
    /// Validate into (name, normalized url). Runs before any optimistic
    /// apply or network call.
    pub(crate) fn validated(&self) -> Result<(String, String), CoreError> {
        Ok((validate_name(&self.name)?, normalize_url(&self.url)?))
    }
}

impl SiteChanges {
    /// Validate the fields that are present, normalizing the URL.
    pub(crate) fn validated(&self) -> Result<Self, CoreError> {
        Ok(Self {
            name: self.name.as_deref().map(validate_name).transpose()?,
            url: self.url.as_deref().map(normalize_url).transpose()?,
            active: self.active,
        })
    }
}

// ── Busy guard ───────────────────────────────────────────────────────

/// Identifier -> pending-flag map enforcing "at most one in-flight
/// mutation per entity". Not a lock: there is no preemption inside a
/// store mutation, only across network awaits.
#[derive(Default)]
pub(crate) struct PendingMutations {
    in_flight: DashMap<EntityId, ()>,
}

impl PendingMutations {
    /// Claim an identifier. Fails synchronously with `Busy` if a mutation
    /// for it is already in flight; the claim is released when the
    /// returned guard drops.
    pub(crate) fn begin(&self, id: &EntityId) -> Result<PendingGuard<'_>, CoreError> {
        match self.in_flight.entry(id.clone()) {
            Entry::Occupied(_) => Err(CoreError::Busy { id: id.to_string() }),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(PendingGuard {
                    map: &self.in_flight,
                    id: id.clone(),
                })
            }
        }
    }
}

/// RAII claim on an entity identifier; releases on drop, so every exit
/// path (confirm, rollback, error) clears the pending flag.
pub(crate) struct PendingGuard<'a> {
    map: &'a DashMap<EntityId, ()>,
    id: EntityId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.id);
    }
}
