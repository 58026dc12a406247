// ── Session store abstraction ──
//
// Opaque key/value persistence for the bearer token and cached user
// profile. The engine never assumes how the storage is implemented, only
// that get/set/remove are synchronous and available. sitewatch-config
// ships a keyring-backed implementation; tests use the in-memory one.

use std::collections::HashMap;
use std::sync::RwLock;

/// Well-known session keys.
pub mod keys {
    /// Bearer token for the backend API.
    pub const TOKEN: &str = "token";
    /// Cached user profile (JSON), kept so the UI can render the account
    /// without a round trip.
    pub const USER_PROFILE: &str = "user-profile";
}

/// Synchronous opaque key/value store for session state.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory session store. Nothing survives the process -- used by tests
/// and by shells that opt out of persistent sessions.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .expect("session lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .expect("session lock poisoned")
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.values
            .write()
            .expect("session lock poisoned")
            .remove(key);
    }
}
