// ── Account profile ──

use serde::{Deserialize, Serialize};

/// Cached user profile, persisted in the session store so the dashboard
/// can render the account without a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}
