use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The raw principal record carried inside an issuer session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// The issuer-assigned principal id.
    pub id: Uuid,
    /// The principal's email address.
    pub email: String,
}

/// Represents the client's belief about the current authenticated principal.
///
/// A session is either absent (no principal) or carries a well-defined
/// `expires_at`. A session whose expiry is further in the past than the
/// configured staleness horizon must never be used to authorize requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The opaque bearer token.
    pub access_token: String,
    /// The opaque refresh token.
    pub refresh_token: String,
    /// The timestamp when the access token expires.
    pub expires_at: DateTime<Utc>,
    /// The raw auth-provider user record.
    pub user: AuthUser,
}

impl Session {
    /// Whether this session expired more than `stale_hours` ago.
    ///
    /// # Arguments
    ///
    /// * `now` - The current wall-clock time.
    /// * `stale_hours` - The staleness horizon in hours.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_hours: i64) -> bool {
        now - self.expires_at > Duration::hours(stale_hours)
    }

    /// Hours elapsed since this session expired; negative while still valid.
    pub fn hours_past_expiry(&self, now: DateTime<Utc>) -> i64 {
        (now - self.expires_at).num_hours()
    }
}
