use anyhow::{Context, Result};
use std::env;

/// The default staleness horizon, in hours past expiry.
const DEFAULT_STALE_HOURS: i64 = 24;
/// The default hard ceiling for session initialization, in seconds.
const DEFAULT_INIT_TIMEOUT_SECS: u64 = 5;

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Hours past `expires_at` after which a persisted session is stale.
    pub session_stale_hours: i64,
    /// Hard ceiling for session initialization before force-clearing.
    pub init_timeout_secs: u64,
    /// The login entry point users are sent to when unauthenticated.
    pub login_path: String,
    /// The page users are sent to on a role mismatch.
    pub unauthorized_path: String,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            session_stale_hours: env::var("SESSION_STALE_HOURS")
                .unwrap_or_else(|_| DEFAULT_STALE_HOURS.to_string())
                .parse()
                .context("Invalid SESSION_STALE_HOURS")?,
            init_timeout_secs: env::var("AUTH_INIT_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_INIT_TIMEOUT_SECS.to_string())
                .parse()
                .context("Invalid AUTH_INIT_TIMEOUT_SECS")?,
            login_path: env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
            unauthorized_path: env::var("UNAUTHORIZED_PATH")
                .unwrap_or_else(|_| "/unauthorized".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_stale_hours: DEFAULT_STALE_HOURS,
            init_timeout_secs: DEFAULT_INIT_TIMEOUT_SECS,
            login_path: "/login".to_string(),
            unauthorized_path: "/unauthorized".to_string(),
        }
    }
}
