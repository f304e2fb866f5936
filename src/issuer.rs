use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::models::session::{AuthUser, Session};

/// A lifecycle event emitted by the auth issuer.
///
/// These arrive out-of-band as well: another tab signing out or an expired
/// refresh token both surface as `SignedOut` here.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// A new session was established; carries the session to adopt.
    SignedIn(Session),
    /// The session ended, whatever triggered it.
    SignedOut,
    /// The access token was refreshed; carries the replacement session.
    TokenRefreshed(Session),
}

/// The external authentication service issuing bearer-token sessions.
#[async_trait]
pub trait AuthIssuer: Send + Sync {
    /// Returns the persisted session, if one exists.
    async fn get_current_session(&self) -> Result<Option<Session>>;

    /// Re-fetches the authoritative user record for the current session.
    async fn get_current_user(&self) -> Result<Option<AuthUser>>;

    /// Authenticates with email and password, establishing a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Revokes the current session with the issuer.
    async fn sign_out(&self) -> Result<()>;

    /// Subscribes to the issuer's lifecycle event stream.
    fn events(&self) -> broadcast::Receiver<AuthEvent>;
}
