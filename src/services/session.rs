use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use zeroize::Zeroize;

use crate::config::Config;
use crate::error::Result;
use crate::issuer::{AuthEvent, AuthIssuer};
use crate::local_store::LocalStore;
use crate::models::session::{AuthUser, Session};
use crate::models::user::{ResolvedUser, Role, RoleDetail};
use crate::navigator::Navigator;
use crate::notify::Notifier;
use crate::repositories::{faculty, profile, student};
use crate::store::RecordStore;
use crate::validation::auth::{SignInRequest, validate_sign_in};

/// Key under which the last successful session validation is persisted.
pub const LAST_VALID_AUTH_KEY: &str = "campus.auth.last_valid";

/// Substrings identifying locally persisted keys in the auth namespace.
/// Matched rather than enumerated so unknown future keys are still swept.
const AUTH_KEY_MARKERS: [&str; 3] = ["auth", "session", "token"];

/// The session snapshot broadcast to every consumer.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    /// The enriched principal, when authenticated.
    pub user: Option<ResolvedUser>,
    /// The issuer session backing the principal.
    pub session: Option<Session>,
    /// True during initialization, sign-in, and role enrichment.
    pub loading: bool,
}

struct Inner {
    issuer: Arc<dyn AuthIssuer>,
    store: Arc<dyn RecordStore>,
    local: Arc<dyn LocalStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    config: Config,
    state_tx: watch::Sender<AuthState>,
    init_attempted: AtomicBool,
}

/// Owns the current session and derived user state.
///
/// Single writer, many readers: consumers hold a read-only snapshot (or a
/// watch subscription) and may only mutate session state through the
/// manager's own methods or its event handler. Cheap to clone; clones share
/// the same state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Creates a new `SessionManager`.
    ///
    /// # Arguments
    ///
    /// * `issuer` - The external authentication service.
    /// * `store` - The record store holding profile and role-detail rows.
    /// * `local` - The client-side persistence surface.
    /// * `notifier` - The user-facing notification sink.
    /// * `navigator` - The host's navigation surface.
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// The manager, in the loading state until [`Self::initialize`] settles.
    pub fn new(
        issuer: Arc<dyn AuthIssuer>,
        store: Arc<dyn RecordStore>,
        local: Arc<dyn LocalStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: Config,
    ) -> Self {
        let (state_tx, _) = watch::channel(AuthState {
            user: None,
            session: None,
            loading: true,
        });
        Self {
            inner: Arc::new(Inner {
                issuer,
                store,
                local,
                notifier,
                navigator,
                config,
                state_tx,
                init_attempted: AtomicBool::new(false),
            }),
        }
    }

    /// The current state snapshot.
    pub fn state(&self) -> AuthState {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribes to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state_tx.subscribe()
    }

    fn settle(&self, user: Option<ResolvedUser>, session: Option<Session>) {
        self.inner.state_tx.send_replace(AuthState {
            user,
            session,
            loading: false,
        });
    }

    fn set_loading(&self) {
        self.inner.state_tx.send_modify(|state| state.loading = true);
    }

    /// Establishes session state from the issuer's persisted session.
    ///
    /// Runs at most once per application load regardless of how many
    /// consumers call it concurrently. A safety timer races the real path:
    /// if initialization has not settled by the deadline the state is
    /// force-cleared, and the timer re-checks `loading` before acting so a
    /// late timeout never overrides an already-settled result.
    pub async fn initialize(&self) {
        if self.inner.init_attempted.swap(true, Ordering::SeqCst) {
            tracing::debug!("Session initialization already attempted");
            return;
        }
        tracing::info!("🔐 Initializing session state...");

        let watchdog = self.clone();
        tokio::spawn(async move {
            let ceiling = watchdog.inner.config.init_timeout_secs;
            tokio::time::sleep(Duration::from_secs(ceiling)).await;
            if watchdog.state().loading {
                tracing::warn!(
                    "❌ Session initialization still pending after {}s, force-clearing",
                    ceiling
                );
                watchdog.force_clear_stale_session();
            }
        });

        let session = match self.inner.issuer.get_current_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("❌ Failed to read persisted session, treating as stale: {}", e);
                self.force_clear_stale_session();
                return;
            }
        };

        let Some(session) = session else {
            tracing::debug!("No persisted session found");
            self.settle(None, None);
            return;
        };

        let now = Utc::now();
        if session.is_stale(now, self.inner.config.session_stale_hours) {
            tracing::warn!(
                "🧹 Persisted session expired {}h ago (limit {}h), clearing",
                session.hours_past_expiry(now),
                self.inner.config.session_stale_hours
            );
            self.force_clear_stale_session();
            return;
        }

        // Re-validate the principal with the issuer rather than trusting
        // the cached session record.
        let auth_user = match self.inner.issuer.get_current_user().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("❌ Issuer no longer recognizes this principal, clearing");
                self.force_clear_stale_session();
                return;
            }
            Err(e) => {
                tracing::warn!("❌ Principal re-validation failed, clearing: {}", e);
                self.force_clear_stale_session();
                return;
            }
        };

        let user = self.resolve_user(&auth_user).await;
        self.touch_last_valid_auth();
        self.settle(Some(user), Some(session));
        tracing::info!("✅ Session initialized");
    }

    /// Authenticates against the issuer and settles the enriched state.
    ///
    /// On failure the issuer's message is surfaced as a notification, state
    /// settles unauthenticated, and the error is re-thrown to the caller.
    pub async fn sign_in(&self, request: SignInRequest) -> Result<()> {
        validate_sign_in(&request)?;
        tracing::info!("🔐 Sign-in attempt: {}", request.email);
        if request.remember_me {
            // UI affordance only; token lifetime is owned by the issuer.
            tracing::debug!("remember_me accepted without effect on token lifetime");
        }
        self.set_loading();

        let SignInRequest {
            email,
            mut password,
            ..
        } = request;
        let outcome = self.inner.issuer.sign_in_with_password(&email, &password).await;
        password.zeroize();

        match outcome {
            Ok(session) => {
                let user = self.resolve_user(&session.user).await;
                self.touch_last_valid_auth();
                self.settle(Some(user), Some(session));
                self.inner.notifier.notify_success("Login successful!");
                tracing::info!("✅ User signed in: {}", email);
                Ok(())
            }
            Err(e) => {
                self.settle(None, None);
                self.inner.notifier.notify_error(&e.to_string());
                tracing::warn!("❌ Sign-in failed for {}: {}", email, e);
                Err(e)
            }
        }
    }

    /// Ends the session and hard-navigates to the login entry point.
    ///
    /// The remote revoke is best-effort: local state is cleared and the
    /// redirect happens even if the issuer call fails, because a logout
    /// intent must never leave a valid-looking local session behind.
    pub async fn sign_out(&self) {
        tracing::info!("👋 Sign-out requested");
        if let Err(e) = self.inner.issuer.sign_out().await {
            tracing::warn!("Issuer revoke failed during sign-out (ignored): {}", e);
        }
        self.clear_all_auth_data();
        self.settle(None, None);
        tracing::info!("✅ User signed out");
        self.inner.navigator.hard_redirect(&self.inner.config.login_path);
    }

    /// Re-runs role/profile enrichment for the current principal.
    ///
    /// No-ops when there is no session.
    pub async fn refresh_user(&self) {
        let snapshot = self.state();
        let Some(session) = snapshot.session else {
            tracing::debug!("refresh_user without a session is a no-op");
            return;
        };
        self.set_loading();
        let user = self.resolve_user(&session.user).await;
        self.settle(Some(user), Some(session));
    }

    /// Unconditionally clears all auth state and, unless already on an
    /// unauthenticated-allowed page, redirects to login.
    pub fn force_clear_stale_session(&self) {
        tracing::warn!("🧹 Force-clearing session state");
        self.clear_all_auth_data();
        self.settle(None, None);
        if !self.inner.navigator.on_public_page() {
            self.inner.navigator.hard_redirect(&self.inner.config.login_path);
        }
    }

    /// Reacts to an issuer lifecycle event.
    pub async fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedOut => {
                // Covers out-of-band sign-out: another tab, or an expired
                // refresh token.
                tracing::info!("👋 Issuer reported sign-out");
                self.clear_all_auth_data();
                self.settle(None, None);
            }
            AuthEvent::SignedIn(session) => {
                tracing::info!("🔑 Issuer reported sign-in");
                let user = self.resolve_user(&session.user).await;
                self.touch_last_valid_auth();
                self.settle(Some(user), Some(session));
            }
            AuthEvent::TokenRefreshed(session) => {
                tracing::debug!("🔑 Access token refreshed");
                self.touch_last_valid_auth();
                // The resolved user is unchanged; only the session rotates.
                self.inner
                    .state_tx
                    .send_modify(|state| state.session = Some(session));
            }
        }
    }

    /// Consumes the issuer's event stream on a background task.
    pub fn spawn_event_listener(&self) -> JoinHandle<()> {
        let manager = self.clone();
        let mut events = manager.inner.issuer.events();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => manager.handle_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Auth event listener lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Enriches an issuer principal into a `ResolvedUser`.
    ///
    /// Enrichment failures degrade to the default student principal rather
    /// than failing the session; they are logged, never surfaced as
    /// blocking errors.
    async fn resolve_user(&self, auth: &AuthUser) -> ResolvedUser {
        match self.try_resolve(auth).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(
                    "Profile enrichment failed for {}, degrading to default role: {}",
                    auth.email,
                    e
                );
                ResolvedUser::fallback(auth.id, &auth.email)
            }
        }
    }

    async fn try_resolve(&self, auth: &AuthUser) -> Result<ResolvedUser> {
        let store = self.inner.store.as_ref();
        let Some(profile) = profile::find_by_user_id(store, &auth.id).await? else {
            tracing::debug!("No profile row for {}, using default role", auth.email);
            return Ok(ResolvedUser::fallback(auth.id, &auth.email));
        };

        let role = Role::from_raw(&profile.role);
        let detail = match role {
            Role::Student => student::find_detail_by_user_id(store, &auth.id)
                .await?
                .map(RoleDetail::Student)
                .unwrap_or(RoleDetail::None),
            Role::Faculty => faculty::find_detail_by_user_id(store, &auth.id)
                .await?
                .map(RoleDetail::Faculty)
                .unwrap_or(RoleDetail::None),
            Role::Admin | Role::Staff => RoleDetail::None,
        };

        Ok(ResolvedUser {
            id: auth.id,
            email: auth.email.clone(),
            role,
            name: profile.name,
            avatar_url: profile.avatar_url,
            detail,
        })
    }

    /// Sweeps every locally persisted artifact in the auth namespace:
    /// matching durable keys, all volatile storage, and matching cookies
    /// (expired with root path scope).
    fn clear_all_auth_data(&self) {
        for key in self.inner.local.keys() {
            if in_auth_namespace(&key) {
                self.inner.local.remove(&key);
            }
        }
        self.inner.local.clear_volatile();
        for name in self.inner.local.cookie_names() {
            if in_auth_namespace(&name) {
                self.inner.local.expire_cookie(&name);
            }
        }
        tracing::debug!("🧹 Local auth artifacts cleared");
    }

    fn touch_last_valid_auth(&self) {
        self.inner
            .local
            .set(LAST_VALID_AUTH_KEY, &Utc::now().timestamp().to_string());
    }
}

fn in_auth_namespace(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    AUTH_KEY_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_namespace_matches_by_substring() {
        assert!(in_auth_namespace(LAST_VALID_AUTH_KEY));
        assert!(in_auth_namespace("sb-access-token"));
        assert!(in_auth_namespace("my-app-session-cache"));
        assert!(!in_auth_namespace("theme-preference"));
    }
}
