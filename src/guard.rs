use crate::config::Config;
use crate::models::user::Role;
use crate::navigator::Navigator;
use crate::notify::Notifier;
use crate::services::session::AuthState;

/// The routing decision for a guarded view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Session state is indeterminate; render a placeholder, do not redirect.
    Loading,
    /// No authenticated user; send to the login entry point.
    RedirectToLogin,
    /// Authenticated but the role is not permitted for this view.
    RedirectToUnauthorized,
    /// Render the guarded children.
    Allow,
}

/// Gates a protected view on the current session's role.
///
/// Role comparison is over the closed [`Role`] enum; an unresolvable role
/// was already normalized to `Student` upstream, so a gate that does not
/// include `Student` correctly excludes it.
#[derive(Debug, Clone)]
pub struct RoleGate {
    allowed: Option<Vec<Role>>,
}

impl RoleGate {
    /// A gate that only requires an authenticated user.
    pub fn any_role() -> Self {
        Self { allowed: None }
    }

    /// A gate permitting only the given roles.
    pub fn allowing(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: Some(roles.into_iter().collect()),
        }
    }

    /// Decides what a guarded view should do for the given snapshot.
    pub fn evaluate(&self, state: &AuthState) -> GateDecision {
        if state.loading {
            return GateDecision::Loading;
        }
        let Some(user) = &state.user else {
            return GateDecision::RedirectToLogin;
        };
        if let Some(allowed) = &self.allowed
            && !allowed.contains(&user.role)
        {
            return GateDecision::RedirectToUnauthorized;
        }
        GateDecision::Allow
    }

    /// Evaluates the gate and performs its side effects: the permission
    /// notification and the history-replacing redirect.
    pub fn enforce(
        &self,
        state: &AuthState,
        notifier: &dyn Notifier,
        navigator: &dyn Navigator,
        config: &Config,
    ) -> GateDecision {
        let decision = self.evaluate(state);
        match decision {
            GateDecision::RedirectToLogin => {
                tracing::debug!("🔐 No authenticated user, redirecting to login");
                navigator.replace(&config.login_path);
            }
            GateDecision::RedirectToUnauthorized => {
                let role = state.user.as_ref().map(|u| u.role.as_str()).unwrap_or("none");
                tracing::warn!("❌ Role {} not permitted for this view", role);
                notifier.notify_error("You don't have permission to access this page");
                navigator.replace(&config.unauthorized_path);
            }
            GateDecision::Loading | GateDecision::Allow => {}
        }
        decision
    }
}
