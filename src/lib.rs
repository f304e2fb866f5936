//! Headless core of the campus management application: the session
//! lifecycle and role-authorization state machine, and the attendance
//! reconciliation workflow. Persistence, auth, and navigation are injected
//! through the traits in [`store`], [`issuer`], [`local_store`],
//! [`notify`], and [`navigator`]; [`memory`] provides hermetic reference
//! implementations of all of them.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use campus_core::config::Config;
//! use campus_core::memory::{MemoryIssuer, MemoryLocalStore, MemoryNavigator, MemoryStore};
//! use campus_core::notify::TracingNotifier;
//! use campus_core::SessionManager;
//!
//! # #[tokio::main]
//! # async fn main() {
//! campus_core::init_tracing();
//! let local = Arc::new(MemoryLocalStore::new());
//! let manager = SessionManager::new(
//!     Arc::new(MemoryIssuer::new(local.clone())),
//!     Arc::new(MemoryStore::new()),
//!     local,
//!     Arc::new(TracingNotifier),
//!     Arc::new(MemoryNavigator::new()),
//!     Config::default(),
//! );
//! manager.initialize().await;
//! # }
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod error;
pub mod guard;
pub mod issuer;
pub mod local_store;
pub mod memory;
pub mod navigator;
pub mod notify;
pub mod store;

pub mod models {
    pub mod attendance;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod attendance;
    pub mod faculty;
    pub mod profile;
    pub(crate) mod row;
    pub mod student;
}

pub mod services {
    pub mod attendance;
    pub mod session;
}

pub mod validation {
    pub mod auth;
}

pub use config::Config;
pub use error::{AppError, Result};
pub use guard::{GateDecision, RoleGate};
pub use models::attendance::{AttendanceMark, AttendanceStatus, PeriodSession};
pub use models::session::{AuthUser, Session};
pub use models::user::{ResolvedUser, Role, Student};
pub use services::attendance::{AttendanceWorkflow, PeriodMode, SubmitOutcome};
pub use services::session::{AuthState, SessionManager};
pub use validation::auth::SignInRequest;

/// Installs the tracing subscriber used across the application.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
