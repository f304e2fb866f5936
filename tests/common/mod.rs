#![allow(dead_code)]

use std::sync::Arc;

use campus_core::config::Config;
use campus_core::memory::{
    BufferNotifier, MemoryIssuer, MemoryLocalStore, MemoryNavigator, MemoryStore,
};
use campus_core::models::session::AuthUser;
use campus_core::services::session::SessionManager;
use campus_core::store::collections;
use once_cell::sync::Lazy;
use serde_json::json;
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    campus_core::init_tracing();
});

/// Shared backend context: every port wired to its in-memory
/// implementation.
pub struct TestBackend {
    pub store: Arc<MemoryStore>,
    pub local: Arc<MemoryLocalStore>,
    pub issuer: Arc<MemoryIssuer>,
    pub notifier: Arc<BufferNotifier>,
    pub navigator: Arc<MemoryNavigator>,
}

impl TestBackend {
    pub fn new() -> Self {
        Lazy::force(&TRACING);
        let local = Arc::new(MemoryLocalStore::new());
        Self {
            store: Arc::new(MemoryStore::new()),
            issuer: Arc::new(MemoryIssuer::new(local.clone())),
            local,
            notifier: Arc::new(BufferNotifier::new()),
            navigator: Arc::new(MemoryNavigator::new()),
        }
    }

    pub fn manager(&self) -> SessionManager {
        SessionManager::new(
            self.issuer.clone(),
            self.store.clone(),
            self.local.clone(),
            self.notifier.clone(),
            self.navigator.clone(),
            Config::default(),
        )
    }

    /// Registers a faculty principal with its profile and detail rows.
    pub fn seed_faculty_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
        abbreviation: &str,
    ) -> AuthUser {
        let user = self.issuer.register_user(email, password);
        self.store.seed(
            collections::PROFILES,
            vec![json!({
                "user_id": user.id.to_string(),
                "role": "faculty",
                "name": name,
            })],
        );
        self.store.seed(
            collections::FACULTY,
            vec![json!({
                "user_id": user.id.to_string(),
                "branch": "CSE",
                "abbreviation": abbreviation,
                "status": "active",
            })],
        );
        user
    }

    /// Registers a student principal with its profile and detail rows.
    pub fn seed_student_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
        roll_no: &str,
        semester: u8,
    ) -> AuthUser {
        let user = self.issuer.register_user(email, password);
        self.store.seed(
            collections::PROFILES,
            vec![json!({
                "user_id": user.id.to_string(),
                "role": "student",
                "name": name,
            })],
        );
        self.store.seed(
            collections::STUDENTS,
            vec![json!({
                "user_id": user.id.to_string(),
                "name": name,
                "roll_no": roll_no,
                "semester": semester as i64,
            })],
        );
        user
    }

    /// Seeds one roster student, returning its record id.
    pub fn seed_roster_student(&self, semester: u8, roll_no: &str, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.store.seed(
            collections::STUDENTS,
            vec![json!({
                "id": id.to_string(),
                "user_id": Uuid::new_v4().to_string(),
                "name": name,
                "roll_no": roll_no,
                "semester": semester as i64,
            })],
        );
        id
    }

    /// Seeds a persisted attendance mark.
    pub fn seed_mark(&self, date: &str, period: u8, student_id: Uuid, status: &str, author: &str) {
        self.store.seed(
            collections::ATTENDANCE,
            vec![json!({
                "date": date,
                "period": period as i64,
                "student_id": student_id.to_string(),
                "status": status,
                "faculty_abbreviation": author,
            })],
        );
    }

    /// Rows currently persisted for `(date, period)`.
    pub fn marks_on(&self, date: &str, period: u8) -> Vec<serde_json::Value> {
        self.store
            .rows(collections::ATTENDANCE)
            .into_iter()
            .filter(|row| {
                row.get("date").and_then(|v| v.as_str()) == Some(date)
                    && row.get("period").and_then(|v| v.as_u64()) == Some(period as u64)
            })
            .collect()
    }
}
