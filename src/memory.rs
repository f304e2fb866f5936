//! In-memory implementations of every external interface, used by the test
//! suite and by hosts that need a hermetic environment.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::issuer::{AuthEvent, AuthIssuer};
use crate::local_store::LocalStore;
use crate::models::session::{AuthUser, Session};
use crate::navigator::Navigator;
use crate::notify::Notifier;
use crate::store::{Filter, RecordStore};

/// Key under which the issuer client persists its session blob.
pub const SESSION_BLOB_KEY: &str = "campus.auth.session";

struct FailRule {
    collection: String,
    field: String,
    value: Value,
}

/// An in-memory record store with injectable write failures.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    fail_rules: Mutex<Vec<FailRule>>,
    fail_reads: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds rows into a collection, assigning ids where absent.
    pub fn seed(&self, collection: &str, rows: Vec<Value>) {
        let mut guard = self.collections.lock().unwrap();
        let stored = guard.entry(collection.to_string()).or_default();
        for mut row in rows {
            if let Some(obj) = row.as_object_mut()
                && !obj.contains_key("id")
            {
                obj.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
            }
            stored.push(row);
        }
    }

    /// Makes every write touching a row whose `field` equals `value` in
    /// `collection` fail with a store error.
    pub fn fail_when(&self, collection: &str, field: &str, value: impl Into<Value>) {
        self.fail_rules.lock().unwrap().push(FailRule {
            collection: collection.to_string(),
            field: field.to_string(),
            value: value.into(),
        });
    }

    /// Makes every read from `collection` fail with a store error.
    pub fn fail_reads_for(&self, collection: &str) {
        self.fail_reads.lock().unwrap().insert(collection.to_string());
    }

    /// A snapshot of every row currently in `collection`.
    pub fn rows(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn write_blocked(&self, collection: &str, row: &Value) -> bool {
        self.fail_rules
            .lock()
            .unwrap()
            .iter()
            .any(|rule| rule.collection == collection && row.get(&rule.field) == Some(&rule.value))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        if self.fail_reads.lock().unwrap().contains(collection) {
            return Err(AppError::Store("injected read failure".to_string()));
        }
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, mut row: Value) -> Result<Value> {
        if self.write_blocked(collection, &row) {
            return Err(AppError::Store("injected write failure".to_string()));
        }
        let obj = row
            .as_object_mut()
            .ok_or_else(|| AppError::Store("row must be a JSON object".to_string()))?;
        if !obj.contains_key("id") {
            obj.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
        }
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, collection: &str, id: &Uuid, patch: Value) -> Result<Value> {
        let id = id.to_string();
        let mut guard = self.collections.lock().unwrap();
        let rows = guard.get_mut(collection).ok_or(AppError::NotFound)?;
        let row = rows
            .iter_mut()
            .find(|r| r.get("id").and_then(|v| v.as_str()) == Some(id.as_str()))
            .ok_or(AppError::NotFound)?;
        if self.write_blocked(collection, row) || self.write_blocked(collection, &patch) {
            return Err(AppError::Store("injected write failure".to_string()));
        }
        let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) else {
            return Err(AppError::Store("patch must be a JSON object".to_string()));
        };
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
        Ok(row.clone())
    }
}

/// An in-memory auth issuer. The persisted session blob lives in the local
/// store under [`SESSION_BLOB_KEY`], owned by this client, and is swept
/// along with the rest of the auth namespace on clear.
pub struct MemoryIssuer {
    local: Arc<dyn LocalStore>,
    credentials: Mutex<HashMap<String, (String, AuthUser)>>,
    current_user: Mutex<Option<AuthUser>>,
    session_ttl: Duration,
    events_tx: broadcast::Sender<AuthEvent>,
    fail_get_session: AtomicBool,
    fail_get_user: AtomicBool,
    fail_sign_out: AtomicBool,
    hang_get_session: AtomicBool,
}

impl MemoryIssuer {
    pub fn new(local: Arc<dyn LocalStore>) -> Self {
        let (events_tx, _) = broadcast::channel(16);
        Self {
            local,
            credentials: Mutex::new(HashMap::new()),
            current_user: Mutex::new(None),
            session_ttl: Duration::hours(1),
            events_tx,
            fail_get_session: AtomicBool::new(false),
            fail_get_user: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            hang_get_session: AtomicBool::new(false),
        }
    }

    /// Registers a principal that can sign in with `password`.
    pub fn register_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
        };
        self.credentials
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    /// Persists a session for `user` expiring at `expires_at`, as if left
    /// behind by an earlier application load.
    pub fn seed_session(&self, user: &AuthUser, expires_at: DateTime<Utc>) -> Session {
        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Uuid::new_v4().to_string(),
            expires_at,
            user: user.clone(),
        };
        if let Err(e) = self.persist_session(&session) {
            tracing::error!("{}", e);
        }
        *self.current_user.lock().unwrap() = Some(user.clone());
        session
    }

    /// Emits a lifecycle event to every subscriber.
    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events_tx.send(event);
    }

    pub fn set_fail_get_session(&self, fail: bool) {
        self.fail_get_session.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_get_user(&self, fail: bool) {
        self.fail_get_user.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Makes `get_current_session` hang far past any init deadline.
    pub fn set_hang_get_session(&self, hang: bool) {
        self.hang_get_session.store(hang, Ordering::SeqCst);
    }

    fn persist_session(&self, session: &Session) -> Result<()> {
        let blob = sonic_rs::to_string(session)
            .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;
        self.local.set(SESSION_BLOB_KEY, &blob);
        Ok(())
    }
}

#[async_trait]
impl AuthIssuer for MemoryIssuer {
    async fn get_current_session(&self) -> Result<Option<Session>> {
        if self.hang_get_session.load(Ordering::SeqCst) {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            return Ok(None);
        }
        if self.fail_get_session.load(Ordering::SeqCst) {
            return Err(AppError::Issuer("session read failed".to_string()));
        }
        let Some(blob) = self.local.get(SESSION_BLOB_KEY) else {
            return Ok(None);
        };
        let session: Session = sonic_rs::from_str(&blob)
            .map_err(|e| AppError::Issuer(format!("invalid persisted session: {}", e)))?;
        Ok(Some(session))
    }

    async fn get_current_user(&self) -> Result<Option<AuthUser>> {
        if self.fail_get_user.load(Ordering::SeqCst) {
            return Err(AppError::Issuer("user fetch failed".to_string()));
        }
        Ok(self.current_user.lock().unwrap().clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let user = {
            let credentials = self.credentials.lock().unwrap();
            match credentials.get(email) {
                Some((stored, user)) if stored == password => user.clone(),
                _ => {
                    return Err(AppError::Authentication(
                        "Invalid login credentials".to_string(),
                    ));
                }
            }
        };
        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Uuid::new_v4().to_string(),
            expires_at: Utc::now() + self.session_ttl,
            user: user.clone(),
        };
        self.persist_session(&session)?;
        *self.current_user.lock().unwrap() = Some(user);
        let _ = self.events_tx.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AppError::Issuer("revoke failed".to_string()));
        }
        self.local.remove(SESSION_BLOB_KEY);
        *self.current_user.lock().unwrap() = None;
        let _ = self.events_tx.send(AuthEvent::SignedOut);
        Ok(())
    }

    fn events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events_tx.subscribe()
    }
}

/// A cookie as the in-memory jar models it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub value: String,
    pub max_age_secs: i64,
    pub path: String,
}

/// An in-memory browser-storage analog: durable keys, volatile keys, and a
/// cookie jar.
#[derive(Default)]
pub struct MemoryLocalStore {
    durable: Mutex<HashMap<String, String>>,
    volatile: Mutex<HashMap<String, String>>,
    cookies: Mutex<HashMap<String, Cookie>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_volatile(&self, key: &str, value: &str) {
        self.volatile
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn volatile_len(&self) -> usize {
        self.volatile.lock().unwrap().len()
    }

    pub fn set_cookie(&self, name: &str, value: &str) {
        self.cookies.lock().unwrap().insert(
            name.to_string(),
            Cookie {
                value: value.to_string(),
                max_age_secs: 86400,
                path: "/".to_string(),
            },
        );
    }

    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        self.cookies.lock().unwrap().get(name).cloned()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.durable.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.durable
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.durable.lock().unwrap().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.durable.lock().unwrap().keys().cloned().collect()
    }

    fn clear_volatile(&self) {
        self.volatile.lock().unwrap().clear();
    }

    fn cookie_names(&self) -> Vec<String> {
        self.cookies.lock().unwrap().keys().cloned().collect()
    }

    fn expire_cookie(&self, name: &str) {
        if let Some(cookie) = self.cookies.lock().unwrap().get_mut(name) {
            cookie.value.clear();
            cookie.max_age_secs = 0;
            cookie.path = "/".to_string();
        }
    }
}

/// One navigation performed through the in-memory navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Replace(String),
    HardRedirect(String),
}

/// An in-memory navigator recording every navigation.
#[derive(Default)]
pub struct MemoryNavigator {
    log: Mutex<Vec<Navigation>>,
    public_page: AtomicBool,
}

impl MemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_on_public_page(&self, public: bool) {
        self.public_page.store(public, Ordering::SeqCst);
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Navigation> {
        self.log.lock().unwrap().last().cloned()
    }
}

impl Navigator for MemoryNavigator {
    fn replace(&self, path: &str) {
        self.log
            .lock()
            .unwrap()
            .push(Navigation::Replace(path.to_string()));
    }

    fn hard_redirect(&self, path: &str) {
        self.log
            .lock()
            .unwrap()
            .push(Navigation::HardRedirect(path.to_string()));
    }

    fn on_public_page(&self) -> bool {
        self.public_page.load(Ordering::SeqCst)
    }
}

/// A notifier buffering every toast for later assertion.
#[derive(Default)]
pub struct BufferNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl BufferNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn last_success(&self) -> Option<String> {
        self.successes.lock().unwrap().last().cloned()
    }

    pub fn last_error(&self) -> Option<String> {
        self.errors.lock().unwrap().last().cloned()
    }
}

impl Notifier for BufferNotifier {
    fn notify_success(&self, message: &str) {
        tracing::debug!("✅ {}", message);
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn notify_error(&self, message: &str) {
        tracing::debug!("❌ {}", message);
        self.errors.lock().unwrap().push(message.to_string());
    }
}
