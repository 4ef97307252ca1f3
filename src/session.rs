//! Session-cookie state and its persistence contract.
//!
//! The original client kept the cookie in a module-level variable; here it is
//! an explicitly owned, injectable object so tests can run isolated sessions
//! and the UI can subscribe to changes. Updates are an atomic replace of one
//! string; when two in-flight responses both carry `Set-Cookie`, the last
//! write wins and that is accepted.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Storage key for the serialized [`StoredUser`] record.
pub const USER_KEY: &str = "user";

/// Storage key for the raw session cookie text.
pub const SESSION_COOKIE_KEY: &str = "session_cookie";

type ChangeListener = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct SessionInner {
    cookie: RwLock<String>,
    listener: RwLock<Option<ChangeListener>>,
}

/// Process-wide session state: the current cookie string (possibly empty)
/// and an optional listener invoked synchronously on every change.
///
/// Cloning is cheap and shares the same underlying state.
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current cookie string; empty when logged out.
    #[must_use]
    pub fn cookie(&self) -> String {
        self.inner
            .cookie
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Replace the cookie and notify the listener, if any.
    pub fn set_cookie(&self, cookie: &str) {
        if let Ok(mut current) = self.inner.cookie.write() {
            *current = cookie.to_string();
        }

        if let Ok(listener) = self.inner.listener.read() {
            if let Some(listener) = listener.as_ref() {
                listener(cookie);
            }
        }
    }

    /// Drop the cookie (logout). Notifies the listener with an empty string.
    pub fn clear(&self) {
        self.set_cookie("");
    }

    /// Register the change listener. Only one listener is held; a second
    /// registration replaces the first.
    pub fn on_change(&self, listener: impl Fn(&str) + Send + Sync + 'static) {
        if let Ok(mut slot) = self.inner.listener.write() {
            *slot = Some(Box::new(listener));
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_cookie", &!self.cookie().is_empty())
            .finish()
    }
}

/// External key-value store the session is persisted through.
///
/// The actual storage engine (on-device preferences, a file, a test map) is
/// out of scope; the client only needs this get/set/remove contract.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str);
    async fn remove(&self, key: &str);
}

/// In-memory [`SessionStore`], for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    values: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
    }

    async fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
    }
}

/// User record persisted alongside the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub username: String,
}

/// Seed the session from persisted state at startup.
///
/// Returns the persisted user record, if one exists and deserializes; a
/// corrupt record is logged and treated as logged out.
pub async fn restore(store: &dyn SessionStore, session: &Session) -> Option<StoredUser> {
    if let Some(cookie) = store.get(SESSION_COOKIE_KEY).await {
        session.set_cookie(&cookie);
    }

    let raw = store.get(USER_KEY).await?;
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(err) => {
            warn!(error = %err, "discarding unreadable stored user record");
            None
        }
    }
}

/// Persist a successful login: the user record and the current cookie.
pub async fn persist_login(store: &dyn SessionStore, session: &Session, user: &StoredUser) {
    match serde_json::to_string(user) {
        Ok(serialized) => store.set(USER_KEY, &serialized).await,
        Err(err) => warn!(error = %err, "failed to serialize user record"),
    }
    store.set(SESSION_COOKIE_KEY, &session.cookie()).await;
}

/// Logout: remove both persisted values and clear the live session.
pub async fn forget(store: &dyn SessionStore, session: &Session) {
    store.remove(USER_KEY).await;
    store.remove(SESSION_COOKIE_KEY).await;
    session.clear();
}
