use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::models::UserProfile;

use super::storage::KeyValueStore;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "authToken";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key for the serialized user profile
pub const USER_KEY: &str = "user";

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    /// The access token was rejected and could not be refreshed
    SessionExpired,
}

/// Authentication state transitions broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn,
    TokenRefreshed,
    LoggedOut(LogoutReason),
}

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

/// Access token, refresh token and cached user profile, plus the
/// listeners interested in changes to them.
///
/// Tokens are opaque strings. The store is meant to be created once by the
/// application and shared with the API client through an `Arc`.
pub struct SessionStore {
    store: Box<dyn KeyValueStore>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener_id: AtomicU64,
}

impl SessionStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
        }
    }

    /// An empty stored token counts as absent.
    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// An empty stored token counts as absent.
    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Cached user profile. A value that no longer parses counts as absent.
    pub fn user(&self) -> Option<UserProfile> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(error = %e, "Ignoring unparseable user profile");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Store a full session. A `None` refresh token keeps the stored one.
    pub fn set_session(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        user: &UserProfile,
    ) -> Result<()> {
        // The access token goes last: once it is visible, so is the user.
        let user_json = serde_json::to_string(user).context("Failed to serialize user profile")?;
        self.store.set(USER_KEY, &user_json)?;
        if let Some(refresh_token) = refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, refresh_token)?;
        }
        self.store.set(ACCESS_TOKEN_KEY, access_token)?;
        debug!(user = %user.email, "Session stored");
        Ok(())
    }

    /// Replace the tokens after a refresh, leaving the user profile alone.
    pub fn update_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
        if let Some(refresh_token) = refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, refresh_token)?;
        }
        self.store.set(ACCESS_TOKEN_KEY, access_token)?;
        Ok(())
    }

    /// Remove every session key. Calling it on an empty store is a no-op.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        Ok(())
    }

    /// User-initiated logout: clear the session and tell subscribers.
    pub fn logout(&self) -> Result<()> {
        let result = self.clear();
        info!("Logged out");
        self.notify(&AuthEvent::LoggedOut(LogoutReason::UserRequested));
        result
    }

    /// Register a callback run synchronously on every auth state change.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AuthEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.push((id, Arc::new(listener)));
        id
    }

    /// Returns false if the id was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn notify(&self, event: &AuthEvent) {
        // Snapshot so listeners may (un)subscribe from inside the callback
        let listeners: Vec<Listener> = {
            let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        debug!(?event, listeners = listeners.len(), "Auth state changed");
        for listener in listeners {
            listener(event);
        }
    }
}
