//! Session context
//!
//! Owns the access/refresh token pair and the plain user cache. Values are
//! mirrored in memory and written through to a [`KeyValueStore`], so a new
//! process picks the session back up with [`SessionContext::init`].
//!
//! There is no locking across a read-refresh-write cycle: concurrent
//! requests that both see an expired token may both refresh, and the last
//! pair written wins.

pub mod token;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::models::{TokenPair, User};
use crate::storage::KeyValueStore;

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "finance_agent_jwt";
/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "finance_agent_refresh_token";
/// Storage keys of the cached user fields
pub const USER_ID_KEY: &str = "userId";
pub const USERNAME_KEY: &str = "username";
pub const EMAIL_KEY: &str = "email";

const EVENT_CAPACITY: usize = 16;

/// Session lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A token pair was stored after sign-in
    SignedIn,
    /// The token pair was replaced by a refresh
    Refreshed,
    /// Tokens (and possibly the user cache) were wiped
    Cleared,
}

#[derive(Debug, Default)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user_id: Option<String>,
    username: Option<String>,
    email: Option<String>,
}

/// Shared session state backed by a key-value store
pub struct SessionContext {
    store: Arc<dyn KeyValueStore>,
    state: RwLock<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionContext {
    /// Create a context over `store`, hydrating whatever it already holds
    #[instrument(skip(store))]
    pub fn init(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let state = SessionState {
            access_token: store.get(ACCESS_TOKEN_KEY)?,
            refresh_token: store.get(REFRESH_TOKEN_KEY)?,
            user_id: store.get(USER_ID_KEY)?,
            username: store.get(USERNAME_KEY)?,
            email: store.get(EMAIL_KEY)?,
        };

        debug!(
            has_access = state.access_token.is_some(),
            has_refresh = state.refresh_token.is_some(),
            has_user = state.user_id.is_some(),
            "Session hydrated"
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            store,
            state: RwLock::new(state),
            events,
        })
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // --- token store ---

    pub fn access_token(&self) -> Option<String> {
        self.read().ok().and_then(|s| s.access_token.clone())
    }

    pub fn set_access_token(&self, token: &str) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, token)?;
        self.write()?.access_token = Some(token.to_string());
        Ok(())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().ok().and_then(|s| s.refresh_token.clone())
    }

    pub fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.store.set(REFRESH_TOKEN_KEY, token)?;
        self.write()?.refresh_token = Some(token.to_string());
        Ok(())
    }

    /// Store a freshly issued pair after sign-in
    pub fn store_tokens(&self, pair: &TokenPair) -> Result<()> {
        self.put_pair(pair)?;
        info!("Session tokens stored");
        self.notify(SessionEvent::SignedIn);
        Ok(())
    }

    /// Replace the pair with one returned by a refresh
    pub fn replace_tokens(&self, pair: &TokenPair) -> Result<()> {
        self.put_pair(pair)?;
        debug!("Session tokens refreshed");
        self.notify(SessionEvent::Refreshed);
        Ok(())
    }

    /// Remove both tokens. Safe to call when nothing is stored.
    pub fn clear_tokens(&self) -> Result<()> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        {
            let mut state = self.write()?;
            state.access_token = None;
            state.refresh_token = None;
        }
        self.notify(SessionEvent::Cleared);
        Ok(())
    }

    fn put_pair(&self, pair: &TokenPair) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, &pair.access_token)?;
        self.store.set(REFRESH_TOKEN_KEY, &pair.refresh_token)?;
        let mut state = self.write()?;
        state.access_token = Some(pair.access_token.clone());
        state.refresh_token = Some(pair.refresh_token.clone());
        Ok(())
    }

    // --- session resolver ---

    /// True only if an access token exists and is not expired
    pub fn is_authenticated(&self) -> bool {
        self.access_token()
            .map(|t| !token::is_expired(&t))
            .unwrap_or(false)
    }

    // --- user cache ---

    /// Cache the user's id, username and email for display
    pub fn store_user(&self, user: &User) -> Result<()> {
        self.store.set(USER_ID_KEY, &user.id)?;
        self.store.set(USERNAME_KEY, &user.username)?;
        self.store.set(EMAIL_KEY, &user.email)?;

        let mut state = self.write()?;
        state.user_id = Some(user.id.clone());
        state.username = Some(user.username.clone());
        state.email = Some(user.email.clone());
        Ok(())
    }

    /// The cached user, if all three fields are present
    pub fn cached_user(&self) -> Option<User> {
        let state = self.read().ok()?;
        Some(User {
            id: state.user_id.clone()?,
            username: state.username.clone()?,
            email: state.email.clone()?,
            created_at: None,
        })
    }

    pub fn clear_user(&self) -> Result<()> {
        self.store.remove(USER_ID_KEY)?;
        self.store.remove(USERNAME_KEY)?;
        self.store.remove(EMAIL_KEY)?;

        let mut state = self.write()?;
        state.user_id = None;
        state.username = None;
        state.email = None;
        Ok(())
    }

    /// Clear the token pair and the user cache
    #[instrument(skip(self))]
    pub fn sign_out(&self) -> Result<()> {
        self.clear_tokens()?;
        self.clear_user()?;
        info!("Signed out");
        Ok(())
    }

    fn notify(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, SessionState>> {
        self.state.read().map_err(|_| {
            warn!("Session state lock poisoned");
            Error::LockPoisoned("session state")
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, SessionState>> {
        self.state.write().map_err(|_| {
            warn!("Session state lock poisoned");
            Error::LockPoisoned("session state")
        })
    }
}
