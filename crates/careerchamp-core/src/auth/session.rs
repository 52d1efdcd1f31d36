//! Session lifecycle: startup restore, login, logout and expiry-driven logout.
//!
//! `SessionController` is the single owner of "who is logged in". The token
//! itself lives in a `TokenStore`; the controller keeps only the decoded
//! claims and publishes a `SessionView` to subscribers on every transition.
//!
//! While authenticated, a background task re-validates the stored token on a
//! fixed interval. The task is aborted on every transition out of
//! `Authenticated`, on `dispose()`, and when the last handle is dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::claims::{decode_claims, Claims, DecodeError};
use super::clock::{Clock, SystemClock};
use super::store::TokenStore;

/// How often the stored token is re-validated while authenticated.
pub const DEFAULT_EXPIRY_CHECK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    #[error("Token storage failed: {0}")]
    Store(String),

    #[error("Session has been disposed")]
    Disposed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Initializing,
    Authenticated(Claims),
    Anonymous,
}

impl SessionState {
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            SessionState::Authenticated(claims) => Some(claims),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Projection of the session handed to views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct SessionView {
    pub is_authenticated: bool,
    pub claims: Option<Claims>,
    pub is_loading: bool,
}

impl From<&SessionState> for SessionView {
    fn from(state: &SessionState) -> Self {
        Self {
            is_authenticated: state.is_authenticated(),
            claims: state.claims().cloned(),
            is_loading: matches!(state, SessionState::Initializing),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub expiry_check_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry_check_interval: DEFAULT_EXPIRY_CHECK_INTERVAL,
        }
    }
}

struct Inner {
    state: SessionState,
    expiry_task: Option<JoinHandle<()>>,
    disposed: bool,
}

impl Inner {
    fn stop_expiry_task(&mut self) {
        if let Some(task) = self.expiry_task.take() {
            task.abort();
            debug!("Expiry check stopped");
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    view_tx: watch::Sender<SessionView>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        inner.stop_expiry_task();
    }
}

/// Handle to the session. Clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl SessionController {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), SessionConfig::default())
    }

    pub fn with_clock(
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let initial = SessionState::Initializing;
        let (view_tx, _) = watch::channel(SessionView::from(&initial));

        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: initial,
                    expiry_task: None,
                    disposed: false,
                }),
                store,
                clock,
                config,
                view_tx,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Restore the session from the token store.
    ///
    /// A stored token that fails validation is removed. Calling `init` again
    /// after the session has left `Initializing` is a no-op.
    pub fn init(&self) -> SessionView {
        let mut inner = self.lock();
        if inner.disposed || inner.state != SessionState::Initializing {
            return SessionView::from(&inner.state);
        }

        let token = match self.shared.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to load stored token, starting anonymous");
                None
            }
        };

        match token {
            Some(token) => match self.check_token(&token) {
                Ok(claims) => {
                    info!(sub = %claims.sub, "Restored session from stored token");
                    self.enter_authenticated(&mut inner, claims);
                }
                Err(e) => {
                    warn!(error = %e, "Stored token rejected at startup");
                    if let Err(e) = self.clear_store() {
                        warn!(error = %e, "Rejected token left in storage");
                    }
                    self.set_state(&mut inner, SessionState::Anonymous);
                }
            },
            None => {
                debug!("No stored token");
                self.set_state(&mut inner, SessionState::Anonymous);
            }
        }

        SessionView::from(&inner.state)
    }

    /// Tear the session down. Stops the expiry check permanently.
    ///
    /// The stored token is left in place so the next process can restore it.
    pub fn dispose(&self) {
        let mut inner = self.lock();
        inner.stop_expiry_task();
        inner.disposed = true;
        debug!("Session disposed");
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Accept a token from the backend and start an authenticated session.
    ///
    /// Rejected tokens leave both the store and the session untouched.
    pub fn login<'a>(&self, token: impl Into<Option<&'a str>>) -> Result<Claims, AuthError> {
        let mut inner = self.lock();
        if inner.disposed {
            return Err(AuthError::Disposed);
        }

        let token = match token.into() {
            Some(token) if !token.trim().is_empty() => token.trim(),
            _ => return Err(AuthError::InvalidToken("no token provided".to_string())),
        };

        let claims = self.check_token(token).map_err(|e| {
            warn!(error = %e, "Login rejected");
            match e {
                AuthError::Decode(e) => AuthError::InvalidToken(e.to_string()),
                other => other,
            }
        })?;

        self.shared
            .store
            .save(token)
            .map_err(|e| AuthError::Store(format!("{:#}", e)))?;

        info!(sub = %claims.sub, "Login successful");
        self.enter_authenticated(&mut inner, claims.clone());
        Ok(claims)
    }

    /// End the session and remove the stored token. Safe to call repeatedly.
    ///
    /// The session is `Anonymous` afterwards even when the store could not be
    /// emptied; that failure is returned as `AuthError::Store`.
    pub fn logout(&self) -> Result<(), AuthError> {
        let mut inner = self.lock();
        let result = self.logout_locked(&mut inner);
        info!("Logged out");
        result
    }

    /// Re-validate the stored token and log out if it is no longer valid.
    ///
    /// Returns `true` when this call ended the session. Skipped while another
    /// transition holds the session.
    pub fn check_expiry(&self) -> bool {
        let mut inner = match self.shared.inner.try_lock() {
            Ok(inner) => inner,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                debug!("Session transition in progress, skipping expiry check");
                return false;
            }
        };
        self.check_expiry_locked(&mut inner)
    }

    fn check_expiry_locked(&self, inner: &mut Inner) -> bool {
        if !inner.state.is_authenticated() {
            return false;
        }

        let reason = match self.shared.store.load() {
            Ok(Some(token)) => match self.check_token(&token) {
                Ok(_) => return false,
                Err(e) => e.to_string(),
            },
            Ok(None) => "stored token is gone".to_string(),
            Err(e) => format!("failed to read stored token: {:#}", e),
        };

        warn!(%reason, "Session ended by expiry check");
        if let Err(e) = self.logout_locked(inner) {
            warn!(error = %e, "Expired token left in storage");
        }
        true
    }

    fn logout_locked(&self, inner: &mut Inner) -> Result<(), AuthError> {
        inner.stop_expiry_task();
        let cleared = self.clear_store();
        self.set_state(inner, SessionState::Anonymous);
        cleared
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn view(&self) -> SessionView {
        SessionView::from(&self.lock().state)
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().state.is_authenticated()
    }

    pub fn claims(&self) -> Option<Claims> {
        self.lock().state.claims().cloned()
    }

    /// Receive a `SessionView` after every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.shared.view_tx.subscribe()
    }

    /// Whether the background expiry check is currently scheduled.
    pub fn is_expiry_check_running(&self) -> bool {
        self.lock()
            .expiry_task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    pub fn store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.shared.store)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Decode and check expiry against the controller's clock.
    fn check_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode_claims(token)?;
        if claims.is_expired_at(self.shared.clock.now()) {
            return Err(AuthError::InvalidToken(format!("token expired at {}", claims.exp)));
        }
        Ok(claims)
    }

    /// Remove the stored token. If the backend refuses, overwrite it with a
    /// blank value, which every store reads back as absent.
    fn clear_store(&self) -> Result<(), AuthError> {
        let store = &self.shared.store;
        let Err(clear_err) = store.clear() else {
            return Ok(());
        };
        warn!(error = %clear_err, "Failed to clear stored token, blanking it instead");
        store.save("").map_err(|e| {
            AuthError::Store(format!("clear failed ({:#}), blanking failed ({:#})", clear_err, e))
        })
    }

    fn set_state(&self, inner: &mut Inner, state: SessionState) {
        debug!(from = state_name(&inner.state), to = state_name(&state), "Session transition");
        inner.state = state;
        self.shared.view_tx.send_replace(SessionView::from(&inner.state));
    }

    fn enter_authenticated(&self, inner: &mut Inner, claims: Claims) {
        inner.stop_expiry_task();
        self.set_state(inner, SessionState::Authenticated(claims));
        inner.expiry_task = self.spawn_expiry_task();
    }

    fn spawn_expiry_task(&self) -> Option<JoinHandle<()>> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No async runtime, periodic expiry check disabled");
                return None;
            }
        };

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let period = self
            .shared
            .config
            .expiry_check_interval
            .max(Duration::from_millis(1));
        debug!(?period, "Expiry check scheduled");

        Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                let controller = SessionController { shared };
                if controller.check_expiry() {
                    break;
                }
            }
        }))
    }
}

fn state_name(state: &SessionState) -> &'static str {
    match state {
        SessionState::Initializing => "initializing",
        SessionState::Authenticated(_) => "authenticated",
        SessionState::Anonymous => "anonymous",
    }
}
