//! Authentication session state machine.
//!
//! ```text
//!   Unknown ──load_user ok──▶ Authenticated ◀──login ok── Unauthenticated
//!      │                          │                            ▲
//!      └──load_user / login err───┴────────── logout ──────────┘
//! ```
//!
//! `login` only yields a token. The user record is filled in by a separate
//! `load_user` call, which [`App::login`](crate::app::App::login) issues right
//! after a successful login.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    api::ShortenerApi,
    error::{ApiError, Result},
    models::User,
    sequence::{InFlight, Sequencer, Ticket},
    token_store::TokenStore,
};

pub const LOAD_USER_FAILED: &str = "Authentication failed";
pub const LOGIN_FAILED: &str = "Login failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Startup, before the stored token has been checked
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Observable session state.
///
/// `Authenticated` always comes with a token; leaving it always clears both
/// `token` and `user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub auth_status: AuthStatus,
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Session {
    fn starting(token: Option<String>) -> Self {
        Self {
            token,
            auth_status: AuthStatus::Unknown,
            user: None,
            loading: true,
            error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_status == AuthStatus::Authenticated
    }

    fn sign_out(&mut self, error: Option<String>) {
        self.token = None;
        self.user = None;
        self.auth_status = AuthStatus::Unauthenticated;
        self.loading = false;
        self.error = error;
    }
}

pub struct AuthSession {
    api: Arc<dyn ShortenerApi>,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<Session>,
    sequence: Sequencer,
    in_flight: InFlight,
}

impl AuthSession {
    /// Start a session from whatever token the store currently holds.
    pub fn new(api: Arc<dyn ShortenerApi>, store: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(Session::starting(store.get()));
        Self {
            api,
            store,
            state,
            sequence: Sequencer::new(),
            in_flight: InFlight::default(),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Current bearer token, if signed in.
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// Resolve the account behind the stored token.
    ///
    /// On rejection the stored token is discarded. The returned value is the
    /// call's own outcome; state is only updated if no newer auth call was
    /// dispatched (or `logout` run) while this one was pending.
    pub async fn load_user(&self) -> Result<User> {
        let ticket = self.begin();
        let token = self.store.get();

        let result = match token.as_deref() {
            Some(token) => self.api.current_user(Some(token)).await,
            None => Err(ApiError::Auth { message: None }),
        };

        let Some(still_loading) = self.settle(ticket, "load_user") else {
            return result;
        };

        match &result {
            Ok(user) => {
                tracing::info!(user = %user.email, "Session authenticated");
                let user = user.clone();
                self.state.send_modify(|s| {
                    s.token = token;
                    s.user = Some(user);
                    s.auth_status = AuthStatus::Authenticated;
                    s.loading = still_loading;
                    s.error = None;
                });
            }
            Err(e) => {
                tracing::warn!("Loading user failed: {}", e);
                self.forget_token();
                let message = e.message_or(LOAD_USER_FAILED);
                self.state.send_modify(|s| {
                    s.sign_out(Some(message));
                    s.loading = still_loading;
                });
            }
        }
        result
    }

    /// Exchange credentials for a token and persist it.
    ///
    /// `user` stays as it was: the login response carries only the token.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let ticket = self.begin();
        tracing::debug!(%email, "Logging in");

        let result = self.api.login(email, password).await;

        let Some(still_loading) = self.settle(ticket, "login") else {
            return result.map(|_| ());
        };

        match result {
            Ok(token) => {
                if let Err(e) = self.store.set(&token) {
                    tracing::warn!("Failed to persist token: {}", e);
                }
                tracing::info!(%email, "Logged in");
                self.state.send_modify(|s| {
                    s.token = Some(token);
                    s.auth_status = AuthStatus::Authenticated;
                    s.loading = still_loading;
                    s.error = None;
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%email, "Login failed: {}", e);
                self.forget_token();
                let message = e.message_or(LOGIN_FAILED);
                self.state.send_modify(|s| {
                    s.sign_out(Some(message));
                    s.loading = still_loading;
                });
                Err(e)
            }
        }
    }

    /// Sign out. Results of auth calls still in flight are ignored.
    pub fn logout(&self) {
        self.sequence.invalidate();
        self.forget_token();
        self.state.send_modify(|s| s.sign_out(None));
        tracing::info!("Logged out");
    }

    /// Drop the session because the server rejected its token.
    pub fn invalidate(&self, message: impl Into<String>) {
        self.sequence.invalidate();
        self.forget_token();
        let message = message.into();
        tracing::warn!("Session invalidated: {}", message);
        self.state.send_modify(|s| s.sign_out(Some(message)));
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    // ── Private helpers ────────────────────────────────────────────────────

    fn begin(&self) -> Ticket {
        let ticket = self.sequence.issue();
        self.in_flight.start();
        self.state.send_modify(|s| s.loading = true);
        ticket
    }

    /// Returns `Some(still_loading)` when the result should be applied, or
    /// `None` for a superseded call (after refreshing `loading`).
    fn settle(&self, ticket: Ticket, op: &str) -> Option<bool> {
        let still_loading = self.in_flight.finish();
        if self.sequence.is_current(ticket) {
            return Some(still_loading);
        }
        tracing::warn!(operation = op, "Discarding superseded auth result");
        self.state.send_modify(|s| s.loading = still_loading);
        None
    }

    fn forget_token(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear stored token: {}", e);
        }
    }
}
