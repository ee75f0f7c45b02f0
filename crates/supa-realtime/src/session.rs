//! Source of access tokens for the realtime connection.

use tokio::sync::watch;

/// An authenticated session as seen by the realtime layer.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Supplies the current access token and announces session changes.
///
/// A `None` session on the change stream means the user signed out.
pub trait SessionProvider: Send + Sync {
    fn current_access_token(&self) -> Option<String>;

    /// Receiver that wakes whenever the session changes.
    fn session_changes(&self) -> watch::Receiver<Option<Session>>;
}

/// A session provider whose session is set directly by the application.
pub struct StaticSessionProvider {
    tx: watch::Sender<Option<Session>>,
}

impl StaticSessionProvider {
    pub fn new(session: Option<Session>) -> Self {
        let (tx, _) = watch::channel(session);
        Self { tx }
    }

    /// Provider with no session; the connection authenticates with the API key alone.
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn with_token(access_token: impl Into<String>) -> Self {
        Self::new(Some(Session::new(access_token)))
    }

    /// Replace the session and notify watchers.
    pub fn set_session(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }

    pub fn sign_out(&self) {
        self.set_session(None);
    }
}

impl SessionProvider for StaticSessionProvider {
    fn current_access_token(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|s| s.access_token.clone())
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}
