use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::connectivity::ConnectivityMonitor;
use crate::constants::TOKEN_KEY;
use crate::credentials::CredentialStore;

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    Expired,
    UserRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedIn,
    LoggedOut(LogoutReason),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::LoggedIn => f.write_str("logged in"),
            SessionState::LoggedOut(LogoutReason::Expired) => f.write_str("logged out (expired)"),
            SessionState::LoggedOut(LogoutReason::UserRequested) => f.write_str("logged out"),
        }
    }
}

/// Behaviour shared by every screen: stored credentials, connectivity and
/// the session-wide expiry transition.
///
/// Screens take a child of [`SessionContext::cancellation_token`], so a
/// logout cancels whatever they have in flight.
pub struct SessionContext {
    credentials: Arc<dyn CredentialStore>,
    connectivity: ConnectivityMonitor,
    state: watch::Sender<SessionState>,
    root: Mutex<CancellationToken>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &*self.state.borrow())
            .field("connectivity", &self.connectivity.current())
            .finish()
    }
}

impl SessionContext {
    /// The session starts logged in when the store already holds a token.
    pub fn new(credentials: Arc<dyn CredentialStore>, connectivity: ConnectivityMonitor) -> Self {
        let initial = match credentials.get(TOKEN_KEY) {
            Some(token) if !token.is_empty() => SessionState::LoggedIn,
            _ => SessionState::LoggedOut(LogoutReason::UserRequested),
        };
        let (state, _rx) = watch::channel(initial);

        Self {
            credentials,
            connectivity,
            state,
            root: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state(), SessionState::LoggedIn)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Child token for a screen, cancelled when the session ends.
    pub fn cancellation_token(&self) -> CancellationToken {
        match self.root.lock() {
            Ok(root) => root.child_token(),
            Err(poisoned) => poisoned.into_inner().child_token(),
        }
    }

    /// Store a fresh token and start a new session.
    pub fn establish(&self, token: &str) -> anyhow::Result<()> {
        self.credentials.set(TOKEN_KEY, token)?;
        self.replace_root();
        self.state.send_replace(SessionState::LoggedIn);
        info!("🔐 Session established");
        Ok(())
    }

    /// Session-wide handler for a 401: purge the token and move to
    /// `LoggedOut`. Returns true only for the call that made the transition.
    pub fn on_token_expired(&self) -> bool {
        if let Err(e) = self.credentials.remove(TOKEN_KEY) {
            warn!("⚠️ Failed to purge expired token: {e:#}");
        }

        let transitioned = self.state.send_if_modified(|state| {
            if *state == SessionState::LoggedIn {
                *state = SessionState::LoggedOut(LogoutReason::Expired);
                true
            } else {
                false
            }
        });

        if transitioned {
            warn!("🔒 Session expired, credentials purged");
            self.cancel_root();
        }
        transitioned
    }

    pub fn logout(&self) {
        if let Err(e) = self.credentials.remove(TOKEN_KEY) {
            warn!("⚠️ Failed to remove token on logout: {e:#}");
        }
        self.state
            .send_replace(SessionState::LoggedOut(LogoutReason::UserRequested));
        self.cancel_root();
        info!("👋 Logged out");
    }

    fn cancel_root(&self) {
        match self.root.lock() {
            Ok(root) => root.cancel(),
            Err(poisoned) => poisoned.into_inner().cancel(),
        }
    }

    fn replace_root(&self) {
        let mut root = match self.root.lock() {
            Ok(root) => root,
            Err(poisoned) => poisoned.into_inner(),
        };
        *root = CancellationToken::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::Connectivity;
    use crate::credentials::MemoryCredentialStore;

    fn session_with_token() -> (SessionContext, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::with_entry(TOKEN_KEY, "jwt"));
        let session = SessionContext::new(
            store.clone(),
            ConnectivityMonitor::new(Connectivity::Wifi),
        );
        (session, store)
    }

    #[test]
    fn test_initial_state_follows_stored_token() {
        let (session, _) = session_with_token();
        assert!(session.is_logged_in());

        let empty = SessionContext::new(
            Arc::new(MemoryCredentialStore::new()),
            ConnectivityMonitor::default(),
        );
        assert!(!empty.is_logged_in());
    }

    #[test]
    fn test_expiry_transitions_once() {
        let (session, store) = session_with_token();
        let rx = session.subscribe();
        let screen_token = session.cancellation_token();

        assert!(session.on_token_expired());
        assert!(!session.on_token_expired());

        assert!(store.get(TOKEN_KEY).is_none());
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            session.state(),
            SessionState::LoggedOut(LogoutReason::Expired)
        );
        assert!(screen_token.is_cancelled());
    }

    #[test]
    fn test_establish_gives_fresh_cancellation_scope() {
        let (session, store) = session_with_token();
        session.on_token_expired();

        session.establish("jwt-2").unwrap();
        assert!(session.is_logged_in());
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("jwt-2"));
        assert!(!session.cancellation_token().is_cancelled());
    }
}
