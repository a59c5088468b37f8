//! In-memory session store.
//!
//! `SessionStore` owns the canonical `Session` for the lifetime of the
//! process. Readers take snapshots or subscribe for change notification;
//! only `set_credentials` and `logout` ever mutate it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// Email and token for an authenticated user. Always held as a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub token: String,
}

/// The authenticated user, or nobody.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credentials: Option<Credentials>,
}

impl Session {
    /// An empty session (no email, no token)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn email(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.email.as_str())
    }

    /// The stored token exactly as it was set
    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.token.as_str())
    }

    /// The token if it is usable as a bearer credential (present and non-empty)
    pub fn bearer_token(&self) -> Option<&str> {
        self.token().filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

/// Shared handle onto the process-wide session.
/// Clone is cheap; every clone refers to the same cell.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::empty());
        Self { tx: Arc::new(tx) }
    }

    /// Replace the session wholesale with the given credentials
    pub fn set_credentials(&self, email: impl Into<String>, token: impl Into<String>) {
        let credentials = Credentials {
            email: email.into(),
            token: token.into(),
        };
        debug!(email = %credentials.email, "Session credentials set");
        self.tx.send_replace(Session {
            credentials: Some(credentials),
        });
    }

    /// Clear the session. Clearing an already empty session changes nothing.
    pub fn logout(&self) {
        let changed = self.tx.send_if_modified(|session| {
            if session.credentials.is_some() {
                session.credentials = None;
                true
            } else {
                false
            }
        });
        debug!(changed, "Session cleared");
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Current bearer token, if any
    pub fn bearer_token(&self) -> Option<String> {
        self.tx.borrow().bearer_token().map(str::to_string)
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    /// Start watching the session for changes
    pub fn subscribe(&self) -> SessionWatcher {
        SessionWatcher {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader side of a `SessionStore` that knows whether it has seen the latest value.
pub struct SessionWatcher {
    rx: watch::Receiver<Session>,
}

impl SessionWatcher {
    /// True if the session changed since this watcher last marked it seen
    pub fn has_changed(&self) -> bool {
        // The sender lives as long as any store handle; a closed channel
        // means no further changes can arrive.
        self.rx.has_changed().unwrap_or(false)
    }

    /// Read the latest session and mark it seen
    pub fn latest(&mut self) -> Session {
        self.rx.borrow_and_update().clone()
    }

    /// Wait until the session changes. Returns false once no store handle remains.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_session_is_empty() {
        let store = SessionStore::new();
        let session = store.session();
        assert_eq!(session.email(), None);
        assert_eq!(session.token(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_set_credentials_replaces_session() {
        let store = SessionStore::new();
        store.set_credentials("a@b.com", "tok123");

        let session = store.session();
        assert_eq!(session.email(), Some("a@b.com"));
        assert_eq!(session.token(), Some("tok123"));
        assert!(session.is_authenticated());

        store.set_credentials("c@d.com", "tok456");
        let session = store.session();
        assert_eq!(session.email(), Some("c@d.com"));
        assert_eq!(session.token(), Some("tok456"));
    }

    #[test]
    fn test_logout_is_idempotent() {
        let store = SessionStore::new();
        store.set_credentials("a@b.com", "tok123");

        store.logout();
        let once = store.session();
        store.logout();
        let twice = store.session();

        assert_eq!(once, Session::empty());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_token_is_not_a_bearer_token() {
        let store = SessionStore::new();
        store.set_credentials("a@b.com", "");

        // Stored as given, but never treated as authorization
        assert_eq!(store.session().token(), Some(""));
        assert_eq!(store.bearer_token(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::new();
        let other = store.clone();

        other.set_credentials("a@b.com", "tok123");
        assert_eq!(store.bearer_token().as_deref(), Some("tok123"));

        store.logout();
        assert!(!other.is_authenticated());
    }

    #[test]
    fn test_watcher_sees_changes() {
        let store = SessionStore::new();
        let mut watcher = store.subscribe();
        assert!(!watcher.has_changed());

        store.set_credentials("a@b.com", "tok123");
        assert!(watcher.has_changed());
        assert_eq!(watcher.latest().token(), Some("tok123"));
        assert!(!watcher.has_changed());

        store.logout();
        assert!(watcher.has_changed());
        assert_eq!(watcher.latest(), Session::empty());
    }

    #[test]
    fn test_logout_when_empty_does_not_notify() {
        let store = SessionStore::new();
        let watcher = store.subscribe();
        store.logout();
        assert!(!watcher.has_changed());
    }

    #[test]
    fn test_readers_never_see_partial_credentials() {
        let store = SessionStore::new();
        let mut watcher = store.subscribe();

        store.set_credentials("a@b.com", "tok123");
        let seen = watcher.latest();

        // Either both halves are present or neither is
        assert_eq!(seen.email().is_some(), seen.token().is_some());
        assert_eq!(
            seen.credentials(),
            Some(&Credentials {
                email: "a@b.com".to_string(),
                token: "tok123".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_watcher_changed_wakes_on_logout() {
        let store = SessionStore::new();
        store.set_credentials("a@b.com", "tok123");
        let mut watcher = store.subscribe();

        let handle = store.clone();
        tokio::spawn(async move {
            handle.logout();
        });

        assert!(watcher.changed().await);
        assert!(!watcher.latest().is_authenticated());
    }
}
