//! Authentication: the session store, access guard, token mirror and login flow.
//!
//! - `SessionStore`: process-wide `{email, token}` with change notification
//! - `AccessGuard`: gates protected views on token presence
//! - `TokenMirror`: optional persisted copy of the token
//! - `Authenticator`: login and logout, the only writer of the store

pub mod flow;
pub mod guard;
pub mod mirror;
pub mod session;

pub use flow::{login_failure_message, validate_login, Authenticator, LoginErrors};
pub use guard::{AccessGuard, Guarded, Navigator, Route, View};
pub use mirror::{FileTokenMirror, KeyringTokenMirror, MirroredToken, NoMirror, TokenMirror};
pub use session::{Credentials, Session, SessionStore, SessionWatcher};
