//! Login and logout.
//!
//! `Authenticator` is the only writer of the session store. A successful
//! login sets the credentials and mirrors the token; logout clears both.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};

use super::mirror::TokenMirror;
use super::session::SessionStore;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login Successful!";
pub const LOGIN_REJECTED_MESSAGE: &str = "Login failed. Please check email and pass.";
pub const LOGIN_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

/// Field-level problems with the login form
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("Invalid login form")]
pub struct LoginErrors {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

/// `local@domain.tld` with no whitespace and a dot inside the domain
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Check the login form before anything is sent
pub fn validate_login(email: &str, password: &str) -> Result<(), LoginErrors> {
    let mut errors = LoginErrors::default();
    if !is_valid_email(email) {
        errors.email = Some("Please enter a valid email address".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.password = Some("Password must be at least 6 characters".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// User-facing status line for a failed login
pub fn login_failure_message(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<ApiError>() {
        Some(ApiError::Rejected(_)) | Some(ApiError::Unauthorized) => LOGIN_REJECTED_MESSAGE,
        _ => LOGIN_ERROR_MESSAGE,
    }
}

pub struct Authenticator {
    api: ApiClient,
    store: SessionStore,
    mirror: Arc<dyn TokenMirror>,
}

impl Authenticator {
    pub fn new(api: ApiClient, mirror: Arc<dyn TokenMirror>) -> Self {
        let store = api.session().clone();
        Self { api, store, mirror }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Validate, authenticate, then set the session. Failures leave the session alone.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        validate_login(email, password)?;

        let success = self.api.login(email, password).await?;

        self.store.set_credentials(&success.email, &success.token);
        if let Err(e) = self.mirror.write(&success.email, &success.token) {
            warn!(error = %e, "Failed to mirror token");
        }
        info!(email = %success.email, "Login successful");
        Ok(())
    }

    /// Clear the session and its mirror. Navigation is up to the caller.
    pub fn logout(&self) {
        self.store.logout();
        if let Err(e) = self.mirror.clear() {
            warn!(error = %e, "Failed to clear token mirror");
        }
        info!("Logged out");
    }

    /// Pick up a mirrored token from an earlier run. Returns whether a session was restored.
    pub fn restore(&self) -> bool {
        match self.mirror.read() {
            Ok(Some(mirrored)) if !mirrored.token.is_empty() => {
                self.store.set_credentials(mirrored.email, mirrored.token);
                info!("Session restored from token mirror");
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, "Failed to read token mirror");
                false
            }
        }
    }
}
