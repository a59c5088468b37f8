//! Application state management for purchasedesk.
//!
//! This module contains the `App` struct that owns the session store, API
//! client and all screen state, plus the plumbing that carries background
//! fetch results and navigation requests back to the main loop.

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use purchasedesk_core::api::{ApiClient, ApiError};
use purchasedesk_core::auth::flow::LOGIN_SUCCESS_MESSAGE;
use purchasedesk_core::auth::{
    login_failure_message, AccessGuard, Authenticator, LoginErrors, Navigator, Route,
    SessionStore,
};
use purchasedesk_core::config::Config;
use purchasedesk_core::models::{
    MaterialPurchase, Pagination, PurchaseField, PurchaseForm, PurchasePage,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

pub const SUBMIT_SUCCESS_MESSAGE: &str = "Material purchase submitted successfully!";

/// Guard type used for the dashboard
pub type DashboardGuard = AccessGuard<mpsc::UnboundedSender<Route>>;

// ============================================================================
// UI State Types
// ============================================================================

/// Which route is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
}

/// Overlay state on top of the current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    AddingPurchase,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Email,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from background API tasks.
enum TaskResult {
    /// A list page arrived (fetch generation, page)
    Page(u64, PurchasePage),
    /// A list fetch failed
    PageFailed {
        generation: u64,
        message: String,
        ends_session: bool,
    },
    /// Purchase rows were accepted
    Submitted,
    /// Purchase submission failed
    SubmitFailed { message: String, ends_session: bool },
}

fn describe_failure(e: &anyhow::Error) -> (String, bool) {
    match e.downcast_ref::<ApiError>() {
        Some(api_err) => (api_err.to_string(), api_err.ends_session()),
        None => (e.to_string(), false),
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub store: SessionStore,
    pub api: ApiClient,
    auth: Authenticator,

    // Navigation
    pub screen: Screen,
    pub state: AppState,
    nav_tx: mpsc::UnboundedSender<Route>,
    nav_rx: mpsc::UnboundedReceiver<Route>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_errors: LoginErrors,
    pub login_status: Option<String>,

    // Dashboard state
    pub purchases: Vec<MaterialPurchase>,
    pub pagination: Pagination,
    pub loading: bool,
    pub selection: usize,
    fetch_generation: u64,

    // Purchase entry modal
    pub form: PurchaseForm,
    pub form_row: usize,
    pub form_field: PurchaseField,
    pub form_error: Option<String>,
    pub submitting: bool,

    // Background task channel
    task_tx: mpsc::Sender<TaskResult>,
    task_rx: mpsc::Receiver<TaskResult>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, api = %config.api_base_url, "Config loaded");

        let store = SessionStore::new();
        let api = ApiClient::new(config.api_base_url.clone(), store.clone())?;
        let auth = Authenticator::new(api.clone(), config.session_mirror(cache_dir));

        Ok(Self::with_services(config, store, api, auth))
    }

    fn with_services(
        config: Config,
        store: SessionStore,
        api: ApiClient,
        auth: Authenticator,
    ) -> Self {
        let (nav_tx, nav_rx) = mpsc::unbounded_channel();
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = config.last_email.clone().unwrap_or_default();
        let login_password = config.password.clone().unwrap_or_default();

        Self {
            config,
            store,
            api,
            auth,

            screen: Screen::Login,
            state: AppState::Normal,
            nav_tx,
            nav_rx,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_errors: LoginErrors::default(),
            login_status: None,

            purchases: Vec::new(),
            pagination: Pagination::default(),
            loading: false,
            selection: 0,
            fetch_generation: 0,

            form: PurchaseForm::new(),
            form_row: 0,
            form_field: PurchaseField::Item,
            form_error: None,
            submitting: false,

            task_tx,
            task_rx,

            status_message: None,
        }
    }

    /// Guard for the dashboard, redirecting through this app's navigation channel
    pub fn dashboard_guard(&self) -> DashboardGuard {
        AccessGuard::new(&self.store, self.nav_tx.clone())
    }

    /// Pick the first screen: dashboard when a mirrored session exists, login otherwise
    pub fn start(&mut self) {
        if self.auth.restore() {
            self.nav_tx.navigate(Route::Dashboard);
        } else {
            self.start_login();
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Apply queued navigation requests. Call after each drawn frame.
    pub fn process_navigation(&mut self, guard: &mut DashboardGuard) {
        while let Ok(route) = self.nav_rx.try_recv() {
            self.navigate(route, guard);
        }
    }

    fn navigate(&mut self, route: Route, guard: &mut DashboardGuard) {
        match route {
            Route::Entry => {
                if self.screen != Screen::Login {
                    info!("Navigating to login");
                    self.state = AppState::Normal;
                    self.discard_session_data();
                    self.form.reset();
                    self.start_login();
                }
            }
            Route::Dashboard => {
                info!("Navigating to dashboard");
                self.screen = Screen::Dashboard;
                self.state = AppState::Normal;
                self.discard_session_data();
                self.pagination = Pagination::default();
                self.selection = 0;
                guard.remount();
                self.fetch_page();
            }
        }
    }

    /// Drop rows and in-flight results that belong to the previous session
    fn discard_session_data(&mut self) {
        self.fetch_generation += 1;
        self.loading = false;
        self.purchases.clear();
        self.status_message = None;
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Show the login screen
    pub fn start_login(&mut self) {
        self.screen = Screen::Login;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_errors = LoginErrors::default();
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        self.login_errors = LoginErrors::default();
        self.login_status = None;

        let email = self.login_email.trim().to_string();
        let result = self.auth.login(&email, &self.login_password).await;
        match result {
            Ok(()) => {
                self.login_status = Some(LOGIN_SUCCESS_MESSAGE.to_string());
                self.login_password.clear();

                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.nav_tx.navigate(Route::Dashboard);
            }
            Err(e) => {
                if let Some(field_errors) = e.downcast_ref::<LoginErrors>() {
                    self.login_errors = field_errors.clone();
                    self.login_focus = if field_errors.email.is_some() {
                        LoginFocus::Email
                    } else {
                        LoginFocus::Password
                    };
                } else {
                    error!(error = %e, "Login failed");
                    self.login_status = Some(login_failure_message(&e).to_string());
                }
            }
        }
    }

    /// Log out and return to the login screen
    pub fn logout(&mut self) {
        self.auth.logout();
        self.discard_session_data();
        self.login_status = None;
        self.nav_tx.navigate(Route::Entry);
    }

    // =========================================================================
    // Purchase list
    // =========================================================================

    /// Fetch the current page in the background. Skipped when signed out.
    pub fn fetch_page(&mut self) {
        if !self.store.is_authenticated() {
            debug!("No token, skipping purchase fetch");
            return;
        }

        self.fetch_generation += 1;
        let generation = self.fetch_generation;
        let page = self.pagination.current();
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        self.loading = true;

        tokio::spawn(async move {
            let result = match api.list_purchases(page).await {
                Ok(page) => TaskResult::Page(generation, page),
                Err(e) => {
                    let (message, ends_session) = describe_failure(&e);
                    TaskResult::PageFailed {
                        generation,
                        message,
                        ends_session,
                    }
                }
            };
            if tx.send(result).await.is_err() {
                debug!("App gone before purchase page arrived");
            }
        });
    }

    pub fn next_page(&mut self) {
        if self.pagination.next() {
            self.fetch_page();
        }
    }

    pub fn prev_page(&mut self) {
        if self.pagination.prev() {
            self.fetch_page();
        }
    }

    pub fn select_next(&mut self) {
        if self.selection + 1 < self.purchases.len() {
            self.selection += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selection = self.selection.saturating_sub(1);
    }

    // =========================================================================
    // Purchase entry modal
    // =========================================================================

    pub fn open_form(&mut self) {
        self.state = AppState::AddingPurchase;
        self.form_error = None;
        self.form_row = self.form_row.min(self.form.len().saturating_sub(1));
    }

    /// Close the modal, keeping whatever was typed
    pub fn close_form(&mut self) {
        self.state = AppState::Normal;
    }

    pub fn form_add_row(&mut self) {
        self.form_row = self.form.add_row();
        self.form_field = PurchaseField::Item;
    }

    pub fn form_remove_row(&mut self) {
        if self.form.remove_row(self.form_row).is_some() {
            self.form_row = self.form_row.min(self.form.len().saturating_sub(1));
        }
    }

    pub fn form_type_char(&mut self, c: char) {
        let field = self.form_field;
        if let Some(row) = self.form.row_mut(self.form_row) {
            row.push_char(field, c);
        }
    }

    pub fn form_backspace(&mut self) {
        let field = self.form_field;
        if let Some(row) = self.form.row_mut(self.form_row) {
            row.pop_char(field);
        }
    }

    pub fn form_next_row(&mut self) {
        if self.form_row + 1 < self.form.len() {
            self.form_row += 1;
        }
    }

    pub fn form_prev_row(&mut self) {
        self.form_row = self.form_row.saturating_sub(1);
    }

    /// Validate and submit the form in the background
    pub fn submit_form(&mut self) {
        if self.submitting {
            return;
        }
        let rows = match self.form.validate() {
            Ok(rows) => rows,
            Err(e) => {
                if let Some(row) = e.row() {
                    self.form_row = row;
                }
                self.form_error = Some(e.to_string());
                return;
            }
        };
        if !self.store.is_authenticated() {
            debug!("No token, skipping purchase submission");
            return;
        }

        self.form_error = None;
        self.submitting = true;
        let api = self.api.clone();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = match api.create_purchases(&rows).await {
                Ok(()) => TaskResult::Submitted,
                Err(e) => {
                    let (message, ends_session) = describe_failure(&e);
                    TaskResult::SubmitFailed {
                        message,
                        ends_session,
                    }
                }
            };
            if tx.send(result).await.is_err() {
                debug!("App gone before submission finished");
            }
        });
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Apply any finished background work
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.apply_task_result(result);
        }
    }

    fn apply_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Page(generation, page) => {
                if generation != self.fetch_generation {
                    debug!(generation, "Dropping stale purchase page");
                    return;
                }
                self.loading = false;
                self.pagination.set_last(page.last_page);
                self.purchases = page.data;
                self.selection = self.selection.min(self.purchases.len().saturating_sub(1));
            }
            TaskResult::PageFailed {
                generation,
                message,
                ends_session,
            } => {
                if generation != self.fetch_generation {
                    return;
                }
                self.loading = false;
                error!(error = %message, "Failed to fetch purchases");
                self.status_message = Some(message);
                if ends_session {
                    // The dashboard guard sees the cleared session and redirects
                    self.auth.logout();
                    self.fetch_generation += 1;
                }
            }
            TaskResult::Submitted => {
                self.submitting = false;
                self.form.reset();
                self.form_row = 0;
                self.form_field = PurchaseField::Item;
                self.state = AppState::Normal;
                self.status_message = Some(SUBMIT_SUCCESS_MESSAGE.to_string());
                self.fetch_page();
            }
            TaskResult::SubmitFailed {
                message,
                ends_session,
            } => {
                self.submitting = false;
                error!(error = %message, "Failed to submit purchases");
                self.form_error = Some(format!("Failed to submit: {}", message));
                if ends_session {
                    self.auth.logout();
                }
            }
        }
    }
}

// ============================================================================
// Input Validation
// ============================================================================

/// Check if a character can be added to the email field
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && !c.is_control() && !c.is_whitespace()
}

/// Check if a character can be added to the password field
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && !c.is_control()
}

#[cfg(test)]
mod tests {
    use super::*;
    use purchasedesk_core::auth::NoMirror;
    use std::sync::Arc;

    fn test_app() -> App {
        let store = SessionStore::new();
        let api = ApiClient::new("http://127.0.0.1:9", store.clone()).expect("client");
        let auth = Authenticator::new(api.clone(), Arc::new(NoMirror));
        App::with_services(Config::default(), store, api, auth)
    }

    fn page(current: u32, last: u32, rows: usize) -> PurchasePage {
        PurchasePage {
            data: vec![MaterialPurchase::default(); rows],
            current_page: current,
            last_page: last,
            total: None,
        }
    }

    // -------------------------------------------------------------------------
    // Navigation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_start_without_session_shows_login() {
        let mut app = test_app();
        app.start();
        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.login_focus, LoginFocus::Email);
    }

    #[test]
    fn test_guard_redirect_reaches_login() {
        let mut app = test_app();
        let mut guard = app.dashboard_guard();
        app.screen = Screen::Dashboard;

        // Nothing rendered, redirect queued after commit
        assert!(guard.render(|_| ()).is_none());
        guard.commit();
        app.process_navigation(&mut guard);

        assert_eq!(app.screen, Screen::Login);
    }

    #[tokio::test]
    async fn test_logout_while_on_dashboard() {
        let mut app = test_app();
        let mut guard = app.dashboard_guard();
        app.store.set_credentials("a@b.com", "tok123");
        app.nav_tx.navigate(Route::Dashboard);
        app.process_navigation(&mut guard);
        assert_eq!(app.screen, Screen::Dashboard);
        assert!(app.loading);

        assert!(guard.render(|_| ()).is_some());
        guard.commit();

        app.logout();
        assert!(guard.needs_render());
        app.process_navigation(&mut guard);
        assert_eq!(app.screen, Screen::Login);
        assert!(!app.store.is_authenticated());
    }

    #[tokio::test]
    async fn test_fetch_in_flight_at_logout_is_dropped() {
        let mut app = test_app();
        let mut guard = app.dashboard_guard();

        // First user signs in and a page fetch starts
        app.store.set_credentials("a@b.com", "tok-a");
        app.nav_tx.navigate(Route::Dashboard);
        app.process_navigation(&mut guard);
        let first_user_generation = app.fetch_generation;
        app.status_message = Some("Unauthorized - token may be expired".to_string());

        app.logout();
        app.process_navigation(&mut guard);
        assert!(!app.loading);
        assert_eq!(app.status_message, None);

        // The first user's page lands after logout
        let mut stale = page(1, 1, 1);
        stale.data[0].line_item_name = "first user row".to_string();
        app.apply_task_result(TaskResult::Page(first_user_generation, stale));
        assert!(app.purchases.is_empty());

        // Second user signs in and their fetch fails
        app.store.set_credentials("c@d.com", "tok-b");
        app.nav_tx.navigate(Route::Dashboard);
        app.process_navigation(&mut guard);
        let generation = app.fetch_generation;
        app.apply_task_result(TaskResult::PageFailed {
            generation,
            message: "Server error: down".to_string(),
            ends_session: false,
        });

        assert!(app.purchases.is_empty());
        assert!(!app.loading);
    }

    #[test]
    fn test_dashboard_entry_clears_previous_rows() {
        let mut app = test_app();
        let mut guard = app.dashboard_guard();
        app.purchases = vec![MaterialPurchase::default(); 2];
        app.status_message = Some("old".to_string());

        // No token, so no fetch is spawned
        app.nav_tx.navigate(Route::Dashboard);
        app.process_navigation(&mut guard);

        assert!(app.purchases.is_empty());
        assert_eq!(app.status_message, None);
    }

    #[test]
    fn test_fetch_skipped_without_token() {
        let mut app = test_app();
        app.fetch_page();
        assert!(!app.loading);
    }

    // -------------------------------------------------------------------------
    // Background Result Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_page_result_updates_list() {
        let mut app = test_app();
        app.fetch_generation = 3;
        app.loading = true;

        app.apply_task_result(TaskResult::Page(3, page(1, 4, 2)));
        assert!(!app.loading);
        assert_eq!(app.purchases.len(), 2);
        assert_eq!(app.pagination.last(), 4);
    }

    #[test]
    fn test_stale_page_is_dropped() {
        let mut app = test_app();
        app.fetch_generation = 5;
        app.loading = true;

        app.apply_task_result(TaskResult::Page(4, page(1, 1, 3)));
        assert!(app.loading);
        assert!(app.purchases.is_empty());
    }

    #[test]
    fn test_unauthorized_page_ends_session() {
        let mut app = test_app();
        app.store.set_credentials("a@b.com", "tok123");
        app.apply_task_result(TaskResult::PageFailed {
            generation: 0,
            message: "Unauthorized".to_string(),
            ends_session: true,
        });
        assert!(!app.store.is_authenticated());
    }

    #[test]
    fn test_submit_failure_keeps_form() {
        let mut app = test_app();
        app.open_form();
        app.form_type_char('x');
        app.submitting = true;

        app.apply_task_result(TaskResult::SubmitFailed {
            message: "Store is required".to_string(),
            ends_session: false,
        });
        assert!(!app.submitting);
        assert_eq!(app.state, AppState::AddingPurchase);
        assert_eq!(app.form.rows()[0].line_item_name, "x");
        assert_eq!(
            app.form_error.as_deref(),
            Some("Failed to submit: Store is required")
        );
    }

    #[test]
    fn test_submit_success_resets_form() {
        let mut app = test_app();
        app.open_form();
        app.form_type_char('x');
        app.form_add_row();
        app.submitting = true;

        app.apply_task_result(TaskResult::Submitted);
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.form.len(), 1);
        assert_eq!(app.form_row, 0);
        assert_eq!(app.status_message.as_deref(), Some(SUBMIT_SUCCESS_MESSAGE));
    }

    // -------------------------------------------------------------------------
    // Form Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_invalid_form_shows_error_and_moves_to_row() {
        let mut app = test_app();
        app.open_form();
        app.form_add_row();
        app.submit_form();

        assert!(!app.submitting);
        assert_eq!(
            app.form_error.as_deref(),
            Some("Please fill out all required fields.")
        );
        assert_eq!(app.form_row, 0);
    }

    #[test]
    fn test_form_row_navigation() {
        let mut app = test_app();
        app.form_add_row();
        app.form_add_row();
        assert_eq!(app.form_row, 2);
        app.form_next_row();
        assert_eq!(app.form_row, 2);
        app.form_prev_row();
        app.form_remove_row();
        assert_eq!(app.form.len(), 2);
        assert_eq!(app.form_row, 1);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_email_char() {
        assert!(can_add_email_char(0, 'a'));
        assert!(can_add_email_char(253, '@'));
        assert!(!can_add_email_char(254, 'a'));
        assert!(!can_add_email_char(0, ' '));
        assert!(!can_add_email_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\x00'));
        // Spaces are fine in passwords
        assert!(can_add_password_char(0, ' '));
    }

    #[test]
    fn test_login_focus_cycles() {
        assert_eq!(LoginFocus::Email.next(), LoginFocus::Password);
        assert_eq!(LoginFocus::Button.next(), LoginFocus::Email);
        assert_eq!(LoginFocus::Email.prev(), LoginFocus::Button);
    }
}
