//! purchasedesk - a terminal front-end for logging material purchases.
//!
//! Sign in, browse the purchase list page by page and submit new
//! multi-row purchase entries against the remote purchase API.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use purchasedesk_core::api::ApiClient;
use purchasedesk_core::auth::{Authenticator, SessionStore};
use purchasedesk_core::config::Config;

use app::{App, AppState, DashboardGuard, Screen};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file prefix inside the cache directory
const LOG_FILE: &str = "purchasedesk.log";

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to a daily file so output does not tear the terminal UI
fn init_file_tracing(log_dir: PathBuf) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    guard
}

fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--list" {
        init_stderr_tracing();
        let page = match args.get(2) {
            Some(p) => parse_page(p)?,
            None => 1,
        };
        return list_purchases(page).await;
    }

    let log_dir = Config::default()
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("./cache"));
    let _log_guard = init_file_tracing(log_dir);
    info!("purchasedesk starting");

    let mut app = App::new()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut guard = app.dashboard_guard();
    app.start();

    let result = run_app(&mut terminal, &mut app, &mut guard).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("purchasedesk shutting down");
    Ok(())
}

/// Parse the `--list` page argument (pages start at 1)
fn parse_page(arg: &str) -> Result<u32> {
    arg.parse::<u32>()
        .ok()
        .filter(|page| *page > 0)
        .with_context(|| format!("PAGE must be a positive number, got {:?}", arg))
}

/// Print one page of purchases as JSON, signing in first if needed
async fn list_purchases(page: u32) -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));

    let store = SessionStore::new();
    let api = ApiClient::new(config.api_base_url.clone(), store.clone())?;
    let auth = Authenticator::new(api.clone(), config.session_mirror(cache_dir));

    if !auth.restore() {
        let email = match config.last_email.clone() {
            Some(email) => email,
            None => {
                eprint!("Email: ");
                io::stderr().flush()?;
                let mut input = String::new();
                io::stdin().read_line(&mut input)?;
                input.trim().to_string()
            }
        };
        let password = match config.password.clone() {
            Some(password) => password,
            None => rpassword::prompt_password("Password: ")?,
        };
        auth.login(&email, &password).await?;
    }

    let purchases = api.list_purchases(page).await?;
    let json = serde_json::to_string_pretty(&purchases)?;
    println!("{}", json);
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    guard: &mut DashboardGuard,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app, guard))?;

        // Post-render: the guard may request a redirect for this frame
        if app.screen == Screen::Dashboard {
            guard.commit();
        }
        app.process_navigation(guard);

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page("1").expect("page"), 1);
        assert_eq!(parse_page("12").expect("page"), 12);

        let err = parse_page("0").expect_err("zero");
        assert!(err.to_string().contains("PAGE must be a positive number"));
        assert!(parse_page("-3").is_err());
        assert!(parse_page("two").is_err());
    }
}
