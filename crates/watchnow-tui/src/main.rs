//! WatchNow - a terminal client for discovering and reviewing movies.
//!
//! Runs the full-screen TUI by default. `watchnow login`, `watchnow logout`
//! and `watchnow whoami` manage the stored session from the shell.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use watchnow_core::{ApiClient, Config, SessionState, SessionStore};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE: &str = "watchnow.log";

const USAGE: &str = "Usage: watchnow [login | logout | whoami]";

fn env_filter() -> EnvFilter {
    // RUST_LOG controls the level (e.g. RUST_LOG=watchnow_core=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to a daily file under the cache directory so the TUI stays clean.
fn init_file_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("Warning: could not create log directory: {}", e);
        return None;
    }
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(env_filter())
        .init();
    Some(guard)
}

/// CLI commands log straight to stderr.
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

fn build_session(config: &Config) -> Result<Arc<SessionStore>> {
    let server_url = config.server_url();
    let api = ApiClient::new(&server_url).context("Failed to create API client")?;
    let storage = config.open_storage()?;
    info!(server = %server_url, "Session store ready");
    Ok(Arc::new(SessionStore::new(api, storage)))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(command) = args.first() {
        init_stderr_tracing();
        return run_command(command, config).await;
    }

    let _guard = init_file_tracing(&config.cache_dir()?.join("logs"));
    info!("WatchNow starting");

    let session = build_session(&config)?;
    let listener = session.spawn_external_listener();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, Arc::clone(&session));
    app.start();

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    listener.abort();

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("WatchNow shutting down");
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }

                    if handle_input(app, key)? {
                        return Ok(());
                    }
                }
            }
        }

        // Apply auth changes and finished background requests
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// CLI commands
// ============================================================================

async fn run_command(command: &str, config: Config) -> Result<()> {
    match command {
        "login" => cli_login(config).await,
        "logout" => cli_logout(&config),
        "whoami" => cli_whoami(&config).await,
        "-h" | "--help" | "help" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => anyhow::bail!("Unknown command '{}'\n{}", other, USAGE),
    }
}

fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    Ok(match (input.is_empty(), default) {
        (true, Some(d)) => d.to_string(),
        _ => input.to_string(),
    })
}

async fn cli_login(mut config: Config) -> Result<()> {
    let session = build_session(&config)?;

    let email = match std::env::var("WATCHNOW_EMAIL") {
        Ok(email) => email,
        Err(_) => prompt("Email", config.last_email.as_deref())?,
    };
    let password = match std::env::var("WATCHNOW_PASSWORD") {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ")?,
    };

    match session.login(&email, &password).await {
        Ok(_) => {
            config.last_email = Some(email.trim().to_string());
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            let name = session
                .identity()
                .map(|me| me.display_name().to_string())
                .unwrap_or_else(|| email.trim().to_string());
            println!("Logged in as {}", name);
            Ok(())
        }
        Err(e) => anyhow::bail!(e.user_message("Login")),
    }
}

fn cli_logout(config: &Config) -> Result<()> {
    let session = build_session(config)?;
    session.logout();
    println!("Logged out");
    Ok(())
}

async fn cli_whoami(config: &Config) -> Result<()> {
    let session = build_session(config)?;
    match session.initialize().await {
        SessionState::Authenticated(me) => {
            println!("{} <{}>", me.display_name(), me.email);
            Ok(())
        }
        _ => anyhow::bail!("Not logged in. Run `watchnow login` first."),
    }
}
