//! jobboard - browse job offers and apply from the terminal.

mod app;
mod cli;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use jobboard_core::{ApiError, Config};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::Command;

/// Log file name prefix inside the data directory
const LOG_FILE_PREFIX: &str = "jobboard.log";

/// Exit code used when the session expired and the user must log in again
const EXIT_LOGIN_REQUIRED: u8 = 2;

/// Initialize the tracing subscriber: stderr plus a daily log file.
/// The returned guard must be kept alive to flush the file writer.
fn init_tracing(data_dir: &Path) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::daily(data_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match cli::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config ({}), using defaults", e);
            Config::default().with_env_overrides(std::env::var(jobboard_core::config::API_URL_ENV).ok())
        }
    };
    let data_dir = app::data_dir(&config);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Error: cannot create {}: {}", data_dir.display(), e);
        return ExitCode::FAILURE;
    }

    let _guard = init_tracing(&data_dir);
    info!(api = %config.api_base_url, "jobboard starting");

    match run(command, config, &data_dir).await {
        Ok(()) => ExitCode::SUCCESS,
        // The session listener has already told the user to log in again
        Err(e) if ApiError::is_login_required(&e) => ExitCode::from(EXIT_LOGIN_REQUIRED),
        Err(e) => {
            warn!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config, data_dir: &Path) -> Result<()> {
    if command == Command::Help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let mut app = App::new(config, data_dir)?;
    match command {
        Command::Login { email } => app.login(email).await,
        Command::Logout => app.logout(),
        Command::WhoAmI => {
            app.whoami();
            Ok(())
        }
        Command::Jobs(args) => app.list_jobs(&args).await,
        Command::Job { uuid } => app.show_job(&uuid).await,
        Command::Apply { uuid } => app.apply(&uuid).await,
        Command::Applications => app.list_applications(),
        Command::Help => Ok(()),
    }
}
