mod config;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use config::{Config, ConfigError};
use qa_core::QaError;
use qa_events::bus::EventBus;
use qa_serve::AppState;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qa", about = "Quality assurance review workflow")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, env = "QA_CONFIG", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API and the periodic overdue sweep.
    Serve,
    /// Create or upgrade the database schema.
    Migrate,
    /// Mark overdue every in-progress review past its due date.
    Sweep {
        /// Date to compare due dates against (defaults to today, UTC).
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Print the OpenAPI document.
    Openapi,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid host {host:?}")]
    InvalidHost { host: String },
    #[error("database error: {message}")]
    Database { message: String },
    #[error(transparent)]
    Qa(#[from] QaError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Config errors surface before tracing is initialised.
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Openapi = cli.command {
        println!("{}", qa_serve::openapi::generate_spec());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    init_tracing(&config);

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Migrate => {
            let db_path = prepare_db_path(&config)?;
            qa_db::schema::open_and_migrate(&db_path).map_err(|err| CliError::Database {
                message: err.to_string(),
            })?;
            tracing::info!(db_path = %db_path, "schema up to date");
            Ok(())
        }
        Command::Sweep { today } => {
            let state = app_state(&config)?;
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            let moved = qa_serve::overdue_sweep::sweep_once(&state, today)?;
            for review in &moved {
                println!("{}", review.id);
            }
            tracing::info!(count = moved.len(), %today, "overdue sweep finished");
            Ok(())
        }
        Command::Openapi => Ok(()),
    }
}

async fn serve(config: Config) -> Result<(), CliError> {
    let host: IpAddr = config.host.parse().map_err(|_| CliError::InvalidHost {
        host: config.host.clone(),
    })?;
    let addr = SocketAddr::new(host, config.port);
    let state = app_state(&config)?;

    let sweep_state = state.clone();
    let every = Duration::from_secs(config.sweep_interval_secs);
    tokio::spawn(async move { qa_serve::overdue_sweep::run(sweep_state, every).await });

    qa_serve::serve(state, addr).await?;
    Ok(())
}

fn app_state(config: &Config) -> Result<AppState, CliError> {
    let db_path = prepare_db_path(config)?;
    Ok(AppState::new(db_path, EventBus::new(config.event_bus_capacity)))
}

fn prepare_db_path(config: &Config) -> Result<String, CliError> {
    if let Some(parent) = config.db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(config.db_path.to_string_lossy().to_string())
}

fn init_tracing(config: &Config) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"))
        }
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
