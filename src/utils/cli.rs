//! Running the CLI

// Allow exits because in this file we ideally handle all errors with known exit codes
#![allow(clippy::exit)]

use std::path::PathBuf;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

use crate::config::Config;
use crate::db;
use crate::db::models::user::{self, NewUser, Role};
use crate::server::app::serve;

/// EduVoice serves courses and learning documents, and hands documents
/// off to text-to-speech and AI reading.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to an `eduvoice.toml` configuration file. Defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// EduVoice cli subcommands
    #[command(subcommand)]
    subcommands: Subcommands,
}

///
#[derive(Clone, clap::Subcommand)]
enum Subcommands {
    /// Serve the HTTP API
    Serve {
        /// Port on which to serve the API. Overrides the configuration file.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manage user accounts
    #[command(subcommand)]
    User(UserCommands),
}

///
#[derive(Clone, clap::Subcommand)]
enum UserCommands {
    /// Register a user and the API token they authenticate with
    Add {
        /// Unique login name
        #[arg(long)]
        username: String,
        /// One of admin, teacher or student
        #[arg(long)]
        role: String,
        /// API token presented as `Authorization: Token <token>`
        #[arg(long)]
        token: String,
    },
}

/// Install the global subscriber. `RUST_LOG` wins over the `info` default.
///
/// The returned guard flushes the log file and must be held until exit.
fn init_tracing(log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "eduvoice.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
    guard
}

/// Register a user from the command line.
fn add_user(config: &Config, username: String, role: &str, token: String) -> anyhow::Result<()> {
    let role = Role::from_string(role)?;
    let new_user = NewUser {
        username,
        role,
        token,
    };
    actix_web::rt::System::new().block_on(async {
        let conn = db::init::connect(&config.database_url).await?;
        let created = user::Manager::create(&conn, &new_user).await?;
        tracing::info!(user_id = created.id, "Created {:?} '{}'", created.role, created.username);
        Ok::<(), anyhow::Error>(())
    })
}

/// Main entrypoint to application
///
/// # Errors
/// Errors when the server cannot bind its address.
pub fn run() -> std::io::Result<()> {
    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: could not load configuration: {err:#}");
            std::process::exit(1);
        }
    };
    let _guard = init_tracing(config.log_dir.as_ref());
    tracing::debug!("Starting application");

    match cli.subcommands {
        Subcommands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }
            serve(config)
        }
        Subcommands::User(UserCommands::Add {
            username,
            role,
            token,
        }) => {
            if let Err(err) = add_user(&config, username, &role, token) {
                tracing::error!("Unable to add user: {err:#}");
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
