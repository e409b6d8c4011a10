//! # pipefy-reconcile
//!
//! Command-line driver for the Pipefy reconciliation engine.
//!
//! ## Commands
//!
//! - `create`: Create an entity from a JSON spec and record its state
//! - `read`: Refresh a recorded entity, dropping it if it no longer exists
//! - `update`: Apply a JSON patch to a recorded entity
//! - `delete`: Delete a recorded entity
//! - `lookup`: Fetch an existing pipe or phase by id
//! - `show`: Print the state file
//!
//! ## Example
//!
//! ```bash
//! export PIPEFY_TOKEN=...
//!
//! # Create a pipe (its default phases are removed)
//! pipefy-reconcile create pipe sales --spec pipe.json
//!
//! # Add a phase to it
//! pipefy-reconcile create phase sales.todo --spec phase.json
//!
//! # Detect drift
//! pipefy-reconcile read pipe sales
//!
//! # Inspect recorded state
//! pipefy-reconcile show
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reconcile_client::{HttpTransport, ProviderConfig, Session};
use reconcile_types::EntityKind;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod state;

use commands::{create, delete, lookup, read, show, update, LookupKind};

/// Config file looked up in the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "pipefy.toml";

/// Command-line driver for reconciling Pipefy entities.
#[derive(Parser, Debug)]
#[command(name = "pipefy-reconcile")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Provider config file (TOML). Defaults to ./pipefy.toml if present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State file recording created entities
    #[arg(long, global = true, default_value = "pipefy-state.json")]
    state: PathBuf,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an entity and record its state
    Create {
        /// Entity kind (pipe, phase, field, automation)
        kind: EntityKind,
        /// Address to record the entity under
        address: String,
        /// JSON file with the desired attributes
        #[arg(long)]
        spec: PathBuf,
    },

    /// Refresh a recorded entity
    Read {
        /// Entity kind
        kind: EntityKind,
        /// Recorded address
        address: String,
    },

    /// Apply a patch to a recorded entity
    Update {
        /// Entity kind
        kind: EntityKind,
        /// Recorded address
        address: String,
        /// JSON file with the attributes to change
        #[arg(long)]
        patch: PathBuf,
    },

    /// Delete a recorded entity
    Delete {
        /// Entity kind
        kind: EntityKind,
        /// Recorded address
        address: String,
    },

    /// Fetch an existing pipe or phase by id
    Lookup {
        /// Entity kind
        #[arg(value_enum)]
        kind: LookupKind,
        /// Remote id
        id: String,
    },

    /// Print the state file
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Create {
            kind,
            address,
            spec,
        } => {
            let session = connect(cli.config.as_deref())?;
            create::run(&session, &cli.state, kind, &address, &spec, &cancel).await?;
        }
        Commands::Read { kind, address } => {
            let session = connect(cli.config.as_deref())?;
            read::run(&session, &cli.state, kind, &address, &cancel).await?;
        }
        Commands::Update {
            kind,
            address,
            patch,
        } => {
            let session = connect(cli.config.as_deref())?;
            update::run(&session, &cli.state, kind, &address, &patch, &cancel).await?;
        }
        Commands::Delete { kind, address } => {
            let session = connect(cli.config.as_deref())?;
            delete::run(&session, &cli.state, kind, &address, &cancel).await?;
        }
        Commands::Lookup { kind, id } => {
            let session = connect(cli.config.as_deref())?;
            lookup::run(&session, kind, &id, &cancel).await?;
        }
        Commands::Show => {
            show::run(&cli.state).await?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Build an HTTP session from the resolved configuration.
fn connect(explicit: Option<&Path>) -> Result<Session<HttpTransport>> {
    let config = load_config(explicit)?;
    Session::from_config(&config).context("Invalid provider configuration")
}

/// Load the provider config, completed from the environment.
fn load_config(explicit: Option<&Path>) -> Result<ProviderConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let config = match path {
        Some(path) => ProviderConfig::from_file(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ProviderConfig::default(),
    };
    Ok(config.with_env())
}

/// The first existing default config file, if any.
fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    directories::ProjectDirs::from("com", "pipefy", "pipefy-reconcile")
        .map(|dirs| dirs.config_dir().join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.exists())
}
