#![deny(unsafe_code)]

//! strokectl — command-line control plane for the IKE daemon.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use strokectl_config::records::{CaRecord, ConnFile, ConnRecord};
use strokectl_config::ClientConfig;
use strokectl_core::{StrokeTransport, encode};

/// strokectl — push connection and CA records to the IKE daemon.
#[derive(Parser)]
#[command(name = "strokectl", version, about, long_about = None)]
struct Cli {
    /// Path to the client configuration file.
    #[arg(short, long, default_value = "strokectl.toml")]
    config: PathBuf,

    /// Path to the connection/CA records file.
    #[arg(short = 'r', long, default_value = "connections.toml")]
    records: PathBuf,

    /// Override the daemon socket path.
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a connection definition into the daemon.
    Add { name: String },

    /// Remove a connection definition from the daemon.
    Del { name: String },

    /// Install trap policies for a connection.
    Route { name: String },

    /// Initiate (bring up) a connection.
    Up { name: String },

    /// Register a certificate authority with the daemon.
    AddCa { name: String },

    /// Remove a certificate authority from the daemon.
    DelCa { name: String },

    /// Push the global setup settings to the daemon.
    Configure,

    /// Validate and display the client configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing subscriber with verbosity level
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = load_config(&cli.config).await?;
    let mut transport = StrokeTransport::from_config(&config);
    if let Some(socket) = &cli.socket {
        transport = transport.with_socket_path(socket);
    }

    match cli.command {
        Commands::Add { name } => {
            let records = load_records(&cli.records).await?;
            let conn = find_conn(&records, &name)?;
            info!(name = %name, "adding connection");
            encode::add_conn(&transport, &records.setup, conn).await?;
        }
        Commands::Del { name } => {
            let records = load_records(&cli.records).await?;
            encode::del_conn(&transport, find_conn(&records, &name)?).await?;
        }
        Commands::Route { name } => {
            let records = load_records(&cli.records).await?;
            encode::route_conn(&transport, find_conn(&records, &name)?).await?;
        }
        Commands::Up { name } => {
            let records = load_records(&cli.records).await?;
            let conn = find_conn(&records, &name)?;
            info!(name = %name, "initiating connection");
            encode::initiate_conn(&transport, conn).await?;
        }
        Commands::AddCa { name } => {
            let records = load_records(&cli.records).await?;
            encode::add_ca(&transport, find_ca(&records, &name)?).await?;
        }
        Commands::DelCa { name } => {
            let records = load_records(&cli.records).await?;
            encode::del_ca(&transport, find_ca(&records, &name)?).await?;
        }
        Commands::Configure => {
            let records = load_records(&cli.records).await?;
            encode::configure(&transport, &records.setup).await?;
        }
        Commands::Config { show } => {
            if show {
                let toml_str = toml::to_string_pretty(&config)
                    .map_err(|e| anyhow::anyhow!("TOML error: {e}"))?;
                println!("{toml_str}");
            } else {
                println!("Configuration at '{}' is valid.", cli.config.display());
            }
        }
    }

    Ok(())
}

async fn load_config(path: &Path) -> Result<ClientConfig> {
    if path.exists() {
        ClientConfig::load(path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(ClientConfig::default())
    }
}

async fn load_records(path: &Path) -> Result<ConnFile> {
    ConnFile::load(path)
        .await
        .with_context(|| format!("failed to load records from {}", path.display()))
}

fn find_conn<'a>(records: &'a ConnFile, name: &str) -> Result<&'a ConnRecord> {
    match records.connection(name) {
        Some(conn) => Ok(conn),
        None => bail!("no connection named {name:?} in the records file"),
    }
}

fn find_ca<'a>(records: &'a ConnFile, name: &str) -> Result<&'a CaRecord> {
    match records.authority(name) {
        Some(ca) => Ok(ca),
        None => bail!("no certificate authority named {name:?} in the records file"),
    }
}
