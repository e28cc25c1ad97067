use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use confkeep::config::ConfigStore;
use confkeep::identity::{ensure_client_id, ensure_device_id, SystemFingerprint};
use confkeep::locator::ProjectLocator;
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "confkeep")]
#[command(about = "Inspect and edit the self-healing client configuration", long_about = None)]
struct Cli {
    /// Project root (default: nearest ancestor with a config/ directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the completed configuration (default)
    Show,
    /// Print the value at a dotted path
    Get { path: String },
    /// Set a dotted path to a JSON value (bare words are stored as strings)
    Set { path: String, value: String },
    /// Reload the file and write back any missing defaults
    Reload,
    /// Generate the client id and device id if they are unset
    InitIds,
    /// Print the config file location
    Path,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let locator = cli
        .root
        .map_or_else(ProjectLocator::discover, ProjectLocator::new);
    let store = ConfigStore::open(locator);

    match cli.command.unwrap_or(Commands::Show) {
        Commands::Show => {
            println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
        }
        Commands::Get { path } => {
            let value = store.get(&path, Value::Null);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Set { path, value } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            if !store.set(&path, value) {
                bail!("failed to update {path}");
            }
            println!("OK");
        }
        Commands::Reload => {
            if !store.reload_config() {
                bail!("reloaded, but the completed config could not be written");
            }
            println!("OK");
        }
        Commands::InitIds => {
            let client_id = ensure_client_id(&store);
            let fingerprint = SystemFingerprint::new(store.config_dir());
            let device_id = ensure_device_id(&store, &fingerprint)
                .context("no MAC address available for the device id")?;
            println!("CLIENT_ID: {client_id}");
            println!("DEVICE_ID: {device_id}");
        }
        Commands::Path => {
            println!("{}", store.config_file().display());
        }
    }

    Ok(())
}
