//! CLI entrypoint for the signal receiver.
//! `serve` (the default) runs the webhook listener; `init` writes a config file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use signal_receiver::config::{self, Config, DEFAULT_CONFIG_FILE};
use signal_receiver::{AppState, MemoryStore, SignalIngestor, StoreState};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "signal-receiver", author, version, about = "Ticker/color webhook receiver", long_about = None)]
struct Args {
    /// Path to the configuration file (TOML); optional
    #[arg(short, long, env = "SIGNAL_RECEIVER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Redis connection string (overrides config and REDIS_URL)
    #[arg(long, value_name = "URL")]
    redis_url: Option<String>,

    /// Keep signals in process memory instead of Redis (local testing only)
    #[arg(long, conflicts_with = "redis_url")]
    memory_store: bool,

    /// Print the default configuration to stdout and exit
    #[arg(long)]
    print_default_config: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the webhook listener (default)
    Serve,
    /// Write a commented default configuration file
    Init {
        /// Output path for the config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    if args.print_default_config {
        println!("{}", Config::default_toml());
        return Ok(());
    }

    match &args.command {
        | Some(Command::Init { config, force }) => init_config(config, *force),
        | Some(Command::Serve) | None => run_service(&args).await,
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("Config file {} exists. Use --force to overwrite.", path.display());
    }
    config::generate_commented_config_template(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load_or_default(&args.config).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = &args.redis_url {
        config.store.url = Some(url.clone());
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run_service(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    signal_receiver::utils::init_logging(&config.log_level);
    if let Err(e) = signal_receiver::metrics::init() {
        log::warn!("Prometheus recorder not installed: {}", e);
    }

    let store = if args.memory_store {
        log::warn!("Using the in-memory store; signals are not visible to other processes");
        StoreState::ready(Arc::new(MemoryStore::new()))
    } else {
        StoreState::connect(&config.store).await
    };

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.bind_address()))?;

    let state = AppState::new(SignalIngestor::from_config(store, &config));
    signal_receiver::server::serve(addr, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received. Stopping...");
}
