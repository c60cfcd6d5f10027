use clap::Parser;
use ferrumkv::{aof::SyncPolicy, server, Config};
use std::path::PathBuf;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// FerrumKV server
#[derive(Parser, Debug)]
#[command(name = "ferrumkv")]
#[command(about = "In-memory key-value store speaking RESP, persisted to an append-only file")]
#[command(version)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long)]
    bind: Option<String>,

    /// Path of the append-only file
    #[arg(long)]
    aof_path: Option<PathBuf>,

    /// fsync policy for the append-only file: always, everysec or no
    #[arg(long)]
    appendfsync: Option<SyncPolicy>,

    /// Run in memory only, without reading or writing the append-only file
    #[arg(long)]
    no_aof: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(path) = self.aof_path {
            config.aof.path = path;
        }
        if let Some(policy) = self.appendfsync {
            config.aof.sync_policy = policy;
        }
        if self.no_aof {
            config.aof.enabled = false;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging (RUST_LOG, INFO by default)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    info!("FerrumKV v{} starting...", ferrumkv::VERSION);
    info!("AOF: {:?} (sync: {:?}, enabled: {})", config.aof.path, config.aof.sync_policy, config.aof.enabled);

    if let Err(e) = server::run(config).await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }
}
