//! Server module
//!
//! Handles TCP connections and manages the accept loop.
//! This module is responsible for accepting connections and delegating
//! command processing to the dispatcher.

mod connection;

use crate::aof::SyncPolicy;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, error};

pub use connection::Connection;

/// Run the server
///
/// Rebuilds the store from the AOF, then starts the TCP server on the
/// configured address. No connection is accepted before replay finishes.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::with_aof(&config.aof)
        .context("Failed to initialize AOF")?;

    let stats = dispatcher.store().stats();
    info!(
        "Store ready: {} string keys, {} hashes ({} fields)",
        stats.string_keys, stats.hash_keys, stats.hash_fields
    );

    let dispatcher = Arc::new(dispatcher);
    spawn_aof_sync(dispatcher.clone());

    run_with_dispatcher(&config.bind, dispatcher).await
}

/// Sync the AOF once per second under `EverySec`
///
/// Without this, the last records before an idle period would wait for the
/// next append to reach the disk.
pub fn spawn_aof_sync(dispatcher: Arc<Dispatcher>) {
    match dispatcher.aof() {
        Some(aof) if aof.sync_policy() == SyncPolicy::EverySec => {}
        _ => return,
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            ticker.tick().await;
            let Some(aof) = dispatcher.aof() else {
                return;
            };
            if let Err(e) = aof.sync_pending() {
                error!("Failed to sync AOF: {}", e);
            }
        }
    });
}

/// Run the server with a provided dispatcher
pub async fn run_with_dispatcher(
    addr: &str,
    dispatcher: Arc<Dispatcher>,
) -> anyhow::Result<()> {
    // Bind the TCP listener
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("FerrumKV RESP server listening on {}", listener.local_addr()?);

    serve(listener, dispatcher).await
}

/// Accept connections forever on an already bound listener
///
/// Each connection gets its own task; there is no connection limit.
pub async fn serve(listener: TcpListener, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    loop {
        // Accept incoming connections
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };
        info!("New RESP connection from {}", addr);

        // Clone the dispatcher Arc for this connection
        let dispatcher = dispatcher.clone();

        // Spawn a new task to handle this connection
        tokio::spawn(async move {
            let mut connection = Connection::new(socket);

            if let Err(e) = connection.handle(dispatcher).await {
                error!("Connection error from {}: {}", addr, e);
            }

            info!("Connection closed: {}", addr);
        });
    }
}
