//! flashmc - An LRU Cache with TTL over a memcached-style Text Protocol
//!
//! This is the main entry point for the flashmc server.
//! It sets up logging, the storage engine, the expiry sweeper and the
//! TCP server, then runs until Ctrl+C.

use anyhow::Context;
use clap::Parser;
use flashmc::connection::ConnectionStats;
use flashmc::storage::{ExpiryConfig, ExpirySweeper, StorageEngine};
use flashmc::{Config, Server};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::parse();

    // Set up logging; RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .with_context(|| format!("invalid log level '{}'", config.log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!(version = flashmc::VERSION, "Starting flashmc");

    // Create the storage engine (shared across all connections)
    let storage = Arc::new(StorageEngine::new(config.capacity));
    if config.capacity == 0 {
        info!("Storage engine initialized without a capacity bound");
    } else {
        info!(capacity = config.capacity, "Storage engine initialized");
    }

    // Start the background expiry sweeper
    let mut sweeper = ExpirySweeper::new(
        Arc::clone(&storage),
        ExpiryConfig {
            interval: config.sweep_interval(),
        },
    );
    sweeper.start();

    // Create connection statistics
    let stats = Arc::new(ConnectionStats::new());

    // Bind the TCP listener
    let server = Server::bind(config.bind_address(), Arc::clone(&storage), Arc::clone(&stats))
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        _ = server.run() => {}
        _ = shutdown => {}
    }

    sweeper.stop().await;

    let store = storage.stats();
    info!(
        keys = store.keys,
        hits = store.hits,
        misses = store.misses,
        sets = store.sets,
        evictions = store.evictions,
        expired = store.expired,
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        "Server shutdown complete"
    );

    Ok(())
}
