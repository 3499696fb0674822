//! # flashmc - An LRU Cache with TTL and a memcached-style Text Protocol
//!
//! flashmc is an in-process, thread-safe cache with least-recently-used
//! eviction and per-entry expiry, plus a TCP server that exposes it over a
//! line-oriented protocol modeled on memcached's storage verbs.
//!
//! ## Features
//!
//! - **O(1) Operations**: Hash index into an arena-backed recency list
//! - **Bounded Capacity**: The least recently used entry is evicted on overflow
//! - **TTL Support**: Lazy expiry on read plus a background sweep
//! - **Async I/O**: Built on Tokio, one task per client connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              flashmc                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │   Line      │    │              StorageEngine (Mutex)           │   │
//! │  │   Parser    │    │  ┌──────────────┐     ┌───────────────────┐  │   │
//! │  │             │    │  │ HashMap      │────>│ Recency list      │  │   │
//! │  └─────────────┘    │  │ key -> slot  │     │ LRU ... MRU       │  │   │
//! │                     │  └──────────────┘     └───────────────────┘  │   │
//! │                     └──────────────────────────────────────────────┘   │
//! │                                               ▲                         │
//! │                                               │                         │
//! │                     ┌─────────────────────────┴───────────────────────┐ │
//! │                     │           ExpirySweeper                         │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use flashmc::connection::ConnectionStats;
//! use flashmc::server::Server;
//! use flashmc::storage::{start_expiry_sweeper, StorageEngine};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     // Create the storage engine, capped at 10k entries
//!     let storage = Arc::new(StorageEngine::new(10_000));
//!
//!     // Start the background expiry sweeper
//!     let _sweeper = start_expiry_sweeper(Arc::clone(&storage), Duration::from_secs(5));
//!
//!     // Serve it
//!     let stats = Arc::new(ConnectionStats::new());
//!     Server::bind("127.0.0.1:9999", storage, stats).await?.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `set <key> <flags> <exptime> <bytes> [noreply]` + data line
//! - `add`, `replace`, `append`, `prepend` (same shape as `set`)
//! - `get <key>`
//! - `delete <key> [noreply]`
//!
//! ## Module Overview
//!
//! - [`protocol`]: Line parser, commands and replies
//! - [`storage`]: Thread-safe LRU store with TTL support
//! - [`commands`]: Maps parsed commands onto the store
//! - [`connection`]: Client connection management
//! - [`server`]: TCP listener and accept loop
//! - [`config`]: Command-line configuration
//!
//! ## Design Highlights
//!
//! ### One Lock
//!
//! Every store operation, reads included, reorders the recency list, so a
//! single mutex guards both the index and the list. It is never held across
//! an `.await`.
//!
//! ### Lazy + Active Expiry
//!
//! Keys with TTL are expired in two ways:
//! 1. **Lazy**: When a key is read, we check if it's expired
//! 2. **Active**: A background task periodically scans for expired keys
//!
//! This ensures memory is reclaimed even for keys that are never accessed again.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{parse_command, Command, ParseError, Reply, Verb};
pub use server::Server;
pub use storage::{
    start_expiry_sweeper, Entry, ExpiryConfig, ExpirySweeper, StorageEngine, StoreError,
};

/// The default port flashmc listens on
pub const DEFAULT_PORT: u16 = 9999;

/// The default host flashmc binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of flashmc
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
