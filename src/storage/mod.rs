//! Storage Engine Module
//!
//! This module provides the core storage functionality for flashmc: a
//! bounded LRU store with TTL support and a background expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │            Mutex ( HashMap  +  RecencyList )                │
//! │                                                             │
//! │   front (LRU) ──> ... ──> ... ──> ... ──> back (MRU)        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │     ExpirySweeper         │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **LRU Eviction**: O(1) lookup, recency update and eviction
//! - **Single Lock**: Connection tasks and the sweeper share one mutex
//! - **TTL Support**: Entries can carry an expiry instant
//! - **Lazy Expiry**: Expired entries are removed when `get` finds them
//! - **Active Expiry**: Background sweeper cleans orphaned expired entries
//!
//! ## Example
//!
//! ```
//! use flashmc::storage::{Entry, StorageEngine};
//! use std::time::Duration;
//!
//! let engine = StorageEngine::new(1024);
//!
//! engine.set("name", Entry::new("Ariz", 0, 4)).unwrap();
//! assert_eq!(engine.get("name").unwrap().value, "Ariz");
//!
//! // Set with TTL
//! engine
//!     .set("session", Entry::new("token123", 0, 8).with_ttl(Duration::from_secs(3600)))
//!     .unwrap();
//! ```

pub mod engine;
pub mod expiry;
pub mod recency;

// Re-export commonly used types
pub use engine::{Entry, StorageEngine, StorageStats, StoreError, StoreResult, UNBOUNDED};
pub use expiry::{start_expiry_sweeper, ExpiryConfig, ExpirySweeper, DEFAULT_SWEEP_INTERVAL};
