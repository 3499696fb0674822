//! Command Handler Module
//!
//! This module implements the command processing layer for flashmc.
//! It receives parsed commands, executes them against the storage engine,
//! and returns the reply to send back.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Line Parser    │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Dispatch     │
//! │  - Execute      │
//! │  - Map to reply │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `set`, `add`, `replace`, `append`, `prepend`
//! - `get`
//! - `delete`

pub mod handler;

// Re-export the main command handler
pub use handler::{expires_at, CommandHandler};
