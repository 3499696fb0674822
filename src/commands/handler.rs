//! Command Handler Module
//!
//! This module applies parsed commands to the storage engine and turns the
//! outcome into a protocol reply.
//!
//! ## Reply Mapping
//!
//! | Command          | Outcome              | Reply                        |
//! |------------------|----------------------|------------------------------|
//! | `set`            | stored               | `STORED`                     |
//! | `get`            | hit / miss           | `VALUE <v> <flags> <bytes>` / `END` |
//! | `add`            | stored / live key    | `STORED` / `NOT_STORED`      |
//! | `replace`        | stored / no key      | `STORED` / `NOT_STORED`      |
//! | `append/prepend` | stored / no key      | `STORED` / `NOT_STORED`      |
//! | `delete`         | removed / no key     | `DELETED` / `NOT_FOUND`      |
//! | any              | other store error    | `SERVER_ERROR <message>`     |

use crate::protocol::{Command, Reply, Verb};
use crate::storage::{Entry, StorageEngine, StoreError, StoreResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Executes commands against a shared storage engine.
#[derive(Clone)]
pub struct CommandHandler {
    /// The storage engine
    storage: Arc<StorageEngine>,
}

impl CommandHandler {
    /// Creates a new command handler with the given storage engine.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }

    /// Executes a command and returns the reply.
    ///
    /// # Arguments
    ///
    /// * `command` - The parsed command line
    /// * `data` - The data line for storage commands, `None` for `get`/`delete`
    pub fn execute(&self, command: &Command, data: Option<&str>) -> Reply {
        let key = command.key.as_str();

        match command.verb {
            Verb::Get => self.cmd_get(key),
            Verb::Delete => self.cmd_delete(key),
            Verb::Set => {
                let entry = entry_from(command, data);
                stored_or(self.storage.set(key, entry))
            }
            Verb::Add => {
                let entry = entry_from(command, data);
                stored_or(self.storage.add(key, entry))
            }
            Verb::Replace => {
                let entry = entry_from(command, data);
                stored_or(self.storage.replace(key, entry))
            }
            Verb::Append => {
                let entry = entry_from(command, data);
                stored_or(self.storage.append(key, entry))
            }
            Verb::Prepend => {
                let entry = entry_from(command, data);
                stored_or(self.storage.prepend(key, entry))
            }
        }
    }

    /// get key
    fn cmd_get(&self, key: &str) -> Reply {
        match self.storage.get(key) {
            Ok(entry) => Reply::Value {
                value: entry.value,
                flags: entry.flags,
                byte_count: entry.byte_count,
            },
            Err(StoreError::KeyNotFound(_)) => Reply::End,
            Err(e) => unexpected(e),
        }
    }

    /// delete key
    fn cmd_delete(&self, key: &str) -> Reply {
        if self.storage.delete(key) {
            Reply::Deleted
        } else {
            Reply::NotFound
        }
    }
}

/// Builds the entry a storage command carries.
fn entry_from(command: &Command, data: Option<&str>) -> Entry {
    Entry::new(data.unwrap_or_default(), command.flags, command.byte_count)
        .expiring_at(expires_at(command.exptime))
}

/// Converts a relative exptime in seconds into an expiry instant.
///
/// Zero means never; a negative value means the entry is already expired.
/// An exptime too far out for the clock to represent also means never.
pub fn expires_at(exptime: i64) -> Option<Instant> {
    let now = Instant::now();
    match exptime {
        0 => None,
        secs if secs < 0 => Some(now),
        secs => now.checked_add(Duration::from_secs(secs.unsigned_abs())),
    }
}

/// Maps the result of a storage command to `STORED`/`NOT_STORED`.
fn stored_or(result: StoreResult<()>) -> Reply {
    match result {
        Ok(()) => Reply::Stored,
        Err(StoreError::KeyAlreadyExists(_)) | Err(StoreError::KeyNotFound(_)) => {
            Reply::NotStored
        }
        Err(e) => unexpected(e),
    }
}

fn unexpected(e: StoreError) -> Reply {
    debug!(error = %e, "Command failed");
    Reply::server_error(e.to_string())
}
