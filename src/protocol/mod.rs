//! Text Protocol Implementation
//!
//! This module implements the line-oriented text protocol flashmc speaks,
//! modeled on the memcached `set/get/add/replace/append/prepend` verbs.
//!
//! ## Modules
//!
//! - `types`: Defines `Command`, `Verb` and `Reply` with reply serialization
//! - `parser`: Turns a command line into a `Command`
//!
//! ## Example
//!
//! ```
//! use flashmc::protocol::{parse_command, Reply, Verb};
//!
//! // Parsing an incoming command line
//! let command = parse_command("set name 0 0 4").unwrap();
//! assert_eq!(command.verb, Verb::Set);
//!
//! // Creating replies
//! assert_eq!(Reply::Stored.serialize(), b"STORED\r\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_command, ParseError, ParseResult};
pub use types::{Command, Reply, Verb};
