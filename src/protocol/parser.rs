//! Command Line Parser
//!
//! This module turns one protocol line into a [`Command`].
//!
//! ## Grammar
//!
//! ```text
//! get <key>                                          (exactly one space)
//! delete <key> [noreply]
//! <verb> <key> <flags> <exptime> <bytes> [noreply]   (any run of whitespace)
//! ```
//!
//! The parser only looks at the command line. Reading the data line that
//! follows a storage command, and honouring `noreply`, is up to the caller.

use crate::protocol::types::{Command, Verb};
use thiserror::Error;

/// Errors that can occur while parsing a command line.
///
/// Each numeric field has its own variant so the client can tell which one
/// was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line was blank
    #[error("empty command")]
    Empty,

    /// `get` not followed by exactly one key
    #[error("unexpected command structure for: '{0}'")]
    MalformedGet(String),

    /// `delete` not followed by a key and an optional `noreply`
    #[error("unexpected command structure for: '{0}'")]
    MalformedDelete(String),

    /// Wrong number of fields or a stray trailing token
    #[error("expected `<command> <key> <flags> <exptime> <bytes> [noreply]`, got: '{0}'")]
    Syntax(String),

    /// `flags` is not an unsigned 16-bit integer
    #[error("`flags` must be a number between 0 and 65535, got '{0}'")]
    InvalidFlags(String),

    /// `exptime` is not an integer
    #[error("`exptime` must be a number, got '{0}'")]
    InvalidExptime(String),

    /// `bytes` is not a non-negative integer
    #[error("`bytes` must be a non-negative number, got '{0}'")]
    InvalidByteCount(String),

    /// The verb isn't one we serve
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// An unknown verb on a well-formed storage line; a data line follows
    #[error("unknown command '{0}'")]
    UnknownStorageCommand(String),
}

impl ParseError {
    /// The name of the rejected verb, if the verb itself was the problem.
    pub fn unknown_verb(&self) -> Option<&str> {
        match self {
            ParseError::UnknownCommand(name) | ParseError::UnknownStorageCommand(name) => {
                Some(name.as_str())
            }
            _ => None,
        }
    }

    /// Returns true if the client will still send a data line for the
    /// rejected command, so the caller must consume it to stay in sync.
    pub fn has_data_line(&self) -> bool {
        matches!(self, ParseError::UnknownStorageCommand(_))
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

const NOREPLY: &str = "noreply";

/// Parses a single command line.
///
/// Surrounding whitespace, including the line terminator, is ignored.
///
/// # Example
///
/// ```
/// use flashmc::protocol::{parse_command, Verb};
///
/// let command = parse_command("set test 0 100 4 noreply").unwrap();
/// assert_eq!(command.verb, Verb::Set);
/// assert_eq!(command.key, "test");
/// assert_eq!(command.exptime, 100);
/// assert!(command.noreply);
/// ```
pub fn parse_command(line: &str) -> ParseResult<Command> {
    let line = line.trim();

    let name = match line.split_whitespace().next() {
        Some(name) => name,
        None => return Err(ParseError::Empty),
    };

    match name {
        "get" => parse_get(line),
        "delete" => parse_delete(line),
        _ => parse_storage(name, line),
    }
}

/// `get <key>`, split on single spaces.
fn parse_get(line: &str) -> ParseResult<Command> {
    let parts: Vec<&str> = line.split(' ').collect();

    match parts.as_slice() {
        [_, key] if !key.is_empty() => Ok(Command::keyed(Verb::Get, *key)),
        _ => Err(ParseError::MalformedGet(line.to_string())),
    }
}

/// `delete <key> [noreply]`
fn parse_delete(line: &str) -> ParseResult<Command> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    let (key, noreply) = match parts.as_slice() {
        [_, key] => (*key, false),
        [_, key, NOREPLY] => (*key, true),
        _ => return Err(ParseError::MalformedDelete(line.to_string())),
    };

    let mut command = Command::keyed(Verb::Delete, key);
    command.noreply = noreply;
    Ok(command)
}

/// `<verb> <key> <flags> <exptime> <bytes> [noreply]`
///
/// The fields are checked before the verb: a client that sends an unknown
/// verb in this shape still sends a data line, and the caller has to know.
fn parse_storage(name: &str, line: &str) -> ParseResult<Command> {
    let verb = Verb::from_name(name).filter(Verb::expects_data);

    let parts: Vec<&str> = line.split_whitespace().collect();

    let (key, flags, exptime, byte_count, noreply) = match parts.as_slice() {
        [_, key, flags, exptime, bytes] => (*key, *flags, *exptime, *bytes, false),
        [_, key, flags, exptime, bytes, NOREPLY] => (*key, *flags, *exptime, *bytes, true),
        _ if verb.is_none() => return Err(ParseError::UnknownCommand(name.to_string())),
        _ => return Err(ParseError::Syntax(line.to_string())),
    };

    let flags = flags
        .parse::<u16>()
        .map_err(|_| ParseError::InvalidFlags(flags.to_string()))?;

    let exptime = exptime
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidExptime(exptime.to_string()))?;

    let byte_count = byte_count
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidByteCount(byte_count.to_string()))?;

    let Some(verb) = verb else {
        return Err(ParseError::UnknownStorageCommand(name.to_string()));
    };

    Ok(Command {
        verb,
        key: key.to_string(),
        flags,
        exptime,
        byte_count,
        noreply,
    })
}
