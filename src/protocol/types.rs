//! Text Protocol Data Types
//!
//! This module defines the commands and replies of the flashmc wire
//! protocol, a line-oriented subset of the memcached text protocol.
//!
//! ## Protocol Format
//!
//! Every request is one command line. Storage commands are followed by one
//! data line:
//!
//! ```text
//! <verb> <key> <flags> <exptime> <bytes> [noreply]\r\n
//! <data>\r\n
//! ```
//!
//! Retrieval and deletion take a single line:
//!
//! ```text
//! get <key>\r\n
//! delete <key> [noreply]\r\n
//! ```
//!
//! Every reply is a single line terminated with CRLF:
//!
//! - `STORED` / `NOT_STORED`
//! - `VALUE <data> <flags> <bytes>` / `END`
//! - `DELETED` / `NOT_FOUND`
//! - `ERROR ...`, `CLIENT_ERROR ...`, `SERVER_ERROR ...`

use std::fmt;

/// The line terminator used in replies
pub const CRLF: &[u8] = b"\r\n";

/// Protocol verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Set,
    Get,
    Add,
    Replace,
    Append,
    Prepend,
    Delete,
}

impl Verb {
    /// Looks up a verb by its wire name. Verbs are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "set" => Some(Verb::Set),
            "get" => Some(Verb::Get),
            "add" => Some(Verb::Add),
            "replace" => Some(Verb::Replace),
            "append" => Some(Verb::Append),
            "prepend" => Some(Verb::Prepend),
            "delete" => Some(Verb::Delete),
            _ => None,
        }
    }

    /// The wire name of this verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Set => "set",
            Verb::Get => "get",
            Verb::Add => "add",
            Verb::Replace => "replace",
            Verb::Append => "append",
            Verb::Prepend => "prepend",
            Verb::Delete => "delete",
        }
    }

    /// Returns true if the command line is followed by a data line.
    pub fn expects_data(&self) -> bool {
        !matches!(self, Verb::Get | Verb::Delete)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    pub key: String,
    /// Opaque client flags, stored and returned verbatim
    pub flags: u16,
    /// Seconds from now until expiry; 0 means never, negative means already expired
    pub exptime: i64,
    /// Declared length of the data line
    pub byte_count: usize,
    /// The client asked for no reply
    pub noreply: bool,
}

impl Command {
    /// Creates a command carrying only a verb and a key.
    pub fn keyed(verb: Verb, key: impl Into<String>) -> Self {
        Self {
            verb,
            key: key.into(),
            flags: 0,
            exptime: 0,
            byte_count: 0,
            noreply: false,
        }
    }
}

/// A reply line sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The data was stored
    Stored,
    /// A conditional store was refused
    NotStored,
    /// A hit on `get`
    Value {
        value: String,
        flags: u16,
        byte_count: usize,
    },
    /// A miss on `get`
    End,
    /// The key was deleted
    Deleted,
    /// `delete` found nothing
    NotFound,
    /// Unknown command
    Error(String),
    /// The client sent something malformed
    ClientError(String),
    /// The server failed to carry out a well-formed command
    ServerError(String),
}

impl Reply {
    pub fn client_error(msg: impl Into<String>) -> Self {
        Reply::ClientError(msg.into())
    }

    pub fn server_error(msg: impl Into<String>) -> Self {
        Reply::ServerError(msg.into())
    }

    /// Serializes the reply to bytes for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.to_string().as_bytes());
        buf.extend_from_slice(CRLF);
    }

    /// Returns true for the three error replies.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Reply::Error(_) | Reply::ClientError(_) | Reply::ServerError(_)
        )
    }
}

impl fmt::Display for Reply {
    /// Formats the reply line without its terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Stored => f.write_str("STORED"),
            Reply::NotStored => f.write_str("NOT_STORED"),
            Reply::Value {
                value,
                flags,
                byte_count,
            } => write!(f, "VALUE {} {} {}", value, flags, byte_count),
            Reply::End => f.write_str("END"),
            Reply::Deleted => f.write_str("DELETED"),
            Reply::NotFound => f.write_str("NOT_FOUND"),
            Reply::Error(msg) => write!(f, "ERROR {}", msg),
            Reply::ClientError(msg) => write!(f, "CLIENT_ERROR {}", msg),
            Reply::ServerError(msg) => write!(f, "SERVER_ERROR {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialize() {
        assert_eq!(Reply::Stored.serialize(), b"STORED\r\n");
        assert_eq!(Reply::NotStored.serialize(), b"NOT_STORED\r\n");
        assert_eq!(Reply::End.serialize(), b"END\r\n");
        assert_eq!(Reply::Deleted.serialize(), b"DELETED\r\n");
        assert_eq!(Reply::NotFound.serialize(), b"NOT_FOUND\r\n");
    }

    #[test]
    fn test_value_serialize() {
        let reply = Reply::Value {
            value: "hello".to_string(),
            flags: 5,
            byte_count: 5,
        };
        assert_eq!(reply.serialize(), b"VALUE hello 5 5\r\n");
    }

    #[test]
    fn test_error_serialize() {
        assert_eq!(
            Reply::client_error("bad flags").serialize(),
            b"CLIENT_ERROR bad flags\r\n"
        );
        assert_eq!(
            Reply::server_error("oops").serialize(),
            b"SERVER_ERROR oops\r\n"
        );
        assert!(Reply::Error("unknown command 'x'".to_string()).is_error());
        assert!(!Reply::Stored.is_error());
    }

    #[test]
    fn test_serialize_into_appends() {
        let mut buf = b"END\r\n".to_vec();
        Reply::Stored.serialize_into(&mut buf);
        assert_eq!(buf, b"END\r\nSTORED\r\n");
    }

    #[test]
    fn test_verb_names() {
        for verb in [
            Verb::Set,
            Verb::Get,
            Verb::Add,
            Verb::Replace,
            Verb::Append,
            Verb::Prepend,
            Verb::Delete,
        ] {
            assert_eq!(Verb::from_name(verb.as_str()), Some(verb));
        }
        assert_eq!(Verb::from_name("SET"), None);
        assert_eq!(Verb::from_name("incr"), None);
    }

    #[test]
    fn test_expects_data() {
        assert!(Verb::Set.expects_data());
        assert!(Verb::Prepend.expects_data());
        assert!(!Verb::Get.expects_data());
        assert!(!Verb::Delete.expects_data());
    }
}
