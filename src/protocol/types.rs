//! RESP2 value types
//!
//! Defines the core data types for the RESP2 subset spoken by FerrumKV

use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// RESP2 value types
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// Simple strings: +OK\r\n
    SimpleString(String),

    /// Errors: -Error message\r\n
    Error(String),

    /// Integers: :1000\r\n (reserved, no command replies with one)
    Integer(i64),

    /// Bulk strings: $6\r\nfoobar\r\n
    BulkString(Bytes),

    /// Null bulk string: $-1\r\n
    Null,

    /// Arrays: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Create a simple string
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// Create an error
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    /// Create a bulk string from bytes
    pub fn bulk_string(b: impl Into<Bytes>) -> Self {
        RespValue::BulkString(b.into())
    }

    /// Create a null value
    pub fn null() -> Self {
        RespValue::Null
    }

    /// Create an array
    pub fn array(v: Vec<RespValue>) -> Self {
        RespValue::Array(v)
    }

    /// Build a command frame out of plain parts, e.g. `["SET", "k", "v"]`
    pub fn command<I, B>(parts: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        RespValue::Array(parts.into_iter().map(RespValue::bulk_string).collect())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Try to extract array elements
    pub fn as_array(&self) -> Option<&Vec<RespValue>> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to extract bulk string bytes
    pub fn as_bulk_string(&self) -> Option<&Bytes> {
        match self {
            RespValue::BulkString(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "SimpleString({})", s),
            RespValue::Error(e) => write!(f, "Error({})", e),
            RespValue::Integer(i) => write!(f, "Integer({})", i),
            RespValue::BulkString(b) => write!(f, "BulkString({} bytes)", b.len()),
            RespValue::Null => write!(f, "Null"),
            RespValue::Array(arr) => write!(f, "Array({} elements)", arr.len()),
        }
    }
}

/// RESP parsing errors
///
/// Every variant is terminal for the stream it came from: the reader has no
/// way to resynchronise in the middle of a frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RespError {
    /// A line was not terminated by CRLF
    #[error("invalid line ending")]
    InvalidLineEnding,

    /// A length or count header was not a valid decimal integer
    #[error("invalid length: {0}")]
    InvalidLength(String),

    /// Leading type byte not accepted on input
    #[error("unknown type byte 0x{0:02x}")]
    UnknownType(u8),

    /// The stream ended before the frame was complete
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// Structurally invalid frame (too large, too deep)
    #[error("invalid protocol: {0}")]
    InvalidProtocol(String),

    /// IO error while reading the stream
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for RespError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => RespError::UnexpectedEof,
            _ => RespError::Io(err.to_string()),
        }
    }
}
