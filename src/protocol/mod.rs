//! RESP2 protocol implementation
//!
//! This module handles parsing and encoding of the Redis Serialization Protocol (RESP2).
//! It is completely independent from other modules (loose coupling); the same
//! encoding is used on the wire and for AOF records.

mod types;
mod resp;
mod reader;

pub use types::{RespValue, RespError};
pub use resp::{RespParser, RespEncoder, MAX_BULK_LEN, MAX_NESTING};
pub use reader::FrameReader;
