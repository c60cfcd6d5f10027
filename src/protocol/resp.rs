//! RESP2 parser and encoder
//!
//! Implements parsing from bytes to RespValue and encoding from RespValue to bytes.
//! Only arrays and bulk strings are accepted as input; the other types are
//! produced on output.

use super::types::{RespValue, RespError};
use bytes::{Buf, BufMut, Bytes, BytesMut};

const CRLF: &[u8] = b"\r\n";

/// Largest bulk string accepted on input (512 MiB)
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Deepest array nesting accepted on input
pub const MAX_NESTING: usize = 32;

/// Longest header line (`$<len>` / `*<count>`) we wait for before giving up
const MAX_HEADER_LEN: usize = 64;

/// RESP2 Parser
pub struct RespParser;

impl RespParser {
    /// Parse a RESP value from a buffer
    ///
    /// Returns Ok(Some(value)) if a complete value was parsed (its bytes are
    /// consumed from the buffer), Ok(None) if more data is needed (nothing is
    /// consumed), Err(e) if parsing failed.
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        match Self::decode(buf, 0, 0)? {
            Some((value, consumed)) => {
                buf.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Decode one value starting at `pos`, returning it with the position
    /// right after it
    fn decode(
        buf: &[u8],
        pos: usize,
        depth: usize,
    ) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some(&type_byte) = buf.get(pos) else {
            return Ok(None);
        };

        match type_byte {
            b'$' => Self::decode_bulk_string(buf, pos + 1),
            b'*' => Self::decode_array(buf, pos + 1, depth),
            other => Err(RespError::UnknownType(other)),
        }
    }

    /// Parse bulk string: $6\r\nfoobar\r\n or $-1\r\n (null)
    fn decode_bulk_string(
        buf: &[u8],
        pos: usize,
    ) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some((line, pos)) = Self::read_line(buf, pos)? else {
            return Ok(None);
        };
        let len = Self::parse_length(line)?;

        if len == -1 {
            return Ok(Some((RespValue::Null, pos)));
        }

        if len < 0 {
            return Err(RespError::InvalidLength(len.to_string()));
        }

        if len as u64 > MAX_BULK_LEN as u64 {
            return Err(RespError::InvalidProtocol(format!(
                "bulk string too large: {} bytes",
                len
            )));
        }

        let len = len as usize;
        let end = pos + len;

        // data + CRLF must be fully buffered
        if buf.len() < end + 2 {
            return Ok(None);
        }

        if &buf[end..end + 2] != CRLF {
            return Err(RespError::InvalidLineEnding);
        }

        let data = Bytes::copy_from_slice(&buf[pos..end]);
        Ok(Some((RespValue::BulkString(data), end + 2)))
    }

    /// Parse array: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    fn decode_array(
        buf: &[u8],
        pos: usize,
        depth: usize,
    ) -> Result<Option<(RespValue, usize)>, RespError> {
        if depth >= MAX_NESTING {
            return Err(RespError::InvalidProtocol(format!(
                "arrays nested deeper than {}",
                MAX_NESTING
            )));
        }

        let Some((line, mut pos)) = Self::read_line(buf, pos)? else {
            return Ok(None);
        };
        let count = Self::parse_length(line)?;

        if count < 0 {
            return Err(RespError::InvalidLength(count.to_string()));
        }

        // Don't trust the header for the allocation, elements arrive later
        let mut elements = Vec::with_capacity((count as usize).min(64));
        for _ in 0..count {
            match Self::decode(buf, pos, depth + 1)? {
                Some((value, next)) => {
                    elements.push(value);
                    pos = next;
                }
                None => return Ok(None),
            }
        }

        Ok(Some((RespValue::Array(elements), pos)))
    }

    /// Find the line starting at `pos`; returns it without CRLF plus the
    /// position of the next line
    fn read_line(buf: &[u8], pos: usize) -> Result<Option<(&[u8], usize)>, RespError> {
        let rest = &buf[pos.min(buf.len())..];

        match rest.iter().position(|&b| b == b'\n') {
            Some(0) => Err(RespError::InvalidLineEnding),
            Some(i) if rest[i - 1] != b'\r' => Err(RespError::InvalidLineEnding),
            Some(i) => Ok(Some((&rest[..i - 1], pos + i + 1))),
            None if rest.len() > MAX_HEADER_LEN => Err(RespError::InvalidProtocol(
                "header line too long".to_string(),
            )),
            None => Ok(None),
        }
    }

    fn parse_length(line: &[u8]) -> Result<i64, RespError> {
        std::str::from_utf8(line)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| RespError::InvalidLength(String::from_utf8_lossy(line).into_owned()))
    }
}

/// RESP2 Encoder
pub struct RespEncoder;

impl RespEncoder {
    /// Encode a RESP value to bytes
    pub fn encode(value: &RespValue) -> Bytes {
        let mut buf = BytesMut::new();
        Self::encode_to(&mut buf, value);
        buf.freeze()
    }

    /// Encode a RESP value into an existing buffer
    pub fn encode_to(buf: &mut BytesMut, value: &RespValue) {
        match value {
            RespValue::SimpleString(s) => {
                buf.put_u8(b'+');
                Self::put_text(buf, s);
                buf.put_slice(CRLF);
            }
            RespValue::Error(e) => {
                buf.put_u8(b'-');
                Self::put_text(buf, e);
                buf.put_slice(CRLF);
            }
            RespValue::Integer(i) => {
                buf.put_u8(b':');
                buf.put_slice(i.to_string().as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::BulkString(bytes) => {
                buf.put_u8(b'$');
                buf.put_slice(bytes.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                buf.put_slice(bytes);
                buf.put_slice(CRLF);
            }
            RespValue::Null => {
                buf.put_slice(b"$-1\r\n");
            }
            RespValue::Array(arr) => {
                buf.put_u8(b'*');
                buf.put_slice(arr.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                for elem in arr {
                    Self::encode_to(buf, elem);
                }
            }
        }
    }

    /// Line-oriented types cannot carry CR or LF
    fn put_text(buf: &mut BytesMut, text: &str) {
        buf.extend(text.bytes().map(|b| match b {
            b'\r' | b'\n' => b' ',
            other => other,
        }));
    }
}
