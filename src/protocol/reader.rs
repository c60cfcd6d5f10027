//! Stream framing
//!
//! Pulls bytes from an async stream until the parser yields one whole frame.

use super::resp::RespParser;
use super::types::{RespError, RespValue};
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Reads RESP frames one at a time from any async byte stream
pub struct FrameReader<R> {
    inner: R,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        FrameReader {
            inner,
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Read exactly one frame
    ///
    /// Returns Ok(None) when the stream ends cleanly between frames and
    /// `RespError::UnexpectedEof` when it ends in the middle of one.
    /// Bytes of any following pipelined frame stay buffered for the next call.
    pub async fn read_frame(&mut self) -> Result<Option<RespValue>, RespError> {
        loop {
            if let Some(value) = RespParser::parse(&mut self.buffer)? {
                return Ok(Some(value));
            }

            let n = self.inner.read_buf(&mut self.buffer).await?;
            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(RespError::UnexpectedEof);
            }
        }
    }

    /// Bytes received but not yet returned as a frame
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
