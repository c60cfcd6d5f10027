//! Connection handling
//!
//! Manages individual client connections, reading RESP frames
//! and sending responses.

use crate::dispatch::Dispatcher;
use crate::protocol::{FrameReader, RespEncoder, RespError, RespValue};
use bytes::BytesMut;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tracing::{debug, warn};

/// Connection handler
///
/// Loops awaiting-frame -> dispatching -> responding until the peer hangs up
/// or sends something that is not valid RESP.
pub struct Connection<S> {
    /// Frame reader over the read half of the stream
    reader: FrameReader<ReadHalf<S>>,

    /// Write half of the stream
    writer: WriteHalf<S>,

    /// Write buffer
    write_buffer: BytesMut,
}

impl<S: AsyncRead + AsyncWrite> Connection<S> {
    /// Create a new connection handler
    pub fn new(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Connection {
            reader: FrameReader::new(reader),
            writer,
            write_buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Handle the connection
    ///
    /// Reads commands from the client, dispatches them, and sends responses.
    /// Returns Ok on a clean hang-up and the error otherwise. On a protocol
    /// error the client gets a best-effort error reply first; on an IO error
    /// the connection is just dropped.
    pub async fn handle(&mut self, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
        loop {
            let frame = match self.reader.read_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(()),
                Err(RespError::UnexpectedEof) => {
                    return Err(anyhow::anyhow!("connection closed mid-frame"));
                }
                // Socket is gone, nobody to reply to
                Err(e @ RespError::Io(_)) => return Err(e.into()),
                Err(e) => {
                    warn!("Protocol error: {}", e);
                    let error_response = RespValue::error(format!("ERR Protocol error: {}", e));
                    // The connection is going away either way
                    let _ = self.send_response(&error_response).await;
                    return Err(e.into());
                }
            };

            debug!("Parsed command: {}", frame);

            let response = dispatcher.dispatch(frame);

            debug!("Response: {}", response);

            self.send_response(&response).await?;
        }
    }

    /// Send a response to the client
    async fn send_response(&mut self, response: &RespValue) -> std::io::Result<()> {
        self.write_buffer.clear();
        RespEncoder::encode_to(&mut self.write_buffer, response);

        self.writer.write_all(&self.write_buffer).await?;
        self.writer.flush().await
    }
}
