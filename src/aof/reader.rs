//! AOF reader
//!
//! Loads the AOF file and decodes the frames it holds.

use crate::protocol::{RespError, RespParser, RespValue};
use bytes::{Bytes, BytesMut};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// How the AOF ended
#[derive(Debug, Clone, PartialEq)]
pub enum AofTail {
    /// Every byte belonged to a complete frame
    Clean,
    /// The last record was cut short, typically a crash mid-append
    Truncated { offset: usize, len: usize },
    /// Bytes at `offset` are not a valid frame
    Corrupt { offset: usize, error: RespError },
}

impl AofTail {
    pub fn is_clean(&self) -> bool {
        matches!(self, AofTail::Clean)
    }
}

/// Result of decoding an AOF
#[derive(Debug)]
pub struct AofLoad {
    /// Frames of the valid prefix, in file order
    pub frames: Vec<RespValue>,
    /// Length in bytes of the valid prefix
    pub valid_len: usize,
    pub tail: AofTail,
    /// Bytes after the valid prefix, empty when the tail is clean
    pub discarded: Bytes,
}

/// AOF reader
pub struct AofReader {
    data: BytesMut,
}

impl AofReader {
    /// Load AOF file
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let data = fs::read(path)?;
        Ok(Self::from_bytes(&data))
    }

    /// Wrap an in-memory copy of an AOF
    pub fn from_bytes(data: &[u8]) -> Self {
        AofReader {
            data: BytesMut::from(data),
        }
    }

    /// Parse frames from the front of the AOF
    ///
    /// Decoding stops at the first incomplete or malformed record; nothing
    /// past that point can be trusted, so it is reported in `tail` and left
    /// out of `frames`.
    pub fn parse_frames(self) -> AofLoad {
        let total = self.data.len();
        let mut buf = self.data;
        let mut frames = Vec::new();

        let tail = loop {
            let offset = total - buf.len();
            if buf.is_empty() {
                break AofTail::Clean;
            }

            match RespParser::parse(&mut buf) {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => {
                    break AofTail::Truncated {
                        offset,
                        len: buf.len(),
                    }
                }
                Err(error) => break AofTail::Corrupt { offset, error },
            }
        };

        let valid_len = total - buf.len();

        match &tail {
            AofTail::Clean => info!("AOF loaded successfully: {} frames", frames.len()),
            AofTail::Truncated { offset, len } => warn!(
                "AOF ends with a truncated record ({} bytes at offset {}). {} frames recovered.",
                len,
                offset,
                frames.len()
            ),
            AofTail::Corrupt { offset, error } => warn!(
                "AOF is corrupt at offset {}: {}. {} frames recovered.",
                offset,
                error,
                frames.len()
            ),
        }

        AofLoad {
            frames,
            valid_len,
            tail,
            discarded: buf.freeze(),
        }
    }

    /// Get the total size of the AOF data
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aof::{AofWriter, SyncPolicy};

    #[test]
    fn test_load_and_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.aof");

        // Write some frames
        let writer = AofWriter::new(&path, SyncPolicy::Always).unwrap();
        writer.append(&RespValue::command(["SET", "key1", "value1"])).unwrap();
        writer.append(&RespValue::command(["SET", "key2", "value2"])).unwrap();
        writer.sync().unwrap();

        // Read back
        let reader = AofReader::load(&path).unwrap();
        let size = reader.size();
        let load = reader.parse_frames();

        assert_eq!(load.tail, AofTail::Clean);
        assert_eq!(load.valid_len, size);
        assert_eq!(
            load.frames,
            vec![
                RespValue::command(["SET", "key1", "value1"]),
                RespValue::command(["SET", "key2", "value2"]),
            ]
        );
    }

    #[test]
    fn test_empty_file() {
        let load = AofReader::from_bytes(b"").parse_frames();
        assert!(load.frames.is_empty());
        assert!(load.tail.is_clean());
        assert_eq!(load.valid_len, 0);
        assert!(load.discarded.is_empty());
    }

    #[test]
    fn test_truncated_last_record() {
        let data = b"*3\r\n$3\r\nSET\r\n$1\r\na\r\n$1\r\n1\r\n*3\r\n$3\r\nSET\r\n$1\r\nb\r\n$1";
        let load = AofReader::from_bytes(data).parse_frames();

        assert_eq!(load.frames, vec![RespValue::command(["SET", "a", "1"])]);
        assert_eq!(load.valid_len, 27);
        assert_eq!(load.tail, AofTail::Truncated { offset: 27, len: data.len() - 27 });
        assert_eq!(&load.discarded[..], &data[27..]);
    }

    #[test]
    fn test_corruption_stops_decoding() {
        let data = b"*1\r\n$4\r\nPING\r\ngarbage\r\n*1\r\n$4\r\nPING\r\n";
        let load = AofReader::from_bytes(data).parse_frames();

        assert_eq!(load.frames.len(), 1);
        assert_eq!(load.valid_len, 14);
        assert_eq!(
            load.tail,
            AofTail::Corrupt { offset: 14, error: RespError::UnknownType(b'g') }
        );
        assert_eq!(&load.discarded[..], &data[14..]);
    }
}
