//! AOF writer
//!
//! Handles appending request frames to the AOF file.

use super::SyncPolicy;
use crate::protocol::{RespEncoder, RespValue};
use bytes::BytesMut;
use parking_lot::{Mutex, MutexGuard};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::warn;

/// Open AOF file and the bookkeeping that goes with it
struct AofFile {
    file: File,
    /// Length of the file up to the last complete record
    len: u64,
    /// Length known to be on disk
    synced_len: u64,
    last_sync: Instant,
    buffer: BytesMut,
}

/// AOF writer
///
/// A single mutex serialises appends so records never interleave.
pub struct AofWriter {
    path: PathBuf,
    file: Mutex<AofFile>,
    sync_policy: SyncPolicy,
}

impl AofWriter {
    /// Open (or create) the AOF for appending
    pub fn new<P: AsRef<Path>>(path: P, sync_policy: SyncPolicy) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let len = file.metadata()?.len();

        Ok(AofWriter {
            path,
            file: Mutex::new(AofFile {
                file,
                len,
                synced_len: len,
                last_sync: Instant::now(),
                buffer: BytesMut::with_capacity(4096),
            }),
            sync_policy,
        })
    }

    /// Take exclusive ownership of the log
    ///
    /// Holding the guard across a store mutation and its append keeps the
    /// record order identical to the mutation order.
    pub fn lock(&self) -> AofGuard<'_> {
        AofGuard {
            inner: self.file.lock(),
            sync_policy: self.sync_policy,
        }
    }

    /// Append a single frame
    pub fn append(&self, frame: &RespValue) -> io::Result<()> {
        self.lock().append(frame)
    }

    /// Cut the file back to `len` bytes
    pub fn truncate(&self, len: u64) -> io::Result<()> {
        let mut inner = self.file.lock();
        inner.file.set_len(len)?;
        inner.len = len;
        inner.synced_len = inner.synced_len.min(len);
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&self) -> io::Result<()> {
        let mut inner = self.file.lock();
        inner.file.sync_all()?;
        inner.synced_len = inner.len;
        inner.last_sync = Instant::now();
        Ok(())
    }

    /// Sync records appended since the last sync, if any
    ///
    /// Returns whether a sync happened. Called periodically under
    /// `EverySec`, where appends alone only sync when the next one arrives.
    pub fn sync_pending(&self) -> io::Result<bool> {
        let mut inner = self.file.lock();
        if inner.synced_len == inner.len {
            return Ok(false);
        }
        inner.file.sync_data()?;
        inner.synced_len = inner.len;
        inner.last_sync = Instant::now();
        Ok(true)
    }

    pub fn sync_policy(&self) -> SyncPolicy {
        self.sync_policy
    }

    /// Current length of the file in bytes
    pub fn len(&self) -> u64 {
        self.file.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Exclusive handle on the AOF, see [`AofWriter::lock`]
pub struct AofGuard<'a> {
    inner: MutexGuard<'a, AofFile>,
    sync_policy: SyncPolicy,
}

impl AofGuard<'_> {
    /// Encode and append a frame, then apply the sync policy
    ///
    /// The frame has reached the file (and the disk, per policy) when this
    /// returns Ok. On a failed write the file is cut back to its previous
    /// length so a partial record never precedes later ones.
    pub fn append(&mut self, frame: &RespValue) -> io::Result<()> {
        let inner = &mut *self.inner;

        inner.buffer.clear();
        RespEncoder::encode_to(&mut inner.buffer, frame);

        if let Err(e) = inner.file.write_all(&inner.buffer) {
            if let Err(rollback) = inner.file.set_len(inner.len) {
                warn!("Failed to roll back partial AOF record: {}", rollback);
            }
            return Err(e);
        }
        inner.len += inner.buffer.len() as u64;

        match self.sync_policy {
            SyncPolicy::Always => {
                inner.file.sync_data()?;
                inner.synced_len = inner.len;
                inner.last_sync = Instant::now();
            }
            SyncPolicy::EverySec => {
                if inner.last_sync.elapsed() >= Duration::from_secs(1) {
                    inner.file.sync_data()?;
                    inner.synced_len = inner.len;
                    inner.last_sync = Instant::now();
                }
            }
            SyncPolicy::No => {
                // No explicit sync
            }
        }

        Ok(())
    }
}
