//! Append-Only File (AOF) persistence module
//!
//! Provides durability by logging every write command to disk.
//! A record is the RESP array frame of the original request, so the file is
//! nothing more than a concatenation of frames: no header, no checksum.
//! Integrity relies on the frame lengths and CRLF terminators alone.

mod writer;
mod reader;
mod replay;

pub use writer::{AofGuard, AofWriter};
pub use reader::{AofLoad, AofReader, AofTail};
pub use replay::replay_frames;

use serde::Deserialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// AOF sync policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPolicy {
    /// fsync after every write (safest, slowest)
    Always,
    /// fsync at most once per second (balanced)
    ///
    /// An append syncs when a second has passed since the last sync; the
    /// server also syncs pending records once per second while idle.
    #[serde(alias = "everysecond")]
    EverySec,
    /// Let the OS decide when to sync (fastest, least safe)
    No,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        SyncPolicy::EverySec
    }
}

impl std::str::FromStr for SyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(SyncPolicy::Always),
            "everysec" | "everysecond" => Ok(SyncPolicy::EverySec),
            "no" => Ok(SyncPolicy::No),
            other => Err(format!(
                "unknown sync policy '{}' (expected always, everysec or no)",
                other
            )),
        }
    }
}

/// AOF configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AofConfig {
    /// Path to the AOF file
    pub path: PathBuf,
    /// Sync policy
    pub sync_policy: SyncPolicy,
    /// Whether to enable AOF
    pub enabled: bool,
}

impl Default for AofConfig {
    fn default() -> Self {
        AofConfig {
            path: PathBuf::from("ferrumkv.aof"),
            sync_policy: SyncPolicy::default(),
            enabled: true,
        }
    }
}

/// Errors that prevent the AOF from being used at startup
#[derive(Debug, Error)]
pub enum AofError {
    #[error("failed to read AOF {}: {source}", path.display())]
    Load { path: PathBuf, source: io::Error },

    #[error("failed to open AOF {} for appending: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to truncate AOF {}: {source}", path.display())]
    Truncate { path: PathBuf, source: io::Error },

    #[error("failed to save corrupt AOF tail to {}: {source}", path.display())]
    SaveCorrupt { path: PathBuf, source: io::Error },
}
