//! Command dispatcher
//!
//! Routes incoming commands to the appropriate handler and journals writes.
//! This module provides loose coupling between the server and command implementations.

use crate::aof::{replay_frames, AofConfig, AofError, AofReader, AofTail, AofWriter};
use crate::commands::{Command, CommandContext, CommandRegistry};
use crate::protocol::RespValue;
use crate::store::MemoryStore;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Command dispatcher
///
/// Receives RESP commands, validates them, and routes to appropriate handlers.
/// Shared by every connection: the store locks internally and the AOF
/// serialises its own appends.
pub struct Dispatcher {
    /// Command registry
    registry: CommandRegistry,

    /// Command execution context
    context: CommandContext,

    /// AOF writer, absent when persistence is disabled
    aof: Option<Arc<AofWriter>>,
}

impl Dispatcher {
    /// Create a new dispatcher over an empty store, without persistence
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Create a dispatcher over an existing store, without persistence
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Dispatcher {
            registry: CommandRegistry::new(),
            context: CommandContext::with_store(store),
            aof: None,
        }
    }

    /// Create a dispatcher with AOF support
    ///
    /// Replays the existing AOF into a fresh store, cuts off any unreadable
    /// tail, then opens the file for appending. A record cut short by a crash
    /// is simply dropped; the suffix starting at a corrupt record is first
    /// copied to `<aof>.corrupt-<offset>`. Failing to read or open the file
    /// is an error.
    pub fn with_aof(config: &AofConfig) -> Result<Self, AofError> {
        let mut dispatcher = Self::new();

        if !config.enabled {
            info!("AOF disabled, running in memory only");
            return Ok(dispatcher);
        }

        // Load and replay AOF if it exists
        let load = match AofReader::load(&config.path) {
            Ok(reader) => {
                info!("Loading AOF from {:?} ({} bytes)", config.path, reader.size());
                Some(reader.parse_frames())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No AOF at {:?}, starting empty", config.path);
                None
            }
            Err(source) => {
                return Err(AofError::Load {
                    path: config.path.clone(),
                    source,
                })
            }
        };

        // Initialize AOF writer only after replay, so nothing replayed is re-appended
        let writer = AofWriter::new(&config.path, config.sync_policy).map_err(|source| {
            AofError::Open {
                path: config.path.clone(),
                source,
            }
        })?;

        if let Some(load) = load {
            let replayed = dispatcher.replay(load.frames);
            info!("Replayed {} frames from AOF", replayed);

            // A corrupt record may be followed by good ones: keep a copy
            if let AofTail::Corrupt { offset, .. } = &load.tail {
                let saved = corrupt_tail_path(&config.path, *offset);
                fs::write(&saved, &load.discarded).map_err(|source| AofError::SaveCorrupt {
                    path: saved.clone(),
                    source,
                })?;
                warn!(
                    "Saved {} unreadable AOF bytes to {:?}",
                    load.discarded.len(),
                    saved
                );
            }

            if !load.tail.is_clean() {
                warn!(
                    "Truncating AOF {:?} to its last valid record ({} bytes)",
                    config.path, load.valid_len
                );
                writer
                    .truncate(load.valid_len as u64)
                    .map_err(|source| AofError::Truncate {
                        path: config.path.clone(),
                        source,
                    })?;
            }
        }

        info!("AOF writer initialized at {:?}", writer.path());
        dispatcher.set_aof_writer(Arc::new(writer));

        Ok(dispatcher)
    }

    /// Set the AOF writer
    pub fn set_aof_writer(&mut self, writer: Arc<AofWriter>) {
        self.aof = Some(writer);
    }

    /// Replay frames into the store without journaling them
    pub fn replay(&self, frames: Vec<RespValue>) -> usize {
        replay_frames(frames, |frame| self.apply(frame))
    }

    /// Dispatch a live command
    ///
    /// Takes a RESP value (expected to be an array), extracts the command name
    /// and arguments, then routes to the appropriate handler. A successful
    /// write is appended to the AOF before its response is returned.
    pub fn dispatch(&self, frame: RespValue) -> RespValue {
        let (command, args) = match self.resolve(&frame) {
            Ok(resolved) => resolved,
            Err(response) => return response,
        };

        let aof = match &self.aof {
            Some(aof) if command.is_write() => aof,
            _ => return command.execute(&self.context, args),
        };

        // Held across execute + append: log order == mutation order
        let mut journal = aof.lock();

        let response = command.execute(&self.context, args);
        if response.is_error() {
            return response;
        }

        if let Err(e) = journal.append(&frame) {
            error!("Failed to append {} to AOF: {}", command.name(), e);
            return RespValue::error(format!("ERR failed to persist write: {}", e));
        }

        response
    }

    /// Execute a command without journaling it (replay path)
    pub fn apply(&self, frame: &RespValue) -> RespValue {
        match self.resolve(frame) {
            Ok((command, args)) => command.execute(&self.context, args),
            Err(response) => response,
        }
    }

    /// Validate a request frame and look up its command
    fn resolve<'a>(
        &self,
        frame: &'a RespValue,
    ) -> Result<(Arc<dyn Command>, &'a [RespValue]), RespValue> {
        // Commands should be arrays
        let parts = match frame.as_array() {
            Some(arr) if !arr.is_empty() => arr,
            Some(_) => {
                return Err(RespValue::error("ERR empty command array"));
            }
            None => {
                return Err(RespValue::error("ERR expected array"));
            }
        };

        // First element is the command name
        let cmd_name = match parts[0].as_bulk_string() {
            Some(name) => match std::str::from_utf8(name) {
                Ok(s) => s,
                Err(_) => {
                    return Err(RespValue::error("ERR invalid command name encoding"));
                }
            },
            None => {
                return Err(RespValue::error("ERR command name must be a bulk string"));
            }
        };

        debug!("Dispatching command: {}", cmd_name);

        // Look up the command
        let command = match self.registry.get(cmd_name) {
            Some(cmd) => cmd,
            None => {
                warn!("Unknown command: {}", cmd_name);
                return Err(RespValue::error("ERR invalid command"));
            }
        };

        // Extract arguments (everything after the command name)
        let args = &parts[1..];

        // Validate argument count
        if !command.accepts(args.len()) {
            return Err(RespValue::error(format!(
                "ERR wrong number of arguments for '{}' command",
                cmd_name.to_lowercase()
            )));
        }

        Ok((command, args))
    }

    /// Get the store commands operate on
    pub fn store(&self) -> &MemoryStore {
        &self.context.store
    }

    /// Get the AOF writer, if persistence is enabled
    pub fn aof(&self) -> Option<&AofWriter> {
        self.aof.as_deref()
    }
}

/// `<aof>.corrupt-<offset>`, next to the AOF itself
fn corrupt_tail_path(path: &Path, offset: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".corrupt-{}", offset));
    PathBuf::from(name)
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
