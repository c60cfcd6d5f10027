//! FerrumKV - A small in-memory key-value store speaking RESP
//!
//! FerrumKV is designed with strong cohesion and loose coupling principles:
//! - Each module has a single, well-defined responsibility
//! - Modules communicate through clear, minimal interfaces
//! - No circular dependencies between modules
//!
//! Request path: `protocol` decodes a frame, `dispatch` resolves it against the
//! `commands` registry, the handler works on the `store`, and writes are
//! appended to the `aof` before the reply is encoded. At startup the AOF is
//! replayed through the same dispatcher.

pub mod config;
pub mod protocol;
pub mod store;
pub mod commands;
pub mod dispatch;
pub mod server;
pub mod aof;

/// Re-export commonly used types
pub use config::Config;
pub use store::{MemoryStore, StoreStats};
pub use protocol::{RespValue, RespError};
pub use commands::{Command, CommandContext};
pub use dispatch::Dispatcher;

/// Current version of FerrumKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
