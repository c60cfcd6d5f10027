//! Command execution module
//!
//! Provides a unified interface for all commands through the Command trait.
//! Each command family is implemented in a separate file for high cohesion.

mod context;
mod registry;

// Command implementations
mod ping;
mod string;
mod hash;

pub use context::CommandContext;
pub use registry::CommandRegistry;

use crate::protocol::RespValue;
use bytes::Bytes;

/// Command execution trait
///
/// A command is a descriptor (name, arity, whether it mutates) plus its
/// handler. The dispatcher checks arity before calling `execute`, so handlers
/// may index `args` up to `min_args()` freely.
pub trait Command: Send + Sync {
    /// Execute the command with the given context and arguments
    ///
    /// Arguments:
    /// - ctx: the command context (contains the store)
    /// - args: command arguments (excluding the command name itself)
    ///
    /// Returns:
    /// - RespValue representing the response to send to the client
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue;

    /// Get the command name (for lookup and error messages)
    fn name(&self) -> &'static str;

    /// Get the minimum number of arguments required
    fn min_args(&self) -> usize {
        0
    }

    /// Get the maximum number of arguments (None = unlimited)
    fn max_args(&self) -> Option<usize> {
        None
    }

    /// Whether the command mutates the store and must be appended to the AOF
    fn is_write(&self) -> bool {
        false
    }

    /// Check an argument count against this command's arity
    fn accepts(&self, count: usize) -> bool {
        count >= self.min_args() && self.max_args().map_or(true, |max| count <= max)
    }
}

/// Helper function to extract bulk string from RespValue
pub(crate) fn extract_bulk_string(value: &RespValue) -> Result<&Bytes, &'static str> {
    value.as_bulk_string().ok_or("expected bulk string argument")
}

/// Extract the bulk payload of every argument, failing on the first that is
/// not a bulk string
pub(crate) fn extract_bulk_strings(args: &[RespValue]) -> Result<Vec<Bytes>, RespValue> {
    args.iter()
        .map(|arg| {
            extract_bulk_string(arg)
                .cloned()
                .map_err(|e| RespValue::error(format!("ERR {}", e)))
        })
        .collect()
}
