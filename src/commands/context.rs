//! Command execution context

use crate::store::MemoryStore;
use std::sync::Arc;

/// Context provided to commands during execution
///
/// Gives commands access to the store they operate on. The store is shared,
/// so one context can serve every connection concurrently.
#[derive(Clone)]
pub struct CommandContext {
    /// The memory store
    pub store: Arc<MemoryStore>,
}

impl CommandContext {
    /// Create a new command context with an empty store
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Create a context around an existing store
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        CommandContext { store }
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}
