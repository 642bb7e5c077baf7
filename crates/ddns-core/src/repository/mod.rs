// # Record Repository Implementations
//
// Built-in implementations of the RecordRepository trait. Provider clients
// (Aliyun, Cloudflare, ...) live in their own crates and register a
// RecordRepositoryFactory the same way.

pub mod memory;

pub use memory::{MemoryRecordRepository, MemoryRecordRepositoryFactory};

use crate::registry::ProviderRegistry;

/// Register the built-in repositories with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_repository("memory", Box::new(MemoryRecordRepositoryFactory));
}
