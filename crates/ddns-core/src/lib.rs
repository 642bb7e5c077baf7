// # ddns-core
//
// Core library for the DDNS system.
//
// ## Architecture Overview
//
// This library decides which single address a host should publish as a
// dynamic-DNS record, and publishes it:
// - **CommandExecutor**: Trait for running the platform's address command
// - **AddressSource**: Trait for producing candidates; `CommandSource` extracts them from command output
// - **Rule**: Selects or synthesizes exactly one address (default, `@N`, IPv6 suffix splice, substring)
// - **RecordRepository**: Trait for creating/reading/updating/deleting DNS records at a provider
// - **DdnsEngine**: Orchestrates the resolve → compare → create/update flow
// - **ProviderRegistry**: Plugin-based registry for repositories and executors
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Address selection is separate from provider I/O
// 2. **Fresh Per Request**: Candidates and rules are rebuilt on every resolution, nothing is cached
// 3. **Plugin-Based**: Providers and shells are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod engine;
pub mod registry;
pub mod config;
pub mod error;
pub mod repository;
pub mod rule;
pub mod select;
pub mod source;

// Re-export core types for convenience
pub use traits::{AddressSource, CommandExecutor, DnsRecord, IpVersion, RecordRepository};
pub use engine::{DdnsEngine, EngineEvent, SyncOutcome};
pub use registry::ProviderRegistry;
pub use config::{DdnsConfig, ProviderConfig, RecordConfig, RecordType, ShellKind, SourceConfig};
pub use error::{Error, Result, SuffixError};
pub use repository::MemoryRecordRepository;
pub use rule::Rule;
pub use select::{resolve, select_family};
pub use source::{CommandSource, parse_addresses};
