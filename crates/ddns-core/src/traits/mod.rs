//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`CommandExecutor`]: Run one shell command and capture its stdout
//! - [`AddressSource`]: Produce candidate addresses and resolve one per rule
//! - [`RecordRepository`]: Create/read/update/delete DNS records at a provider

pub mod address_source;
pub mod record_repository;

pub use address_source::{AddressSource, CommandExecutor, ExecutorFactory, IpVersion};
pub use record_repository::{DnsRecord, RecordRepository, RecordRepositoryFactory};
