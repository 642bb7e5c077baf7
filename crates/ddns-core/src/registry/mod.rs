//! Plugin-based provider registry
//!
//! The registry allows record repositories and command executors to be
//! registered dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ddns_core::registry::ProviderRegistry;
//! use ddns_core::config::{ProviderConfig, SourceConfig};
//!
//! // Create a registry
//! let registry = ProviderRegistry::new();
//!
//! // Register built-ins and platform executors
//! ddns_core::repository::register(&registry);
//! ddns_ip_command::register(&registry);
//!
//! // Create components from config
//! let repository = registry.create_repository(&ProviderConfig::Memory)?;
//! let executor = registry.create_executor(&SourceConfig::new("hostname -I | tr ' ' '\\n'"))?;
//! ```
//!
//! ## Registration
//!
//! Implementations should register themselves during initialization:
//!
//! ```rust,ignore
//! # use ddns_core::registry::ProviderRegistry;
//!
//! // In a provider crate
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_repository("aliyun", Box::new(AliyunFactory));
//! }
//! ```

use crate::config::{ProviderConfig, SourceConfig};
use crate::error::{Error, Result};
use crate::traits::{CommandExecutor, ExecutorFactory, RecordRepository, RecordRepositoryFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Provider registry for plugin-based component creation
///
/// The registry maintains maps of type names to factory objects,
/// allowing dynamic instantiation based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered record repository factories
    repositories: RwLock<HashMap<String, Box<dyn RecordRepositoryFactory>>>,

    /// Registered command executor factories, keyed by shell name
    executors: RwLock<HashMap<String, Box<dyn ExecutorFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record repository factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "memory", "aliyun")
    /// - `factory`: Factory object for creating repository instances
    pub fn register_repository(
        &self,
        name: impl Into<String>,
        factory: Box<dyn RecordRepositoryFactory>,
    ) {
        let mut repositories = self
            .repositories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        repositories.insert(name.into(), factory);
    }

    /// Register a command executor factory
    ///
    /// # Parameters
    ///
    /// - `name`: Shell name (e.g., "bash", "zsh", "powershell")
    /// - `factory`: Factory object for creating executor instances
    pub fn register_executor(&self, name: impl Into<String>, factory: Box<dyn ExecutorFactory>) {
        let mut executors = self
            .executors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        executors.insert(name.into(), factory);
    }

    /// Create a record repository from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RecordRepository>)`: Created repository instance
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_repository(&self, config: &ProviderConfig) -> Result<Box<dyn RecordRepository>> {
        let provider_type = config.type_name();
        let repositories = self
            .repositories
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = repositories
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create a command executor from configuration
    ///
    /// The shell named in `config`, or the host platform's shell when unset,
    /// selects the factory.
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn CommandExecutor>)`: Created executor instance
    /// - `Err(Error)`: If the shell is not registered or creation fails
    pub fn create_executor(&self, config: &SourceConfig) -> Result<Box<dyn CommandExecutor>> {
        let shell = config.effective_shell().name();
        let executors = self
            .executors
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = executors
            .get(shell)
            .ok_or_else(|| Error::config(format!("Unknown shell: {}", shell)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_repositories(&self) -> Vec<String> {
        let repositories = self
            .repositories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        repositories.keys().cloned().collect()
    }

    /// List all registered shells
    pub fn list_executors(&self) -> Vec<String> {
        let executors = self
            .executors
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        executors.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_repository(&self, name: &str) -> bool {
        let repositories = self
            .repositories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        repositories.contains_key(name)
    }

    /// Check if a shell is registered
    pub fn has_executor(&self, name: &str) -> bool {
        let executors = self
            .executors
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        executors.contains_key(name)
    }
}
