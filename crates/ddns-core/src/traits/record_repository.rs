// # Record Repository Trait
//
// Defines the interface for managing DNS records at a provider.
//
// ## Implementations
//
// - In-memory: `ddns_core::repository::MemoryRecordRepository` (dry runs, tests)
// - Provider clients live outside this crate and register via `ProviderRegistry`
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::config::RecordType;
// use ddns_core::{DnsRecord, RecordRepository};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let repository = /* RecordRepository implementation */;
//
//     let id = repository
//         .create_record(&DnsRecord::new("example.com", "home", RecordType::A, "203.0.113.7", 600))
//         .await?;
//
//     let mut record = repository.get_record(&id).await?;
//     record.value = "203.0.113.8".to_string();
//     repository.update_record(&record).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ProviderConfig, RecordType};

/// A DNS record as stored by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned record ID (empty until created)
    pub id: String,
    /// Zone the record belongs to (e.g., "example.com")
    pub domain: String,
    /// Subdomain label (e.g., "home", "@" for the apex)
    pub subdomain: String,
    /// A or AAAA
    pub record_type: RecordType,
    /// Record value, the textual address
    pub value: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

impl DnsRecord {
    /// Create a record that has not been stored yet
    pub fn new(
        domain: impl Into<String>,
        subdomain: impl Into<String>,
        record_type: RecordType,
        value: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            id: String::new(),
            domain: domain.into(),
            subdomain: subdomain.into(),
            record_type,
            value: value.into(),
            ttl,
        }
    }
}

/// Trait for record repository implementations
///
/// A record repository is a thin remote-procedure wrapper around a DNS
/// provider's record API.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform API calls to the provider's endpoints
/// - ✅ Cache provider metadata (e.g., the domain list) internally
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic (owned by `DdnsEngine`)
/// - ❌ Decide which address to publish (owned by `AddressSource` and `Rule`)
/// - ❌ Spawn tasks or threads
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// List every record of a domain
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Get a record by ID
    ///
    /// # Returns
    ///
    /// - `Ok(DnsRecord)`: The record
    /// - `Err(Error::NotFound)`: No record with this ID
    async fn get_record(&self, id: &str) -> Result<DnsRecord, crate::Error>;

    /// Create a record, returning the provider-assigned ID
    ///
    /// The `id` field of `record` is ignored.
    async fn create_record(&self, record: &DnsRecord) -> Result<String, crate::Error>;

    /// Update the record identified by `record.id`
    async fn update_record(&self, record: &DnsRecord) -> Result<(), crate::Error>;

    /// Delete a record by ID
    async fn delete_record(&self, id: &str) -> Result<(), crate::Error>;

    /// Records of `domain` whose subdomain label is `subdomain`
    async fn find_records(
        &self,
        domain: &str,
        subdomain: &str,
    ) -> Result<Vec<DnsRecord>, crate::Error> {
        let records = self.list_records(domain).await?;
        Ok(records
            .into_iter()
            .filter(|record| record.subdomain == subdomain)
            .collect())
    }

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing record repositories from configuration
pub trait RecordRepositoryFactory: Send + Sync {
    /// Create a RecordRepository instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    ///
    /// # Returns
    ///
    /// A boxed RecordRepository trait object
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn RecordRepository>, crate::Error>;
}
