// # Memory Record Repository
//
// In-memory implementation of RecordRepository.
//
// ## Purpose
//
// Stands in for a DNS provider when nothing should leave the process: dry
// runs of the daemon and tests. Records are lost on restart.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::ProviderConfig;
use crate::traits::record_repository::{DnsRecord, RecordRepository, RecordRepositoryFactory};
use crate::Error;

/// In-memory record repository
///
/// Records are kept in creation order. IDs are decimal counters starting at 1.
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::config::RecordType;
/// use ddns_core::repository::MemoryRecordRepository;
/// use ddns_core::traits::{DnsRecord, RecordRepository};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let repository = MemoryRecordRepository::new();
///
///     let record = DnsRecord::new("example.com", "home", RecordType::A, "203.0.113.7", 600);
///     let id = repository.create_record(&record).await?;
///
///     let stored = repository.get_record(&id).await?;
///     assert_eq!(stored.value, "203.0.113.7");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordRepository {
    inner: Arc<RwLock<BTreeMap<u64, DnsRecord>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryRecordRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of records in the repository
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the repository is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Every stored record, in creation order
    pub async fn records(&self) -> Vec<DnsRecord> {
        self.inner.read().await.values().cloned().collect()
    }
}

fn parse_id(id: &str) -> Result<u64, Error> {
    id.parse()
        .map_err(|_| Error::not_found(format!("no record with id {:?}", id)))
}

#[async_trait]
impl RecordRepository for MemoryRecordRepository {
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard
            .values()
            .filter(|record| record.domain == domain)
            .cloned()
            .collect())
    }

    async fn get_record(&self, id: &str) -> Result<DnsRecord, Error> {
        let key = parse_id(id)?;
        let guard = self.inner.read().await;
        guard
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("no record with id {:?}", id)))
    }

    async fn create_record(&self, record: &DnsRecord) -> Result<String, Error> {
        let key = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = key.to_string();
        let mut stored = record.clone();
        stored.id = id.clone();

        let mut guard = self.inner.write().await;
        guard.insert(key, stored);
        Ok(id)
    }

    async fn update_record(&self, record: &DnsRecord) -> Result<(), Error> {
        let key = parse_id(&record.id)?;
        let mut guard = self.inner.write().await;
        match guard.get_mut(&key) {
            Some(stored) => {
                *stored = record.clone();
                Ok(())
            }
            None => Err(Error::not_found(format!("no record with id {:?}", record.id))),
        }
    }

    async fn delete_record(&self, id: &str) -> Result<(), Error> {
        let key = parse_id(id)?;
        let mut guard = self.inner.write().await;
        guard
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("no record with id {:?}", id)))
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory record repositories
pub struct MemoryRecordRepositoryFactory;

impl RecordRepositoryFactory for MemoryRecordRepositoryFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn RecordRepository>, Error> {
        match config {
            ProviderConfig::Memory => Ok(Box::new(MemoryRecordRepository::new())),
            _ => Err(Error::config("Invalid config for memory record repository")),
        }
    }
}
