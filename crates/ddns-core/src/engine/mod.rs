//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Resolving one address per configured record via AddressSource and Rule
//! - Looking up the record's current value via RecordRepository
//! - Creating or updating the record when the value differs
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   candidates   ┌──────────────┐   one address   ┌──────────────┐
//! │ AddressSource │ ─────────────▶ │ family + Rule│ ──────────────▶ │  DdnsEngine  │
//! └───────────────┘                └──────────────┘                 └──────────────┘
//!                                                                          │
//!                                              ┌───────────────────────────┼────────────┐
//!                                              ▼                           ▼            ▼
//!                                     ┌──────────────────┐        ┌──────────────┐ ┌─────────┐
//!                                     │ RecordRepository │        │ RecordRepo.  │ │ Events  │
//!                                     │ (find)           │        │ (create/upd) │ │(notify) │
//!                                     └──────────────────┘        └──────────────┘ └─────────┘
//! ```
//!
//! ## Sync Flow (per record, one pass)
//!
//! 1. Parse the record's rule (fresh every pass)
//! 2. Resolve exactly one address of the record's family
//! 3. Find existing records by domain, subdomain and type
//! 4. None → create; same value → unchanged; different value → update
//! 5. Emit events for monitoring/logging
//!
//! Scheduling is the caller's concern: the engine performs a single pass per
//! [`DdnsEngine::run_once`] call.

use std::future::Future;
use std::net::IpAddr;

use crate::config::{DdnsConfig, RecordConfig};
use crate::error::Result;
use crate::rule::Rule;
use crate::traits::{AddressSource, DnsRecord, RecordRepository};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// An address was resolved for a record
    AddressResolved {
        record_name: String,
        ip: IpAddr,
    },

    /// The record did not exist and was created
    RecordCreated {
        record_name: String,
        id: String,
        ip: IpAddr,
    },

    /// The record held a different value and was updated
    RecordUpdated {
        record_name: String,
        id: String,
        ip: IpAddr,
        previous_value: String,
    },

    /// The record already held the resolved address
    RecordUnchanged {
        record_name: String,
        ip: IpAddr,
    },

    /// Resolving or writing the record failed
    SyncFailed {
        record_name: String,
        error: String,
    },
}

/// Result of syncing one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Record created with the given ID
    Created {
        record_name: String,
        id: String,
        ip: IpAddr,
    },
    /// Record value replaced
    Updated {
        record_name: String,
        id: String,
        ip: IpAddr,
        previous_value: String,
    },
    /// Record already correct (no-op)
    Unchanged {
        record_name: String,
        ip: IpAddr,
    },
    /// Record could not be synced
    Failed {
        record_name: String,
        error: String,
    },
}

impl SyncOutcome {
    /// Whether this record failed to sync
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed { .. })
    }

    /// The record's fully qualified name
    pub fn record_name(&self) -> &str {
        match self {
            SyncOutcome::Created { record_name, .. }
            | SyncOutcome::Updated { record_name, .. }
            | SyncOutcome::Unchanged { record_name, .. }
            | SyncOutcome::Failed { record_name, .. } => record_name,
        }
    }
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Call [`DdnsEngine::run_once()`] whenever a sync is due
/// 3. Drop to cleanup
///
/// ## Load Resistance
///
/// - **Bounded event channel**: Prevents unbounded memory growth
/// - **Event dropping**: When the channel is full, new events are dropped (logged)
pub struct DdnsEngine {
    /// Address source for candidate acquisition
    source: Box<dyn AddressSource>,

    /// Record repository for reading and writing records
    repository: Box<dyn RecordRepository>,

    /// DNS records to manage
    records: Vec<RecordConfig>,

    /// Maximum retry attempts
    max_retries: usize,

    /// Delay between retries (in seconds)
    retry_delay_secs: u64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `source`: Address source implementation
    /// - `repository`: Record repository implementation
    /// - `config`: DDNS configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        source: Box<dyn AddressSource>,
        repository: Box<dyn RecordRepository>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity.max(1));

        let engine = Self {
            source,
            repository,
            records: config.records,
            max_retries: config.engine.max_retries,
            retry_delay_secs: config.engine.retry_delay_secs,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Sync every enabled record once
    ///
    /// A failing record does not stop the others; its failure is reported in
    /// the returned outcomes.
    pub async fn run_once(&self) -> Vec<SyncOutcome> {
        let mut outcomes = Vec::with_capacity(self.records.len());

        for record in &self.records {
            if !record.enabled {
                debug!("Record {} is disabled, skipping", record.fqdn());
                continue;
            }

            let record_name = record.fqdn();
            match self.sync_record(record).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!("Failed to sync record {} ({}): {}", record_name, record.record_type, e);
                    self.emit_event(EngineEvent::SyncFailed {
                        record_name: record_name.clone(),
                        error: e.to_string(),
                    });
                    outcomes.push(SyncOutcome::Failed {
                        record_name,
                        error: e.to_string(),
                    });
                }
            }
        }

        outcomes
    }

    /// Resolve and publish one record
    async fn sync_record(&self, record: &RecordConfig) -> Result<SyncOutcome> {
        let record_name = record.fqdn();

        let rule = if record.strict {
            Rule::parse_strict(&record.rule)?
        } else {
            Rule::parse(&record.rule)
        };

        let ip = self.source.get(record.record_type, &rule).await?;
        debug!("Resolved {} {} -> {}", record.record_type, record_name, ip);
        self.emit_event(EngineEvent::AddressResolved {
            record_name: record_name.clone(),
            ip,
        });

        let value = ip.to_string();
        let existing = self
            .with_retry(&record_name, || {
                self.repository.find_records(&record.domain, &record.subdomain)
            })
            .await?
            .into_iter()
            .find(|existing| existing.record_type == record.record_type);

        match existing {
            None => {
                let new_record = DnsRecord::new(
                    record.domain.clone(),
                    record.subdomain.clone(),
                    record.record_type,
                    value,
                    record.ttl,
                );
                let id = self
                    .with_retry(&record_name, || self.repository.create_record(&new_record))
                    .await?;

                info!("Created {} record {} -> {} (id {})", record.record_type, record_name, ip, id);
                self.emit_event(EngineEvent::RecordCreated {
                    record_name: record_name.clone(),
                    id: id.clone(),
                    ip,
                });
                Ok(SyncOutcome::Created { record_name, id, ip })
            }
            Some(existing) if existing.value == value => {
                debug!("Record {} already has value {}, skipping update", record_name, value);
                self.emit_event(EngineEvent::RecordUnchanged {
                    record_name: record_name.clone(),
                    ip,
                });
                Ok(SyncOutcome::Unchanged { record_name, ip })
            }
            Some(existing) => {
                let updated = DnsRecord {
                    value,
                    ttl: record.ttl,
                    ..existing.clone()
                };
                self.with_retry(&record_name, || self.repository.update_record(&updated))
                    .await?;

                info!(
                    "Updated {} record {} -> {} (previous: {})",
                    record.record_type, record_name, ip, existing.value
                );
                self.emit_event(EngineEvent::RecordUpdated {
                    record_name: record_name.clone(),
                    id: existing.id.clone(),
                    ip,
                    previous_value: existing.value.clone(),
                });
                Ok(SyncOutcome::Updated {
                    record_name,
                    id: existing.id,
                    ip,
                    previous_value: existing.value,
                })
            }
        }
    }

    /// Run a repository call, retrying failures
    ///
    /// The last error is returned as the repository reported it.
    ///
    /// # Parameters
    ///
    /// - `record_name`: The DNS record name (for logging)
    /// - `call`: Produces a fresh repository future per attempt
    async fn with_retry<T, F, Fut>(&self, record_name: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_retries + 1;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        "Repository attempt {}/{} failed for {} ({}): {}",
                        attempt,
                        attempts,
                        record_name,
                        self.repository.provider_name(),
                        e
                    );

                    if attempt >= attempts {
                        return Err(e);
                    }

                    // Wait before retry
                    tokio::time::sleep(tokio::time::Duration::from_secs(self.retry_delay_secs))
                        .await;
                }
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Send event, logging warning if channel is full (backpressure)
        match self.event_tx.try_send(event) {
            Ok(()) | Err(mpsc::error::TrySendError::Closed(_)) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_outcome_accessors() {
        let failed = SyncOutcome::Failed {
            record_name: "home.example.com".to_string(),
            error: "no IPv6 address among candidates".to_string(),
        };
        assert!(failed.is_failure());
        assert_eq!(failed.record_name(), "home.example.com");

        let unchanged = SyncOutcome::Unchanged {
            record_name: "example.com".to_string(),
            ip: IpAddr::from([203, 0, 113, 1]),
        };
        assert!(!unchanged.is_failure());
    }
}
