//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that stand in for the shell and
//! the DNS provider.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, EngineConfig, ProviderConfig, RecordConfig, SourceConfig};
use ddns_core::error::{Error, Result};
use ddns_core::repository::MemoryRecordRepository;
use ddns_core::traits::{CommandExecutor, DnsRecord, RecordRepository};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An executor that returns canned output, one entry per call
///
/// The last entry repeats once the script is exhausted.
#[derive(Clone)]
pub struct ScriptedExecutor {
    outputs: Arc<Mutex<Vec<String>>>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn new(outputs: &[&str]) -> Self {
        Self {
            outputs: Arc::new(Mutex::new(outputs.iter().rev().map(|s| s.to_string()).collect())),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the number of times execute() was called
    pub fn call_count(&self) -> usize {
        self.commands.lock().unwrap().len()
    }

    /// Commands received, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, command: &str) -> Result<Vec<u8>> {
        self.commands.lock().unwrap().push(command.to_string());
        let mut outputs = self.outputs.lock().unwrap();
        let output = if outputs.len() > 1 {
            outputs.pop().unwrap()
        } else {
            outputs.last().cloned().unwrap_or_default()
        };
        Ok(output.into_bytes())
    }

    fn shell_name(&self) -> &'static str {
        "scripted"
    }
}

/// Which acquisition failure a FailingExecutor reports
#[derive(Clone, Copy)]
pub enum Failure {
    Spawn,
    NonZeroExit,
    Timeout,
}

/// An executor that always fails
#[derive(Clone)]
pub struct FailingExecutor {
    failure: Failure,
    calls: Arc<AtomicUsize>,
}

impl FailingExecutor {
    pub fn new(failure: Failure) -> Self {
        Self {
            failure,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CommandExecutor for FailingExecutor {
    async fn execute(&self, command: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(match self.failure {
            Failure::Spawn => Error::spawn(
                command,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such shell"),
            ),
            Failure::NonZeroExit => Error::NonZeroExit {
                command: command.to_string(),
                code: Some(1),
                stderr: "ip: command not found".to_string(),
            },
            Failure::Timeout => Error::timeout(command, Duration::from_secs(5)),
        })
    }

    fn shell_name(&self) -> &'static str {
        "failing"
    }
}

/// A repository that wraps MemoryRecordRepository, counts writes and can fail
/// a number of calls before succeeding
#[derive(Clone)]
pub struct CountingRepository {
    inner: MemoryRecordRepository,
    creates: Arc<AtomicUsize>,
    updates: Arc<AtomicUsize>,
    lookups: Arc<AtomicUsize>,
    failures_remaining: Arc<AtomicUsize>,
}

impl CountingRepository {
    pub fn new() -> Self {
        Self::with_failures(0)
    }

    /// Fail the first `failures` calls of any kind
    pub fn with_failures(failures: usize) -> Self {
        Self {
            inner: MemoryRecordRepository::new(),
            creates: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(AtomicUsize::new(0)),
            lookups: Arc::new(AtomicUsize::new(0)),
            failures_remaining: Arc::new(AtomicUsize::new(failures)),
        }
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn memory(&self) -> &MemoryRecordRepository {
        &self.inner
    }

    fn maybe_fail(&self) -> Result<()> {
        let failed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(Error::provider("counting", "provider unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl RecordRepository for CountingRepository {
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        self.inner.list_records(domain).await
    }

    async fn get_record(&self, id: &str) -> Result<DnsRecord> {
        self.inner.get_record(id).await
    }

    async fn create_record(&self, record: &DnsRecord) -> Result<String> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        self.inner.create_record(record).await
    }

    async fn update_record(&self, record: &DnsRecord) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        self.inner.update_record(record).await
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        self.inner.delete_record(id).await
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(records: Vec<RecordConfig>) -> DdnsConfig {
    DdnsConfig {
        source: SourceConfig::new("list-addresses"),
        provider: ProviderConfig::Memory,
        records,
        engine: EngineConfig {
            max_retries: 2,
            retry_delay_secs: 0, // No waiting in tests
            event_channel_capacity: 100,
        },
    }
}
