//! Contract tests for retry behavior
//!
//! Repository calls are retried up to `max_retries` times. Address
//! acquisition is not retried within a pass.

mod common;

use common::{CountingRepository, Failure, FailingExecutor, ScriptedExecutor, minimal_config};
use ddns_core::config::{DdnsConfig, RecordConfig};
use ddns_core::source::CommandSource;
use ddns_core::traits::CommandExecutor;
use ddns_core::{DdnsEngine, SyncOutcome};

fn build(
    executor: Box<dyn CommandExecutor>,
    repository: &CountingRepository,
    config: DdnsConfig,
) -> DdnsEngine {
    let source = CommandSource::new("list-addresses", executor);
    let (engine, _events) =
        DdnsEngine::new(Box::new(source), Box::new(repository.clone()), config).unwrap();
    engine
}

fn one_record() -> Vec<RecordConfig> {
    vec![RecordConfig::new("example.com", "home")]
}

#[tokio::test]
async fn test_transient_repository_failures_are_retried() {
    let repository = CountingRepository::with_failures(2);
    let engine = build(
        Box::new(ScriptedExecutor::new(&["203.0.113.7\n"])),
        &repository,
        minimal_config(one_record()),
    );

    let outcomes = engine.run_once().await;

    assert!(matches!(&outcomes[..], [SyncOutcome::Created { .. }]));
    // Two failed lookups, then one that succeeds
    assert_eq!(repository.lookup_count(), 3);
    assert_eq!(repository.create_count(), 1);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let repository = CountingRepository::with_failures(3);
    let engine = build(
        Box::new(ScriptedExecutor::new(&["203.0.113.7\n"])),
        &repository,
        minimal_config(one_record()),
    );

    let outcomes = engine.run_once().await;

    match &outcomes[..] {
        // The repository's own error, not a rewrapped copy of it
        [SyncOutcome::Failed { error, .. }] => {
            assert_eq!(error, "Provider error (counting): provider unavailable")
        }
        other => panic!("expected a failure, got {other:?}"),
    }
    assert_eq!(repository.lookup_count(), 3);
    assert_eq!(repository.create_count(), 0);
}

#[tokio::test]
async fn test_zero_retries_means_a_single_attempt() {
    let repository = CountingRepository::with_failures(1);
    let mut config = minimal_config(one_record());
    config.engine.max_retries = 0;
    let engine = build(
        Box::new(ScriptedExecutor::new(&["203.0.113.7\n"])),
        &repository,
        config,
    );

    let outcomes = engine.run_once().await;

    assert!(outcomes[0].is_failure());
    assert_eq!(repository.lookup_count(), 1);

    // The next pass starts fresh
    let outcomes = engine.run_once().await;
    assert!(matches!(&outcomes[..], [SyncOutcome::Created { .. }]));
}

#[tokio::test]
async fn test_command_failures_are_not_retried() {
    let repository = CountingRepository::new();
    let executor = FailingExecutor::new(Failure::Timeout);
    let engine = build(
        Box::new(executor.clone()),
        &repository,
        minimal_config(one_record()),
    );

    let outcomes = engine.run_once().await;

    match &outcomes[..] {
        [SyncOutcome::Failed { error, .. }] => assert!(error.contains("timed out"), "{error}"),
        other => panic!("expected a failure, got {other:?}"),
    }
    assert_eq!(executor.call_count(), 1);
    assert_eq!(repository.lookup_count(), 0);
}
