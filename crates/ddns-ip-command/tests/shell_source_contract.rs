//! Contract tests for resolving addresses through a real shell
//!
//! These tests spawn bash, so they only run on Linux.

#![cfg(target_os = "linux")]

use ddns_core::config::{RecordType, ShellKind, SourceConfig};
use ddns_core::rule::Rule;
use ddns_core::source::CommandSource;
use ddns_core::{AddressSource, ProviderRegistry};
use std::net::IpAddr;

const LISTING: &str = "printf '127.0.0.1\\n203.0.113.9\\nfe80::1\\n2001:db8:0:7::5\\n'";

fn bash_source(command: &str, timeout_secs: u64) -> CommandSource {
    let registry = ProviderRegistry::new();
    ddns_ip_command::register(&registry);

    let mut config = SourceConfig::new(command);
    config.shell = Some(ShellKind::Bash);
    config.timeout_secs = timeout_secs;

    let executor = registry.create_executor(&config).unwrap();
    CommandSource::new(config.command, executor)
}

#[tokio::test]
async fn test_bash_output_resolves_per_family() {
    let source = bash_source(LISTING, 5);

    let v4 = source.get(RecordType::A, &Rule::parse("")).await.unwrap();
    let v6 = source.get(RecordType::Aaaa, &Rule::parse("")).await.unwrap();

    assert_eq!(v4, "203.0.113.9".parse::<IpAddr>().unwrap());
    assert_eq!(v6, "2001:db8:0:7::5".parse::<IpAddr>().unwrap());
}

#[tokio::test]
async fn test_bash_output_spliced_suffix() {
    let source = bash_source(LISTING, 5);

    let ip = source
        .get(RecordType::Aaaa, &Rule::parse("::dead:beef/64"))
        .await
        .unwrap();

    assert_eq!(ip, "2001:db8:0:7::dead:beef".parse::<IpAddr>().unwrap());
}

#[tokio::test]
async fn test_failing_command_surfaces_exit_status() {
    let source = bash_source("echo 203.0.113.9; exit 7", 5);

    let err = source.get_all().await.unwrap_err();

    assert!(err.is_acquisition());
    assert!(matches!(err, ddns_core::Error::NonZeroExit { code: Some(7), .. }));
}

#[tokio::test]
async fn test_configured_timeout_is_enforced() {
    let source = bash_source("sleep 30", 1);

    let err = source.get_all().await.unwrap_err();

    assert!(err.is_timeout());
}
