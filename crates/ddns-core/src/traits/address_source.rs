// # Address Source Traits
//
// Defines the interfaces for acquiring candidate addresses from the host.
//
// ## Implementations
//
// - Shell executors (bash, zsh, PowerShell): `ddns-ip-command` crate
// - `CommandSource`: runs an executor and extracts addresses from its output
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::config::RecordType;
// use ddns_core::rule::Rule;
// use ddns_core::source::CommandSource;
// use ddns_core::AddressSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let executor = ddns_ip_command::host_executor();
//     let source = CommandSource::new("ip -6 addr | awk '/inet6/{print $2}' | cut -d/ -f1", executor);
//
//     // All extracted public candidates
//     let candidates = source.get_all().await?;
//
//     // Exactly one address for an AAAA record, spliced onto the host suffix
//     let ip = source.get(RecordType::Aaaa, &Rule::parse("::1/64")).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::IpAddr;

use crate::config::{RecordType, SourceConfig};
use crate::rule::Rule;

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Family of a concrete address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

/// Trait for running one shell command on the host
///
/// Exactly one executor is selected per host platform. Every call spawns
/// exactly one child process and captures its standard output.
///
/// # Contract
///
/// - The call is bounded by a wall-clock timeout; on expiry the child and any
///   of its descendants are terminated and [`Error::Timeout`] is returned.
/// - A child that cannot be started surfaces as [`Error::Spawn`].
/// - A child that exits unsuccessfully surfaces as [`Error::NonZeroExit`],
///   even when it wrote something to stdout.
///
/// [`Error::Timeout`]: crate::Error::Timeout
/// [`Error::Spawn`]: crate::Error::Spawn
/// [`Error::NonZeroExit`]: crate::Error::NonZeroExit
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` through the shell and return its raw stdout
    async fn execute(&self, command: &str) -> Result<Vec<u8>, crate::Error>;

    /// Name of the shell this executor drives (for logging/debugging)
    fn shell_name(&self) -> &'static str;
}

/// Trait for address sources
///
/// An address source yields the ordered list of public candidate addresses
/// currently visible on the host, and resolves a single address for a record
/// from that list.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Get every candidate address, in order of first appearance
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<IpAddr>)`: At least one global unicast address
    /// - `Err(Error)`: Acquisition or parse failure
    async fn get_all(&self) -> Result<Vec<IpAddr>, crate::Error>;

    /// Resolve the single address to publish for a record
    ///
    /// Candidates are fetched fresh, narrowed to the family of `record_type`,
    /// then handed to `rule`.
    async fn get(&self, record_type: RecordType, rule: &Rule) -> Result<IpAddr, crate::Error> {
        let candidates = self.get_all().await?;
        crate::select::resolve(record_type.version(), &candidates, rule)
    }
}

/// Helper trait for constructing executors from configuration
pub trait ExecutorFactory: Send + Sync {
    /// Create a CommandExecutor instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Source configuration (shell, timeout)
    ///
    /// # Returns
    ///
    /// A boxed CommandExecutor trait object
    fn create(&self, config: &SourceConfig) -> Result<Box<dyn CommandExecutor>, crate::Error>;
}
