// # Address Sources
//
// `CommandSource` acquires candidates by running a shell command through a
// `CommandExecutor` and extracting address literals from its output.

pub mod extract;

pub use extract::{is_global_unicast, parse_addresses};

use async_trait::async_trait;
use std::net::IpAddr;
use tracing::debug;

use crate::error::Result;
use crate::traits::{AddressSource, CommandExecutor};

/// Address source backed by a shell command
///
/// # Example
///
/// ```rust,ignore
/// use ddns_core::source::CommandSource;
///
/// let source = CommandSource::new("ip -4 -o addr | awk '{print $4}' | cut -d/ -f1", executor);
/// let candidates = source.get_all().await?;
/// ```
pub struct CommandSource {
    command: String,
    executor: Box<dyn CommandExecutor>,
}

impl CommandSource {
    /// Create a command source
    pub fn new(command: impl Into<String>, executor: Box<dyn CommandExecutor>) -> Self {
        Self {
            command: command.into(),
            executor,
        }
    }

    /// The command this source runs
    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl AddressSource for CommandSource {
    async fn get_all(&self) -> Result<Vec<IpAddr>> {
        debug!(
            "Running address command via {}: {}",
            self.executor.shell_name(),
            self.command
        );
        let output = self.executor.execute(&self.command).await?;
        let text = String::from_utf8_lossy(&output);
        let candidates = parse_addresses(&text)?;
        debug!("Extracted {} candidate address(es)", candidates.len());
        Ok(candidates)
    }
}
