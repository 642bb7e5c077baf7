//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::traits::IpVersion;

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Address source configuration
    pub source: SourceConfig,

    /// Record repository configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// DNS records to manage
    pub records: Vec<RecordConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a new configuration for the given address command
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            source: SourceConfig::new(command),
            provider: ProviderConfig::default(),
            records: Vec::new(),
            engine: EngineConfig::default(),
        }
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add a record to manage
    pub fn with_record(mut self, record: RecordConfig) -> Self {
        self.records.push(record);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.records.is_empty() {
            return Err(crate::Error::config("No records configured"));
        }

        self.source.validate()?;
        self.provider.validate()?;

        for record in &self.records {
            record.validate()?;
        }

        Ok(())
    }
}

/// Address source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Shell command whose output lists the host's addresses, one per line
    pub command: String,

    /// Shell to run the command with (host default when unset)
    #[serde(default)]
    pub shell: Option<ShellKind>,

    /// Wall-clock bound for one command run (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SourceConfig {
    /// Create a source configuration with the host shell and default timeout
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            shell: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Shell to use, falling back to the host platform's shell
    pub fn effective_shell(&self) -> ShellKind {
        self.shell.unwrap_or_else(ShellKind::for_host)
    }

    /// Command timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.command.trim().is_empty() {
            return Err(crate::Error::config("Source command cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Source command timeout must be > 0"));
        }
        Ok(())
    }
}

/// Shell used to run the address command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    /// `bash -c` (Linux and other unix)
    Bash,
    /// `zsh -c` (macOS)
    Zsh,
    /// `powershell /C` (Windows)
    #[serde(rename = "powershell")]
    PowerShell,
}

impl ShellKind {
    /// The shell for the platform this binary was built for
    pub fn for_host() -> Self {
        if cfg!(target_os = "windows") {
            ShellKind::PowerShell
        } else if cfg!(target_os = "macos") {
            ShellKind::Zsh
        } else {
            ShellKind::Bash
        }
    }

    /// Registry name of the shell
    pub fn name(&self) -> &'static str {
        match self {
            ShellKind::Bash => "bash",
            ShellKind::Zsh => "zsh",
            ShellKind::PowerShell => "powershell",
        }
    }
}

impl std::str::FromStr for ShellKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bash" => Ok(ShellKind::Bash),
            "zsh" => Ok(ShellKind::Zsh),
            "powershell" => Ok(ShellKind::PowerShell),
            other => Err(crate::Error::config(format!(
                "Unknown shell '{}'. Supported shells: bash, zsh, powershell",
                other
            ))),
        }
    }
}

/// Record repository configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// In-memory repository (dry run, nothing leaves the process)
    #[default]
    Memory,

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Memory => Ok(()),
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Memory => "memory",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// DNS record configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Zone name (e.g., "example.com")
    pub domain: String,

    /// Subdomain label (e.g., "home", "@" for the apex)
    #[serde(default = "default_subdomain")]
    pub subdomain: String,

    /// Record type (A for IPv4, AAAA for IPv6)
    #[serde(default = "default_record_type")]
    pub record_type: RecordType,

    /// Address selection rule ("", "@N", "<ipv6-suffix>[/len]" or a substring)
    #[serde(default)]
    pub rule: String,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Reject malformed rules and out-of-range `@N` instead of falling back
    #[serde(default)]
    pub strict: bool,

    /// Whether this record is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl RecordConfig {
    /// Create a new record configuration
    pub fn new(domain: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            subdomain: subdomain.into(),
            record_type: default_record_type(),
            rule: String::new(),
            ttl: default_ttl(),
            strict: false,
            enabled: true,
        }
    }

    /// Set the record type
    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    /// Set the selection rule
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = rule.into();
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable strict rule handling
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enable or disable the record
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Fully qualified name of the record ("@" maps to the apex)
    pub fn fqdn(&self) -> String {
        if self.subdomain.is_empty() || self.subdomain == "@" {
            self.domain.clone()
        } else {
            format!("{}.{}", self.subdomain, self.domain)
        }
    }

    /// Validate the record configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domain.trim().is_empty() {
            return Err(crate::Error::config("Record domain cannot be empty"));
        }
        if self.ttl == 0 {
            return Err(crate::Error::config(format!(
                "Record {} TTL must be > 0",
                self.fqdn()
            )));
        }
        Ok(())
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    #[serde(rename = "A")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Address family carried by this record type
    pub fn version(&self) -> IpVersion {
        match self {
            RecordType::A => IpVersion::V4,
            RecordType::Aaaa => IpVersion::V6,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => f.write_str("A"),
            RecordType::Aaaa => f.write_str("AAAA"),
        }
    }
}

impl std::str::FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(crate::Error::config(format!(
                "Unsupported record type '{}'. Supported types: A, AAAA",
                other
            ))),
        }
    }
}

fn default_record_type() -> RecordType {
    RecordType::A
}

fn default_subdomain() -> String {
    "@".to_string()
}

fn default_ttl() -> u32 {
    600
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    5
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of retry attempts for failed repository writes
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay between retry attempts (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Capacity of the internal event channel
    ///
    /// When full, new engine events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_json_applies_defaults() {
        let config = DdnsConfig::from_json(
            r#"{
                "source": { "command": "curl -s https://api.ipify.org" },
                "records": [
                    { "domain": "example.com", "subdomain": "home", "record_type": "AAAA", "rule": "::1/64" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.source.timeout_secs, 5);
        assert_eq!(config.source.shell, None);
        assert!(matches!(config.provider, ProviderConfig::Memory));
        assert_eq!(config.records[0].record_type, RecordType::Aaaa);
        assert_eq!(config.records[0].ttl, 600);
        assert!(config.records[0].enabled);
        assert!(!config.records[0].strict);
        assert_eq!(config.engine.max_retries, 3);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        assert!(DdnsConfig::new("echo 1.2.3.4").validate().is_err());

        let record = RecordConfig::new("example.com", "@");
        assert!(DdnsConfig::new("  ").with_record(record.clone()).validate().is_err());

        let mut config = DdnsConfig::new("echo").with_record(record.clone());
        config.source.timeout_secs = 0;
        assert!(config.validate().is_err());

        let config = DdnsConfig::new("echo").with_record(record.with_ttl(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fqdn() {
        assert_eq!(RecordConfig::new("example.com", "@").fqdn(), "example.com");
        assert_eq!(RecordConfig::new("example.com", "home").fqdn(), "home.example.com");
    }

    #[test]
    fn test_record_type_and_shell_parsing() {
        assert_eq!("aaaa".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert_eq!(RecordType::A.version(), IpVersion::V4);
        assert!("CNAME".parse::<RecordType>().is_err());

        assert_eq!("PowerShell".parse::<ShellKind>().unwrap(), ShellKind::PowerShell);
        assert!("fish".parse::<ShellKind>().is_err());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_host_shell_is_bash_on_linux() {
        assert_eq!(ShellKind::for_host(), ShellKind::Bash);
        assert_eq!(SourceConfig::new("true").effective_shell(), ShellKind::Bash);
    }
}
