//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.
//!
//! Errors fall into three groups:
//! - **Acquisition**: running the address command failed (spawn, exit status, timeout)
//! - **Parse**: the command output, a rule or an IPv6 suffix could not be decoded
//! - **Selection**: the candidates did not satisfy the requested family or rule

use crate::traits::IpVersion;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// The shell process could not be started or waited on
    #[error("failed to run command `{command}`: {source}")]
    Spawn {
        /// The command string handed to the shell
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The command ran but exited unsuccessfully
    #[error("command `{command}` exited with {}: {stderr}", exit_code_label(.code))]
    NonZeroExit {
        /// The command string handed to the shell
        command: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Captured standard error (trimmed)
        stderr: String,
    },

    /// The command did not finish within its time bound
    #[error("command `{command}` timed out after {timeout:?}")]
    Timeout {
        /// The command string handed to the shell
        command: String,
        /// The bound that expired
        timeout: Duration,
    },

    /// Command output was empty or whitespace-only
    #[error("empty command output")]
    EmptyInput,

    /// Command output contained no global unicast address
    #[error("no global unicast address found in command output")]
    NoAddressFound,

    /// A rule string could not be parsed (strict mode only)
    #[error("invalid rule {rule:?}: {reason}")]
    InvalidRule {
        /// The offending rule
        rule: String,
        /// What is wrong with it
        reason: String,
    },

    /// The identifier of a splice rule is not a valid IPv6 suffix
    #[error("invalid suffix {identifier:?}: {source}")]
    InvalidSuffix {
        /// The offending identifier
        identifier: String,
        /// Decoding failure
        #[source]
        source: SuffixError,
    },

    /// A strategy was handed an empty candidate list
    #[error("no candidate addresses to select from")]
    NoCandidates,

    /// No candidate belongs to the requested address family
    #[error("no {version} address among candidates")]
    NoFamilyMatch {
        /// Requested family
        version: IpVersion,
    },

    /// No candidate contains the substring of a filter rule
    #[error("no address matches filter {pattern:?}")]
    NoFilterMatch {
        /// The substring pattern
        pattern: String,
    },

    /// A splice rule found no IPv6 candidate to take the prefix from
    #[error("no IPv6 address to splice suffix {identifier:?} onto")]
    NoIpv6Candidate {
        /// The suffix identifier
        identifier: String,
    },

    /// Prefix length outside `0..=128`
    #[error("invalid prefix length: {0}")]
    InvalidPrefixLength(i64),

    /// Prefix length is not a multiple of 8
    #[error("prefix length must be a multiple of 8, got /{0}")]
    UnalignedPrefixLength(i64),

    /// A strict `@N` rule points past the candidate list
    #[error("index {index} out of range for {len} candidate(s)")]
    IndexOutOfRange {
        /// 1-based position requested by the rule
        index: i64,
        /// Number of candidates available
        len: usize,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to decode an IPv6 suffix identifier into 16 bytes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuffixError {
    #[error("empty hextet")]
    EmptyHextet,

    #[error("hextet too long: {0:?}")]
    HextetTooLong(String),

    #[error("invalid hextet {0:?}")]
    InvalidHextet(String),

    #[error("too many hextets in suffix ({0})")]
    TooManyHextets(usize),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (killed by signal)".to_string(),
    }
}

impl Error {
    /// Create a spawn error
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Create a timeout error
    pub fn timeout(command: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            command: command.into(),
            timeout,
        }
    }

    /// Create a strict-mode rule error
    pub fn invalid_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from running the address command
    pub fn is_acquisition(&self) -> bool {
        matches!(
            self,
            Self::Spawn { .. } | Self::NonZeroExit { .. } | Self::Timeout { .. }
        )
    }

    /// Whether the address command hit its time bound
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the error came from family filtering or rule matching
    pub fn is_selection(&self) -> bool {
        matches!(
            self,
            Self::NoCandidates
                | Self::NoFamilyMatch { .. }
                | Self::NoFilterMatch { .. }
                | Self::NoIpv6Candidate { .. }
                | Self::InvalidPrefixLength(_)
                | Self::UnalignedPrefixLength(_)
                | Self::IndexOutOfRange { .. }
        )
    }
}
