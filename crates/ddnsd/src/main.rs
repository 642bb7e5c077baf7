// # ddnsd - DDNS Daemon
//
// This is a thin integration layer. All address selection and record
// synchronization lives in ddns-core; the daemon only wires it together.
//
// The ddnsd daemon is responsible for:
// 1. Reading configuration from a JSON file or environment variables
// 2. Initializing logging and the runtime
// 3. Registering repositories and shell executors
// 4. Running one sync pass of the DDNS engine
//
// ## Configuration
//
// `DDNS_CONFIG_FILE` points at a JSON `DdnsConfig`. When it is unset, a single
// record is configured from the environment:
//
// ### Address Source
// - `DDNS_COMMAND`: Shell command printing the host's addresses, one per line (required)
// - `DDNS_SHELL`: Shell to run it with (bash, zsh, powershell; host default when unset)
// - `DDNS_COMMAND_TIMEOUT_SECS`: Wall-clock bound for the command (default 5)
//
// ### Record
// - `DDNS_DOMAIN`: Zone the record lives in (required)
// - `DDNS_SUBDOMAIN`: Host label, `@` for the apex (default `@`)
// - `DDNS_RECORD_TYPE`: `A` or `AAAA` (default `A`)
// - `DDNS_RULE`: Address selection rule (default: first candidate)
// - `DDNS_TTL`: Record TTL in seconds (default 600)
// - `DDNS_STRICT_RULES`: Reject malformed rules instead of falling back (default false)
//
// ### Provider
// - `DDNS_PROVIDER_TYPE`: Repository type (default `memory`)
//
// ### Engine
// - `DDNS_MAX_RETRIES`: Maximum retry attempts for repository calls
// - `DDNS_RETRY_DELAY_SECS`: Delay between retries
//
// ### Logging
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DDNS_COMMAND="ip -6 -o addr show scope global | awk '{print \$4}' | cut -d/ -f1"
// export DDNS_DOMAIN=example.com
// export DDNS_SUBDOMAIN=home
// export DDNS_RECORD_TYPE=AAAA
// export DDNS_RULE=::1234/64
//
// ddnsd
// ```

use anyhow::Result;
use ddns_core::config::{
    DdnsConfig, EngineConfig, ProviderConfig, RecordConfig, RecordType, ShellKind, SourceConfig,
};
use ddns_core::source::CommandSource;
use ddns_core::{DdnsEngine, ProviderRegistry, SyncOutcome};
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Every record synced
/// - 1: Configuration or startup error
/// - 2: Runtime error, or at least one record failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// All records created, updated or already correct
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error or failed record
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    config_file: Option<String>,
    command: Option<String>,
    shell: Option<ShellKind>,
    command_timeout_secs: Option<u64>,
    domain: Option<String>,
    subdomain: String,
    record_type: RecordType,
    rule: String,
    ttl: Option<u32>,
    strict_rules: bool,
    provider_type: String,
    max_retries: Option<usize>,
    retry_delay_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any key/value lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            config_file: var("DDNS_CONFIG_FILE"),
            command: var("DDNS_COMMAND"),
            shell: parse_var(&var, "DDNS_SHELL")?,
            command_timeout_secs: parse_var(&var, "DDNS_COMMAND_TIMEOUT_SECS")?,
            domain: var("DDNS_DOMAIN").map(|d| d.trim().to_string()),
            subdomain: var("DDNS_SUBDOMAIN").unwrap_or_else(|| "@".to_string()),
            record_type: parse_var(&var, "DDNS_RECORD_TYPE")?.unwrap_or(RecordType::A),
            rule: var("DDNS_RULE").unwrap_or_default(),
            ttl: parse_var(&var, "DDNS_TTL")?,
            strict_rules: match var("DDNS_STRICT_RULES") {
                Some(value) => parse_bool("DDNS_STRICT_RULES", &value)?,
                None => false,
            },
            provider_type: var("DDNS_PROVIDER_TYPE").unwrap_or_else(|| "memory".to_string()),
            max_retries: parse_var(&var, "DDNS_MAX_RETRIES")?,
            retry_delay_secs: parse_var(&var, "DDNS_RETRY_DELAY_SECS")?,
            log_level: var("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the daemon-level settings
    ///
    /// Record, source and engine settings are validated again by
    /// `DdnsConfig::validate` once the full configuration is built.
    fn validate(&self) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        if self.config_file.is_some() {
            return Ok(());
        }

        if self.command.is_none() {
            anyhow::bail!(
                "DDNS_COMMAND is required. \
                Set it via: export DDNS_COMMAND=\"hostname -I | tr ' ' '\\n'\""
            );
        }

        match &self.domain {
            Some(domain) => validate_domain_name(domain)?,
            None => anyhow::bail!(
                "DDNS_DOMAIN is required. Set it via: export DDNS_DOMAIN=example.com"
            ),
        }

        if self.subdomain != "@" {
            validate_domain_name(&self.subdomain)?;
        }

        if let Some(max_retries) = self.max_retries
            && max_retries > 10
        {
            anyhow::bail!(
                "DDNS_MAX_RETRIES must be between 0 and 10. Got: {}",
                max_retries
            );
        }

        if let Some(retry_delay) = self.retry_delay_secs
            && retry_delay > 300
        {
            anyhow::bail!(
                "DDNS_RETRY_DELAY_SECS must be at most 300 seconds. Got: {}",
                retry_delay
            );
        }

        Ok(())
    }

    /// Build the engine configuration
    fn to_ddns_config(&self) -> Result<DdnsConfig> {
        let config = match &self.config_file {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("Failed to read DDNS_CONFIG_FILE {}: {}", path, e))?;
                DdnsConfig::from_json(&json)?
            }
            None => self.env_ddns_config()?,
        };

        config.validate()?;
        Ok(config)
    }

    fn env_ddns_config(&self) -> Result<DdnsConfig> {
        let (Some(command), Some(domain)) = (&self.command, &self.domain) else {
            anyhow::bail!("DDNS_COMMAND and DDNS_DOMAIN are required without DDNS_CONFIG_FILE");
        };

        let mut source = SourceConfig::new(command.clone());
        source.shell = self.shell;
        if let Some(timeout) = self.command_timeout_secs {
            source.timeout_secs = timeout;
        }

        let mut record = RecordConfig::new(domain.clone(), self.subdomain.clone())
            .with_record_type(self.record_type)
            .with_rule(self.rule.clone())
            .with_strict(self.strict_rules);
        if let Some(ttl) = self.ttl {
            record = record.with_ttl(ttl);
        }

        let provider = match self.provider_type.as_str() {
            "memory" => ProviderConfig::Memory,
            // Provider settings beyond the type come from DDNS_CONFIG_FILE
            other => ProviderConfig::Custom {
                factory: other.to_string(),
                config: serde_json::Value::Object(Default::default()),
            },
        };

        let mut engine = EngineConfig::default();
        if let Some(max_retries) = self.max_retries {
            engine.max_retries = max_retries;
        }
        if let Some(delay) = self.retry_delay_secs {
            engine.retry_delay_secs = delay;
        }

        Ok(DdnsConfig {
            source,
            provider,
            records: vec![record],
            engine,
        })
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Parse an optional variable with `FromStr`, failing on malformed values
fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, raw, e)),
        None => Ok(None),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be a boolean (true/false). Got: {}", name, other),
    }
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        // Wildcard labels are allowed for subdomains like "*.home"
        if label != "*" && !label.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric, hyphen and underscore only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let ddns_config = match config.to_ddns_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration validation error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!("Starting ddnsd");
    info!("Configuration loaded: {} record(s)", ddns_config.records.len());

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(ddns_config).await {
            Ok(code) => code,
            Err(e) => {
                error!("Daemon error: {}", e);
                DdnsExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run one sync pass
async fn run_daemon(config: DdnsConfig) -> Result<DdnsExitCode> {
    let registry = ProviderRegistry::new();
    ddns_core::repository::register(&registry);
    ddns_ip_command::register(&registry);

    let executor = match registry.create_executor(&config.source) {
        Ok(executor) => executor,
        Err(e) => {
            error!("Failed to create command executor: {}", e);
            return Ok(DdnsExitCode::ConfigError);
        }
    };
    let repository = match registry.create_repository(&config.provider) {
        Ok(repository) => repository,
        Err(e) => {
            error!(
                "Failed to create record repository: {}. Registered providers: {:?}",
                e,
                registry.list_repositories()
            );
            return Ok(DdnsExitCode::ConfigError);
        }
    };

    let shell = executor.shell_name();
    let source = CommandSource::new(config.source.command.clone(), executor);
    info!("Address command via {}: {}", shell, source.command());
    info!("Provider: {}", repository.provider_name());

    let (engine, mut events) = DdnsEngine::new(Box::new(source), repository, config)?;

    let outcomes = tokio::select! {
        outcomes = engine.run_once() => outcomes,
        signal = wait_for_shutdown() => {
            warn!("Received {}, abandoning sync pass", signal);
            return Ok(DdnsExitCode::RuntimeError);
        }
    };

    while let Ok(event) = events.try_recv() {
        debug!("Engine event: {:?}", event);
    }

    let mut failures = 0;
    for outcome in &outcomes {
        match outcome {
            SyncOutcome::Created { record_name, ip, .. } => {
                info!("{}: created -> {}", record_name, ip)
            }
            SyncOutcome::Updated {
                record_name,
                ip,
                previous_value,
                ..
            } => info!("{}: updated {} -> {}", record_name, previous_value, ip),
            SyncOutcome::Unchanged { record_name, ip } => {
                info!("{}: unchanged ({})", record_name, ip)
            }
            SyncOutcome::Failed { record_name, error } => {
                failures += 1;
                error!("{}: failed: {}", record_name, error)
            }
        }
    }

    if failures > 0 {
        error!("{} of {} record(s) failed", failures, outcomes.len());
        Ok(DdnsExitCode::RuntimeError)
    } else {
        info!("Sync pass complete");
        Ok(DdnsExitCode::Success)
    }
}

/// Wait for a shutdown signal, or forever if signals cannot be observed
async fn wait_for_shutdown() -> &'static str {
    match shutdown_signal().await {
        Ok(signal) => signal,
        Err(e) => {
            warn!("Signal handling unavailable: {}", e);
            std::future::pending().await
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_env_config_builds_single_record() {
        let config = config_from(&[
            ("DDNS_COMMAND", "hostname -I"),
            ("DDNS_DOMAIN", "example.com"),
            ("DDNS_SUBDOMAIN", "home"),
            ("DDNS_RECORD_TYPE", "aaaa"),
            ("DDNS_RULE", "::1/64"),
            ("DDNS_STRICT_RULES", "true"),
            ("DDNS_SHELL", "zsh"),
            ("DDNS_MAX_RETRIES", "0"),
        ])
        .unwrap();
        config.validate().unwrap();

        let ddns = config.to_ddns_config().unwrap();
        assert_eq!(ddns.source.shell, Some(ShellKind::Zsh));
        assert_eq!(ddns.engine.max_retries, 0);
        let record = &ddns.records[0];
        assert_eq!(record.fqdn(), "home.example.com");
        assert_eq!(record.record_type, RecordType::Aaaa);
        assert_eq!(record.rule, "::1/64");
        assert!(record.strict);
        assert!(matches!(ddns.provider, ProviderConfig::Memory));
    }

    #[test]
    fn test_env_config_with_custom_provider_type() {
        let config = config_from(&[
            ("DDNS_COMMAND", "hostname -I"),
            ("DDNS_DOMAIN", "example.com"),
            ("DDNS_PROVIDER_TYPE", "aliyun"),
        ])
        .unwrap();
        config.validate().unwrap();

        let ddns = config.to_ddns_config().unwrap();
        match &ddns.provider {
            ProviderConfig::Custom { factory, config } => {
                assert_eq!(factory, "aliyun");
                assert!(config.is_object());
            }
            other => panic!("expected a custom provider, got {other:?}"),
        }
        assert_eq!(ddns.provider.type_name(), "aliyun");
    }

    #[test]
    fn test_missing_required_variables() {
        let config = config_from(&[("DDNS_DOMAIN", "example.com")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("DDNS_COMMAND", "hostname -I")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert!(config_from(&[("DDNS_TTL", "ten")]).is_err());
        assert!(config_from(&[("DDNS_SHELL", "fish")]).is_err());
        assert!(config_from(&[("DDNS_RECORD_TYPE", "MX")]).is_err());
        assert!(config_from(&[("DDNS_STRICT_RULES", "maybe")]).is_err());

        let config = config_from(&[
            ("DDNS_COMMAND", "hostname -I"),
            ("DDNS_DOMAIN", "example.com"),
            ("DDNS_LOG_LEVEL", "loud"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_fails_engine_validation() {
        let config = config_from(&[
            ("DDNS_COMMAND", "hostname -I"),
            ("DDNS_DOMAIN", "example.com"),
            ("DDNS_COMMAND_TIMEOUT_SECS", "0"),
        ])
        .unwrap();
        config.validate().unwrap();
        assert!(config.to_ddns_config().is_err());
    }

    #[test]
    fn test_domain_name_validation() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("home-1.example.com").is_ok());
        assert!(validate_domain_name("example..com").is_err());
        assert!(validate_domain_name("-bad.example.com").is_err());
        assert!(validate_domain_name("bad domain.com").is_err());
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(DdnsExitCode::Success as u8, 0);
        assert_eq!(DdnsExitCode::ConfigError as u8, 1);
        assert_eq!(DdnsExitCode::RuntimeError as u8, 2);
    }
}
