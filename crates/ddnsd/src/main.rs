// # ddnsd - NameSilo DDNS Daemon
//
// Thin integration layer: no DNS or retry logic lives here.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the NameSilo provider and the reconcile engine
// 4. Cancelling the engine on SIGTERM / SIGINT
//
// ## Configuration
//
// ### Record
// - `DDNS_DOMAIN`: Domain that owns the record (required)
// - `DDNS_SUBDOMAIN`: Host label of the managed record (required)
// - `DDNS_RECORD_TYPE`: Only match records of this type (`A` or `AAAA`)
// - `DDNS_TTL`: TTL written on update (default 3600)
//
// ### Provider
// - `DDNS_API_KEY`: NameSilo API key (required, never logged)
// - `DDNS_API_BASE_URL`: API endpoint (default https://www.namesilo.com/api)
// - `DDNS_REQUEST_TIMEOUT_SECS`: HTTP timeout (default 30)
// - `DDNS_MODE`: `live` (default) or `dry-run`
//
// ### Engine
// - `DDNS_POLL_INTERVAL_SECS`: Seconds between cycles (default 300)
// - `DDNS_SKIP_UNCHANGED`: Skip the update when the record already matches (default false)
// - `DDNS_MAX_RETRIES`: Extra attempts for transport failures (default 0)
// - `DDNS_RETRY_DELAY_SECS`: Delay between attempts (default 5)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DDNS_DOMAIN=example.com
// export DDNS_SUBDOMAIN=home
// export DDNS_API_KEY=your_key
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::{
    CancellationToken, DdnsConfig, DdnsEngine, EngineConfig, EngineEvent, ProviderConfig,
    RecordType, Target,
};
use ddns_provider_namesilo::NameSiloProvider;
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon mode selected by `DDNS_MODE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Live,
    DryRun,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(Mode::Live),
            "dry-run" | "dryrun" | "dry_run" => Ok(Mode::DryRun),
            other => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                other
            ),
        }
    }
}

/// Application configuration
struct Config {
    domain: String,
    subdomain: String,
    api_key: String,
    api_base_url: Option<String>,
    record_type: Option<RecordType>,
    ttl: u32,
    poll_interval_secs: u64,
    skip_unchanged: bool,
    max_retries: usize,
    retry_delay_secs: u64,
    request_timeout_secs: u64,
    mode: Mode,
    log_level: String,
}

// API key stays out of any debug output
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("domain", &self.domain)
            .field("subdomain", &self.subdomain)
            .field("api_key", &"<REDACTED>")
            .field("api_base_url", &self.api_base_url)
            .field("record_type", &self.record_type)
            .field("ttl", &self.ttl)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("skip_unchanged", &self.skip_unchanged)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("mode", &self.mode)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .with_context(|| format!("{} is required. Set it via: export {}=...", key, key))
        };

        Ok(Self {
            domain: required("DDNS_DOMAIN")?.to_ascii_lowercase(),
            subdomain: required("DDNS_SUBDOMAIN")?.to_ascii_lowercase(),
            api_key: required("DDNS_API_KEY")?,
            api_base_url: lookup("DDNS_API_BASE_URL").filter(|s| !s.trim().is_empty()),
            record_type: lookup("DDNS_RECORD_TYPE")
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse::<RecordType>())
                .transpose()
                .context("Invalid DDNS_RECORD_TYPE")?,
            ttl: parse_or(&lookup, "DDNS_TTL", 3600)?,
            poll_interval_secs: parse_or(&lookup, "DDNS_POLL_INTERVAL_SECS", 300)?,
            skip_unchanged: parse_bool_or(&lookup, "DDNS_SKIP_UNCHANGED", false)?,
            max_retries: parse_or(&lookup, "DDNS_MAX_RETRIES", 0)?,
            retry_delay_secs: parse_or(&lookup, "DDNS_RETRY_DELAY_SECS", 5)?,
            request_timeout_secs: parse_or(&lookup, "DDNS_REQUEST_TIMEOUT_SECS", 30)?,
            mode: lookup("DDNS_MODE")
                .map(|s| s.trim().parse::<Mode>())
                .transpose()?
                .unwrap_or(Mode::Live),
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks domain name syntax, numeric ranges, the endpoint scheme and the
    /// log level. Everything else is checked again by `DdnsConfig::validate`.
    fn validate(&self) -> Result<()> {
        self.validate_domain_name(&self.domain)
            .context("Invalid DDNS_DOMAIN")?;
        self.validate_host_label(&self.subdomain)
            .context("Invalid DDNS_SUBDOMAIN")?;

        let fqdn_len = self.subdomain.len() + 1 + self.domain.len();
        if fqdn_len > 253 {
            anyhow::bail!(
                "DDNS_SUBDOMAIN + DDNS_DOMAIN too long: {} chars (max 253)",
                fqdn_len
            );
        }

        // Check for obvious placeholder keys (common mistake)
        let key_lower = self.api_key.to_lowercase();
        if key_lower.contains("your_key") || key_lower.contains("replace_me") {
            anyhow::bail!(
                "DDNS_API_KEY appears to be a placeholder. \
                Use the API key from your NameSilo account."
            );
        }

        if self.ttl == 0 {
            anyhow::bail!("DDNS_TTL must be greater than 0");
        }

        if !(1..=86400).contains(&self.poll_interval_secs) {
            anyhow::bail!(
                "DDNS_POLL_INTERVAL_SECS must be between 1 and 86400 seconds. Got: {}",
                self.poll_interval_secs
            );
        }

        if self.max_retries > 10 {
            anyhow::bail!(
                "DDNS_MAX_RETRIES must be between 0 and 10. Got: {}",
                self.max_retries
            );
        }

        if !(1..=300).contains(&self.retry_delay_secs) {
            anyhow::bail!(
                "DDNS_RETRY_DELAY_SECS must be between 1 and 300 seconds. Got: {}",
                self.retry_delay_secs
            );
        }

        if !(1..=300).contains(&self.request_timeout_secs) {
            anyhow::bail!(
                "DDNS_REQUEST_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.request_timeout_secs
            );
        }

        if let Some(ref url) = self.api_base_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!(
                    "DDNS_API_BASE_URL must use HTTP or HTTPS scheme. Got: {}",
                    url
                );
            }

            // The API key travels in the query string
            if url.starts_with("http://") {
                eprintln!(
                    "WARNING: DDNS_API_BASE_URL uses HTTP (not HTTPS). \
                    The API key will be sent in clear text."
                );
            }
        }

        // Validate log level
        parse_log_level(&self.log_level)?;

        Ok(())
    }

    /// Validate that a string is a valid domain name
    ///
    /// Basic RFC 1035 label rules. Not comprehensive but catches common errors.
    fn validate_domain_name(&self, domain: &str) -> Result<()> {
        if domain.is_empty() {
            anyhow::bail!("Domain name cannot be empty");
        }

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

            if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                anyhow::bail!(
                    "Domain label contains invalid characters. Label: '{}'. \
                    Valid: alphanumeric and hyphen only.",
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

    /// Validate the host part of the managed record
    ///
    /// Looser than a domain name: the first label may be a bare `*` and
    /// labels may contain underscores (`_acme-challenge`, `_dmarc`).
    fn validate_host_label(&self, host: &str) -> Result<()> {
        if host.is_empty() {
            anyhow::bail!("Host cannot be empty");
        }

        if host.len() > 253 {
            anyhow::bail!("Host too long: {} chars (max 253). Got: {}", host.len(), host);
        }

        for (i, label) in host.split('.').enumerate() {
            if i == 0 && label == "*" {
                continue;
            }

            if label.is_empty() {
                anyhow::bail!("Host has empty label: '{}'", host);
            }

            if label.len() > 63 {
                anyhow::bail!(
                    "Host label too long: {} chars (max 63). Label: '{}'",
                    label.len(),
                    label
                );
            }

            if !label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                anyhow::bail!(
                    "Host label contains invalid characters. Label: '{}'. \
                    Valid: alphanumeric, hyphen and underscore, or a leading '*'.",
                    label
                );
            }

            if label.starts_with('-') || label.ends_with('-') {
                anyhow::bail!(
                    "Host label cannot start or end with hyphen. Label: '{}'",
                    label
                );
            }
        }

        Ok(())
    }

    /// Build the immutable core configuration
    fn to_ddns_config(&self) -> DdnsConfig {
        let mut target = Target::new(self.domain.clone(), self.subdomain.clone());
        if let Some(record_type) = self.record_type {
            target = target.with_record_type(record_type);
        }

        let provider = ProviderConfig {
            api_key: self.api_key.clone(),
            base_url: self.api_base_url.clone(),
            request_timeout_secs: self.request_timeout_secs,
            dry_run: self.mode == Mode::DryRun,
        };

        let mut config = DdnsConfig::new(target, provider);
        config.ttl = self.ttl;
        config.poll_interval_secs = self.poll_interval_secs;
        config.engine = EngineConfig {
            max_retries: self.max_retries,
            retry_delay_secs: self.retry_delay_secs,
            skip_unchanged: self.skip_unchanged,
            ..EngineConfig::default()
        };
        config
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a non-negative integer. Got: '{}'", key, raw)),
        _ => Ok(default),
    }
}

fn parse_bool_or<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(s) if s.is_empty() => Ok(default),
        Some(s) => match s.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => anyhow::bail!("{} must be true or false. Got: '{}'", key, s),
        },
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    debug!("Configuration loaded: {:?}", config);

    let ddns_config = config.to_ddns_config();
    if let Err(e) = ddns_config.validate() {
        error!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

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
        if let Err(e) = run_daemon(ddns_config).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: DdnsConfig) -> Result<()> {
    let provider = Arc::new(
        NameSiloProvider::from_config(&config.provider)
            .context("Failed to create NameSilo provider")?,
    );

    info!(
        "Managing {} (ttl={}, poll every {}s, max_retries={})",
        config.target,
        config.ttl,
        config.poll_interval_secs,
        config.engine.max_retries
    );

    let (engine, mut event_rx) = DdnsEngine::new(provider.clone(), provider, config)
        .context("Failed to create DDNS engine")?;

    // Engine events are informational only
    let event_logger = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            log_event(&event);
        }
    });

    let shutdown = CancellationToken::new();
    let signal_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match wait_for_shutdown_signal().await {
                Ok(signal) => info!("Received shutdown signal: {}", signal),
                Err(e) => error!("Signal handling failed, shutting down: {}", e),
            }
            shutdown.cancel();
        })
    };

    engine.run_with_shutdown(shutdown).await;

    signal_task.abort();
    drop(engine);
    if let Err(e) = event_logger.await {
        warn!("Event logger task ended abnormally: {}", e);
    }

    info!("ddnsd stopped");
    Ok(())
}

fn log_event(event: &EngineEvent) {
    debug!("Engine event: {:?}", event);
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
