//! Configuration types for the DDNS system
//!
//! The whole configuration is built once at startup and handed to the
//! engine and provider by value. Nothing mutates it afterwards.

use crate::record::Target;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Host to keep in sync
    pub target: Target,

    /// Registrar access
    pub provider: ProviderConfig,

    /// TTL written with every update (seconds)
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Time between reconcile cycles (seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration with default TTL, interval and engine settings
    pub fn new(target: Target, provider: ProviderConfig) -> Self {
        Self {
            target,
            provider,
            ttl: default_ttl(),
            poll_interval_secs: default_poll_interval_secs(),
            engine: EngineConfig::default(),
        }
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.target.domain.trim().is_empty() {
            return Err(crate::Error::config("Domain cannot be empty"));
        }
        if self.target.subdomain.trim().is_empty() {
            return Err(crate::Error::config("Subdomain cannot be empty"));
        }
        if self.ttl == 0 {
            return Err(crate::Error::config("TTL must be > 0"));
        }
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }

        self.provider.validate()?;

        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

/// NameSilo API access
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key, forwarded verbatim on every request
    pub api_key: String,

    /// API base URL; `None` means the public NameSilo endpoint
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request HTTP timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log update requests instead of sending them
    #[serde(default)]
    pub dry_run: bool,
}

impl ProviderConfig {
    /// Create a provider configuration for the public endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            dry_run: false,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.is_empty() {
            return Err(crate::Error::config("NameSilo API key cannot be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        if let Some(url) = &self.base_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "API base URL must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }
        Ok(())
    }

    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// The API key must never reach logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Registrar spelling of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Case-insensitive comparison against a registrar type string
    pub fn matches(&self, record_type: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(record_type.trim())
    }
}

impl std::str::FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(crate::Error::config(format!(
                "Unsupported record type '{}'. Supported: A, AAAA",
                other
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Extra attempts for transient failures within one cycle
    ///
    /// 0 means a failed fetch or update waits for the next cycle.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay between attempts (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Skip the update when the record already publishes the observed IP
    ///
    /// Off by default: every cycle pushes the observed IP, which keeps the
    /// TTL refreshed at the registrar.
    #[serde(default)]
    pub skip_unchanged: bool,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Retry delay as a [`Duration`]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            skip_unchanged: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_ttl() -> u32 {
    3600
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    0
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    100
}
