// # NameSilo DNS Provider
//
// This crate provides the NameSilo implementation of the DDNS provider
// traits. One `NameSiloProvider` serves as both `RecordFetcher` and
// `RecordUpdater`.
//
// ## Behavior
//
// - One HTTP GET per trait call, no retries, no backoff (owned by DdnsEngine)
// - Explicit request timeout (30 seconds unless configured)
// - Reply code 300 is success; anything else is `RemoteRejected`
// - Dry-run mode performs list requests but only logs update requests
//
// ## Security Requirements
//
// - The API key travels in the query string, so request URLs are never logged
// - The Debug implementation redacts the API key
//
// ## API Reference
//
// - List DNS Records: GET `/dnsListRecords?version=1&type=xml&key=..&domain=..`
// - Update DNS Record: GET `/dnsUpdateRecord?version=1&type=xml&key=..&domain=..&rrid=..&rrhost=..&rrvalue=..&rrttl=..`

pub mod response;

use async_trait::async_trait;
use ddns_core::config::ProviderConfig;
use ddns_core::error::{FetchError, UpdateError};
use ddns_core::record::{DnsRecordSnapshot, Target, UpdateReceipt};
use ddns_core::traits::{RecordFetcher, RecordUpdater};
use ddns_core::{Error, Result};
use std::time::Duration;

pub use response::{SUCCESS_CODE, parse_list_records, parse_update_record};

/// NameSilo API base URL
pub const NAMESILO_API_BASE: &str = "https://www.namesilo.com/api";

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const LIST_RECORDS_OPERATION: &str = "dnsListRecords";
const UPDATE_RECORD_OPERATION: &str = "dnsUpdateRecord";

/// NameSilo DNS provider
///
/// Stateless and single-shot. All coordination (retries, scheduling,
/// the update decision) is owned by `DdnsEngine`.
pub struct NameSiloProvider {
    /// NameSilo API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: perform list requests but skip updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for NameSiloProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameSiloProvider")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl NameSiloProvider {
    /// Create a provider against the public NameSilo endpoint
    ///
    /// # Errors
    ///
    /// Fails if the API key is empty or the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, NAMESILO_API_BASE, DEFAULT_HTTP_TIMEOUT, false)
    }

    /// Create a provider with an explicit endpoint, timeout and mode
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
        dry_run: bool,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("NameSilo API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider from the shared configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        if config.dry_run {
            tracing::warn!("NameSilo provider running in DRY-RUN mode - no changes will be made");
        }

        Self::with_options(
            config.api_key.clone(),
            config
                .base_url
                .clone()
                .unwrap_or_else(|| NAMESILO_API_BASE.to_string()),
            config.request_timeout(),
            config.dry_run,
        )
    }

    /// Whether update requests are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Issue one GET against `operation` and return the body
    ///
    /// Any failure before a body is in hand is returned as a message for the
    /// caller's transport error. Non-2xx statuses count: NameSilo reports
    /// application errors inside a 200 response.
    async fn get(
        &self,
        operation: &str,
        params: &[(&str, &str)],
    ) -> std::result::Result<String, String> {
        let url = format!("{}/{}", self.base_url, operation);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("version", "1"),
                ("type", "xml"),
                ("key", self.api_key.as_str()),
            ])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                format!(
                    "{} request failed: {}",
                    operation,
                    describe_reqwest_error(e)
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                429 => format!("{}: rate limit exceeded. Status: {}", operation, status),
                500..=599 => format!("{}: NameSilo server error (transient): {}", operation, status),
                _ => format!("{}: unexpected HTTP status: {}", operation, status),
            });
        }

        response.text().await.map_err(|e| {
            format!(
                "{}: failed to read response: {}",
                operation,
                describe_reqwest_error(e)
            )
        })
    }
}

/// Render a reqwest error with its kind and cause chain
///
/// The URL is stripped first: it carries the API key.
fn describe_reqwest_error(err: reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request error"
    };

    let err = err.without_url();
    let mut message = format!("{} ({})", err, kind);

    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

#[async_trait]
impl RecordFetcher for NameSiloProvider {
    /// List the domain's records and extract the managed one
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /dnsListRecords?version=1&type=xml&key=<key>&domain=example.com
    /// ```
    async fn fetch(&self, target: &Target) -> std::result::Result<DnsRecordSnapshot, FetchError> {
        tracing::debug!("Listing NameSilo records for {}", target.domain);

        let body = self
            .get(LIST_RECORDS_OPERATION, &[("domain", target.domain.as_str())])
            .await
            .map_err(FetchError::Transport)?;

        let records = parse_list_records(&body)?;
        tracing::debug!(
            "NameSilo returned {} record(s) for {}, observed ip: {}",
            records.records.len(),
            target.domain,
            records.observed_ip
        );

        records.snapshot_for(target)
    }

    fn provider_name(&self) -> &'static str {
        "namesilo"
    }
}

#[async_trait]
impl RecordUpdater for NameSiloProvider {
    /// Point the record at `new_value`
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /dnsUpdateRecord?version=1&type=xml&key=<key>&domain=example.com
    ///     &rrid=<id>&rrhost=home&rrvalue=5.6.7.8&rrttl=3600
    /// ```
    async fn update(
        &self,
        target: &Target,
        record_id: &str,
        new_value: &str,
        ttl: u32,
    ) -> std::result::Result<UpdateReceipt, UpdateError> {
        let ttl = ttl.to_string();

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send {} for {} (rrid={}, rrvalue={}, rrttl={})",
                UPDATE_RECORD_OPERATION,
                target,
                record_id,
                new_value,
                ttl
            );
            return Ok(UpdateReceipt {
                record_id: record_id.to_string(),
            });
        }

        tracing::debug!("Updating NameSilo record {} for {} -> {}", record_id, target, new_value);

        let body = self
            .get(
                UPDATE_RECORD_OPERATION,
                &[
                    ("domain", target.domain.as_str()),
                    ("rrid", record_id),
                    ("rrhost", target.subdomain.as_str()),
                    ("rrvalue", new_value),
                    ("rrttl", ttl.as_str()),
                ],
            )
            .await
            .map_err(UpdateError::Transport)?;

        let echoed_id = parse_update_record(&body)?;

        Ok(UpdateReceipt {
            record_id: echoed_id.unwrap_or_else(|| record_id.to_string()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "namesilo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        assert!(NameSiloProvider::new("").is_err());
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let provider = NameSiloProvider::new("secret_key_12345").unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("NameSiloProvider"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider = NameSiloProvider::with_options(
            "key",
            "http://localhost:8080/api/",
            DEFAULT_HTTP_TIMEOUT,
            false,
        )
        .unwrap();
        assert_eq!(provider.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn test_from_config_defaults_to_public_endpoint() {
        let provider = NameSiloProvider::from_config(&ProviderConfig::new("key")).unwrap();
        assert_eq!(provider.base_url, NAMESILO_API_BASE);
        assert!(!provider.is_dry_run());
    }

    #[test]
    fn test_from_config_dry_run() {
        let mut config = ProviderConfig::new("key");
        config.dry_run = true;
        let provider = NameSiloProvider::from_config(&config).unwrap();
        assert!(provider.is_dry_run());
    }

    #[test]
    fn test_provider_name() {
        let provider = NameSiloProvider::new("key").unwrap();
        assert_eq!(RecordFetcher::provider_name(&provider), "namesilo");
        assert_eq!(RecordUpdater::provider_name(&provider), "namesilo");
    }
}
