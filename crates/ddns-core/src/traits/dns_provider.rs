// # DNS Provider Traits
//
// Defines the two halves of the registrar interface: reading the managed
// record and writing a new value into it.
//
// ## Implementations
//
// - NameSilo: `ddns-provider-namesilo` crate (implements both traits)
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{RecordFetcher, RecordUpdater, Target};
//
// let target = Target::new("example.com", "home");
// let snapshot = provider.fetch(&target).await?;
// provider
//     .update(&target, &snapshot.record_id, &snapshot.observed_external_ip, 3600)
//     .await?;
// ```

use crate::error::{FetchError, UpdateError};
use crate::record::{DnsRecordSnapshot, Target, UpdateReceipt};
use async_trait::async_trait;

/// Reads the registrar's view of the managed record
///
/// # Constraints
///
/// - Exactly one registrar round trip per call
/// - No retries, no sleeping (the engine owns retry policy)
/// - No state carried between calls
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    /// Fetch the record set of `target.domain` and extract the record for
    /// `target.fqdn()` together with the caller's observed address
    ///
    /// # Returns
    ///
    /// - `Ok(DnsRecordSnapshot)`: the managed record and observed IP
    /// - `Err(FetchError::RemoteRejected)`: reply code other than success
    /// - `Err(FetchError::HostNotFound)`: no record for the host
    /// - `Err(FetchError::Transport | FetchError::Parse)`: the call itself failed
    async fn fetch(&self, target: &Target) -> Result<DnsRecordSnapshot, FetchError>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Writes a new value into one registrar record
///
/// # Idempotency
///
/// Writing the value a record already holds must leave it unchanged, so the
/// engine may push the same address every cycle.
#[async_trait]
pub trait RecordUpdater: Send + Sync {
    /// Set record `record_id` of `target` to `new_value` with `ttl`
    ///
    /// `record_id` comes from a previous fetch; it is not validated locally,
    /// the registrar rejects stale ids.
    async fn update(
        &self,
        target: &Target,
        record_id: &str,
        new_value: &str,
        ttl: u32,
    ) -> Result<UpdateReceipt, UpdateError>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
