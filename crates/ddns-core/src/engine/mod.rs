//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Fetching the managed record and observed IP via RecordFetcher
//! - Deciding whether an update is needed
//! - Pushing the observed IP via RecordUpdater
//! - Waiting out the poll interval until shutdown
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────┐
//!        ┌────────▶│ DdnsEngine   │◀──── CancellationToken
//!        │         └──────────────┘
//!   Scheduler             │
//!   (wait)                ├───────────────────────────┐
//!                         │                           │
//!                         ▼                           ▼
//!              ┌────────────────┐  snapshot  ┌────────────────┐
//!              │ RecordFetcher  │──────────▶ │ RecordUpdater  │
//!              └────────────────┘            └────────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Fetch the record set, extract the managed record
//! 2. On failure, log and go to 5
//! 3. Unless skipping unchanged records, push the observed IP
//! 4. Log the outcome, emit events
//! 5. Wait the poll interval (or stop on shutdown), repeat
//!
//! Every error is recoverable. The loop only ends through cancellation.

use crate::config::DdnsConfig;
use crate::error::{FetchError, Result, UpdateError};
use crate::record::{DnsRecordSnapshot, Target, UpdateReceipt};
use crate::traits::{RecordFetcher, RecordUpdater, Scheduler, TokioScheduler};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started { target: String },

    /// Managed record read from the registrar
    FetchSucceeded {
        target: String,
        record_id: String,
        record_type: String,
        published_value: String,
        published_ttl: Option<u32>,
        observed_ip: String,
    },

    /// Fetch failed after all attempts
    FetchFailed {
        target: String,
        error: String,
        attempts: usize,
    },

    /// DNS update started
    UpdateStarted { target: String, new_value: String },

    /// DNS update succeeded
    UpdateSucceeded {
        target: String,
        record_id: String,
        previous_value: String,
        new_value: String,
    },

    /// DNS update skipped (record already current)
    UpdateSkipped { target: String, current_value: String },

    /// DNS update failed after all attempts
    UpdateFailed {
        target: String,
        error: String,
        attempts: usize,
    },

    /// Engine stopped
    Stopped { reason: String },
}

/// Result of one reconcile cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Registrar acknowledged the new value
    Updated {
        snapshot: DnsRecordSnapshot,
        receipt: UpdateReceipt,
    },

    /// Record already published the observed IP and the update was skipped
    Unchanged { snapshot: DnsRecordSnapshot },

    /// No snapshot could be obtained
    FetchFailed { error: FetchError, attempts: usize },

    /// Snapshot obtained but the update was not acknowledged
    UpdateFailed {
        snapshot: DnsRecordSnapshot,
        error: UpdateError,
        attempts: usize,
    },

    /// Shutdown requested while the cycle was waiting to retry
    Cancelled,
}

impl CycleOutcome {
    /// Whether the record is known to publish the observed IP after this cycle
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            CycleOutcome::Updated { .. } | CycleOutcome::Unchanged { .. }
        )
    }
}

/// Outcome of an operation run under the retry policy
enum Attempted<T, E> {
    Done(T),
    Failed { error: E, attempts: usize },
    Cancelled,
}

/// Core DDNS engine
///
/// Runs reconcile cycles back to back, separated by the poll interval.
/// Exactly one fetch-then-update sequence is in flight at any time.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Optionally swap the scheduler with [`DdnsEngine::with_scheduler()`]
/// 3. Start with [`DdnsEngine::run()`] or [`DdnsEngine::run_with_shutdown()`]
/// 4. Engine runs until the shutdown signal fires
pub struct DdnsEngine {
    /// Reads the managed record
    fetcher: Arc<dyn RecordFetcher>,

    /// Writes the managed record
    updater: Arc<dyn RecordUpdater>,

    /// Source of poll and retry delays
    scheduler: Arc<dyn Scheduler>,

    /// Host kept in sync
    target: Target,

    /// TTL sent with every update
    ttl: u32,

    /// Delay between cycles
    poll_interval: Duration,

    /// Extra attempts for transient errors
    max_retries: usize,

    /// Delay between attempts
    retry_delay: Duration,

    /// Skip updates when the record is already current
    skip_unchanged: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `fetcher`: reads the managed record
    /// - `updater`: writes the managed record
    /// - `config`: DDNS configuration (validated here)
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        fetcher: Arc<dyn RecordFetcher>,
        updater: Arc<dyn RecordUpdater>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            fetcher,
            updater,
            scheduler: Arc::new(TokioScheduler),
            poll_interval: config.poll_interval(),
            retry_delay: config.engine.retry_delay(),
            max_retries: config.engine.max_retries,
            skip_unchanged: config.engine.skip_unchanged,
            ttl: config.ttl,
            target: config.target,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Replace the tokio timer with another scheduler
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Host this engine keeps in sync
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Run the engine until Ctrl-C
    pub async fn run(&self) {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();

        let signal_task = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown signal received");
                    trigger.cancel();
                }
                Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
            }
        });

        self.run_with_shutdown(shutdown).await;
        signal_task.abort();
    }

    /// Run reconcile cycles until `shutdown` is cancelled
    ///
    /// The first cycle starts immediately. Cancellation is observed between
    /// cycles, during the poll wait and during retry delays.
    pub async fn run_with_shutdown(&self, shutdown: CancellationToken) {
        info!(
            "Starting reconcile loop for {} via {} (interval: {:?}, ttl: {})",
            self.target,
            self.fetcher.provider_name(),
            self.poll_interval,
            self.ttl
        );
        self.emit_event(EngineEvent::Started {
            target: self.target.fqdn(),
        });

        while !shutdown.is_cancelled() {
            if let CycleOutcome::Cancelled = self.reconcile_once(&shutdown).await {
                break;
            }

            if !self.wait(self.poll_interval, &shutdown).await {
                break;
            }
        }

        info!("Reconcile loop stopped");
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
    }

    /// Run a single fetch-then-update cycle
    pub async fn reconcile_once(&self, shutdown: &CancellationToken) -> CycleOutcome {
        let target = &self.target;
        debug!("Fetching DNS records for {}", target);

        let fetched = self
            .with_retry("fetch", shutdown, FetchError::is_transient, move || {
                self.fetcher.fetch(target)
            })
            .await;

        let snapshot = match fetched {
            Attempted::Done(snapshot) => snapshot,
            Attempted::Failed { error, attempts } => {
                error!(
                    domain = %target.domain,
                    subdomain = %target.subdomain,
                    attempts,
                    "Get DNS data failed: {}",
                    error
                );
                self.emit_event(EngineEvent::FetchFailed {
                    target: target.fqdn(),
                    error: error.to_string(),
                    attempts,
                });
                return CycleOutcome::FetchFailed { error, attempts };
            }
            Attempted::Cancelled => return CycleOutcome::Cancelled,
        };

        info!(
            record_id = %snapshot.record_id,
            record_type = %snapshot.record_type,
            current_ip = %snapshot.current_published_value,
            current_ttl = ?snapshot.ttl,
            observed_ip = %snapshot.observed_external_ip,
            "Read DNS data for {}",
            target
        );
        if snapshot.ttl.is_some_and(|ttl| ttl != self.ttl) {
            debug!(
                "{} TTL will change from {:?} to {}",
                target, snapshot.ttl, self.ttl
            );
        }
        self.emit_event(EngineEvent::FetchSucceeded {
            target: target.fqdn(),
            record_id: snapshot.record_id.clone(),
            record_type: snapshot.record_type.clone(),
            published_value: snapshot.current_published_value.clone(),
            published_ttl: snapshot.ttl,
            observed_ip: snapshot.observed_external_ip.clone(),
        });

        if self.skip_unchanged && snapshot.is_current() {
            debug!(
                "{} already has IP {}, skipping update",
                target, snapshot.current_published_value
            );
            self.emit_event(EngineEvent::UpdateSkipped {
                target: target.fqdn(),
                current_value: snapshot.current_published_value.clone(),
            });
            return CycleOutcome::Unchanged { snapshot };
        }

        self.emit_event(EngineEvent::UpdateStarted {
            target: target.fqdn(),
            new_value: snapshot.observed_external_ip.clone(),
        });

        let record_id = snapshot.record_id.as_str();
        let new_value = snapshot.observed_external_ip.as_str();
        let ttl = self.ttl;

        let updated = self
            .with_retry("update", shutdown, UpdateError::is_transient, move || {
                self.updater.update(target, record_id, new_value, ttl)
            })
            .await;

        match updated {
            Attempted::Done(receipt) => {
                info!(
                    record_id = %receipt.record_id,
                    "Set {} -> {} (was: {})",
                    target,
                    snapshot.observed_external_ip,
                    snapshot.current_published_value
                );
                self.emit_event(EngineEvent::UpdateSucceeded {
                    target: target.fqdn(),
                    record_id: receipt.record_id.clone(),
                    previous_value: snapshot.current_published_value.clone(),
                    new_value: snapshot.observed_external_ip.clone(),
                });
                CycleOutcome::Updated { snapshot, receipt }
            }
            Attempted::Failed { error, attempts } => {
                error!(
                    domain = %target.domain,
                    subdomain = %target.subdomain,
                    attempts,
                    "Update DNS data failed: {}",
                    error
                );
                self.emit_event(EngineEvent::UpdateFailed {
                    target: target.fqdn(),
                    error: error.to_string(),
                    attempts,
                });
                CycleOutcome::UpdateFailed {
                    snapshot,
                    error,
                    attempts,
                }
            }
            Attempted::Cancelled => CycleOutcome::Cancelled,
        }
    }

    /// Run `attempt` until it succeeds, fails permanently, or runs out of retries
    ///
    /// Only errors accepted by `is_transient` are retried.
    async fn with_retry<T, E, F, Fut>(
        &self,
        operation: &'static str,
        shutdown: &CancellationToken,
        is_transient: fn(&E) -> bool,
        mut attempt: F,
    ) -> Attempted<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match attempt().await {
                Ok(value) => return Attempted::Done(value),
                Err(error) => {
                    if attempts > self.max_retries || !is_transient(&error) {
                        return Attempted::Failed { error, attempts };
                    }

                    warn!(
                        "{} attempt {} failed for {}, retrying in {:?}: {}",
                        operation, attempts, self.target, self.retry_delay, error
                    );

                    if !self.wait(self.retry_delay, shutdown).await {
                        return Attempted::Cancelled;
                    }
                }
            }
        }
    }

    /// Wait for `period`, returning `false` if shutdown fired first
    async fn wait(&self, period: Duration, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => false,
            _ = self.scheduler.wait(period) => true,
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, event discarded");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_updated_and_unchanged_count_as_success() {
        let snapshot = DnsRecordSnapshot {
            observed_external_ip: "5.6.7.8".to_string(),
            record_id: "R1".to_string(),
            current_published_value: "1.2.3.4".to_string(),
            record_type: "A".to_string(),
            ttl: Some(3600),
        };

        assert!(CycleOutcome::Unchanged {
            snapshot: snapshot.clone()
        }
        .is_success());
        assert!(!CycleOutcome::FetchFailed {
            error: FetchError::Transport("down".into()),
            attempts: 1,
        }
        .is_success());
        assert!(!CycleOutcome::UpdateFailed {
            snapshot,
            error: UpdateError::Parse("bad".into()),
            attempts: 1,
        }
        .is_success());
        assert!(!CycleOutcome::Cancelled.is_success());
    }

    #[test]
    fn engine_events_compare_by_value() {
        let event = EngineEvent::UpdateSkipped {
            target: "home.example.com".to_string(),
            current_value: "1.2.3.4".to_string(),
        };
        assert_eq!(event.clone(), event);
    }
}
