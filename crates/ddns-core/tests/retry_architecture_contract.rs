//! Architectural Contract Test: Engine-Owned Retry Logic
//!
//! This test verifies that retry logic is explicitly configured and engine-owned,
//! not hidden in providers or triggered automatically.
//!
//! Constraints verified:
//! - Retries are controlled by explicit configuration (max_retries, retry_delay_secs)
//! - Only transient (transport) failures are retried
//! - Retry delays go through the scheduler
//! - Retries can be completely disabled via configuration
//!
//! If this test fails, someone has moved retry logic to the wrong layer
//! or implemented automatic, hidden retry behavior.

mod common;

use common::*;
use ddns_core::error::{FetchError, UpdateError};
use ddns_core::{CancellationToken, CycleOutcome, DdnsEngine};
use std::time::Duration;

#[tokio::test]
async fn retries_disabled_by_default() {
    let fetcher = ScriptedFetcher::always(Err(FetchError::Transport(
        "Provider unavailable".to_string(),
    )));
    let updater = RecordingUpdater::new();

    let (engine, _event_rx) = DdnsEngine::new(fetcher.clone(), updater, minimal_config())
        .expect("engine construction succeeds");

    let outcome = engine.reconcile_once(&CancellationToken::new()).await;

    assert!(matches!(
        outcome,
        CycleOutcome::FetchFailed { attempts: 1, .. }
    ));
    assert_eq!(
        fetcher.fetch_call_count(),
        1,
        "Expected exactly 1 fetch attempt with max_retries=0"
    );
}

#[tokio::test]
async fn retries_honor_explicit_configuration() {
    let fetcher = ScriptedFetcher::always(Err(FetchError::Transport(
        "Provider unavailable".to_string(),
    )));
    let updater = RecordingUpdater::new();

    let mut config = minimal_config();
    config.engine.max_retries = 2; // 1 initial + 2 retries = 3 total
    config.engine.retry_delay_secs = 7;

    let shutdown = CancellationToken::new();
    let scheduler = CountingScheduler::new(usize::MAX, shutdown.clone());

    let (engine, _event_rx) = DdnsEngine::new(fetcher.clone(), updater.clone(), config)
        .expect("engine construction succeeds");
    let engine = engine.with_scheduler(scheduler.clone());

    let outcome = engine.reconcile_once(&shutdown).await;

    assert!(matches!(
        outcome,
        CycleOutcome::FetchFailed { attempts: 3, .. }
    ));
    assert_eq!(fetcher.fetch_call_count(), 3);
    assert_eq!(updater.update_call_count(), 0);
    assert_eq!(
        scheduler.waits(),
        vec![Duration::from_secs(7), Duration::from_secs(7)],
        "each retry waits the configured delay"
    );
}

#[tokio::test]
async fn remote_rejection_is_not_retried() {
    let fetcher = ScriptedFetcher::always(Err(FetchError::RemoteRejected {
        code: 280,
        detail: "Invalid API key".to_string(),
    }));
    let updater = RecordingUpdater::new();

    let mut config = minimal_config();
    config.engine.max_retries = 5;

    let shutdown = CancellationToken::new();
    let scheduler = CountingScheduler::new(usize::MAX, shutdown.clone());

    let (engine, _event_rx) = DdnsEngine::new(fetcher.clone(), updater, config)
        .expect("engine construction succeeds");
    let engine = engine.with_scheduler(scheduler.clone());

    let outcome = engine.reconcile_once(&shutdown).await;

    assert_eq!(
        outcome,
        CycleOutcome::FetchFailed {
            error: FetchError::RemoteRejected {
                code: 280,
                detail: "Invalid API key".to_string(),
            },
            attempts: 1,
        }
    );
    assert_eq!(fetcher.fetch_call_count(), 1);
    assert_eq!(scheduler.wait_count(), 0);
}

#[tokio::test]
async fn transient_update_failure_recovers_within_cycle() {
    let fetcher = ScriptedFetcher::always(Ok(snapshot("R1", "1.2.3.4", "5.6.7.8")));
    let updater = RecordingUpdater::scripted(vec![Err(UpdateError::Transport(
        "timed out".to_string(),
    ))]);

    let mut config = minimal_config();
    config.engine.max_retries = 1;

    let shutdown = CancellationToken::new();
    let scheduler = CountingScheduler::new(usize::MAX, shutdown.clone());

    let (engine, _event_rx) = DdnsEngine::new(fetcher.clone(), updater.clone(), config)
        .expect("engine construction succeeds");
    let engine = engine.with_scheduler(scheduler);

    let outcome = engine.reconcile_once(&shutdown).await;

    assert!(outcome.is_success());
    assert_eq!(fetcher.fetch_call_count(), 1, "fetch is not repeated");
    assert_eq!(updater.update_call_count(), 2);
}

#[tokio::test]
async fn shutdown_during_retry_delay_cancels_cycle() {
    let fetcher = ScriptedFetcher::always(Err(FetchError::Transport(
        "Provider unavailable".to_string(),
    )));
    let updater = RecordingUpdater::new();

    let mut config = minimal_config();
    config.engine.max_retries = 3;

    let shutdown = CancellationToken::new();
    // First retry delay cancels
    let scheduler = CountingScheduler::new(1, shutdown.clone());

    let (engine, _event_rx) = DdnsEngine::new(fetcher.clone(), updater, config)
        .expect("engine construction succeeds");
    let engine = engine.with_scheduler(scheduler);

    let outcome = engine.reconcile_once(&shutdown).await;

    assert_eq!(outcome, CycleOutcome::Cancelled);
    assert_eq!(fetcher.fetch_call_count(), 1);
}
