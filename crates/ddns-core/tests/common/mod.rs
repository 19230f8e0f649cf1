//! Test doubles and common utilities for architecture contract tests
//!
//! These doubles script registrar responses and drive the engine's waits
//! without touching the network or the wall clock.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, EngineConfig, ProviderConfig};
use ddns_core::error::{FetchError, UpdateError};
use ddns_core::record::{DnsRecordSnapshot, RecordSet, ResourceRecord, Target, UpdateReceipt};
use ddns_core::traits::{RecordFetcher, RecordUpdater, Scheduler};
use ddns_core::CancellationToken;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Snapshot with the given record id, published value and observed IP
pub fn snapshot(record_id: &str, published: &str, observed: &str) -> DnsRecordSnapshot {
    DnsRecordSnapshot {
        observed_external_ip: observed.to_string(),
        record_id: record_id.to_string(),
        current_published_value: published.to_string(),
        record_type: "A".to_string(),
        ttl: Some(3600),
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config() -> DdnsConfig {
    DdnsConfig {
        target: Target::new("example.com", "home"),
        provider: ProviderConfig::new("test-key"),
        ttl: 3600,
        poll_interval_secs: 300,
        engine: EngineConfig {
            max_retries: 0,
            retry_delay_secs: 1,
            skip_unchanged: false,
            event_channel_capacity: 100,
        },
    }
}

/// A fetcher that replays a script of results
///
/// Once the script runs out, the last entry is repeated.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<DnsRecordSnapshot, FetchError>>>,
    last: Mutex<Option<Result<DnsRecordSnapshot, FetchError>>>,
    fetch_call_count: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<DnsRecordSnapshot, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            fetch_call_count: AtomicUsize::new(0),
        })
    }

    /// Always return the same result
    pub fn always(result: Result<DnsRecordSnapshot, FetchError>) -> Arc<Self> {
        Self::new(vec![result])
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecordFetcher for ScriptedFetcher {
    async fn fetch(&self, _target: &Target) -> Result<DnsRecordSnapshot, FetchError> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(FetchError::Transport("script empty".to_string()))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// One recorded update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub record_id: String,
    pub new_value: String,
    pub ttl: u32,
}

/// An updater that records calls and replays a script of results
///
/// Once the script runs out, every call succeeds.
pub struct RecordingUpdater {
    script: Mutex<VecDeque<Result<(), UpdateError>>>,
    calls: Mutex<Vec<UpdateCall>>,
}

impl RecordingUpdater {
    pub fn new() -> Arc<Self> {
        Self::scripted(Vec::new())
    }

    pub fn scripted(script: Vec<Result<(), UpdateError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Get the number of times update() was called
    pub fn update_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Get every recorded call
    pub fn calls(&self) -> Vec<UpdateCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecordUpdater for RecordingUpdater {
    async fn update(
        &self,
        _target: &Target,
        record_id: &str,
        new_value: &str,
        ttl: u32,
    ) -> Result<UpdateReceipt, UpdateError> {
        self.calls.lock().unwrap().push(UpdateCall {
            record_id: record_id.to_string(),
            new_value: new_value.to_string(),
            ttl,
        });

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
            .map(|()| UpdateReceipt {
                record_id: record_id.to_string(),
            })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// A scheduler that returns immediately and cancels after a number of waits
///
/// The wait that reaches the limit cancels the token and never completes,
/// so the engine observes shutdown at exactly that point.
pub struct CountingScheduler {
    waits: Mutex<Vec<Duration>>,
    cancel_after: usize,
    shutdown: CancellationToken,
}

impl CountingScheduler {
    pub fn new(cancel_after: usize, shutdown: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            waits: Mutex::new(Vec::new()),
            cancel_after,
            shutdown,
        })
    }

    /// Every period the engine asked to wait for
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }

    pub fn wait_count(&self) -> usize {
        self.waits.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Scheduler for CountingScheduler {
    async fn wait(&self, period: Duration) {
        let reached_limit = {
            let mut waits = self.waits.lock().unwrap();
            waits.push(period);
            waits.len() >= self.cancel_after
        };

        if reached_limit {
            self.shutdown.cancel();
            std::future::pending::<()>().await;
        }

        tokio::task::yield_now().await;
    }
}

/// In-memory registrar holding one domain's records
///
/// Implements both halves of the provider interface, so repeated updates
/// can be checked against registrar-visible state.
pub struct FakeRegistrar {
    observed_ip: String,
    records: Mutex<Vec<ResourceRecord>>,
    update_call_count: AtomicUsize,
}

impl FakeRegistrar {
    pub fn new(observed_ip: &str, records: Vec<ResourceRecord>) -> Arc<Self> {
        Arc::new(Self {
            observed_ip: observed_ip.to_string(),
            records: Mutex::new(records),
            update_call_count: AtomicUsize::new(0),
        })
    }

    /// Current value of a record, as the registrar would serve it
    pub fn value_of(&self, record_id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.record_id == record_id)
            .map(|r| r.value.clone())
    }

    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }
}

pub fn a_record(record_id: &str, host: &str, value: &str) -> ResourceRecord {
    ResourceRecord {
        record_id: record_id.to_string(),
        record_type: "A".to_string(),
        host: host.to_string(),
        value: value.to_string(),
        ttl: Some(3600),
        distance: Some(0),
    }
}

#[async_trait::async_trait]
impl RecordFetcher for FakeRegistrar {
    async fn fetch(&self, target: &Target) -> Result<DnsRecordSnapshot, FetchError> {
        let set = RecordSet {
            observed_ip: self.observed_ip.clone(),
            records: self.records.lock().unwrap().clone(),
        };
        set.snapshot_for(target)
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[async_trait::async_trait]
impl RecordUpdater for FakeRegistrar {
    async fn update(
        &self,
        _target: &Target,
        record_id: &str,
        new_value: &str,
        ttl: u32,
    ) -> Result<UpdateReceipt, UpdateError> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.record_id == record_id)
            .ok_or_else(|| UpdateError::RemoteRejected {
                code: 280,
                detail: "Invalid resource record id".to_string(),
            })?;

        record.value = new_value.to_string();
        record.ttl = Some(ttl);

        Ok(UpdateReceipt {
            record_id: record_id.to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
