// # Scheduler Trait
//
// All waiting the engine does (poll interval, retry delay) goes through a
// `Scheduler`, so tests can drive the reconcile loop without wall-clock
// sleeps. The engine races every wait against its cancellation token;
// implementations only need to complete once the period has elapsed.

use async_trait::async_trait;
use std::time::Duration;

/// Source of delays for the reconcile loop
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Complete after `period`
    ///
    /// Must be cancellation-safe: the engine drops the future when shutdown
    /// wins the race.
    async fn wait(&self, period: Duration);
}

/// Scheduler backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn wait(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}
