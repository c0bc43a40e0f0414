pub mod config;
pub mod metrics;
pub mod server;

use metrics::Metrics;
use state::ClassificationStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use validator::ValidatorApi;

/// Periodic snapshot cycle: reads the store and the validator's connection
/// totals, and pushes both onto the metrics surface.
///
/// Classification calls arrive on the shared store handle from the validator
/// side; this loop never mutates classification state.
pub struct Monitor<V> {
    store: Arc<ClassificationStore>,
    metrics: Metrics,
    validator: Arc<V>,
    snapshot_interval: Duration,
}

impl<V> Monitor<V>
where
    V: ValidatorApi,
{
    pub const fn new(
        store: Arc<ClassificationStore>,
        metrics: Metrics,
        validator: Arc<V>,
        snapshot_interval: Duration,
    ) -> Self {
        Self {
            store,
            metrics,
            validator,
            snapshot_interval,
        }
    }

    /// Handle the validator side uses to record determinations.
    pub fn store(&self) -> Arc<ClassificationStore> {
        Arc::clone(&self.store)
    }

    /// One snapshot cycle over a single consistent store read.
    pub fn cycle(&mut self) {
        self.store.log_state();
        let snapshot = self.store.snapshot();
        self.metrics
            .update(&snapshot, self.validator.connection_stats());
    }

    /// Run snapshot cycles at a fixed cadence until cancelled.
    pub async fn run(mut self) {
        let mut interval = time::interval(self.snapshot_interval);
        loop {
            interval.tick().await;
            self.cycle();
        }
    }
}
