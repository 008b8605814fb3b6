//! Runtime configuration shared by the bus, adapters, and launcher.

use crate::defaults;
use std::time::Duration;

/// Bus and adapter tuning. Poll cadence and idle detection are configuration,
/// not constants baked into the adapters.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Sleep between polls when the backend is poll-based.
    pub poll_interval: Duration,
    /// The bus must be empty this long before a job counts as finished.
    pub idle_grace: Duration,
    /// Bounded capacity for channels and in-memory queues.
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(defaults::DEFAULT_POLL_INTERVAL_MS),
            idle_grace: Duration::from_millis(defaults::DEFAULT_IDLE_GRACE_MS),
            channel_capacity: defaults::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
