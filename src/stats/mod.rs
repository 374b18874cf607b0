// Read-side key statistics. Deliberately uncached, and the active count uses
// the same predicate validation uses, so the numbers never drift from what
// validate() would accept.

use crate::clock::Clock;
use crate::config::StatsConfig;
use crate::db::store::{with_deadline, KeyStats, Store};
use crate::errors::Result;
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;

pub struct StatsAggregator {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    config: StatsConfig,
    call_timeout: Duration,
}

impl StatsAggregator {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        config: StatsConfig,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            config,
            call_timeout,
        }
    }

    pub async fn key_stats(&self) -> Result<KeyStats> {
        let now = self.clock.now();
        let recent_since = now - ChronoDuration::hours(self.config.recent_window_hours);
        with_deadline(self.call_timeout, self.store.key_stats(now, recent_since)).await
    }
}
