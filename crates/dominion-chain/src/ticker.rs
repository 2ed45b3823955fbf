//! Block production cadence.

use std::sync::Arc;
use std::time::Duration;

use dominion_types::BlockTimestamp;

use crate::cancel::{CancelToken, Canceled};
use crate::config::ChainConfig;
use crate::time::TimeSource;

/// Computes when the next block is due and waits for it.
///
/// The next block is due one interval after its parent. When that moment
/// has already passed the ticker restarts from now instead of catching up
/// with a burst of overdue blocks.
#[derive(Debug, Clone)]
pub struct BlockTicker {
    interval: Duration,
    skew: Duration,
    time: Arc<dyn TimeSource>,
}

impl BlockTicker {
    /// Ticker with an explicit interval and jitter allowance.
    pub fn new(interval: Duration, skew: Duration, time: Arc<dyn TimeSource>) -> Self {
        Self {
            interval,
            skew,
            time,
        }
    }

    /// Ticker configured from the chain settings.
    pub fn from_config(config: &ChainConfig, time: Arc<dyn TimeSource>) -> Self {
        Self::new(config.block_interval(), config.block_skew(), time)
    }

    /// Due time of the block after `previous`, before skew.
    pub fn next_timestamp(&self, previous: BlockTimestamp) -> BlockTimestamp {
        let candidate = previous.saturating_add(self.interval);
        let now = self.time.now();
        if candidate < now { now } else { candidate }
    }

    /// Wait until the block after `previous` is due and return its
    /// timestamp, skew included.
    pub async fn wait_for_next(
        &self,
        cancel: &CancelToken,
        previous: BlockTimestamp,
    ) -> Result<BlockTimestamp, Canceled> {
        let target = self.next_timestamp(previous).saturating_add(self.skew);
        let wait = target.saturating_duration_since(self.time.now());
        cancel.sleep(wait).await?;
        Ok(target)
    }
}
