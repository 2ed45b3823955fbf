//! Chain pipeline configuration.

use std::time::Duration;

use serde::Deserialize;

/// Settings for the block and event pipeline, read from the `chain`
/// section of the node config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainConfig {
    /// Whether this node produces blocks.
    #[serde(default = "default_authority")]
    pub authority: bool,

    /// Target gap between consecutive blocks.
    #[serde(default = "default_block_interval_ms")]
    pub block_interval_ms: u64,

    /// Subtracted from the interval when the producer sleeps after a block.
    #[serde(default = "default_production_margin_ms")]
    pub production_margin_ms: u64,

    /// Added to every production target to absorb clock jitter.
    #[serde(default = "default_block_skew_ms")]
    pub block_skew_ms: u64,

    /// Period of the send, receive and ingestion loops.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause after a failed loop iteration.
    #[serde(default = "default_failure_backoff_ms")]
    pub failure_backoff_ms: u64,

    /// Capacity of the in-process event transport queue.
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,

    /// Capacity of the in-process block transport queue.
    #[serde(default = "default_block_queue_capacity")]
    pub block_queue_capacity: usize,

    /// Capacity of each queue between ingestion and the world engine.
    #[serde(default = "default_emitter_capacity")]
    pub emitter_capacity: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            authority: default_authority(),
            block_interval_ms: default_block_interval_ms(),
            production_margin_ms: default_production_margin_ms(),
            block_skew_ms: default_block_skew_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            failure_backoff_ms: default_failure_backoff_ms(),
            event_queue_capacity: default_event_queue_capacity(),
            block_queue_capacity: default_block_queue_capacity(),
            emitter_capacity: default_emitter_capacity(),
        }
    }
}

impl ChainConfig {
    /// Target gap between blocks.
    pub const fn block_interval(&self) -> Duration {
        Duration::from_millis(self.block_interval_ms)
    }

    /// How long the producer rests after adding a block.
    pub const fn production_rest(&self) -> Duration {
        Duration::from_millis(self.block_interval_ms.saturating_sub(self.production_margin_ms))
    }

    /// Jitter allowance added to production targets.
    pub const fn block_skew(&self) -> Duration {
        Duration::from_millis(self.block_skew_ms)
    }

    /// Period of polling loops.
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Pause after a failed iteration.
    pub const fn failure_backoff(&self) -> Duration {
        Duration::from_millis(self.failure_backoff_ms)
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_authority() -> bool {
    true
}

const fn default_block_interval_ms() -> u64 {
    10_000
}

const fn default_production_margin_ms() -> u64 {
    1_000
}

const fn default_block_skew_ms() -> u64 {
    50
}

const fn default_poll_interval_ms() -> u64 {
    100
}

const fn default_failure_backoff_ms() -> u64 {
    100
}

const fn default_event_queue_capacity() -> usize {
    2_048
}

const fn default_block_queue_capacity() -> usize {
    64
}

const fn default_emitter_capacity() -> usize {
    256
}
