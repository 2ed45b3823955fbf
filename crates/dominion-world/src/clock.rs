//! World clock: turns block timestamps into simulated time.
//!
//! The clock only moves when a confirmed block is observed. Each block
//! timestamp is compared against the previous one and the wall-clock gap
//! is scaled by the compression factor. The first observed timestamp seeds
//! the clock and yields no elapsed time.
//!
//! All arithmetic is checked; a timestamp older than the last one is a
//! regression, which means the local replica has diverged from the chain.

use std::time::Duration;

/// Maturity gained per simulated second when growth takes one second.
pub const SECOND_DELTA_FACTOR: f32 = 1.0;
/// Growth that completes in one simulated minute.
pub const MINUTE_DELTA_FACTOR: f32 = SECOND_DELTA_FACTOR / 60.0;
/// Growth that completes in one simulated hour.
pub const HOUR_DELTA_FACTOR: f32 = MINUTE_DELTA_FACTOR / 60.0;
/// Growth that completes in half a simulated day.
pub const HALF_DAY_DELTA_FACTOR: f32 = HOUR_DELTA_FACTOR / 12.0;
/// Growth that completes in one simulated day.
pub const DAY_DELTA_FACTOR: f32 = HOUR_DELTA_FACTOR / 24.0;
/// Growth that completes in two simulated days.
pub const TWO_DAYS_DELTA_FACTOR: f32 = DAY_DELTA_FACTOR / 2.0;
/// Growth that completes in three simulated days.
pub const THREE_DAYS_DELTA_FACTOR: f32 = DAY_DELTA_FACTOR / 3.0;
/// Growth that completes in four simulated days.
pub const FOUR_DAYS_DELTA_FACTOR: f32 = DAY_DELTA_FACTOR / 4.0;
/// Growth that completes in one simulated week.
pub const WEEK_DELTA_FACTOR: f32 = DAY_DELTA_FACTOR / 7.0;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// A timestamp precedes the last one observed.
    #[error("timestamp {timestamp} precedes last tick {last_tick}")]
    Regression {
        /// The rejected timestamp (unix millis).
        timestamp: u64,
        /// The last accepted timestamp (unix millis).
        last_tick: u64,
    },

    /// The scaled delta does not fit in `u64` milliseconds.
    #[error("simulated delta overflow")]
    DeltaOverflow,

    /// Invalid clock configuration (e.g. zero compression).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Converts wall-clock block timestamps into simulated elapsed time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldClock {
    /// First observed timestamp, `None` until the clock is seeded.
    first_tick: Option<u64>,

    /// Most recently accepted timestamp.
    last_tick: u64,

    /// Simulated milliseconds per wall-clock millisecond.
    compression: u64,
}

impl WorldClock {
    /// Create an unseeded clock.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `compression` is zero.
    pub fn new(compression: u64) -> Result<Self, ClockError> {
        if compression == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "time compression must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            first_tick: None,
            last_tick: 0,
            compression,
        })
    }

    /// Observe a new timestamp and return the simulated delta in millis.
    ///
    /// The first call seeds the clock and returns zero. Later calls return
    /// `(timestamp - last) * compression`.
    pub fn set_current_timestamp(&mut self, timestamp: u64) -> Result<u64, ClockError> {
        if self.first_tick.is_none() {
            self.first_tick = Some(timestamp);
            self.last_tick = timestamp;
            return Ok(0);
        }

        let wall = timestamp
            .checked_sub(self.last_tick)
            .ok_or(ClockError::Regression {
                timestamp,
                last_tick: self.last_tick,
            })?;
        let delta = wall
            .checked_mul(self.compression)
            .ok_or(ClockError::DeltaOverflow)?;
        self.last_tick = timestamp;
        Ok(delta)
    }

    /// Simulated time elapsed since the clock was seeded.
    pub fn simulated_elapsed(&self) -> Duration {
        let wall = self
            .first_tick
            .map_or(0, |first| self.last_tick.saturating_sub(first));
        Duration::from_millis(wall.saturating_mul(self.compression))
    }

    /// Whether the clock has observed a timestamp yet.
    pub const fn is_seeded(&self) -> bool {
        self.first_tick.is_some()
    }

    /// Last accepted timestamp in unix millis.
    pub const fn last_tick(&self) -> u64 {
        self.last_tick
    }

    /// Configured compression factor.
    pub const fn compression(&self) -> u64 {
        self.compression
    }
}
