//! Block and event timestamps.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock instant in milliseconds since the unix epoch.
///
/// Serialized as a bare `u64`, matching the wire shape of block and
/// event timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockTimestamp(u64);

impl BlockTimestamp {
    /// Build a timestamp from unix milliseconds.
    pub const fn from_unix_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Unix milliseconds.
    pub const fn unix_millis(self) -> u64 {
        self.0
    }

    /// Convert a [`SystemTime`]. Instants before the epoch clamp to zero.
    pub fn from_system_time(time: SystemTime) -> Self {
        let millis = time
            .duration_since(UNIX_EPOCH)
            .map_or(0, |since| u64::try_from(since.as_millis()).unwrap_or(u64::MAX));
        Self(millis)
    }

    /// Add a duration, saturating at `u64::MAX` milliseconds.
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Time from `earlier` to `self`, or zero if `earlier` is later.
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// The instant as a UTC date-time, for logging.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }
}

impl fmt::Display for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(at) => write!(f, "{}", at.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_millis_round_trip() {
        assert_eq!(BlockTimestamp::from_unix_millis(1).unix_millis(), 1);
    }

    #[test]
    fn saturating_arithmetic() {
        let ts = BlockTimestamp::from_unix_millis(1_000);
        assert_eq!(ts.saturating_add(Duration::from_millis(50)).unix_millis(), 1_050);
        assert_eq!(
            BlockTimestamp::from_unix_millis(u64::MAX)
                .saturating_add(Duration::from_secs(1))
                .unix_millis(),
            u64::MAX
        );
        let later = BlockTimestamp::from_unix_millis(3_000);
        assert_eq!(later.saturating_duration_since(ts), Duration::from_secs(2));
        assert_eq!(ts.saturating_duration_since(later), Duration::ZERO);
    }

    #[test]
    fn system_time_before_epoch_clamps() {
        let before = UNIX_EPOCH.checked_sub(Duration::from_secs(10));
        if let Some(before) = before {
            assert_eq!(BlockTimestamp::from_system_time(before).unix_millis(), 0);
        }
    }

    #[test]
    fn display_formats_utc() {
        let ts = BlockTimestamp::from_unix_millis(1_616_087_057_000);
        assert_eq!(ts.to_string(), "2021-03-18T17:04:17.000Z");
    }
}
