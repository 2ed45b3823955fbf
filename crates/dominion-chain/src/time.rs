//! Wall-clock access.
//!
//! Components never read the system clock directly; they are handed a
//! [`TimeSource`]. Tests swap in a [`ManualTimeSource`].

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use dominion_types::BlockTimestamp;

/// Source of the current wall-clock time.
pub trait TimeSource: Send + Sync + Debug {
    /// Current time.
    fn now(&self) -> BlockTimestamp;
}

/// The operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> BlockTimestamp {
        BlockTimestamp::from_system_time(SystemTime::now())
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    millis: AtomicU64,
}

impl ManualTimeSource {
    /// A clock stopped at `start`.
    pub const fn new(start: BlockTimestamp) -> Self {
        Self {
            millis: AtomicU64::new(start.unix_millis()),
        }
    }

    /// Jump to `at`.
    pub fn set(&self, at: BlockTimestamp) {
        self.millis.store(at.unix_millis(), Ordering::Release);
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        let step = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        let _ = self
            .millis
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_add(step))
            });
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> BlockTimestamp {
        BlockTimestamp::from_unix_millis(self.millis.load(Ordering::Acquire))
    }
}
