//! The two notions of "now" an event is handled at.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Monotonic time for debounce deadlines plus wall-clock time for queue
/// timestamps and backoff.
///
/// Frontends normally pass [`Clock::now`]; a virtual clock advanced with
/// [`Clock::advanced`] drives both timers deterministically.
///
/// ```
/// use std::time::Duration;
/// use todo_core::app::Clock;
///
/// let start = Clock::now();
/// let later = start.advanced(Duration::from_millis(500));
/// assert_eq!(later.instant - start.instant, Duration::from_millis(500));
/// assert_eq!((later.wall - start.wall).num_milliseconds(), 500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub instant: Instant,
    pub wall: DateTime<Utc>,
}

impl Clock {
    #[must_use]
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Utc::now(),
        }
    }

    /// Both clocks moved forward by `by`.
    #[must_use]
    pub fn advanced(self, by: Duration) -> Self {
        let wall = chrono::Duration::from_std(by)
            .ok()
            .and_then(|step| self.wall.checked_add_signed(step))
            .unwrap_or(self.wall);
        Self {
            instant: self.instant + by,
            wall,
        }
    }
}
