//! Time source abstraction for token issuing and expiry checks.
//!
//! Token timestamps are whole seconds since the Unix epoch. Production code
//! reads the system clock; tests use [`ManualTimeSource`] and move time
//! forward explicitly so expiry can be checked deterministically.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over the wall clock.
pub trait TimeSource: Send + Sync {
    /// Get the current time in seconds since the Unix epoch.
    fn now_secs(&self) -> i64;
}

/// Real time source using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> i64 {
        // A clock set before 1970 reads as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| {
                i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
            })
    }
}

/// A time source that only moves when told to.
///
/// Uses an atomic so it can be shared with a `TokenManager` behind an `Arc`
/// while the test keeps its own handle to advance the clock.
///
/// # Example
///
/// ```
/// use intranet_server::time::{ManualTimeSource, TimeSource};
///
/// let time = ManualTimeSource::new(1000);
/// time.advance(3600);
/// assert_eq!(time.now_secs(), 4600);
/// ```
#[derive(Debug)]
pub struct ManualTimeSource {
    current_secs: AtomicI64,
}

impl ManualTimeSource {
    /// Create a time source frozen at `initial_secs`.
    #[must_use]
    pub const fn new(initial_secs: i64) -> Self {
        Self {
            current_secs: AtomicI64::new(initial_secs),
        }
    }

    /// Advance time by `secs`, saturating at `i64::MAX`.
    pub fn advance(&self, secs: i64) {
        let current = self.current_secs.load(Ordering::SeqCst);
        self.current_secs
            .store(current.saturating_add(secs), Ordering::SeqCst);
    }

    /// Set the current time. May move time backwards.
    pub fn set(&self, secs: i64) {
        self.current_secs.store(secs, Ordering::SeqCst);
    }
}

impl Default for ManualTimeSource {
    /// Starts at `1_700_000_000` (November 2023).
    fn default() -> Self {
        Self::new(1_700_000_000)
    }
}

impl TimeSource for ManualTimeSource {
    fn now_secs(&self) -> i64 {
        self.current_secs.load(Ordering::SeqCst)
    }
}
