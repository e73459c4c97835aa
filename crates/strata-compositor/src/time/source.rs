use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

/// Pair of timestamps sampled together at the start of a draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameTimestamps {
    /// Monotonic timestamp used for animation math.
    pub monotonic: Instant,

    /// Wall-clock timestamp used for event correlation.
    pub wall: SystemTime,
}

/// Provider of monotonic and wall-clock time.
pub trait TimeSource {
    fn monotonic_now(&self) -> Instant;

    fn wall_now(&self) -> SystemTime;

    /// Samples both clocks.
    fn now(&self) -> FrameTimestamps {
        FrameTimestamps {
            monotonic: self.monotonic_now(),
            wall: self.wall_now(),
        }
    }
}

/// Reads the operating system clocks.
#[derive(Debug, Copy, Clone, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn monotonic_now(&self) -> Instant {
        Instant::now()
    }

    fn wall_now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually advanced clock.
///
/// Clones share the same offset, so a test can keep one handle while the proxy
/// owns another.
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    monotonic_base: Instant,
    wall_base: SystemTime,
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            monotonic_base: Instant::now(),
            wall_base: SystemTime::UNIX_EPOCH,
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Moves both clocks forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += by;
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn monotonic_now(&self) -> Instant {
        self.monotonic_base + self.elapsed()
    }

    fn wall_now(&self) -> SystemTime {
        self.wall_base + self.elapsed()
    }
}
