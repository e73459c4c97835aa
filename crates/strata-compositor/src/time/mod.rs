//! Time sources for animation stepping.
//!
//! The draw protocol samples two independent clocks per frame:
//! - a monotonic clock that drives animation progression
//! - a wall clock used to correlate animation events with the outside world
//!
//! Both are read through `TimeSource` so tests can drive them by hand.

mod source;

pub use source::{FrameTimestamps, ManualTimeSource, SystemTimeSource, TimeSource};
