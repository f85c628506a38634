//! The monotonic millisecond counter that every deadline is measured against.
//!
//! u64 milliseconds won't roll over, so deadlines can be compared directly.

#[cfg(feature = "std")]
use std::time::Instant;

pub trait MonotonicMillis {
    fn now_ms(&self) -> u64;
}

/// milliseconds since this was created
#[cfg(feature = "std")]
pub struct StdMillis {
    start: Instant,
}

#[cfg(feature = "std")]
impl Default for StdMillis {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl StdMillis {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl MonotonicMillis for StdMillis {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// milliseconds since boot. needs an embassy time driver
#[cfg(feature = "embassy")]
pub struct EmbassyMillis;

#[cfg(feature = "embassy")]
impl MonotonicMillis for EmbassyMillis {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}

impl<T: MonotonicMillis + ?Sized> MonotonicMillis for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
