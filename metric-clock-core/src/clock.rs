//! Real time and metric time, each ticking on its own deadline.
//!
//! Neither clock is ever derived from the other while running. They are only lined up again when the GPS resyncs them.
use crate::logging::trace;

pub const SECONDS_PER_DAY: u32 = 86_400;
/// 1 metric unit is 0.864 real seconds
pub const UNITS_PER_DAY: u32 = 100_000;

pub const REAL_TICK_MS: u64 = 1_000;
pub const METRIC_TICK_MS: u64 = 864;

/// where the first metric tick after a sync lands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MetricPhase {
    /// a full 864ms after the sync. the fractional unit that was truncated during conversion is lost until the next sync
    #[default]
    Fixed,
    /// on the real unit boundary. the first period is shortened by the truncated fraction
    Aligned,
}

/// A counter that goes up by one every `PERIOD_MS` and wraps at `WRAP`.
///
/// Missed deadlines are caught up one tick per call. The deadline moves by a fixed period, so a late loop doesn't add drift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticker<const WRAP: u32, const PERIOD_MS: u64> {
    value: u32,
    next_tick_ms: u64,
}

/// seconds since local midnight
pub type RealClock = Ticker<SECONDS_PER_DAY, REAL_TICK_MS>;

/// metric units since local midnight
pub type MetricClock = Ticker<UNITS_PER_DAY, METRIC_TICK_MS>;

impl<const WRAP: u32, const PERIOD_MS: u64> Default for Ticker<WRAP, PERIOD_MS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WRAP: u32, const PERIOD_MS: u64> Ticker<WRAP, PERIOD_MS> {
    pub const fn new() -> Self {
        Self {
            value: 0,
            next_tick_ms: PERIOD_MS,
        }
    }

    pub const fn value(&self) -> u32 {
        self.value
    }

    pub const fn next_tick_ms(&self) -> u64 {
        self.next_tick_ms
    }

    /// jump to `value` and schedule the next tick `first_tick_in_ms` from `now_ms`
    pub fn set(&mut self, value: u32, now_ms: u64, first_tick_in_ms: u64) {
        self.value = value % WRAP;
        self.next_tick_ms = now_ms + first_tick_in_ms;
    }

    /// returns true if the value changed
    pub fn maybe_tick(&mut self, now_ms: u64) -> bool {
        if now_ms < self.next_tick_ms {
            return false;
        }

        self.next_tick_ms += PERIOD_MS;
        self.value = (self.value + 1) % WRAP;

        true
    }
}

/// floor(seconds * 1000 / 864), wrapped to a day
pub const fn seconds_to_units(seconds_of_day: u32) -> u32 {
    ((seconds_of_day as u64 * 1000 / METRIC_TICK_MS) % UNITS_PER_DAY as u64) as u32
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockState {
    pub real: RealClock,
    pub metric: MetricClock,
}

impl ClockState {
    pub const fn new() -> Self {
        Self {
            real: RealClock::new(),
            metric: MetricClock::new(),
        }
    }

    pub const fn seconds_of_day(&self) -> u32 {
        self.real.value()
    }

    pub const fn units_of_day(&self) -> u32 {
        self.metric.value()
    }

    pub fn maybe_tick_real(&mut self, now_ms: u64) -> bool {
        self.real.maybe_tick(now_ms)
    }

    pub fn maybe_tick_metric(&mut self, now_ms: u64) -> bool {
        self.metric.maybe_tick(now_ms)
    }

    /// re-anchor both clocks on a local time of day
    pub fn set_from_seconds_of_day(&mut self, seconds_of_day: u32, now_ms: u64, phase: MetricPhase) {
        let seconds_of_day = seconds_of_day % SECONDS_PER_DAY;

        self.real.set(seconds_of_day, now_ms, REAL_TICK_MS);

        let units_of_day = seconds_to_units(seconds_of_day);

        let first_metric_tick_ms = match phase {
            MetricPhase::Fixed => METRIC_TICK_MS,
            MetricPhase::Aligned => {
                METRIC_TICK_MS - (seconds_of_day as u64 * 1000) % METRIC_TICK_MS
            }
        };

        self.metric.set(units_of_day, now_ms, first_metric_tick_ms);

        trace!(
            "clocks set to {} seconds and {} units. next metric tick in {}ms",
            seconds_of_day, units_of_day, first_metric_tick_ms
        );
    }
}
