use crate::clock::MetricPhase;
use crate::timezone::{Dow, Month, TimeChangeRule, Timezone, Week};

/// US Eastern. EDT starts the second sunday in march, EST starts the first sunday in november
pub const US_EASTERN: Timezone = Timezone::new(
    TimeChangeRule {
        abbrev: "EDT",
        week: Week::Second,
        dow: Dow::Sun,
        month: Month::Mar,
        hour: 2,
        offset_minutes: -240,
    },
    TimeChangeRule {
        abbrev: "EST",
        week: Week::First,
        dow: Dow::Sun,
        month: Month::Nov,
        hour: 2,
        offset_minutes: -300,
    },
);

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// must match the GPS module. most of them ship at 9600
    pub gps_baud_rate: u32,
    /// PCF8574 backpacks are usually 0x27 or 0x3F
    pub lcd_i2c_address: u8,
    /// 125 metric units is exactly 108 real seconds. only resync on those so the conversion has no fractional second
    pub resync_unit_multiple: u32,
    pub resync_min_interval_ms: u64,
    pub metric_phase: MetricPhase,
    pub timezone: Timezone,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            gps_baud_rate: 9600,
            lcd_i2c_address: 0x27,
            resync_unit_multiple: 125,
            resync_min_interval_ms: 5_000,
            metric_phase: MetricPhase::Fixed,
            timezone: US_EASTERN,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
