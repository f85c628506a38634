//! UTC to local time with one pair of daylight saving rules.
//!
//! Rules follow the same shape as the Arduino Timezone library: each rule says "on the Nth weekday of a month, at this
//! local hour, switch to this offset". That is enough for the US and EU zones.
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

/// seconds since 1970-01-01T00:00:00 UTC. signed so that subtracting an offset near the epoch can't underflow
pub type UnixSeconds = i64;

const SECS_PER_MINUTE: i64 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Week {
    Last,
    First,
    Second,
    Third,
    Fourth,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dow {
    Sun = 1,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl From<Dow> for Weekday {
    fn from(dow: Dow) -> Self {
        match dow {
            Dow::Sun => Weekday::Sun,
            Dow::Mon => Weekday::Mon,
            Dow::Tue => Weekday::Tue,
            Dow::Wed => Weekday::Wed,
            Dow::Thu => Weekday::Thu,
            Dow::Fri => Weekday::Fri,
            Dow::Sat => Weekday::Sat,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Month {
    Jan = 1,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeChangeRule {
    /// "EDT", "EST", etc. only used for logging
    pub abbrev: &'static str,
    pub week: Week,
    pub dow: Dow,
    pub month: Month,
    /// local hour (0-23) when the change happens
    pub hour: u8,
    /// offset from UTC in minutes. EST = -300
    pub offset_minutes: i16,
}

impl TimeChangeRule {
    /// the local time at which this rule takes effect in the given year
    pub fn local_start(&self, year: i32) -> Option<NaiveDateTime> {
        let month = self.month as u32;
        let weekday = Weekday::from(self.dow);

        let date = match self.week {
            // some months only have 4 of a given weekday
            Week::Last => NaiveDate::from_weekday_of_month_opt(year, month, weekday, 5)
                .or_else(|| NaiveDate::from_weekday_of_month_opt(year, month, weekday, 4)),
            Week::First => NaiveDate::from_weekday_of_month_opt(year, month, weekday, 1),
            Week::Second => NaiveDate::from_weekday_of_month_opt(year, month, weekday, 2),
            Week::Third => NaiveDate::from_weekday_of_month_opt(year, month, weekday, 3),
            Week::Fourth => NaiveDate::from_weekday_of_month_opt(year, month, weekday, 4),
        }?;

        date.and_hms_opt(self.hour.into(), 0, 0)
    }

    pub const fn offset_seconds(&self) -> i64 {
        self.offset_minutes as i64 * SECS_PER_MINUTE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timezone {
    dst: TimeChangeRule,
    std: TimeChangeRule,
}

impl Timezone {
    pub const fn new(dst: TimeChangeRule, std: TimeChangeRule) -> Self {
        Self { dst, std }
    }

    /// a zone that never observes daylight saving time
    pub const fn fixed(rule: TimeChangeRule) -> Self {
        Self {
            dst: rule,
            std: rule,
        }
    }

    /// the rule in effect for the part of the year without daylight saving
    pub const fn standard(&self) -> &TimeChangeRule {
        &self.std
    }

    /// the (dst start, std start) instants in UTC for a year
    fn changes_utc(&self, year: i32) -> Option<(UnixSeconds, UnixSeconds)> {
        // the switch to dst happens at a local time that is still on standard time, and vice versa
        let dst_start =
            self.dst.local_start(year)?.and_utc().timestamp() - self.std.offset_seconds();
        let std_start =
            self.std.local_start(year)?.and_utc().timestamp() - self.dst.offset_seconds();

        Some((dst_start, std_start))
    }

    pub fn utc_is_dst(&self, utc: UnixSeconds) -> bool {
        if self.dst.offset_minutes == self.std.offset_minutes {
            return false;
        }

        let Some(year) = DateTime::from_timestamp(utc, 0).map(|dt| dt.year()) else {
            return false;
        };

        let Some((dst_start, std_start)) = self.changes_utc(year) else {
            return false;
        };

        if std_start > dst_start {
            // northern hemisphere
            utc >= dst_start && utc < std_start
        } else {
            // southern hemisphere. dst spans the new year
            !(utc >= std_start && utc < dst_start)
        }
    }

    /// the rule that is in effect at this instant
    pub fn rule_for(&self, utc: UnixSeconds) -> &TimeChangeRule {
        if self.utc_is_dst(utc) {
            &self.dst
        } else {
            &self.std
        }
    }

    pub fn to_local(&self, utc: UnixSeconds) -> UnixSeconds {
        utc + self.rule_for(utc).offset_seconds()
    }
}

/// Keeps UTC running off the monotonic millisecond counter between updates from an authoritative source.
///
/// This is what the GPS sets. `now_utc` is the stored time plus however long it has been since it was stored.
#[derive(Clone, Debug)]
pub struct WallClock {
    zone: Timezone,
    /// (utc, monotonic ms at which that whole second started)
    anchor: Option<(UnixSeconds, u64)>,
}

impl WallClock {
    pub const fn new(zone: Timezone) -> Self {
        Self { zone, anchor: None }
    }

    pub fn zone(&self) -> &Timezone {
        &self.zone
    }

    pub fn is_set(&self) -> bool {
        self.anchor.is_some()
    }

    /// `at_ms` is when `utc` was true. usually when the sentence carrying it finished arriving
    ///
    /// Any fraction of a second in `utc` moves the anchor back to the start of that second.
    pub fn set_authoritative_time(&mut self, utc: NaiveDateTime, at_ms: u64) {
        let subsec_ms = u64::from(utc.nanosecond() / 1_000_000);

        self.anchor = Some((utc.and_utc().timestamp(), at_ms.saturating_sub(subsec_ms)));
    }

    pub fn now_utc(&self, now_ms: u64) -> Option<UnixSeconds> {
        let (utc, at_ms) = self.anchor?;

        let elapsed_s = now_ms.saturating_sub(at_ms) / 1000;

        Some(utc + elapsed_s as i64)
    }

    pub fn to_local(&self, utc: UnixSeconds) -> UnixSeconds {
        self.zone.to_local(utc)
    }

    pub fn now_local(&self, now_ms: u64) -> Option<NaiveDateTime> {
        let local = self.to_local(self.now_utc(now_ms)?);

        DateTime::from_timestamp(local, 0).map(|dt| dt.naive_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::US_EASTERN;
    use crate::testing::datetime;

    const CET: TimeChangeRule = TimeChangeRule {
        abbrev: "CET",
        week: Week::Last,
        dow: Dow::Sun,
        month: Month::Oct,
        hour: 3,
        offset_minutes: 60,
    };

    const CEST: TimeChangeRule = TimeChangeRule {
        abbrev: "CEST",
        week: Week::Last,
        dow: Dow::Sun,
        month: Month::Mar,
        hour: 2,
        offset_minutes: 120,
    };

    fn local(zone: &Timezone, utc: UnixSeconds) -> NaiveDateTime {
        DateTime::from_timestamp(zone.to_local(utc), 0)
            .unwrap()
            .naive_utc()
    }

    #[test]
    fn test_local_start() {
        // second sunday in march 2023
        assert_eq!(
            US_EASTERN.dst.local_start(2023),
            Some(datetime(2023, 3, 12, 2, 0, 0))
        );
        // march 2023 only has 4 sundays
        assert_eq!(CEST.local_start(2023), Some(datetime(2023, 3, 26, 2, 0, 0)));
        // october 2023 has 5
        assert_eq!(CET.local_start(2023), Some(datetime(2023, 10, 29, 3, 0, 0)));
    }

    #[test]
    fn test_us_eastern_changes() {
        // 2023-03-12 07:00 UTC and 2023-11-05 06:00 UTC
        assert_eq!(
            US_EASTERN.changes_utc(2023),
            Some((1_678_604_400, 1_699_164_000))
        );
        // 2024-03-10 07:00 UTC and 2024-11-03 06:00 UTC
        assert_eq!(
            US_EASTERN.changes_utc(2024),
            Some((1_710_054_000, 1_730_613_600))
        );
    }

    #[test]
    fn test_us_eastern_to_local() {
        // 2023-07-04 16:00 UTC is noon EDT
        assert_eq!(
            local(&US_EASTERN, 1_688_486_400),
            datetime(2023, 7, 4, 12, 0, 0)
        );
        assert_eq!(US_EASTERN.rule_for(1_688_486_400).abbrev, "EDT");

        // 2023-01-15 17:30 UTC is 12:30 EST
        assert_eq!(
            local(&US_EASTERN, 1_673_803_800),
            datetime(2023, 1, 15, 12, 30, 0)
        );
        assert!(!US_EASTERN.utc_is_dst(1_673_803_800));
    }

    #[test]
    fn test_us_eastern_boundaries() {
        let dst_start = 1_678_604_400;

        assert!(!US_EASTERN.utc_is_dst(dst_start - 1));
        assert!(US_EASTERN.utc_is_dst(dst_start));

        // clocks jump from 01:59:59 to 03:00:00
        assert_eq!(
            local(&US_EASTERN, dst_start - 1),
            datetime(2023, 3, 12, 1, 59, 59)
        );
        assert_eq!(
            local(&US_EASTERN, dst_start),
            datetime(2023, 3, 12, 3, 0, 0)
        );

        let std_start = 1_699_164_000;

        assert!(US_EASTERN.utc_is_dst(std_start - 1));
        assert!(!US_EASTERN.utc_is_dst(std_start));

        // clocks fall back from 01:59:59 to 01:00:00
        assert_eq!(
            local(&US_EASTERN, std_start),
            datetime(2023, 11, 5, 1, 0, 0)
        );
    }

    #[test]
    fn test_last_week_rules() {
        let central_europe = Timezone::new(CEST, CET);

        // 2023-03-26 01:00 UTC and 2023-10-29 01:00 UTC
        assert_eq!(
            central_europe.changes_utc(2023),
            Some((1_679_792_400, 1_698_541_200))
        );
    }

    #[test]
    fn test_southern_hemisphere() {
        // same rules, but with the months swapped so dst spans the new year
        let southern = Timezone::new(
            TimeChangeRule {
                month: Month::Oct,
                ..CEST
            },
            TimeChangeRule {
                month: Month::Mar,
                hour: 3,
                ..CET
            },
        );

        // 2023-01-15 is summer
        assert!(southern.utc_is_dst(1_673_803_800));
        // 2023-07-04 is winter
        assert!(!southern.utc_is_dst(1_688_486_400));
    }

    #[test]
    fn test_fixed() {
        let utc = Timezone::fixed(TimeChangeRule {
            abbrev: "UTC",
            offset_minutes: 0,
            ..CET
        });

        assert!(!utc.utc_is_dst(1_688_486_400));
        assert_eq!(utc.to_local(1_688_486_400), 1_688_486_400);
        assert_eq!(utc.standard().abbrev, "UTC");
    }

    #[test]
    fn test_wall_clock() {
        let mut wall_clock = WallClock::new(US_EASTERN);

        assert!(!wall_clock.is_set());
        assert_eq!(wall_clock.now_utc(5_000), None);

        wall_clock.set_authoritative_time(datetime(2023, 7, 4, 16, 0, 0), 10_000);

        assert_eq!(wall_clock.now_utc(10_000), Some(1_688_486_400));
        assert_eq!(wall_clock.now_utc(10_999), Some(1_688_486_400));
        assert_eq!(wall_clock.now_utc(12_500), Some(1_688_486_402));

        assert_eq!(
            wall_clock.now_local(12_500),
            Some(datetime(2023, 7, 4, 12, 0, 2))
        );
    }

    #[test]
    fn test_wall_clock_fractional_seconds() {
        let mut wall_clock = WallClock::new(US_EASTERN);

        // 16:00:00.75 was true at 10_000, so 16:00:00 started at 9_250
        let utc = NaiveDate::from_ymd_opt(2023, 7, 4)
            .and_then(|date| date.and_hms_milli_opt(16, 0, 0, 750))
            .unwrap();

        wall_clock.set_authoritative_time(utc, 10_000);

        assert_eq!(wall_clock.now_utc(10_249), Some(1_688_486_400));
        assert_eq!(wall_clock.now_utc(10_250), Some(1_688_486_401));
    }
}
