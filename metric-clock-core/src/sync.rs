//! Re-anchors both clocks on GPS time.
//!
//! At startup we wait (forever if we have to) for a fix we believe. After that the GPS is only consulted every so
//! often. Between syncs the clocks free-run on the millisecond counter.
use chrono::Timelike;
use embedded_io::{Read, ReadReady};

use crate::clock::{ClockState, MetricPhase, SECONDS_PER_DAY};
use crate::config::Config;
use crate::errors::{ClockError, ClockResult};
use crate::gps::GpsParser;
use crate::logging::{debug, info, warn};
use crate::timezone::WallClock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncState {
    /// startup only. nothing is displayed until we leave this
    Acquiring,
    Synced,
}

pub struct SyncEngine<G> {
    gps: G,
    parser: GpsParser,
    wall_clock: WallClock,
    state: SyncState,
    /// when the parser last finished a sentence that carried a time
    last_fix_ms: Option<u64>,
    last_sync_ms: u64,
    resync_unit_multiple: u32,
    resync_min_interval_ms: u64,
    metric_phase: MetricPhase,
}

impl<G: Read + ReadReady> SyncEngine<G> {
    pub fn new(gps: G, config: &Config) -> Self {
        Self {
            gps,
            parser: GpsParser::new(),
            wall_clock: WallClock::new(config.timezone),
            state: SyncState::Acquiring,
            last_fix_ms: None,
            last_sync_ms: 0,
            resync_unit_multiple: config.resync_unit_multiple,
            resync_min_interval_ms: config.resync_min_interval_ms,
            metric_phase: config.metric_phase,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn parser(&self) -> &GpsParser {
        &self.parser
    }

    pub fn wall_clock(&self) -> &WallClock {
        &self.wall_clock
    }

    pub fn last_sync_ms(&self) -> u64 {
        self.last_sync_ms
    }

    /// move everything the uart already has into the parser. never waits for more
    pub fn drain(&mut self, now_ms: u64) -> ClockResult<usize> {
        let mut buf = [0u8; 32];
        let mut total = 0;

        while self.gps.read_ready().map_err(ClockError::gps_read)? {
            let n = self.gps.read(&mut buf).map_err(ClockError::gps_read)?;

            if n == 0 {
                break;
            }

            for &b in &buf[..n] {
                if self.parser.encode(b) {
                    self.last_fix_ms = Some(now_ms);
                }
            }

            total += n;
        }

        Ok(total)
    }

    /// a broken uart is the same as no gps. the clocks keep running either way
    fn drain_or_warn(&mut self, now_ms: u64) {
        if let Err(err) = self.drain(now_ms) {
            warn!("failed reading gps: {:?}", err);
        }
    }

    /// One step of the startup wait. Returns true once a usable time has been seen.
    ///
    /// Right after a cold start some receivers report a valid time of midnight, so midnight isn't usable. A date is not
    /// needed. Plenty of receivers only send GGA.
    pub fn poll_acquisition(&mut self, now_ms: u64) -> bool {
        if self.state == SyncState::Synced {
            return true;
        }

        self.drain_or_warn(now_ms);

        match self.parser.time() {
            Some(time) if !time.is_midnight() => {
                info!(
                    "gps time acquired after {}ms: {}:{}:{} UTC",
                    now_ms, time.hour, time.minute, time.second
                );
                self.state = SyncState::Synced;
                true
            }
            _ => false,
        }
    }

    /// Only sync on exact multiples of 125 metric units (108 real seconds) and not too often.
    pub fn resync_due(&self, units_of_day: u32, now_ms: u64) -> bool {
        units_of_day % self.resync_unit_multiple == 0
            && now_ms.saturating_sub(self.last_sync_ms) >= self.resync_min_interval_ms
    }

    /// Local seconds since midnight according to the gps, carried forward to `now_ms`.
    ///
    /// Without a date there is no way to know if daylight saving applies, so standard time is assumed until one arrives.
    /// Once a date has been seen the parser keeps it.
    fn local_seconds_of_day(&mut self, now_ms: u64) -> Option<u32> {
        // the time in the sentence was true when the sentence arrived, not now
        let fix_ms = self.last_fix_ms.unwrap_or(now_ms);

        if let Some(utc) = self.parser.utc() {
            self.wall_clock.set_authoritative_time(utc, fix_ms);

            let local = self.wall_clock.now_local(now_ms)?;

            return Some(local.num_seconds_from_midnight());
        }

        let time = self.parser.time()?;

        debug!("gps has no date yet. assuming standard time");

        let second_started_ms = fix_ms.saturating_sub(u64::from(time.centisecond) * 10);
        let elapsed_s = now_ms.saturating_sub(second_started_ms) / 1000;

        let local = i64::from(time.seconds_of_day())
            + elapsed_s as i64
            + self.wall_clock.zone().standard().offset_seconds();

        Some(local.rem_euclid(i64::from(SECONDS_PER_DAY)) as u32)
    }

    /// Set both clocks from the latest GPS time. Returns false (and changes nothing) if the GPS hasn't given us a time.
    pub fn sync(&mut self, clocks: &mut ClockState, now_ms: u64) -> bool {
        let Some(seconds_of_day) = self.local_seconds_of_day(now_ms) else {
            debug!("no valid gps time. skipping sync");
            return false;
        };

        clocks.set_from_seconds_of_day(seconds_of_day, now_ms, self.metric_phase);

        info!(
            "synced to {} local seconds. {} metric units",
            seconds_of_day,
            clocks.units_of_day()
        );

        true
    }

    /// the sync at the end of acquisition
    pub fn initial_sync(&mut self, clocks: &mut ClockState, now_ms: u64) -> bool {
        self.last_sync_ms = now_ms;
        self.sync(clocks, now_ms)
    }

    /// Steady state. Drains the gps and resyncs if it is time to. Returns true if the clocks were changed.
    pub fn poll(&mut self, clocks: &mut ClockState, now_ms: u64) -> bool {
        self.drain_or_warn(now_ms);

        if !self.resync_due(clocks.units_of_day(), now_ms) {
            return false;
        }

        // even if the sync fails we wait for the next window
        self.last_sync_ms = now_ms;

        self.sync(clocks, now_ms)
    }
}
