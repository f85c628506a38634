//! The whole clock: startup acquisition and then the control loop.
//!
//! Each pass of the loop: drain the gps and maybe resync, tick real time, tick metric time, redraw if anything changed.
//! Nothing in the loop waits on anything.
use embedded_io::{Read, ReadReady};

use crate::clock::ClockState;
use crate::config::Config;
use crate::display::{CharDisplay, draw_acquiring, draw_layout, render};
use crate::logging::{info, trace};
use crate::loop_stats::LoopStats;
use crate::millis::MonotonicMillis;
use crate::sync::{SyncEngine, SyncState};

pub struct ClockController<G, D, M> {
    clocks: ClockState,
    sync: SyncEngine<G>,
    display: D,
    millis: M,
    loop_stats: LoopStats,
}

impl<G, D, M> ClockController<G, D, M>
where
    G: Read + ReadReady,
    D: CharDisplay,
    M: MonotonicMillis,
{
    pub fn new(gps: G, display: D, millis: M, config: &Config) -> Self {
        let loop_stats = LoopStats::new(millis.now_ms());

        Self {
            clocks: ClockState::new(),
            sync: SyncEngine::new(gps, config),
            display,
            millis,
            loop_stats,
        }
    }

    pub fn clocks(&self) -> &ClockState {
        &self.clocks
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn sync_engine(&self) -> &SyncEngine<G> {
        &self.sync
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    /// put up the "please wait" screen
    pub fn begin_acquisition(&mut self) {
        info!("acquiring gps time");

        draw_acquiring(&mut self.display);
    }

    /// returns true once the gps has a time we believe
    pub fn poll_acquisition(&mut self) -> bool {
        let now_ms = self.millis.now_ms();

        self.sync.poll_acquisition(now_ms)
    }

    /// draw the static layout and set the clocks for the first time
    pub fn finish_acquisition(&mut self) {
        draw_layout(&mut self.display);

        let now_ms = self.millis.now_ms();

        self.sync.initial_sync(&mut self.clocks, now_ms);

        render(&mut self.display, &self.clocks);

        self.loop_stats = LoopStats::new(now_ms);
    }

    /// Blocks until the gps gives us a usable time. There is no timeout. Without a gps this never returns.
    pub fn start(&mut self) {
        self.begin_acquisition();

        while !self.poll_acquisition() {
            core::hint::spin_loop();
        }

        self.finish_acquisition();
    }

    /// One pass of the control loop. Returns true if the display was redrawn.
    pub fn step(&mut self) -> bool {
        let now_ms = self.millis.now_ms();

        let synced = self.sync.poll(&mut self.clocks, now_ms);

        // these two don't depend on each other
        let real_ticked = self.clocks.maybe_tick_real(now_ms);
        let metric_ticked = self.clocks.maybe_tick_metric(now_ms);

        let changed = synced || real_ticked || metric_ticked;

        if changed {
            trace!(
                "{} seconds, {} units",
                self.clocks.seconds_of_day(),
                self.clocks.units_of_day()
            );

            render(&mut self.display, &self.clocks);
        }

        self.loop_stats.tick(now_ms);

        changed
    }

    pub fn run(&mut self) -> ! {
        self.start();

        loop {
            self.step();
        }
    }
}
