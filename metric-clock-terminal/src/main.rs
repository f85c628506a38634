//! Runs the clock on the host with a simulated GPS and prints the LCD to the terminal.
mod gps_sim;

use std::{thread::sleep, time::Duration, time::SystemTime};

use log::*;
use metric_clock_core::{
    config::Config,
    controller::ClockController,
    display::{Lcd1602Buffer, LCD_WIDTH},
    millis::StdMillis,
};

use crate::gps_sim::SimulatedGps;

/// how many bogus midnight sentences the simulated gps sends before the real time
const COLD_START_SENTENCES: u64 = 3;

fn draw(lcd: &Lcd1602Buffer) {
    let border = "-".repeat(LCD_WIDTH as usize);

    // clear the screen and go home
    print!("\x1b[2J\x1b[H");
    println!("+{border}+");
    for row in lcd.rows() {
        println!("|{row}|");
    }
    println!("+{border}+");
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    info!("hello, world!");

    let config = Config::default();

    let gps = SimulatedGps::new(SystemTime::now(), COLD_START_SENTENCES)?;

    let mut clock = ClockController::new(gps, Lcd1602Buffer::new(), StdMillis::new(), &config);

    clock.begin_acquisition();
    draw(clock.display());

    // the firmware spins here. no need to melt the host's cpu
    while !clock.poll_acquisition() {
        sleep(Duration::from_millis(10));
    }

    clock.finish_acquisition();
    draw(clock.display());

    debug!("entering the control loop");

    loop {
        if clock.step() {
            draw(clock.display());
        }

        sleep(Duration::from_millis(1));
    }
}
