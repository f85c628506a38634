#![no_std]

#[cfg(feature = "std")]
extern crate std;

pub mod clock;
pub mod config;
pub mod controller;
pub mod display;
pub mod errors;
pub mod gps;
pub mod logging;
pub mod loop_stats;
pub mod millis;
pub mod sync;
pub mod timezone;

#[cfg(test)]
pub(crate) mod testing;
