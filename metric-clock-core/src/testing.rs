//! fakes for the hardware so the clock can be tested on the host
use core::{cell::Cell, cell::RefCell, convert::Infallible};
use std::{collections::VecDeque, format, rc::Rc, string::String};

use chrono::{NaiveDate, NaiveDateTime};
use embedded_io::{ErrorType, Read, ReadReady};

use crate::gps::checksum;
use crate::millis::MonotonicMillis;

/// wrap a sentence body in `$`, a checksum, and CRLF
pub fn nmea(body: &str) -> String {
    let checksum = checksum(body.as_bytes());

    format!("${body}*{checksum:02X}\r\n")
}

/// an RMC sentence with a fix. `yy` is the two digit year
pub fn rmc(hour: u8, minute: u8, second: u8, day: u8, month: u8, yy: u8) -> String {
    nmea(&format!(
        "GPRMC,{hour:02}{minute:02}{second:02}.00,A,4807.038,N,01131.000,E,0.0,0.0,{day:02}{month:02}{yy:02},,,A"
    ))
}

pub fn datetime(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .expect("test dates are valid")
}

/// bytes pushed in from the test show up on the "uart"
#[derive(Clone, Default)]
pub struct FakeGps {
    bytes: Rc<RefCell<VecDeque<u8>>>,
}

impl FakeGps {
    pub fn push(&self, data: &str) {
        self.bytes.borrow_mut().extend(data.bytes());
    }

    pub fn pending(&self) -> usize {
        self.bytes.borrow().len()
    }
}

impl ErrorType for FakeGps {
    type Error = Infallible;
}

impl Read for FakeGps {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut bytes = self.bytes.borrow_mut();

        let n = buf.len().min(bytes.len());

        for (x, b) in buf.iter_mut().zip(bytes.drain(..n)) {
            *x = b;
        }

        Ok(n)
    }
}

impl ReadReady for FakeGps {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.bytes.borrow().is_empty())
    }
}

/// a uart that is always ready and always fails
pub struct BrokenGps;

impl ErrorType for BrokenGps {
    type Error = embedded_io::ErrorKind;
}

impl Read for BrokenGps {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        Err(embedded_io::ErrorKind::Other)
    }
}

impl ReadReady for BrokenGps {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

#[derive(Clone, Default)]
pub struct FakeMillis(Rc<Cell<u64>>);

impl FakeMillis {
    pub fn set(&self, now_ms: u64) {
        self.0.set(now_ms);
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl MonotonicMillis for FakeMillis {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}
