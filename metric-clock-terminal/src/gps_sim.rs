use std::{
    collections::VecDeque,
    convert::Infallible,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use chrono::{DateTime, Datelike, Timelike};
use embedded_io::{ErrorType, Read, ReadReady};
use log::trace;
use metric_clock_core::{gps::checksum, timezone::UnixSeconds};

/// Pretends to be a GPS module on a uart. One RMC sentence per second, starting from the host's clock.
///
/// The first few sentences are the bogus midnight that some modules send after a cold start.
pub struct SimulatedGps {
    pending: VecDeque<u8>,
    started: Instant,
    utc_at_start: UnixSeconds,
    sentences_sent: u64,
    cold_start_sentences: u64,
}

impl SimulatedGps {
    pub fn new(now: SystemTime, cold_start_sentences: u64) -> anyhow::Result<Self> {
        let utc_at_start = now.duration_since(UNIX_EPOCH)?.as_secs() as UnixSeconds;

        Ok(Self {
            pending: VecDeque::new(),
            started: Instant::now(),
            utc_at_start,
            sentences_sent: 0,
            cold_start_sentences,
        })
    }

    fn sentence(&self, n: u64) -> String {
        let now = DateTime::from_timestamp(self.utc_at_start + n as UnixSeconds, 0);

        let body = match now {
            Some(dt) if n >= self.cold_start_sentences => format!(
                "GPRMC,{:02}{:02}{:02}.00,A,3723.465,N,12202.269,W,0.0,0.0,{:02}{:02}{:02},,,A",
                dt.hour(),
                dt.minute(),
                dt.second(),
                dt.day(),
                dt.month(),
                dt.year() % 100
            ),
            _ => "GPRMC,000000.00,V,,,,,,,060180,,,N".to_string(),
        };

        format!("${}*{:02X}\r\n", body, checksum(body.as_bytes()))
    }

    /// queue up every sentence that "should" have been sent by now
    fn refill(&mut self) {
        let elapsed_s = self.started.elapsed().as_secs();

        while self.sentences_sent <= elapsed_s {
            let sentence = self.sentence(self.sentences_sent);

            trace!("gps sim: {}", sentence.trim_end());

            self.pending.extend(sentence.bytes());
            self.sentences_sent += 1;
        }
    }
}

impl ErrorType for SimulatedGps {
    type Error = Infallible;
}

impl Read for SimulatedGps {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.pending.len());

        for (x, b) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *x = b;
        }

        Ok(n)
    }
}

impl ReadReady for SimulatedGps {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.refill();

        Ok(!self.pending.is_empty())
    }
}
