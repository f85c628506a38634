use thiserror::Error;

/// none of these are fatal. the control loop logs them and keeps the clocks free-running
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    #[error("gps read error: {0:?}")]
    GpsRead(embedded_io::ErrorKind),
    #[error("nmea sentence longer than {0} bytes")]
    SentenceTooLong(usize),
    #[error("nmea sentence has no checksum")]
    MissingChecksum,
    #[error("nmea checksum mismatch: expected {expected:#04x}, calculated {calculated:#04x}")]
    ChecksumMismatch { expected: u8, calculated: u8 },
    #[error("malformed nmea field: {0}")]
    MalformedField(&'static str),
}

pub type ClockResult<T> = Result<T, ClockError>;

impl ClockError {
    pub fn gps_read<E: embedded_io::Error>(err: E) -> Self {
        Self::GpsRead(err.kind())
    }
}
