//! Just enough NMEA 0183 to get the time and date out of a GPS module.
//!
//! Feed it one byte at a time as they come off the uart. Only RMC, GGA, and ZDA are decoded. Everything else is
//! checksummed and then ignored.
//!
//! Time is committed even when the receiver doesn't have a position fix yet. Modules with a backup battery know the time
//! long before they have a fix. Some modules will happily send 00:00:00 right after a cold start though, so callers
//! should not trust midnight until they've seen something else.
use chrono::{NaiveDate, NaiveDateTime};
use heapless::Vec;

use crate::errors::{ClockError, ClockResult};
use crate::logging::{debug, trace};

/// the longest sentence the standard allows, including the `$` and the line ending
pub const MAX_SENTENCE_BYTES: usize = 82;

/// what is left for everything between the `$` and the `\r\n`
const MAX_BODY_BYTES: usize = MAX_SENTENCE_BYTES - 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub centisecond: u8,
}

impl GpsTime {
    /// the midnight check only looks at hours and minutes. that's what a cold start looks like
    pub fn is_midnight(&self) -> bool {
        self.hour == 0 && self.minute == 0
    }

    /// whole seconds since UTC midnight
    pub fn seconds_of_day(&self) -> u32 {
        u32::from(self.hour) * 3600 + u32::from(self.minute) * 60 + u32::from(self.second)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsDate {
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

#[derive(Default)]
struct Decoded {
    time: Option<GpsTime>,
    date: Option<GpsDate>,
}

pub struct GpsParser {
    /// everything between the `$` and the line ending
    sentence: Vec<u8, MAX_BODY_BYTES>,
    in_sentence: bool,
    overflowed: bool,
    time: Option<GpsTime>,
    date: Option<GpsDate>,
    passed_sentences: u32,
    failed_sentences: u32,
}

impl Default for GpsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GpsParser {
    pub const fn new() -> Self {
        Self {
            sentence: Vec::new(),
            in_sentence: false,
            overflowed: false,
            time: None,
            date: None,
            passed_sentences: 0,
            failed_sentences: 0,
        }
    }

    /// returns true when this byte finished a sentence that carried a new time
    pub fn encode(&mut self, byte: u8) -> bool {
        match byte {
            b'$' => {
                self.sentence.clear();
                self.in_sentence = true;
                self.overflowed = false;
                false
            }
            b'\r' | b'\n' => {
                if !self.in_sentence {
                    // the other half of a CRLF
                    return false;
                }
                self.in_sentence = false;

                match self.finish_sentence() {
                    Ok(new_time) => new_time,
                    Err(err) => {
                        self.failed_sentences += 1;
                        debug!("dropping nmea sentence: {:?}", err);
                        false
                    }
                }
            }
            _ if !self.in_sentence => false,
            _ => {
                if self.sentence.push(byte).is_err() {
                    self.overflowed = true;
                }
                false
            }
        }
    }

    fn finish_sentence(&mut self) -> ClockResult<bool> {
        if self.overflowed {
            return Err(ClockError::SentenceTooLong(MAX_SENTENCE_BYTES));
        }

        let body_len = verify_checksum(&self.sentence)?;
        self.passed_sentences += 1;

        let decoded = decode(&self.sentence[..body_len])?;

        if let Some(date) = decoded.date {
            self.date = Some(date);
        }

        match decoded.time {
            Some(time) => {
                trace!("gps time {}:{}:{}", time.hour, time.minute, time.second);
                self.time = Some(time);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn time_is_valid(&self) -> bool {
        self.time.is_some()
    }

    pub fn date_is_valid(&self) -> bool {
        self.date.is_some()
    }

    pub fn time(&self) -> Option<GpsTime> {
        self.time
    }

    pub fn date(&self) -> Option<GpsDate> {
        self.date
    }

    /// the full UTC timestamp, if both halves have been seen and make a real date
    pub fn utc(&self) -> Option<NaiveDateTime> {
        let time = self.time?;
        let date = self.date?;

        let date = NaiveDate::from_ymd_opt(date.year.into(), date.month.into(), date.day.into())?;

        date.and_hms_milli_opt(
            time.hour.into(),
            time.minute.into(),
            time.second.into(),
            u32::from(time.centisecond) * 10,
        )
    }

    /// 0 if the time isn't valid
    pub fn hour(&self) -> u8 {
        self.time.unwrap_or_default().hour
    }

    pub fn minute(&self) -> u8 {
        self.time.unwrap_or_default().minute
    }

    pub fn second(&self) -> u8 {
        self.time.unwrap_or_default().second
    }

    /// 0 if the date isn't valid
    pub fn date_day(&self) -> u8 {
        self.date.unwrap_or_default().day
    }

    pub fn date_month(&self) -> u8 {
        self.date.unwrap_or_default().month
    }

    pub fn date_year(&self) -> u16 {
        self.date.unwrap_or_default().year
    }

    pub fn passed_sentences(&self) -> u32 {
        self.passed_sentences
    }

    pub fn failed_sentences(&self) -> u32 {
        self.failed_sentences
    }
}

/// xor of every byte between the `$` and the `*`
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// returns the length of the sentence body (everything before the `*`)
fn verify_checksum(sentence: &[u8]) -> ClockResult<usize> {
    let star = sentence
        .iter()
        .position(|&b| b == b'*')
        .ok_or(ClockError::MissingChecksum)?;

    let expected = match &sentence[star + 1..] {
        [high, low] => (hex_digit(*high)? << 4) | hex_digit(*low)?,
        _ => return Err(ClockError::MalformedField("checksum")),
    };

    let calculated = checksum(&sentence[..star]);

    if expected != calculated {
        return Err(ClockError::ChecksumMismatch {
            expected,
            calculated,
        });
    }

    Ok(star)
}

fn hex_digit(b: u8) -> ClockResult<u8> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        _ => Err(ClockError::MalformedField("checksum")),
    }
}

fn decode(body: &[u8]) -> ClockResult<Decoded> {
    let mut fields = body.split(|&b| b == b',');

    // talker + sentence type. "GPRMC", "GNRMC", etc.
    let address = fields.next().unwrap_or_default();

    if address.len() < 3 {
        return Ok(Decoded::default());
    }

    let mut decoded = Decoded::default();

    match &address[address.len() - 3..] {
        b"RMC" => {
            decoded.time = parse_time(fields.next().unwrap_or_default())?;
            // skip status, lat, N/S, lon, E/W, speed, and course
            decoded.date = parse_ddmmyy(fields.nth(7).unwrap_or_default())?;
        }
        b"GGA" => {
            decoded.time = parse_time(fields.next().unwrap_or_default())?;
        }
        b"ZDA" => {
            decoded.time = parse_time(fields.next().unwrap_or_default())?;

            let day = fields.next().unwrap_or_default();
            let month = fields.next().unwrap_or_default();
            let year = fields.next().unwrap_or_default();

            if !(day.is_empty() || month.is_empty() || year.is_empty()) {
                let year = four_digits(year).ok_or(ClockError::MalformedField("year"))?;

                decoded.date = Some(check_date(two_digits(day), two_digits(month), Some(year))?);
            }
        }
        _ => {}
    }

    Ok(decoded)
}

/// `hhmmss` or `hhmmss.ss`. empty means the receiver doesn't know yet
fn parse_time(field: &[u8]) -> ClockResult<Option<GpsTime>> {
    if field.is_empty() {
        return Ok(None);
    }

    if field.len() < 6 {
        return Err(ClockError::MalformedField("time"));
    }

    let (hour, minute, second) = match (
        two_digits(&field[0..2]),
        two_digits(&field[2..4]),
        two_digits(&field[4..6]),
    ) {
        (Some(h), Some(m), Some(s)) if h < 24 && m < 60 && s < 60 => (h, m, s),
        _ => return Err(ClockError::MalformedField("time")),
    };

    // hundredths are optional and sometimes only have one digit
    let centisecond = match field.get(6..) {
        Some([b'.', fraction @ ..]) => fraction
            .iter()
            .take(2)
            .chain(core::iter::repeat(&b'0'))
            .take(2)
            .try_fold(0u8, |acc, &b| b.is_ascii_digit().then(|| acc * 10 + (b - b'0')))
            .ok_or(ClockError::MalformedField("time"))?,
        _ => 0,
    };

    Ok(Some(GpsTime {
        hour,
        minute,
        second,
        centisecond,
    }))
}

/// the RMC date. two digit years are assumed to be 20xx
fn parse_ddmmyy(field: &[u8]) -> ClockResult<Option<GpsDate>> {
    if field.is_empty() {
        return Ok(None);
    }

    if field.len() != 6 {
        return Err(ClockError::MalformedField("date"));
    }

    let year = two_digits(&field[4..6]).map(|yy| 2000 + yy as u16);

    check_date(two_digits(&field[0..2]), two_digits(&field[2..4]), year).map(Some)
}

fn check_date(day: Option<u8>, month: Option<u8>, year: Option<u16>) -> ClockResult<GpsDate> {
    match (day, month, year) {
        (Some(day), Some(month), Some(year))
            if (1..=31).contains(&day) && (1..=12).contains(&month) =>
        {
            Ok(GpsDate { day, month, year })
        }
        _ => Err(ClockError::MalformedField("date")),
    }
}

fn two_digits(b: &[u8]) -> Option<u8> {
    match b {
        [tens, ones] if tens.is_ascii_digit() && ones.is_ascii_digit() => {
            Some((tens - b'0') * 10 + (ones - b'0'))
        }
        _ => None,
    }
}

fn four_digits(b: &[u8]) -> Option<u16> {
    match b {
        [a, b, c, d] => {
            let high = two_digits(&[*a, *b])? as u16;
            let low = two_digits(&[*c, *d])? as u16;
            Some(high * 100 + low)
        }
        _ => None,
    }
}
