//! Fixed layout for a 16x2 character LCD.
//!
//! ```text
//! Metric:  D:DD:DD
//! Actual: HH:MM:SS
//! ```
//!
//! The labels and delimiters are drawn once. After that only the digit cells are rewritten.
use core::fmt;

use crate::clock::ClockState;

pub const LCD_WIDTH: u8 = 16;
pub const LCD_HEIGHT: u8 = 2;

/// position of digits on the display from most to least significant
pub const DIGITS: [u8; 6] = [8, 9, 11, 12, 14, 15];
pub const DELIMITER: char = ':';
pub const DELIMS: [u8; 2] = [10, 13];

pub const METRIC_ROW: u8 = 0;
pub const REAL_ROW: u8 = 1;

/// Something that can put characters in cells. Writes are fire and forget.
///
/// The cursor advances one column after every character, like an HD44780.
pub trait CharDisplay {
    fn clear(&mut self);

    fn set_cursor(&mut self, col: u8, row: u8);

    fn write_char(&mut self, c: char);

    fn write_str(&mut self, s: &str) {
        for c in s.chars() {
            self.write_char(c);
        }
    }
}

impl<T: CharDisplay + ?Sized> CharDisplay for &mut T {
    fn clear(&mut self) {
        (**self).clear()
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        (**self).set_cursor(col, row)
    }

    fn write_char(&mut self, c: char) {
        (**self).write_char(c)
    }

    fn write_str(&mut self, s: &str) {
        (**self).write_str(s)
    }
}

/// DDRAM address of each row's first cell on an HD44780 style controller
pub const HD44780_ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

/// The DDRAM address for a cell. Out of range cells are pinned to the last column and row.
pub fn hd44780_address(col: u8, row: u8) -> u8 {
    let row = usize::from(row).min(HD44780_ROW_OFFSETS.len() - 1);
    let col = col.min(LCD_WIDTH - 1);

    HD44780_ROW_OFFSETS[row] + col
}

/// the five metric digits, most significant first
pub fn metric_digits(units_of_day: u32) -> [u8; 5] {
    let mut digits = [0; 5];
    let mut remaining = units_of_day;

    // starts with the least significant digit
    for digit in digits.iter_mut().rev() {
        *digit = (remaining % 10) as u8;
        remaining /= 10;
    }

    digits
}

/// (hours, minutes, seconds)
pub fn hms(seconds_of_day: u32) -> (u8, u8, u8) {
    let hours = seconds_of_day / 3600;
    let minutes = seconds_of_day % 3600 / 60;
    let seconds = seconds_of_day % 60;

    (hours as u8, minutes as u8, seconds as u8)
}

fn digit_char(digit: u8) -> char {
    char::from(b'0' + digit % 10)
}

fn write_two_digits<D: CharDisplay + ?Sized>(display: &mut D, col: u8, row: u8, value: u8) {
    display.set_cursor(col, row);
    if value < 10 {
        display.write_char('0');
    } else {
        display.write_char(digit_char(value / 10));
    }
    display.write_char(digit_char(value));
}

/// shown while we wait for the first usable fix
pub fn draw_acquiring<D: CharDisplay + ?Sized>(display: &mut D) {
    display.clear();
    display.set_cursor(1, 0);
    display.write_str("Acquiring Time");
    display.set_cursor(2, 1);
    display.write_str("Please Wait");
}

/// the labels and delimiters that never change
pub fn draw_layout<D: CharDisplay + ?Sized>(display: &mut D) {
    display.clear();

    display.set_cursor(0, METRIC_ROW);
    display.write_str("Metric:");

    display.set_cursor(0, REAL_ROW);
    display.write_str("Actual:");

    for row in [METRIC_ROW, REAL_ROW] {
        for col in DELIMS {
            display.set_cursor(col, row);
            display.write_char(DELIMITER);
        }
    }
}

/// rewrite every digit cell. safe to call as often as you like
pub fn render<D: CharDisplay + ?Sized>(display: &mut D, clocks: &ClockState) {
    // metric time only has 5 digits, so the first cell is skipped
    for (&col, digit) in DIGITS[1..]
        .iter()
        .zip(metric_digits(clocks.units_of_day()))
    {
        display.set_cursor(col, METRIC_ROW);
        display.write_char(digit_char(digit));
    }

    let (hours, minutes, seconds) = hms(clocks.seconds_of_day());

    write_two_digits(display, DIGITS[0], REAL_ROW, hours);
    write_two_digits(display, DIGITS[2], REAL_ROW, minutes);
    write_two_digits(display, DIGITS[4], REAL_ROW, seconds);
}

/// An in-memory grid of character cells.
///
/// Used by the tests and the terminal simulator. Anything that isn't printable ascii is stored as `?`.
#[derive(Clone, PartialEq, Eq)]
pub struct TextBuffer<const COLS: usize, const ROWS: usize> {
    cells: [[u8; COLS]; ROWS],
    col: usize,
    row: usize,
}

pub type Lcd1602Buffer = TextBuffer<{ LCD_WIDTH as usize }, { LCD_HEIGHT as usize }>;

impl<const COLS: usize, const ROWS: usize> Default for TextBuffer<COLS, ROWS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const COLS: usize, const ROWS: usize> TextBuffer<COLS, ROWS> {
    pub const fn new() -> Self {
        Self {
            cells: [[b' '; COLS]; ROWS],
            col: 0,
            row: 0,
        }
    }

    /// empty if the row doesn't exist
    pub fn row(&self, row: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|cells| core::str::from_utf8(cells).ok())
            .unwrap_or_default()
    }

    pub fn rows(&self) -> impl Iterator<Item = &str> {
        (0..ROWS).map(|row| self.row(row))
    }
}

impl<const COLS: usize, const ROWS: usize> CharDisplay for TextBuffer<COLS, ROWS> {
    fn clear(&mut self) {
        self.cells = [[b' '; COLS]; ROWS];
        self.col = 0;
        self.row = 0;
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        self.col = col as usize;
        self.row = row as usize;
    }

    fn write_char(&mut self, c: char) {
        // writes past the edge are dropped
        if let Some(cell) = self
            .cells
            .get_mut(self.row)
            .and_then(|cells| cells.get_mut(self.col))
        {
            *cell = if c.is_ascii_graphic() || c == ' ' {
                c as u8
            } else {
                b'?'
            };
        }

        self.col += 1;
    }
}

impl<const COLS: usize, const ROWS: usize> fmt::Display for TextBuffer<COLS, ROWS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(row)?;
        }
        Ok(())
    }
}

impl<const COLS: usize, const ROWS: usize> fmt::Debug for TextBuffer<COLS, ROWS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MetricPhase;

    #[test]
    fn test_metric_digits() {
        assert_eq!(metric_digits(4205), [0, 4, 2, 0, 5]);
        assert_eq!(metric_digits(0), [0, 0, 0, 0, 0]);
        assert_eq!(metric_digits(99_999), [9, 9, 9, 9, 9]);
        assert_eq!(metric_digits(50_000), [5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_hd44780_address() {
        assert_eq!(hd44780_address(0, 0), 0x00);
        assert_eq!(hd44780_address(15, 0), 0x0F);
        assert_eq!(hd44780_address(8, 1), 0x48);

        // never spills into the next row or off the end of ddram
        assert_eq!(hd44780_address(40, 0), 0x0F);
        assert_eq!(hd44780_address(255, 1), 0x4F);
        assert_eq!(hd44780_address(3, 9), 0x43);
    }

    #[test]
    fn test_hms() {
        assert_eq!(hms(3661), (1, 1, 1));
        assert_eq!(hms(0), (0, 0, 0));
        assert_eq!(hms(86_399), (23, 59, 59));
    }

    #[test]
    fn test_acquiring() {
        let mut lcd = Lcd1602Buffer::new();

        draw_acquiring(&mut lcd);

        assert_eq!(lcd.row(0), " Acquiring Time ");
        assert_eq!(lcd.row(1), "  Please Wait   ");
    }

    #[test]
    fn test_layout() {
        let mut lcd = Lcd1602Buffer::new();

        draw_acquiring(&mut lcd);
        draw_layout(&mut lcd);

        assert_eq!(lcd.row(0), "Metric:   :  :  ");
        assert_eq!(lcd.row(1), "Actual:   :  :  ");
    }

    #[test]
    fn test_render() {
        let mut lcd = Lcd1602Buffer::new();
        let mut clocks = ClockState::new();

        clocks.set_from_seconds_of_day(3661, 0, MetricPhase::Fixed);
        clocks.metric.set(4205, 0, 864);

        draw_layout(&mut lcd);
        render(&mut lcd, &clocks);

        assert_eq!(lcd.row(0), "Metric:  0:42:05");
        assert_eq!(lcd.row(1), "Actual: 01:01:01");

        clocks.set_from_seconds_of_day(86_399, 0, MetricPhase::Fixed);
        render(&mut lcd, &clocks);

        assert_eq!(lcd.row(0), "Metric:  9:99:98");
        assert_eq!(lcd.row(1), "Actual: 23:59:59");

        assert_eq!(
            std::format!("{lcd}"),
            "Metric:  9:99:98\nActual: 23:59:59"
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut once = Lcd1602Buffer::new();
        let mut twice = Lcd1602Buffer::new();
        let mut clocks = ClockState::new();

        clocks.set_from_seconds_of_day(43_200, 0, MetricPhase::Fixed);

        draw_layout(&mut once);
        render(&mut once, &clocks);

        draw_layout(&mut twice);
        render(&mut twice, &clocks);
        render(&mut twice, &clocks);

        assert_eq!(once, twice);
        assert_eq!(once.row(0), "Metric:  5:00:00");
        assert_eq!(once.row(1), "Actual: 12:00:00");
    }

    #[test]
    fn test_writes_past_the_edge_are_dropped() {
        let mut lcd = TextBuffer::<4, 1>::new();

        lcd.write_str("abcdef");
        lcd.set_cursor(0, 3);
        lcd.write_char('z');
        lcd.set_cursor(3, 0);
        lcd.write_char('é');

        assert_eq!(lcd.row(0), "abc?");
        assert_eq!(lcd.row(1), "");
    }
}
