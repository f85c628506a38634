//! HD44780 16x2 character lcd behind a PCF8574 i2c backpack.
//!
//! The backpack only has 8 pins, so the lcd runs in 4-bit mode and every byte goes out as two nibbles.
//! Bus errors are counted and otherwise ignored. A missing lcd should not stop the clock.
use embassy_time::{Duration, block_for};
use embedded_hal::i2c::I2c;
use metric_clock_core::display::{CharDisplay, hd44780_address};
use metric_clock_core::logging::{info, warn};

// pcf8574 pin -> lcd pin
const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_LEFT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

pub struct I2cLcd<I> {
    i2c: I,
    address: u8,
    failed_writes: u32,
}

impl<I: I2c> I2cLcd<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self {
            i2c,
            address,
            failed_writes: 0,
        }
    }

    /// the power-on dance from the hd44780 datasheet
    pub fn init(&mut self) {
        block_for(Duration::from_millis(50));

        // three times to get out of whatever mode it was in. then switch to 4-bit
        self.write_nibble(0x03, 0);
        block_for(Duration::from_micros(4_500));
        self.write_nibble(0x03, 0);
        block_for(Duration::from_micros(4_500));
        self.write_nibble(0x03, 0);
        block_for(Duration::from_micros(150));
        self.write_nibble(0x02, 0);

        self.command(CMD_FUNCTION_4BIT_2LINE);
        self.command(CMD_DISPLAY_ON);
        self.clear();
        self.command(CMD_ENTRY_MODE_LEFT);

        if self.failed_writes > 0 {
            warn!(
                "lcd at {:#x} did not respond. the clock will run without it",
                self.address
            );
        } else {
            info!("lcd ready at {:#x}", self.address);
        }
    }

    pub fn failed_writes(&self) -> u32 {
        self.failed_writes
    }

    fn write_raw(&mut self, data: u8) {
        if self.i2c.write(self.address, &[data]).is_err() {
            self.failed_writes = self.failed_writes.wrapping_add(1);
        }
    }

    fn write_nibble(&mut self, nibble: u8, mode: u8) {
        let data = (nibble << 4) | mode | BACKLIGHT;

        // the lcd latches on the falling edge of enable
        self.write_raw(data | EN);
        block_for(Duration::from_micros(1));
        self.write_raw(data & !EN);
        block_for(Duration::from_micros(50));
    }

    fn send(&mut self, byte: u8, mode: u8) {
        self.write_nibble(byte >> 4, mode);
        self.write_nibble(byte & 0x0F, mode);
    }

    fn command(&mut self, cmd: u8) {
        self.send(cmd, 0);
    }
}

impl<I: I2c> CharDisplay for I2cLcd<I> {
    fn clear(&mut self) {
        self.command(CMD_CLEAR);
        block_for(Duration::from_millis(2));
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        self.command(CMD_SET_DDRAM | hd44780_address(col, row));
    }

    fn write_char(&mut self, c: char) {
        // the character rom is mostly ascii
        let byte = if c.is_ascii() { c as u8 } else { b'?' };

        self.send(byte, RS);
    }
}
