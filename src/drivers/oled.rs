//! Minimal HD44780-compatible character LCD/OLED driver, addressed over a
//! PCF8574 I2C I/O-expander backpack (the common wiring for a 16x4 text
//! display). This is the concrete implementation behind `hal_iface::CharDisplay`;
//! spec.md §1 declares the display driver itself an external collaborator,
//! so the flight-control core never sees anything below that trait.
//!
//! Only the subset of the HD44780 instruction set the status display needs
//! is implemented: 4-bit initialization, clear, and positioned character
//! writes. Contrast, cursor, and custom-character glyphs are out of scope.

use hal::i2c::I2c;
use hal::pac::I2C1;

use crate::hal_iface::CharDisplay;

/// 7-bit I2C address of the PCF8574 backpack, as wired on the reference
/// board (the common default for these modules).
const I2C_ADDR: u8 = 0x27;

/// PCF8574 bit assignments: 4 data lines plus enable/register-select/
/// backlight control lines, per the standard HD44780-over-PCF8574 wiring.
const BIT_RS: u8 = 0b0000_0001;
const BIT_ENABLE: u8 = 0b0000_0100;
const BIT_BACKLIGHT: u8 = 0b0000_1000;

/// Row start addresses for a 16x4 display (the third and fourth rows are
/// not contiguous with the first two in HD44780 DDRAM).
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

const CMD_CLEAR_DISPLAY: u8 = 0x01;
const CMD_FUNCTION_SET_4BIT_2LINE: u8 = 0x28;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_ENTRY_MODE_INCREMENT: u8 = 0x06;
const CMD_SET_DDRAM_ADDR: u8 = 0x80;

pub struct Oled {
    i2c: I2c<I2C1>,
    backlight: bool,
}

impl Oled {
    /// Runs the HD44780 4-bit initialization sequence and returns a driver
    /// ready for `draw_line` calls. `i2c` must already be configured for
    /// standard-mode (100 kHz) operation; the backpack's PCF8574 doesn't
    /// support fast mode.
    pub fn new(i2c: I2c<I2C1>) -> Self {
        let mut dev = Self {
            i2c,
            backlight: true,
        };

        // The display powers up in 8-bit mode; nudging it three times with
        // the upper nibble of the "function set" command is the documented
        // way to force it into a known state before switching to 4-bit.
        for _ in 0..3 {
            dev.write_nibble(0x03, false);
        }
        dev.write_nibble(0x02, false);

        dev.command(CMD_FUNCTION_SET_4BIT_2LINE);
        dev.command(CMD_DISPLAY_ON);
        dev.command(CMD_CLEAR_DISPLAY);
        dev.command(CMD_ENTRY_MODE_INCREMENT);

        dev
    }

    fn write_raw(&mut self, bits: u8) {
        let byte = bits | if self.backlight { BIT_BACKLIGHT } else { 0 };
        let _ = self.i2c.write(I2C_ADDR, &[byte]);
    }

    /// Pulses the enable line so the HD44780 latches the nibble currently
    /// held on the four data lines.
    fn strobe(&mut self, bits: u8) {
        self.write_raw(bits | BIT_ENABLE);
        self.write_raw(bits);
    }

    fn write_nibble(&mut self, nibble: u8, register_select: bool) {
        let bits = (nibble << 4) | if register_select { BIT_RS } else { 0 };
        self.strobe(bits);
    }

    fn command(&mut self, byte: u8) {
        self.write_nibble(byte >> 4, false);
        self.write_nibble(byte & 0x0F, false);
    }

    fn data(&mut self, byte: u8) {
        self.write_nibble(byte >> 4, true);
        self.write_nibble(byte & 0x0F, true);
    }

    fn set_cursor(&mut self, row: u8, col: u8) {
        let addr = ROW_OFFSETS[row as usize % ROW_OFFSETS.len()] + col;
        self.command(CMD_SET_DDRAM_ADDR | addr);
    }
}

impl CharDisplay for Oled {
    fn draw_line(&mut self, row: u8, text: &str) {
        const COLS: usize = 16;
        self.set_cursor(row, 0);
        let mut written = 0usize;
        for b in text.bytes().take(COLS) {
            self.data(b);
            written += 1;
        }
        for _ in written..COLS {
            self.data(b' ');
        }
    }
}
