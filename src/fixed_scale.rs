//! Conversions for sensors with a fixed transfer function and no per-device
//! calibration. Temperatures are in kelvin.
//!
//! # Examples
//!
//! ```
//! use env_compensation::fixed_scale::tmp116_kelvin;
//! use env_compensation::units::{convert, CELSIUS, KELVIN};
//!
//! let celsius = convert(tmp116_kelvin(0x0C80), KELVIN, CELSIUS);
//! assert!((celsius - 25.0).abs() < 1e-3);
//! ```

const ZERO_CELSIUS: f32 = 273.15;

/// Data-invalid flag of the TMP007 object temperature register.
const TMP007_INVALID: u16 = 0b1;

/// 14-bit two's complement in bits `[15..2]`, 1/32 °C per LSB.
fn tmp007_kelvin(register: u16) -> f32 {
    ((register as i16) >> 2) as f32 * 0.031_25 + ZERO_CELSIUS
}

/// TMP007 local (die) temperature, register `0x01`.
pub fn tmp007_die_kelvin(register: u16) -> f32 {
    tmp007_kelvin(register)
}

/// TMP007 object temperature, register `0x03`. `None` while the device
/// flags the result as invalid.
pub fn tmp007_object_kelvin(register: u16) -> Option<f32> {
    if register & TMP007_INVALID != 0 {
        return None;
    }

    Some(tmp007_kelvin(register))
}

/// TMP116 temperature register: 16-bit two's complement, 1/128 °C per LSB.
pub fn tmp116_kelvin(register: u16) -> f32 {
    register as i16 as f32 * 0.007_812_5 + ZERO_CELSIUS
}

/// Raw codes of one HDC1000 or HDC2080 acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HdcSample {
    pub temperature: u16,
    pub humidity: u16,
}

impl HdcSample {
    /// `code / 2^16 * 165 - 40` °C.
    pub fn temperature_kelvin(&self) -> f32 {
        self.temperature as f32 * 165.0 / 65536.0 - 40.0 + ZERO_CELSIUS
    }

    /// Percent relative humidity, `code / 2^16 * 100`.
    pub fn humidity(&self) -> f32 {
        self.humidity as f32 * 100.0 / 65536.0
    }
}

/// HDC1000 burst from register `0x00`: temperature then humidity, each MSB first.
pub fn decode_hdc1000(frame: &[u8; 4]) -> HdcSample {
    let [t0, t1, h0, h1] = *frame;
    HdcSample {
        temperature: u16::from_be_bytes([t0, t1]),
        humidity: u16::from_be_bytes([h0, h1]),
    }
}

/// HDC2080 burst from register `0x00`: temperature then humidity, each LSB first.
pub fn decode_hdc2080(frame: &[u8; 4]) -> HdcSample {
    let [t0, t1, h0, h1] = *frame;
    HdcSample {
        temperature: u16::from_le_bytes([t0, t1]),
        humidity: u16::from_le_bytes([h0, h1]),
    }
}
