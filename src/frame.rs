use crate::error::NotReady;

/// Raw pressure code the device reports before its first conversion.
pub const PRESSURE_SENTINEL: u32 = 0x80000;

/// ADC codes of one BMP280/BME280 acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// 20-bit code.
    pub pressure: u32,
    /// 20-bit code.
    pub temperature: u32,
    /// 16-bit code, only read on humidity-capable families.
    pub humidity: Option<u32>,
}

impl RawSample {
    pub fn is_ready(&self) -> bool {
        self.pressure != PRESSURE_SENTINEL
    }
}

/// Packs `msb`, `lsb` and the upper nibble of `xlsb` into a 20-bit code.
fn code20(msb: u8, lsb: u8, xlsb: u8) -> u32 {
    ((msb as u32) << 12) | ((lsb as u32) << 4) | ((xlsb as u32) >> 4)
}

/// Length of a pressure and temperature burst.
pub const FRAME_LEN: usize = 6;

/// Length of a pressure, temperature and humidity burst.
pub const HUMIDITY_FRAME_LEN: usize = 8;

/// Decodes a pressure and temperature burst read from the data block (`0xF7..`).
///
/// # Examples
///
/// ```
/// use env_compensation::{decode, NotReady};
///
/// let sample = decode(&[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00]).unwrap();
/// assert_eq!(sample.pressure, 415148);
/// assert_eq!(sample.temperature, 519888);
/// assert_eq!(sample.humidity, None);
///
/// assert_eq!(decode(&[0x80, 0x00, 0x00, 0x7E, 0xED, 0x00]), Err(NotReady));
/// ```
pub fn decode(frame: &[u8; FRAME_LEN]) -> Result<RawSample, NotReady> {
    let [p0, p1, p2, t0, t1, t2] = *frame;
    sample(code20(p0, p1, p2), code20(t0, t1, t2), None)
}

/// Decodes a burst that also carries the 16-bit humidity code, MSB first.
pub fn decode_with_humidity(frame: &[u8; HUMIDITY_FRAME_LEN]) -> Result<RawSample, NotReady> {
    let [p0, p1, p2, t0, t1, t2, h0, h1] = *frame;
    sample(
        code20(p0, p1, p2),
        code20(t0, t1, t2),
        Some(u16::from_be_bytes([h0, h1]) as u32),
    )
}

fn sample(pressure: u32, temperature: u32, humidity: Option<u32>) -> Result<RawSample, NotReady> {
    if pressure == PRESSURE_SENTINEL {
        return Err(NotReady);
    }

    Ok(RawSample {
        pressure,
        temperature,
        humidity,
    })
}

/// OPT3001 result code with the exponent applied, in units of 0.01 lux.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawIlluminance(pub u32);

impl RawIlluminance {
    pub fn lux(self) -> f32 {
        0.01 * self.0 as f32
    }
}

/// Expands the OPT3001 result register: mantissa in bits `[11..0]`,
/// exponent in bits `[15..12]`.
pub fn decode_illuminance(register: u16) -> RawIlluminance {
    let mantissa = (register & 0x0FFF) as u32;
    let exponent = (register >> 12) as u32;

    RawIlluminance(mantissa << exponent)
}
