//! Fixed-point compensation of BMP280/BME280 ADC codes.
//!
//! The integer formulas are the 64-bit variants published by the
//! manufacturer, so results are bit-for-bit reproducible against reference
//! hardware. Temperature must be compensated first: pressure and humidity
//! both consume its `t_fine` intermediate.

use crate::calibration::{CalibrationCoefficients, HumidityCoefficients};
use crate::error::NotReady;
use crate::frame::RawSample;
use crate::units::{self, Pressure, Temperature, Unit};

/// Upper clamp of the humidity intermediate: 100 %RH in Q22.10, shifted by 12.
const HUMIDITY_MAX: i64 = 419_430_400;

/// A compensated measurement in canonical units.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibratedReading {
    /// Kelvin.
    pub temperature: f32,
    /// Hectopascal.
    pub pressure: f32,
    /// Percent relative humidity, `0.0..=100.0`.
    pub humidity: Option<f32>,
}

impl CalibratedReading {
    pub fn temperature_in(&self, unit: Unit<Temperature>) -> f32 {
        units::convert(self.temperature, units::KELVIN, unit)
    }

    pub fn pressure_in(&self, unit: Unit<Pressure>) -> f32 {
        units::convert(self.pressure, units::HECTOPASCAL, unit)
    }
}

/// Whether the pressure of a [`Compensated`] reading comes from this acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressureUpdate {
    Updated,
    /// The pressure divisor evaluated to zero. The reading carries the
    /// previous pressure, or NaN when there was none.
    StaleReadingRetained,
}

/// Result of [`compensate`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Compensated {
    pub reading: CalibratedReading,
    pub pressure_update: PressureUpdate,
    /// Fine temperature, in 1/5120 °C.
    pub t_fine: i32,
}

impl Compensated {
    pub fn is_stale(&self) -> bool {
        self.pressure_update == PressureUpdate::StaleReadingRetained
    }
}

/// Fine temperature, shared by all three channels.
pub fn t_fine(raw_temperature: u32, c: &CalibrationCoefficients) -> i32 {
    let raw = raw_temperature as i64;
    let t1 = c.t1 as i64;

    let var1 = (((raw >> 3) - (t1 << 1)) * c.t2 as i64) >> 11;
    let delta = (raw >> 4) - t1;
    let var2 = (((delta * delta) >> 12) * c.t3 as i64) >> 14;

    (var1 + var2) as i32
}

pub fn temperature_kelvin(t_fine: i32) -> f32 {
    t_fine as f32 / 5120.0 + 273.15
}

/// Pressure in Pa as Q24.8, or `None` when the divisor is zero.
pub fn pressure_q24_8(t_fine: i32, raw_pressure: u32, c: &CalibrationCoefficients) -> Option<i64> {
    let mut var1 = t_fine as i64 - 128_000;
    let mut var2 = var1 * var1 * c.p6 as i64;
    var2 += (var1 * c.p5 as i64) << 17;
    var2 += (c.p4 as i64) << 35;
    var1 = ((var1 * var1 * c.p3 as i64) >> 8) + ((var1 * c.p2 as i64) << 12);
    var1 = (((1i64 << 47) + var1) * c.p1 as i64) >> 33;

    if var1 == 0 {
        return None;
    }

    let mut p = 1_048_576 - raw_pressure as i64;
    p = (((p << 31) - var2) * 3125) / var1;
    let correction1 = (c.p9 as i64 * (p >> 13) * (p >> 13)) >> 25;
    let correction2 = (c.p8 as i64 * p) >> 19;

    Some(((p + correction1 + correction2) >> 8) + ((c.p7 as i64) << 4))
}

/// Relative humidity as Q22.10 percent, clamped to `0..=100 * 1024`.
pub fn humidity_q22_10(t_fine: i32, raw_humidity: u32, h: &HumidityCoefficients) -> u32 {
    let v = t_fine as i64 - 76_800;
    let raw = raw_humidity as i64;
    let (h1, h2, h3) = (h.h1 as i64, h.h2 as i64, h.h3 as i64);
    let (h4, h5, h6) = (h.h4 as i64, h.h5 as i64, h.h6 as i64);

    let offset = ((raw << 14) - (h4 << 20) - (h5 * v) + 16_384) >> 15;
    let sensitivity =
        ((((((v * h6) >> 10) * (((v * h3) >> 11) + 32_768)) >> 10) + 2_097_152) * h2 + 8192) >> 14;
    let mut x = offset * sensitivity;
    x -= ((((x >> 15) * (x >> 15)) >> 7) * h1) >> 4;

    (x.clamp(0, HUMIDITY_MAX) >> 12) as u32
}

/// Converts one acquisition into a [`CalibratedReading`].
///
/// `previous` is the last reading of the same device; its pressure is
/// carried over when the pressure divisor is zero.
///
/// # Examples
///
/// ```
/// use env_compensation::{compensate, CalibrationCoefficients, RawSample};
///
/// let coefficients = CalibrationCoefficients {
///     t1: 27504, t2: 26435, t3: -1000,
///     p1: 36477, p2: -10685, p3: 3024, p4: 2855, p5: 140,
///     p6: -7, p7: 15500, p8: -14600, p9: 6000,
///     humidity: None,
/// };
/// let sample = RawSample { pressure: 415148, temperature: 519888, humidity: None };
///
/// let compensated = compensate(&sample, &coefficients, None).unwrap();
/// assert_eq!(compensated.t_fine, 128422);
/// assert!((compensated.reading.temperature - 298.23).abs() < 0.01);
/// assert!((compensated.reading.pressure - 1006.53).abs() < 0.01);
/// ```
pub fn compensate(
    sample: &RawSample,
    coefficients: &CalibrationCoefficients,
    previous: Option<&CalibratedReading>,
) -> Result<Compensated, NotReady> {
    if !sample.is_ready() {
        return Err(NotReady);
    }

    let t_fine = t_fine(sample.temperature, coefficients);

    let (pressure, pressure_update) = match pressure_q24_8(t_fine, sample.pressure, coefficients) {
        Some(p) => (p as f32 / 25600.0, PressureUpdate::Updated),
        None => (
            previous.map_or(f32::NAN, |r| r.pressure),
            PressureUpdate::StaleReadingRetained,
        ),
    };

    let humidity = match (sample.humidity, coefficients.humidity.as_ref()) {
        (Some(raw), Some(h)) => Some(humidity_q22_10(t_fine, raw, h) as f32 / 1024.0),
        _ => None,
    };

    Ok(Compensated {
        reading: CalibratedReading {
            temperature: temperature_kelvin(t_fine),
            pressure,
            humidity,
        },
        pressure_update,
        t_fine,
    })
}
