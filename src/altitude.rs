//! International barometric formula. Pressures in any one call must share a
//! unit; altitudes are in metres.

use crate::compensation::CalibratedReading;
use libm::powf;

const SCALE: f32 = 44_330.77;
const EXPONENT: f32 = 0.190_263;
const INVERSE_EXPONENT: f32 = 5.255_876;

/// Standard atmosphere at sea level (hPa).
pub const STANDARD_SEA_LEVEL: f32 = 1013.25;

/// Altitude above the level where the pressure is `sea_level_pressure`.
///
/// # Examples
///
/// ```
/// use env_compensation::altitude::altitude_from_sea_level;
///
/// assert_eq!(altitude_from_sea_level(1013.25, 1013.25), 0.0);
/// assert!((altitude_from_sea_level(1000.0, 1013.25) - 110.88).abs() < 0.1);
/// ```
pub fn altitude_from_sea_level(measured_pressure: f32, sea_level_pressure: f32) -> f32 {
    SCALE * (1.0 - powf(measured_pressure / sea_level_pressure, EXPONENT))
}

/// Sea-level pressure implied by `reference_pressure` measured at `reference_altitude`.
pub fn sea_level_from_reference(reference_pressure: f32, reference_altitude: f32) -> f32 {
    reference_pressure / powf(1.0 - reference_altitude / SCALE, INVERSE_EXPONENT)
}

/// Altitude of `measured_pressure` relative to a known reference point.
pub fn altitude_from_reference(
    measured_pressure: f32,
    reference_pressure: f32,
    reference_altitude: f32,
) -> f32 {
    altitude_from_sea_level(
        measured_pressure,
        sea_level_from_reference(reference_pressure, reference_altitude),
    )
}

/// Sea-level equivalent of `measured_pressure` taken at `current_altitude`.
pub fn absolute_pressure_at_sea_level(measured_pressure: f32, current_altitude: f32) -> f32 {
    measured_pressure / powf(1.0 - current_altitude / SCALE, INVERSE_EXPONENT)
}

impl CalibratedReading {
    /// Altitude in metres, given the sea-level pressure in hPa.
    pub fn altitude(&self, sea_level_pressure: f32) -> f32 {
        altitude_from_sea_level(self.pressure, sea_level_pressure)
    }

    /// Altitude in metres relative to a pressure (hPa) taken at a known altitude.
    pub fn altitude_from_reference(&self, reference_pressure: f32, reference_altitude: f32) -> f32 {
        altitude_from_reference(self.pressure, reference_pressure, reference_altitude)
    }

    /// Pressure reduced to sea level (hPa), given the current altitude in metres.
    pub fn sea_level_pressure(&self, current_altitude: f32) -> f32 {
        absolute_pressure_at_sea_level(self.pressure, current_altitude)
    }
}
