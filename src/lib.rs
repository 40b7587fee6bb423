//! Calibrated temperature, pressure and humidity from BMP280/BME280 raw
//! codes, illuminance from the OPT3001, plus unit conversion and barometric
//! altitude.
//!
//! The compensation arithmetic is pure and bus-independent. Sensors with a
//! fixed transfer function (TMP007, TMP116, HDC1000, HDC2080) are covered by
//! [`fixed_scale`]. The
//! [`Bmx280`] and [`Opt3001`] drivers wrap it over any `embedded-hal`
//! blocking I2C implementation.
//!
//! # Examples
//!
//! ```
//! use env_compensation::{units, Bmx280, Config, Family, DEFAULT_ADDRESS};
//! # use embedded_hal_mock::{delay::MockNoop, i2c::{Mock, Transaction}};
//! # let i2c = Mock::new(&[
//! #     Transaction::write(0x77, vec![0xE0, 0xB6]),
//! #     Transaction::write_read(0x77, vec![0x88], vec![
//! #         0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B,
//! #         0x27, 0x0B, 0x8C, 0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17,
//! #     ]),
//! #     Transaction::write(0x77, vec![0xF5, 0x00]),
//! #     Transaction::write(0x77, vec![0xF4, 0x25]),
//! #     Transaction::write_read(0x77, vec![0xF4], vec![0x24]),
//! #     Transaction::write(0x77, vec![0xF4, 0x25]),
//! #     Transaction::write_read(0x77, vec![0xF3], vec![0x00]),
//! #     Transaction::write_read(0x77, vec![0xF7], vec![0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00]),
//! # ]);
//! # let delay = MockNoop;
//!
//! let mut sensor =
//!     Bmx280::init(i2c, DEFAULT_ADDRESS, delay, Family::Bmp280, Config::default()).unwrap();
//!
//! let reading = sensor.measure_retrying(8, 100).unwrap().reading;
//!
//! // 25.08 °C at 1006.53 hPa
//! assert!((reading.temperature_in(units::CELSIUS) - 25.08).abs() < 0.01);
//! assert!((reading.pressure - 1006.53).abs() < 0.01);
//! ```

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod altitude;
mod bmx280;
mod bus;
mod calibration;
mod compensation;
mod error;
mod family;
pub mod fixed_scale;
mod frame;
pub mod opt3001;
pub mod units;

pub use bmx280::{Bmx280, Config, Filter, Mode, Oversampling, Standby};
pub use bus::{ByteOrder, RegisterBus};
pub use calibration::{
    load as load_calibration, CalibrationCoefficients, HumidityCoefficients, CALIBRATION_LEN,
    HUMIDITY_CALIBRATION_LEN,
};
pub use compensation::{
    compensate, humidity_q22_10, pressure_q24_8, t_fine, temperature_kelvin, CalibratedReading,
    Compensated, PressureUpdate,
};
pub use error::{Error, NotReady};
pub use family::{Family, RegisterMap, DEFAULT_ADDRESS, RESET_COMMAND, SETTLE_MS};
pub use frame::{
    decode, decode_illuminance, decode_with_humidity, RawIlluminance, RawSample, FRAME_LEN,
    HUMIDITY_FRAME_LEN, PRESSURE_SENTINEL,
};
pub use opt3001::{Configuration, Opt3001};
