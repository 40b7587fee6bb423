//! Driver for the OPT3001 ambient light sensor.

use crate::bus::{ByteOrder, RegisterBus};
use crate::error::Error;
use crate::frame::decode_illuminance;
use embedded_hal::blocking::i2c::{Write, WriteRead};

pub const DEFAULT_ADDRESS: u8 = 0x47;

const RESULT: u8 = 0x00;
const CONFIGURATION: u8 = 0x01;

/// Conversion-ready flag of the configuration register.
const READY_FLAG: u16 = 0x0080;

/// Contents of the configuration register.
///
/// The presets select automatic full-scale range with a 100 ms or 800 ms
/// conversion time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Configuration(pub u16);

impl Configuration {
    pub const SHUTDOWN_100MS: Self = Self(0xC010);
    pub const SINGLE_SHOT_100MS: Self = Self(0xC210);
    pub const CONTINUOUS_100MS: Self = Self(0xC410);
    pub const SHUTDOWN_800MS: Self = Self(0xC810);
    pub const SINGLE_SHOT_800MS: Self = Self(0xCA10);
    pub const CONTINUOUS_800MS: Self = Self(0xCC10);
}

impl Default for Configuration {
    fn default() -> Self {
        Self::CONTINUOUS_800MS
    }
}

#[derive(Debug)]
pub struct Opt3001<I2C> {
    bus: RegisterBus<I2C>,
    configuration: Configuration,
}

impl<I2C, E> Opt3001<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    /// Writes `configuration` to the device at `address`.
    pub fn new(i2c: I2C, address: u8, configuration: Configuration) -> Result<Self, Error<E>> {
        let mut sensor = Self {
            bus: RegisterBus::new(i2c, address),
            configuration,
        };
        sensor.set_configuration(configuration)?;

        Ok(sensor)
    }

    /// Destroys the driver and returns the I2C peripheral.
    pub fn release(self) -> I2C {
        self.bus.release()
    }

    pub fn address(&self) -> u8 {
        self.bus.address()
    }

    pub fn configuration(&self) -> Configuration {
        self.configuration
    }

    pub fn set_configuration(&mut self, configuration: Configuration) -> Result<(), Error<E>> {
        self.bus
            .write_u16(CONFIGURATION, configuration.0, ByteOrder::MsbFirst)
            .map_err(Error::Bus)?;
        self.configuration = configuration;
        Ok(())
    }

    /// Returns the illuminance in lux, or `WouldBlock` until a conversion
    /// has completed.
    ///
    /// # Examples
    ///
    /// ```
    /// use env_compensation::opt3001::{Configuration, Opt3001, DEFAULT_ADDRESS};
    /// # use embedded_hal_mock::i2c::{Mock, Transaction};
    /// # let i2c = Mock::new(&[
    /// #     Transaction::write(0x47, vec![0x01, 0xCC, 0x10]),
    /// #     Transaction::write_read(0x47, vec![0x01], vec![0xCC, 0x10]),
    /// #     Transaction::write_read(0x47, vec![0x01], vec![0xCC, 0x90]),
    /// #     Transaction::write_read(0x47, vec![0x00], vec![0x12, 0x34]),
    /// # ]);
    ///
    /// let mut sensor = Opt3001::new(i2c, DEFAULT_ADDRESS, Configuration::CONTINUOUS_800MS).unwrap();
    ///
    /// let lux = nb::block!(sensor.read()).unwrap();
    /// assert!((lux - 11.28).abs() < 1e-3);
    /// ```
    pub fn read(&mut self) -> nb::Result<f32, Error<E>> {
        let configuration = self
            .bus
            .read_u16(CONFIGURATION, ByteOrder::MsbFirst)
            .map_err(Error::Bus)?;
        if configuration & READY_FLAG == 0 {
            return Err(nb::Error::WouldBlock);
        }

        let result = self
            .bus
            .read_u16(RESULT, ByteOrder::MsbFirst)
            .map_err(Error::Bus)?;
        let illuminance = decode_illuminance(result);
        trace!("raw illuminance: {}", illuminance);

        Ok(illuminance.lux())
    }
}
