use crate::bus::RegisterBus;
use crate::calibration::{self, CalibrationCoefficients};
use crate::compensation::{compensate, CalibratedReading, Compensated};
use crate::error::Error;
use crate::family::Family;
use crate::frame::{decode, decode_with_humidity, FRAME_LEN, HUMIDITY_FRAME_LEN};
use embedded_hal::blocking::{
    delay::DelayMs,
    i2c::{Write, WriteRead},
};

/// Mode bits of the control register.
const MODE_MASK: u8 = 0b0000_0011;

/// Status bit set while a conversion is running.
const MEASURING: u8 = 0b0000_1000;

/// Status reads after the worst-case conversion time has elapsed.
const STATUS_POLLS: u8 = 8;
const STATUS_POLL_MS: u32 = 2;

/// Oversampling of one channel. `Skip` disables the channel.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    Skip = 0b000,
    X1 = 0b001,
    X2 = 0b010,
    X4 = 0b011,
    X8 = 0b100,
    X16 = 0b101,
}

impl Oversampling {
    fn samples(self) -> u32 {
        match self {
            Oversampling::Skip => 0,
            Oversampling::X1 => 1,
            Oversampling::X2 => 2,
            Oversampling::X4 => 4,
            Oversampling::X8 => 8,
            Oversampling::X16 => 16,
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Sleep = 0b00,
    /// One conversion per trigger, then back to sleep.
    Forced = 0b01,
    Normal = 0b11,
}

/// Inactive time between conversions in [`Mode::Normal`].
///
/// On the BME280 the last two codes select 10 ms and 20 ms.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Standby {
    Ms0_5 = 0b000,
    Ms62_5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms2000 = 0b110,
    Ms4000 = 0b111,
}

/// IIR filter coefficient applied to pressure and temperature.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Filter {
    Off = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X8 = 0b011,
    X16 = 0b100,
}

/// Configuration for a [`Bmx280`].
///
/// - `temperature`, `pressure`, `humidity`: oversampling of each channel
///   (`humidity` is ignored on the BMP280)
/// - `mode`: in [`Mode::Forced`], every [`Bmx280::measure`] triggers a conversion
/// - `standby`, `filter`: written to the `config` register during [`Bmx280::init`]
///
/// # Examples
///
/// ```
/// use env_compensation::{Config, Filter, Mode, Oversampling, Standby};
///
/// let config = Config {
///     pressure: Oversampling::X16,
///     mode: Mode::Normal,
///     standby: Standby::Ms125,
///     filter: Filter::X4,
///     ..Config::default()
/// };
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub temperature: Oversampling,
    pub pressure: Oversampling,
    pub humidity: Oversampling,
    pub mode: Mode,
    pub standby: Standby,
    pub filter: Filter,
}

impl Default for Config {
    /// x1 oversampling on every channel, forced mode, no filter.
    fn default() -> Self {
        Self {
            temperature: Oversampling::X1,
            pressure: Oversampling::X1,
            humidity: Oversampling::X1,
            mode: Mode::Forced,
            standby: Standby::Ms0_5,
            filter: Filter::Off,
        }
    }
}

impl Config {
    fn control(&self) -> u8 {
        ((self.temperature as u8) << 5) | ((self.pressure as u8) << 2) | self.mode as u8
    }

    fn control_humidity(&self) -> u8 {
        self.humidity as u8
    }

    fn config(&self) -> u8 {
        ((self.standby as u8) << 5) | ((self.filter as u8) << 2)
    }

    /// Worst-case duration of one conversion with these oversampling
    /// settings, rounded up to whole milliseconds.
    pub fn measurement_time_ms(&self, family: Family) -> u32 {
        let mut us = 1250 + 2300 * self.temperature.samples();
        if self.pressure != Oversampling::Skip {
            us += 2300 * self.pressure.samples() + 575;
        }
        if family.has_humidity() && self.humidity != Oversampling::Skip {
            us += 2300 * self.humidity.samples() + 575;
        }

        (us + 999) / 1000
    }
}

/// Driver for the BMP280 and BME280.
#[derive(Debug)]
pub struct Bmx280<I2C, D> {
    bus: RegisterBus<I2C>,
    delay: D,
    family: Family,
    config: Config,
    calibration: CalibrationCoefficients,
    last: Option<CalibratedReading>,
}

impl<I2C, D, E> Bmx280<I2C, D>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u32>,
{
    /// Resets the device, reads its calibration and applies `config`.
    ///
    /// # Examples
    ///
    /// ```
    /// use env_compensation::{Bmx280, Config, Family, DEFAULT_ADDRESS};
    /// # use embedded_hal_mock::{delay::MockNoop, i2c::{Mock, Transaction}};
    /// # let i2c = Mock::new(&[
    /// #     Transaction::write(0x77, vec![0xE0, 0xB6]),
    /// #     Transaction::write_read(0x77, vec![0x88], vec![0; 24]),
    /// #     Transaction::write(0x77, vec![0xF5, 0x00]),
    /// #     Transaction::write(0x77, vec![0xF4, 0x25]),
    /// # ]);
    /// # let delay = MockNoop;
    ///
    /// let sensor = Bmx280::init(i2c, DEFAULT_ADDRESS, delay, Family::Bmp280, Config::default());
    /// assert!(sensor.is_ok());
    /// ```
    pub fn init(
        i2c: I2C,
        address: u8,
        mut delay: D,
        family: Family,
        config: Config,
    ) -> Result<Self, Error<E>> {
        let mut bus = RegisterBus::new(i2c, address);
        let calibration = calibration::load(&mut bus, &mut delay, family).map_err(Error::Bus)?;

        let registers = family.registers();
        if let Some(register) = registers.control_humidity {
            bus.write_u8(register, config.control_humidity())
                .map_err(Error::Bus)?;
        }
        bus.write_u8(registers.config, config.config())
            .map_err(Error::Bus)?;
        bus.write_u8(registers.control, config.control())
            .map_err(Error::Bus)?;

        Ok(Self {
            bus,
            delay,
            family,
            config,
            calibration,
            last: None,
        })
    }

    /// Destroys the driver and returns the I2C peripheral and delay.
    pub fn release(self) -> (I2C, D) {
        (self.bus.release(), self.delay)
    }

    pub fn address(&self) -> u8 {
        self.bus.address()
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn calibration(&self) -> &CalibrationCoefficients {
        &self.calibration
    }

    /// The most recent successful reading.
    pub fn last_reading(&self) -> Option<&CalibratedReading> {
        self.last.as_ref()
    }

    /// Rewrites the mode bits, keeping the oversampling settings.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error<E>> {
        let control = self.family.registers().control;
        let value = self.bus.read_u8(control).map_err(Error::Bus)?;
        self.bus
            .write_u8(control, (value & !MODE_MASK) | mode as u8)
            .map_err(Error::Bus)?;
        self.config.mode = mode;
        Ok(())
    }

    /// Waits out the conversion time, then polls the status register until
    /// the measuring bit clears.
    fn wait_for_conversion(&mut self) -> Result<(), Error<E>> {
        self.delay
            .delay_ms(self.config.measurement_time_ms(self.family));

        let status = self.family.registers().status;
        for _ in 0..STATUS_POLLS {
            if self.bus.read_u8(status).map_err(Error::Bus)? & MEASURING == 0 {
                return Ok(());
            }
            self.delay.delay_ms(STATUS_POLL_MS);
        }

        debug!("conversion still running after {} status polls", STATUS_POLLS);
        Err(Error::NotReady)
    }

    /// Acquires and compensates one sample.
    ///
    /// In [`Mode::Forced`] this triggers a conversion and blocks until it
    /// completes.
    ///
    /// Returns [`Error::NotReady`] while no conversion has completed; the
    /// previous reading is left untouched. Check
    /// [`Compensated::is_stale`] for a pressure carried over from the
    /// previous reading.
    pub fn measure(&mut self) -> Result<Compensated, Error<E>> {
        if self.config.mode == Mode::Forced {
            self.set_mode(Mode::Forced)?;
            self.wait_for_conversion()?;
        }

        let data = self.family.registers().data;
        let sample = if self.family.has_humidity() {
            let mut frame = [0u8; HUMIDITY_FRAME_LEN];
            self.bus.read_block(data, &mut frame).map_err(Error::Bus)?;
            decode_with_humidity(&frame)?
        } else {
            let mut frame = [0u8; FRAME_LEN];
            self.bus.read_block(data, &mut frame).map_err(Error::Bus)?;
            decode(&frame)?
        };
        trace!("raw sample: {}", sample);

        let compensated = compensate(&sample, &self.calibration, self.last.as_ref())?;
        if compensated.is_stale() {
            warn!("pressure divisor is zero, previous pressure retained");
        }

        self.last = Some(compensated.reading);
        Ok(compensated)
    }

    /// Calls [`measure`](Bmx280::measure) up to `max_attempts` times,
    /// waiting `interval_ms` after each [`Error::NotReady`].
    pub fn measure_retrying(
        &mut self,
        max_attempts: u8,
        interval_ms: u32,
    ) -> Result<Compensated, Error<E>> {
        let mut attempt = 1;
        loop {
            match self.measure() {
                Err(Error::NotReady) if attempt < max_attempts => {
                    debug!("conversion not ready, attempt {}", attempt);
                    self.delay.delay_ms(interval_ms);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::tests::{datasheet, datasheet_with_humidity, load_transactions, ADDRESS};
    use crate::compensation::PressureUpdate;
    use crate::family::SETTLE_MS;
    use embedded_hal_mock::{
        delay::MockNoop,
        i2c::{Mock, Transaction},
        MockError,
    };
    use float_cmp::approx_eq;
    use std::io::ErrorKind;

    const FRAME: [u8; 8] = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x75, 0x30];
    const NOT_READY: [u8; 8] = [0x80, 0x00, 0x00, 0x80, 0x00, 0x00, 0x80, 0x00];

    /// Sums the requested delays.
    #[derive(Debug, Default)]
    struct Sleeper(u32);

    impl DelayMs<u32> for Sleeper {
        fn delay_ms(&mut self, ms: u32) {
            self.0 += ms;
        }
    }

    fn init_transactions(family: Family, config: Config) -> Vec<Transaction> {
        let mut transactions = load_transactions(family);
        if family.has_humidity() {
            transactions.push(Transaction::write(
                ADDRESS,
                vec![0xF2, config.control_humidity()],
            ));
        }
        transactions.push(Transaction::write(ADDRESS, vec![0xF5, config.config()]));
        transactions.push(Transaction::write(ADDRESS, vec![0xF4, config.control()]));
        transactions
    }

    /// Forced trigger followed by an idle status register.
    fn trigger() -> [Transaction; 3] {
        [
            Transaction::write_read(ADDRESS, vec![0xF4], vec![0x24]),
            Transaction::write(ADDRESS, vec![0xF4, 0x25]),
            Transaction::write_read(ADDRESS, vec![0xF3], vec![0x00]),
        ]
    }

    fn sensor(
        family: Family,
        config: Config,
        acquisitions: &[Transaction],
    ) -> Bmx280<Mock, Sleeper> {
        let mut transactions = init_transactions(family, config);
        transactions.extend_from_slice(acquisitions);
        Bmx280::init(Mock::new(&transactions), ADDRESS, Sleeper::default(), family, config)
            .unwrap()
    }

    /// Checks the bus traffic and returns the time slept after `init`.
    fn done(sensor: Bmx280<Mock, Sleeper>) -> u32 {
        let (mut i2c, delay) = sensor.release();
        i2c.done();
        delay.0 - SETTLE_MS
    }

    #[test]
    fn register_bytes() {
        let config = Config::default();
        assert_eq!(config.control(), 0x25);
        assert_eq!(config.control_humidity(), 0x01);
        assert_eq!(config.config(), 0x00);

        let config = Config {
            temperature: Oversampling::X2,
            pressure: Oversampling::X16,
            humidity: Oversampling::Skip,
            mode: Mode::Normal,
            standby: Standby::Ms125,
            filter: Filter::X4,
        };
        assert_eq!(config.control(), 0b010_101_11);
        assert_eq!(config.control_humidity(), 0);
        assert_eq!(config.config(), 0b010_010_00);
    }

    #[test]
    fn measurement_time() {
        let config = Config::default();
        // 1.25 + 2.3 + 2.875 (+ 2.875) ms
        assert_eq!(config.measurement_time_ms(Family::Bmp280), 7);
        assert_eq!(config.measurement_time_ms(Family::Bme280), 10);

        let config = Config {
            temperature: Oversampling::X16,
            pressure: Oversampling::X16,
            humidity: Oversampling::X16,
            ..Config::default()
        };
        assert_eq!(config.measurement_time_ms(Family::Bme280), 113);

        let config = Config {
            pressure: Oversampling::Skip,
            humidity: Oversampling::Skip,
            ..Config::default()
        };
        assert_eq!(config.measurement_time_ms(Family::Bme280), 4);
    }

    #[test]
    fn init_loads_calibration() {
        let sensor = sensor(Family::Bme280, Config::default(), &[]);

        assert_eq!(sensor.calibration(), &datasheet_with_humidity());
        assert_eq!(sensor.family(), Family::Bme280);
        assert_eq!(sensor.address(), ADDRESS);
        assert_eq!(sensor.config(), &Config::default());
        assert_eq!(sensor.last_reading(), None);
        assert_eq!(done(sensor), 0);
    }

    #[test]
    fn init_writes_standby_and_filter() {
        let config = Config {
            mode: Mode::Normal,
            standby: Standby::Ms1000,
            filter: Filter::X16,
            ..Config::default()
        };
        let mut transactions = load_transactions(Family::Bmp280);
        transactions.push(Transaction::write(ADDRESS, vec![0xF5, 0b101_100_00]));
        transactions.push(Transaction::write(ADDRESS, vec![0xF4, 0x27]));

        let sensor =
            Bmx280::init(Mock::new(&transactions), ADDRESS, MockNoop, Family::Bmp280, config)
                .unwrap();
        let (mut i2c, _) = sensor.release();
        i2c.done();
    }

    #[test]
    fn init_fails_on_bus_error() {
        let i2c = Mock::new(&[
            Transaction::write(ADDRESS, vec![0xE0, 0xB6]).with_error(MockError::Io(ErrorKind::Other))
        ]);

        let result = Bmx280::init(i2c, ADDRESS, MockNoop, Family::Bmp280, Config::default());
        assert!(matches!(result, Err(Error::Bus(_))));
    }

    #[test]
    fn measures_bme280_in_forced_mode() {
        let mut acquisition = trigger().to_vec();
        acquisition.push(Transaction::write_read(ADDRESS, vec![0xF7], FRAME.to_vec()));
        let mut sensor = sensor(Family::Bme280, Config::default(), &acquisition);

        let compensated = sensor.measure().unwrap();
        assert_eq!(compensated.t_fine, 128422);
        assert_eq!(compensated.pressure_update, PressureUpdate::Updated);
        assert!(approx_eq!(f32, compensated.reading.pressure, 1006.5325, epsilon = 0.001));
        assert_eq!(compensated.reading.humidity, Some(55953.0 / 1024.0));
        assert_eq!(sensor.last_reading(), Some(&compensated.reading));
        assert_eq!(done(sensor), 10);
    }

    #[test]
    fn forced_mode_waits_for_conversion_before_reading() {
        let mut sensor = sensor(
            Family::Bme280,
            Config::default(),
            &[
                Transaction::write_read(ADDRESS, vec![0xF4], vec![0x24]),
                Transaction::write(ADDRESS, vec![0xF4, 0x25]),
                Transaction::write_read(ADDRESS, vec![0xF3], vec![0x08]),
                Transaction::write_read(ADDRESS, vec![0xF3], vec![0x09]),
                Transaction::write_read(ADDRESS, vec![0xF3], vec![0x01]),
                Transaction::write_read(ADDRESS, vec![0xF7], FRAME.to_vec()),
            ],
        );

        assert_eq!(sensor.measure().map(|c| c.t_fine), Ok(128422));
        assert_eq!(done(sensor), 10 + 2 * STATUS_POLL_MS);
    }

    #[test]
    fn conversion_that_never_finishes_is_not_ready() {
        let mut acquisition = vec![
            Transaction::write_read(ADDRESS, vec![0xF4], vec![0x24]),
            Transaction::write(ADDRESS, vec![0xF4, 0x25]),
        ];
        for _ in 0..STATUS_POLLS {
            acquisition.push(Transaction::write_read(ADDRESS, vec![0xF3], vec![0x08]));
        }
        let mut sensor = sensor(Family::Bmp280, Config::default(), &acquisition);

        assert_eq!(sensor.measure(), Err(Error::NotReady));
        assert_eq!(sensor.last_reading(), None);
        assert_eq!(done(sensor), 7 + STATUS_POLLS as u32 * STATUS_POLL_MS);
    }

    #[test]
    fn measures_bmp280_in_normal_mode() {
        let config = Config {
            mode: Mode::Normal,
            ..Config::default()
        };
        let mut sensor = sensor(
            Family::Bmp280,
            config,
            &[Transaction::write_read(ADDRESS, vec![0xF7], FRAME[..6].to_vec())],
        );

        let compensated = sensor.measure().unwrap();
        assert_eq!(sensor.calibration(), &datasheet());
        assert_eq!(compensated.reading.humidity, None);
        assert!(approx_eq!(f32, compensated.reading.temperature, 298.2324, epsilon = 0.001));
        assert_eq!(done(sensor), 0);
    }

    #[test]
    fn not_ready_keeps_previous_reading() {
        let mut acquisitions = trigger().to_vec();
        acquisitions.push(Transaction::write_read(ADDRESS, vec![0xF7], FRAME.to_vec()));
        acquisitions.extend(trigger());
        acquisitions.push(Transaction::write_read(ADDRESS, vec![0xF7], NOT_READY.to_vec()));
        let mut sensor = sensor(Family::Bme280, Config::default(), &acquisitions);

        let first = sensor.measure().unwrap();
        assert_eq!(sensor.measure(), Err(Error::NotReady));
        assert_eq!(sensor.last_reading(), Some(&first.reading));
        done(sensor);
    }

    #[test]
    fn retries_until_ready() {
        let mut acquisitions = Vec::new();
        for frame in [NOT_READY, NOT_READY, FRAME] {
            acquisitions.extend(trigger());
            acquisitions.push(Transaction::write_read(ADDRESS, vec![0xF7], frame.to_vec()));
        }
        let mut sensor = sensor(Family::Bme280, Config::default(), &acquisitions);

        let compensated = sensor.measure_retrying(8, 100).unwrap();
        assert_eq!(compensated.t_fine, 128422);
        // three conversions, two retry intervals
        assert_eq!(done(sensor), 3 * 10 + 2 * 100);
    }

    #[test]
    fn retries_give_up() {
        let mut acquisitions = Vec::new();
        for _ in 0..3 {
            acquisitions.extend(trigger());
            acquisitions.push(Transaction::write_read(ADDRESS, vec![0xF7], NOT_READY.to_vec()));
        }
        let mut sensor = sensor(Family::Bme280, Config::default(), &acquisitions);

        assert_eq!(sensor.measure_retrying(3, 100), Err(Error::NotReady));
        done(sensor);
    }

    #[test]
    fn retries_stop_on_bus_error() {
        let mut acquisitions = trigger().to_vec();
        acquisitions.push(
            Transaction::write_read(ADDRESS, vec![0xF7], FRAME.to_vec())
                .with_error(MockError::Io(ErrorKind::Other)),
        );
        let mut sensor = sensor(Family::Bme280, Config::default(), &acquisitions);

        assert!(matches!(sensor.measure_retrying(8, 100), Err(Error::Bus(_))));
        done(sensor);
    }

    #[test]
    fn set_mode_keeps_oversampling() {
        let mut sensor = sensor(
            Family::Bmp280,
            Config::default(),
            &[
                Transaction::write_read(ADDRESS, vec![0xF4], vec![0b101_011_01]),
                Transaction::write(ADDRESS, vec![0xF4, 0b101_011_00]),
            ],
        );

        assert_eq!(sensor.set_mode(Mode::Sleep), Ok(()));
        assert_eq!(sensor.config().mode, Mode::Sleep);
        done(sensor);
    }
}
