use crate::bus::RegisterBus;
use crate::family::{Family, RESET_COMMAND, SETTLE_MS};
use embedded_hal::blocking::{
    delay::DelayMs,
    i2c::{Write, WriteRead},
};

/// Length of the T1..P9 calibration block.
pub const CALIBRATION_LEN: usize = 24;

/// Length of the H2..H6 calibration block.
pub const HUMIDITY_CALIBRATION_LEN: usize = 7;

/// Factory calibration of one BMP280/BME280, read once at start-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationCoefficients {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
    /// Present on humidity-capable families only.
    pub humidity: Option<HumidityCoefficients>,
}

/// H1..H6 of the BME280.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HumidityCoefficients {
    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

impl CalibrationCoefficients {
    /// Decodes the little-endian words stored at `0x88..=0x9F`.
    pub fn from_registers(block: &[u8; CALIBRATION_LEN]) -> Self {
        let unsigned = |i: usize| u16::from_le_bytes([block[i], block[i + 1]]);
        let signed = |i: usize| i16::from_le_bytes([block[i], block[i + 1]]);

        Self {
            t1: unsigned(0),
            t2: signed(2),
            t3: signed(4),
            p1: unsigned(6),
            p2: signed(8),
            p3: signed(10),
            p4: signed(12),
            p5: signed(14),
            p6: signed(16),
            p7: signed(18),
            p8: signed(20),
            p9: signed(22),
            humidity: None,
        }
    }

    pub fn with_humidity(self, humidity: HumidityCoefficients) -> Self {
        Self {
            humidity: Some(humidity),
            ..self
        }
    }
}

impl HumidityCoefficients {
    /// Decodes H1 (register `0xA1`) and the block at `0xE1..=0xE7`.
    ///
    /// H4 and H5 are 12-bit values sharing register `0xE5`:
    /// `H4 = 0xE4[7:0] << 4 | 0xE5[3:0]` and `H5 = 0xE6[7:0] << 4 | 0xE5[7:4]`.
    /// The most significant byte of each is sign-extended.
    pub fn from_registers(h1: u8, block: &[u8; HUMIDITY_CALIBRATION_LEN]) -> Self {
        let e4 = block[3];
        let e5 = block[4];
        let e6 = block[5];

        Self {
            h1,
            h2: i16::from_le_bytes([block[0], block[1]]),
            h3: block[2],
            h4: ((e4 as i8 as i16) << 4) | (e5 & 0x0F) as i16,
            h5: ((e6 as i8 as i16) << 4) | (e5 >> 4) as i16,
            h6: block[6] as i8,
        }
    }
}

/// Resets the device, waits for it to settle and reads its calibration.
///
/// Any failed transfer aborts the load; partially read coefficients are
/// never returned.
pub fn load<I2C, D, E>(
    bus: &mut RegisterBus<I2C>,
    delay: &mut D,
    family: Family,
) -> Result<CalibrationCoefficients, E>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u32>,
{
    let registers = family.registers();

    bus.write_u8(registers.reset, RESET_COMMAND)?;
    delay.delay_ms(SETTLE_MS);

    let mut block = [0u8; CALIBRATION_LEN];
    bus.read_block(registers.calibration, &mut block)?;
    let coefficients = CalibrationCoefficients::from_registers(&block);

    let coefficients = match registers.calibration_humidity {
        Some((h1_register, block_register)) => {
            let h1 = bus.read_u8(h1_register)?;
            let mut block = [0u8; HUMIDITY_CALIBRATION_LEN];
            bus.read_block(block_register, &mut block)?;
            coefficients.with_humidity(HumidityCoefficients::from_registers(h1, &block))
        }
        None => coefficients,
    };

    debug!("calibration loaded: {}", coefficients);
    Ok(coefficients)
}
