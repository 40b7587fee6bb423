/// Default I2C address of the BMP280 and BME280 (SDO pulled high).
pub const DEFAULT_ADDRESS: u8 = 0x77;

/// Value written to the reset register to trigger a power-on reset.
pub const RESET_COMMAND: u8 = 0xB6;

/// Time to wait after a soft reset before the calibration block is readable (ms).
pub const SETTLE_MS: u32 = 100;

/// Register addresses of one sensor family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterMap {
    pub reset: u8,
    /// Bit 3 is set while a conversion is running.
    pub status: u8,
    /// `ctrl_meas`: temperature/pressure oversampling and mode bits.
    pub control: u8,
    /// `ctrl_hum`: only takes effect after a write to `control`.
    pub control_humidity: Option<u8>,
    /// `config`: standby time and IIR filter.
    pub config: u8,
    /// Start of the 24-byte T1..P9 block.
    pub calibration: u8,
    /// H1, then the start of the 7-byte H2..H6 block.
    pub calibration_humidity: Option<(u8, u8)>,
    /// Start of the measurement burst.
    pub data: u8,
}

const BMP280: RegisterMap = RegisterMap {
    reset: 0xE0,
    status: 0xF3,
    control: 0xF4,
    control_humidity: None,
    config: 0xF5,
    calibration: 0x88,
    calibration_humidity: None,
    data: 0xF7,
};

const BME280: RegisterMap = RegisterMap {
    control_humidity: Some(0xF2),
    calibration_humidity: Some((0xA1, 0xE1)),
    ..BMP280
};

/// Bosch pressure sensors sharing the same decoding and compensation.
///
/// The BME280 adds a humidity channel (two more data bytes and six more
/// calibration coefficients) on top of the BMP280 layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Family {
    Bmp280,
    Bme280,
}

impl Family {
    pub fn registers(self) -> &'static RegisterMap {
        match self {
            Family::Bmp280 => &BMP280,
            Family::Bme280 => &BME280,
        }
    }

    pub fn has_humidity(self) -> bool {
        self.registers().calibration_humidity.is_some()
    }
}
