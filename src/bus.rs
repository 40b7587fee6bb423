use embedded_hal::blocking::i2c::{Write, WriteRead};

/// Order in which the two bytes of a 16-bit register travel on the bus.
///
/// - `MsbFirst`: bits `[15..8]` at `register`, bits `[7..0]` at `register + 1`
/// - `LsbFirst`: bits `[7..0]` at `register`, bits `[15..8]` at `register + 1`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteOrder {
    MsbFirst,
    LsbFirst,
}

impl ByteOrder {
    fn to_bytes(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::MsbFirst => value.to_be_bytes(),
            ByteOrder::LsbFirst => value.to_le_bytes(),
        }
    }

    fn from_bytes(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::MsbFirst => u16::from_be_bytes(bytes),
            ByteOrder::LsbFirst => u16::from_le_bytes(bytes),
        }
    }
}

/// 8- and 16-bit register access to one device on an I2C bus.
#[derive(Debug)]
pub struct RegisterBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> RegisterBus<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    /// Returns a bus handle for the device at the 7-bit `address`.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// The 7-bit device address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Destroys the handle and returns the I2C peripheral.
    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn write_u8(&mut self, register: u8, value: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[register, value])
    }

    pub fn write_u16(&mut self, register: u8, value: u16, order: ByteOrder) -> Result<(), E> {
        let [first, second] = order.to_bytes(value);
        self.i2c.write(self.address, &[register, first, second])
    }

    pub fn read_u8(&mut self, register: u8) -> Result<u8, E> {
        let mut buffer = [0u8; 1];
        self.i2c.write_read(self.address, &[register], &mut buffer)?;
        Ok(buffer[0])
    }

    pub fn read_u16(&mut self, register: u8, order: ByteOrder) -> Result<u16, E> {
        let mut buffer = [0u8; 2];
        self.i2c.write_read(self.address, &[register], &mut buffer)?;
        Ok(order.from_bytes(buffer))
    }

    /// Fills `buffer` from consecutive registers starting at `register`.
    pub fn read_block(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), E> {
        self.i2c.write_read(self.address, &[register], buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::{
        i2c::{Mock, Transaction},
        MockError,
    };
    use std::io::ErrorKind;

    const ADDRESS: u8 = 0x44;

    fn bus(expectations: &[Transaction]) -> RegisterBus<Mock> {
        RegisterBus::new(Mock::new(expectations), ADDRESS)
    }

    #[test]
    fn reads_u16_in_both_orders() {
        let mut bus = bus(&[
            Transaction::write_read(ADDRESS, vec![0x88], vec![0x70, 0x6B]),
            Transaction::write_read(ADDRESS, vec![0x01], vec![0xC4, 0x10]),
        ]);

        assert_eq!(bus.read_u16(0x88, ByteOrder::LsbFirst), Ok(27504));
        assert_eq!(bus.read_u16(0x01, ByteOrder::MsbFirst), Ok(0xC410));
        bus.release().done();
    }

    #[test]
    fn writes_u16_in_both_orders() {
        let mut bus = bus(&[
            Transaction::write(ADDRESS, vec![0x01, 0xCC, 0x10]),
            Transaction::write(ADDRESS, vec![0x01, 0x10, 0xCC]),
        ]);

        assert_eq!(bus.write_u16(0x01, 0xCC10, ByteOrder::MsbFirst), Ok(()));
        assert_eq!(bus.write_u16(0x01, 0xCC10, ByteOrder::LsbFirst), Ok(()));
        bus.release().done();
    }

    #[test]
    fn single_bytes_and_blocks() {
        let mut bus = bus(&[
            Transaction::write(ADDRESS, vec![0xE0, 0xB6]),
            Transaction::write_read(ADDRESS, vec![0xA1], vec![0x4B]),
            Transaction::write_read(ADDRESS, vec![0xF7], vec![1, 2, 3]),
        ]);

        assert_eq!(bus.write_u8(0xE0, 0xB6), Ok(()));
        assert_eq!(bus.read_u8(0xA1), Ok(0x4B));

        let mut block = [0u8; 3];
        assert_eq!(bus.read_block(0xF7, &mut block), Ok(()));
        assert_eq!(block, [1, 2, 3]);
        bus.release().done();
    }

    #[test]
    fn propagates_bus_errors() {
        let mut bus = bus(&[Transaction::write_read(ADDRESS, vec![0xA1], vec![0x00])
            .with_error(MockError::Io(ErrorKind::Other))]);

        assert!(bus.read_u8(0xA1).is_err());
        bus.release().done();
    }
}
