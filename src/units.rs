//! Affine unit conversion.
//!
//! Every unit of a quantity is defined against that quantity's SI reference
//! unit: `value_in_unit = value_in_reference * gain + base`. Units carry their
//! quantity as a type parameter, so converting between quantities does not
//! compile:
//!
//! ```compile_fail
//! use env_compensation::units::{convert, CELSIUS, PASCAL};
//!
//! convert(20.0, CELSIUS, PASCAL);
//! ```

use core::fmt;
use core::marker::PhantomData;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Temperature {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pressure {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Altitude {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Illuminance {}

/// A unit of the quantity `Q`.
pub struct Unit<Q> {
    gain: f32,
    base: f32,
    symbol: &'static str,
    quantity: PhantomData<Q>,
}

impl<Q> Unit<Q> {
    /// `gain` must be non-zero.
    pub const fn new(gain: f32, base: f32, symbol: &'static str) -> Self {
        Self {
            gain,
            base,
            symbol,
            quantity: PhantomData,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn base(&self) -> f32 {
        self.base
    }

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }
}

// Implemented by hand so that `Q` needs no bounds.
impl<Q> Clone for Unit<Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Q> Copy for Unit<Q> {}

impl<Q> PartialEq for Unit<Q> {
    fn eq(&self, other: &Self) -> bool {
        self.gain == other.gain && self.base == other.base && self.symbol == other.symbol
    }
}

impl<Q> fmt::Debug for Unit<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("gain", &self.gain)
            .field("base", &self.base)
            .field("symbol", &self.symbol)
            .finish()
    }
}

/// SI reference.
pub const KELVIN: Unit<Temperature> = Unit::new(1.0, 0.0, "K");
pub const CELSIUS: Unit<Temperature> = Unit::new(1.0, -273.15, "°C");
pub const FAHRENHEIT: Unit<Temperature> = Unit::new(1.8, -459.67, "°F");

/// SI reference.
pub const PASCAL: Unit<Pressure> = Unit::new(1.0, 0.0, "Pa");
pub const HECTOPASCAL: Unit<Pressure> = Unit::new(1e-2, 0.0, "hPa");
pub const BAR: Unit<Pressure> = Unit::new(1e-5, 0.0, "bar");
pub const ATMOSPHERE: Unit<Pressure> = Unit::new(1.0 / 101_325.0, 0.0, "atm");
pub const PSI: Unit<Pressure> = Unit::new(1.0 / 6_894.757, 0.0, "psi");

/// SI reference.
pub const METRE: Unit<Altitude> = Unit::new(1.0, 0.0, "m");
pub const FOOT: Unit<Altitude> = Unit::new(1.0 / 0.3048, 0.0, "ft");

/// SI reference.
pub const LUX: Unit<Illuminance> = Unit::new(1.0, 0.0, "lx");

/// Converts `value` from one unit to another unit of the same quantity.
///
/// # Examples
///
/// ```
/// use env_compensation::units::{convert, CELSIUS, FAHRENHEIT};
///
/// let boiling = convert(100.0, CELSIUS, FAHRENHEIT);
/// assert!((boiling - 212.0).abs() < 1e-3);
/// ```
pub fn convert<Q>(value: f32, from: Unit<Q>, to: Unit<Q>) -> f32 {
    if from == to {
        return value;
    }
    (value - from.base) / from.gain * to.gain + to.base
}
