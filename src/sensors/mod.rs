//! Climate sensing: sensor identities, sample types and the [`SensorBank`]
//! that owns the three DHT22 drivers.
//!
//! The domain only ever sees a [`ClimateSample`]: a raw humidity /
//! temperature pair where NaN in either field means the read failed.
//! [`ClimateSample::validate`] is the single place that interprets it.

pub mod dht22;

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorError;
use dht22::Dht22;

// ───────────────────────────────────────────────────────────────
// Sensor identity
// ───────────────────────────────────────────────────────────────

/// One of the three physically distinct sensors, numbered as the user
/// sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SensorId {
    #[default]
    One,
    Two,
    Three,
}

impl SensorId {
    pub const ALL: [SensorId; 3] = [SensorId::One, SensorId::Two, SensorId::Three];

    /// User-facing sensor number (1-3).
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Zero-based slot in the bank.
    pub const fn index(self) -> usize {
        self.number() as usize - 1
    }

    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            _ => None,
        }
    }

    /// Map an ASCII digit command byte (`b'1'`..=`b'3'`) to a sensor.
    pub const fn from_digit(byte: u8) -> Option<Self> {
        if byte < b'0' {
            return None;
        }
        Self::from_number(byte - b'0')
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

// ───────────────────────────────────────────────────────────────
// Samples
// ───────────────────────────────────────────────────────────────

/// Raw result of one sensor poll.  NaN in either field marks a failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    /// Relative humidity, percent.
    pub humidity: f32,
    /// Temperature, degrees Celsius.
    pub temperature: f32,
}

impl ClimateSample {
    /// What a failed read looks like on the port.
    pub const FAILED: Self = Self {
        humidity: f32::NAN,
        temperature: f32::NAN,
    };

    pub const fn new(humidity: f32, temperature: f32) -> Self {
        Self {
            humidity,
            temperature,
        }
    }

    /// Accept the sample only if both values are numbers.
    pub fn validate(self) -> Result<ClimateReading, SensorError> {
        if self.humidity.is_nan() || self.temperature.is_nan() {
            return Err(SensorError::NotANumber);
        }
        Ok(ClimateReading {
            humidity_pct: self.humidity,
            temperature_c: self.temperature,
        })
    }
}

/// A validated measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub humidity_pct: f32,
    pub temperature_c: f32,
}

impl From<ClimateReading> for ClimateSample {
    fn from(r: ClimateReading) -> Self {
        Self::new(r.humidity_pct, r.temperature_c)
    }
}

impl From<Result<ClimateReading, SensorError>> for ClimateSample {
    fn from(r: Result<ClimateReading, SensorError>) -> Self {
        r.map_or(Self::FAILED, Self::from)
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor bank
// ───────────────────────────────────────────────────────────────

/// Owns one DHT22 driver per [`SensorId`].
///
/// All three data lines share a pin type (`esp_idf_hal` downgrades them to
/// `AnyIOPin`), so a plain array is enough.
pub struct SensorBank<P> {
    sensors: [Dht22<P>; 3],
}

impl<P> SensorBank<P>
where
    P: InputPin + OutputPin,
{
    /// Build the bank from data pins ordered sensor 1, 2, 3.
    pub fn new(pins: [P; 3]) -> Self {
        Self {
            sensors: pins.map(Dht22::new),
        }
    }

    /// Release every data line so the sensors sit idle-high.
    pub fn begin(&mut self) -> Result<(), SensorError> {
        for sensor in &mut self.sensors {
            sensor.begin()?;
        }
        Ok(())
    }

    /// Perform one full read of `id`.
    pub fn read(
        &mut self,
        id: SensorId,
        delay: &mut impl DelayNs,
    ) -> Result<ClimateReading, SensorError> {
        self.sensors[id.index()].read(delay)
    }
}
