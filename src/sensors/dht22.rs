//! DHT22 (AM2302) temperature / humidity sensor.
//!
//! Single-wire, open-drain protocol:
//!
//! ```text
//!  host    ▔▔▔▁▁▁▁▁▁▁▁▁▁▔▔▔┐
//!               ≥1.1 ms    │ release
//!  sensor                  └▁▁▁▁▔▔▔▔┐ 80 µs low, 80 µs high (response)
//!                                   └─ 40 bits: 50 µs low + 26 µs (0) / 70 µs (1) high
//! ```
//!
//! Frame: humidity ×10 (u16 BE), temperature ×10 (sign bit + 15-bit
//! magnitude, BE), checksum = low byte of the sum of the first four bytes.
//!
//! ## Dual-target design
//!
//! Generic over `embedded-hal` 1.0 pin and delay traits.  On ESP-IDF the
//! pin is a `PinDriver<AnyIOPin, InputOutput>` in open-drain mode and the
//! delay is `Ets` (busy-wait).  On host/test a simulated line plays back a
//! recorded waveform.
//!
//! Pulse widths are measured by counting 1 µs polls.  Loop overhead
//! stretches every count by the same factor, so a bit is decided by
//! comparing its high phase against its own low phase instead of
//! against an absolute threshold.
//!
//! Everything after the start pulse runs inside `critical_section::with`.
//! A task switch or interrupt during a bit would stretch one phase and
//! corrupt the frame.  The span is about 5 ms.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use super::ClimateReading;
use crate::error::SensorError;

/// Host start pulse.  The datasheet asks for at least 1 ms.
const START_LOW_US: u32 = 1_100;
/// Longest phase the sensor ever drives is 80 µs.
const EDGE_TIMEOUT_US: u32 = 100;
const FRAME_BITS: usize = 40;

pub struct Dht22<P> {
    pin: P,
}

impl<P> Dht22<P>
where
    P: InputPin + OutputPin,
{
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Release the line (idle high).
    pub fn begin(&mut self) -> Result<(), SensorError> {
        self.pin.set_high().map_err(|_| SensorError::Pin)
    }

    /// Run one complete transaction and decode it.
    pub fn read(&mut self, delay: &mut impl DelayNs) -> Result<ClimateReading, SensorError> {
        let frame = self.read_frame(delay)?;
        decode_frame(&frame)
    }

    fn read_frame(&mut self, delay: &mut impl DelayNs) -> Result<[u8; 5], SensorError> {
        self.pin.set_low().map_err(|_| SensorError::Pin)?;
        delay.delay_us(START_LOW_US);
        critical_section::with(|_| self.release_and_receive(delay))
    }

    /// Release the line and clock in the response and 40 data bits.
    fn release_and_receive(&mut self, delay: &mut impl DelayNs) -> Result<[u8; 5], SensorError> {
        self.pin.set_high().map_err(|_| SensorError::Pin)?;

        // Response: pull-up phase, 80 µs low, 80 µs high.
        self.wait_while(true, delay)?;
        self.wait_while(false, delay)?;
        self.wait_while(true, delay)?;

        let mut frame = [0u8; 5];
        for bit in 0..FRAME_BITS {
            let low = self.wait_while(false, delay)?;
            let high = self.wait_while(true, delay)?;
            if high > low {
                frame[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        Ok(frame)
    }

    /// Poll until the line leaves `level_high`; returns the poll count.
    fn wait_while(
        &mut self,
        level_high: bool,
        delay: &mut impl DelayNs,
    ) -> Result<u32, SensorError> {
        let mut elapsed = 0;
        while self.pin.is_high().map_err(|_| SensorError::Pin)? == level_high {
            if elapsed >= EDGE_TIMEOUT_US {
                return Err(SensorError::Timeout);
            }
            delay.delay_us(1);
            elapsed += 1;
        }
        Ok(elapsed)
    }
}

/// Verify and decode a raw 5-byte frame.
pub fn decode_frame(frame: &[u8; 5]) -> Result<ClimateReading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::Checksum);
    }

    let humidity = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
    let magnitude = f32::from(u16::from_be_bytes([frame[2] & 0x7F, frame[3]])) / 10.0;
    let temperature = if frame[2] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok(ClimateReading {
        humidity_pct: humidity,
        temperature_c: temperature,
    })
}
