//! Inbound commands to the door controller.
//!
//! Every byte received on the wireless channel is one complete command.
//! [`Command::decode`] is total: bytes outside the vocabulary decode to
//! [`Command::Unrecognized`] rather than being dropped silently.

use crate::sensors::SensorId;

/// Commands the remote side can send, one ASCII byte each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `'O'`: drive the lid to the open angle.
    Open,
    /// `'C'`: drive the lid to the closed angle.
    Close,
    /// `'1'` / `'2'` / `'3'`: select a sensor and report it immediately.
    SelectSensor(SensorId),
    /// `'R'`: report the currently selected sensor.
    ReadSelected,
    /// Anything else.  Carries the raw byte for logging.
    Unrecognized(u8),
}

impl Command {
    /// Decode one received byte.  Case-sensitive.
    pub fn decode(byte: u8) -> Self {
        match byte {
            b'O' => Self::Open,
            b'C' => Self::Close,
            b'R' => Self::ReadSelected,
            other => match SensorId::from_digit(other) {
                Some(id) => Self::SelectSensor(id),
                None => Self::Unrecognized(other),
            },
        }
    }
}

impl From<u8> for Command {
    fn from(byte: u8) -> Self {
        Self::decode(byte)
    }
}
