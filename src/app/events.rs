//! Outbound application events.
//!
//! The [`DoorController`](super::service::DoorController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Events that the
//! user should see render to a fixed text line via [`AppEvent::report_line`];
//! the wording is part of the wire contract and must not change.

use crate::sensors::{ClimateReading, SensorId};

pub const LINE_DOOR_OPENED: &str = "门已开启";
pub const LINE_DOOR_CLOSED: &str = "门已关闭";

/// Terminator written after a line's text.
///
/// Door lines and boot banners end in CR LF; sensor lines end in a bare LF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Console-only boot banner once the SPP server is up.
pub const LINE_BT_READY: &str = "蓝牙设备已启动，可以配对了！";
/// Console-only boot banner once the sensor lines are released.
pub const LINE_SENSORS_READY: &str = "DHT22传感器已初始化";

/// Structured events emitted by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller parked the door and is ready for commands.
    Started { angle: u8, sensor: SensorId },

    /// A ramp toward `to` has begun.
    DoorMoving { from: u8, to: u8 },

    /// The door reached the open angle.
    DoorOpened { angle: u8 },

    /// The door reached the closed angle.
    DoorClosed { angle: u8 },

    /// A sensor produced a valid measurement.
    SensorReport {
        sensor: SensorId,
        reading: ClimateReading,
    },

    /// A sensor returned NaN for humidity or temperature.
    SensorReadFailed { sensor: SensorId },

    /// A byte outside the command vocabulary was received.
    CommandIgnored(u8),
}

impl AppEvent {
    /// The text line mirrored to the console and the wireless channel, or
    /// `None` for events that are only logged.
    pub fn report_line(&self) -> Option<String> {
        match self {
            Self::DoorOpened { .. } => Some(LINE_DOOR_OPENED.to_owned()),
            Self::DoorClosed { .. } => Some(LINE_DOOR_CLOSED.to_owned()),
            Self::SensorReport { sensor, reading } => Some(format!(
                "传感器{} - 温度: {:.1}°C, 湿度: {:.1}%",
                sensor.number(),
                reading.temperature_c,
                reading.humidity_pct,
            )),
            Self::SensorReadFailed { sensor } => {
                Some(format!("传感器{}读取失败", sensor.number()))
            }
            Self::Started { .. } | Self::DoorMoving { .. } | Self::CommandIgnored(_) => None,
        }
    }

    /// Terminator that follows [`report_line`](Self::report_line).
    pub fn line_ending(&self) -> LineEnding {
        match self {
            Self::DoorOpened { .. } | Self::DoorClosed { .. } => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }
}
