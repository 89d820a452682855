//! System configuration parameters
//!
//! All tunable parameters for the medicine box controller.  There is no
//! config file and nothing is persisted: the firmware boots with
//! [`SystemConfig::default()`], validates it, and logs it once.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Longest Bluetooth device name we will advertise.
pub const MAX_DEVICE_NAME_LEN: usize = 32;

/// Largest angle the servo accepts.
pub const SERVO_MAX_ANGLE: u8 = 180;

/// How door motion is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    /// Run the whole ramp inside the command handler, sleeping between
    /// steps.  Commands that arrive meanwhile wait in the inbox.
    Blocking,
    /// Install the ramp and advance it one step per elapsed
    /// `step_delay_ms` from the main loop.
    Ticked,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Wireless ---
    /// Name the SPP server advertises under
    pub device_name: String,

    // --- Door ---
    /// Angle for an open lid (degrees)
    pub open_angle: u8,
    /// Angle for a closed lid (degrees)
    pub close_angle: u8,
    /// Angle increment per ramp step (degrees)
    pub step_degrees: f32,
    /// Pause between ramp steps (milliseconds)
    pub step_delay_ms: u32,
    /// Time allowed for the servo to reach the closed position at boot (milliseconds)
    pub settle_ms: u32,
    /// Blocking or ticked ramp execution
    pub motion_mode: MotionMode,

    // --- Servo PWM ---
    /// Servo frame rate (Hz)
    pub servo_freq_hz: u32,
    /// Pulse width at 0 degrees (microseconds)
    pub servo_min_pulse_us: u32,
    /// Pulse width at 180 degrees (microseconds)
    pub servo_max_pulse_us: u32,

    // --- Timing ---
    /// Main loop idle period between inbox polls (milliseconds)
    pub poll_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Wireless
            device_name: String::from("ESP32_Door_Control"),

            // Door
            open_angle: 90,
            close_angle: 0,
            step_degrees: 0.5,
            step_delay_ms: 20,
            settle_ms: 500,
            motion_mode: MotionMode::Blocking,

            // Servo PWM (standard hobby servo)
            servo_freq_hz: 50,
            servo_min_pulse_us: 500,
            servo_max_pulse_us: 2400,

            // Timing
            poll_interval_ms: 1,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() || self.device_name.len() > MAX_DEVICE_NAME_LEN {
            return Err(ConfigError::ValidationFailed(
                "device_name must be 1-32 bytes",
            ));
        }
        if !self.device_name.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err(ConfigError::ValidationFailed(
                "device_name must be printable ASCII",
            ));
        }
        if self.open_angle > SERVO_MAX_ANGLE || self.close_angle > SERVO_MAX_ANGLE {
            return Err(ConfigError::ValidationFailed(
                "door angles must be within 0-180",
            ));
        }
        if !self.step_degrees.is_finite() || self.step_degrees <= 0.0 {
            return Err(ConfigError::ValidationFailed("step_degrees must be > 0"));
        }
        if self.servo_freq_hz == 0 {
            return Err(ConfigError::ValidationFailed("servo_freq_hz must be > 0"));
        }
        if self.servo_min_pulse_us >= self.servo_max_pulse_us {
            return Err(ConfigError::ValidationFailed(
                "servo_min_pulse_us must be below servo_max_pulse_us",
            ));
        }
        if self.servo_max_pulse_us > self.servo_period_us() {
            return Err(ConfigError::ValidationFailed(
                "servo_max_pulse_us exceeds the PWM period",
            ));
        }
        Ok(())
    }

    /// Length of one PWM frame in microseconds.
    pub fn servo_period_us(&self) -> u32 {
        1_000_000 / self.servo_freq_hz.max(1)
    }
}
