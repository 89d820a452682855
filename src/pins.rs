//! GPIO pin assignments for the medicine box board (ESP32-WROOM-32).
//!
//! Single source of truth for the wiring.  `main` claims the matching
//! `esp_idf_hal` pin singletons; the numbers here are what gets logged.

// ---------------------------------------------------------------------------
// Door servo
// ---------------------------------------------------------------------------

/// LEDC PWM output to the servo signal wire.
pub const SERVO_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// DHT22 climate sensors (single-wire, open-drain with 10 kΩ pull-up)
// ---------------------------------------------------------------------------

pub const DHT1_GPIO: i32 = 14;
pub const DHT2_GPIO: i32 = 27;
pub const DHT3_GPIO: i32 = 26;

/// Data pins indexed by sensor number minus one.
pub const DHT_GPIOS: [i32; 3] = [DHT1_GPIO, DHT2_GPIO, DHT3_GPIO];
