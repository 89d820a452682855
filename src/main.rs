//! Medicine Box Firmware: main entry point
//!
//! Hexagonal architecture with a single polling loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   BtSerialAdapter  ConsoleSink │
//! │  (Servo+Climate)   (EventSink)    (Command+Line)   (LineSink)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            DoorController (pure logic)                 │    │
//! │  │  command decode · servo ramp · sensor report           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::gpio::{AnyIOPin, InputOutput, PinDriver, Pull};
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use medbox::adapters::bt_serial::BtSerialAdapter;
use medbox::adapters::console::ConsoleSink;
use medbox::adapters::hardware::HardwareAdapter;
use medbox::adapters::log_sink::LogEventSink;
use medbox::adapters::report_sink::ReportSink;
use medbox::adapters::time::Esp32TimeAdapter;
use medbox::app::events::{LINE_BT_READY, LINE_SENSORS_READY, LineEnding};
use medbox::app::ports::LineSink;
use medbox::app::service::DoorController;
use medbox::config::{MotionMode, SystemConfig};
use medbox::drivers::servo::{PulseRange, ServoDriver};
use medbox::error::Error;
use medbox::inbox::WIRELESS_RX;
use medbox::pins;
use medbox::sensors::SensorBank;

/// Open-drain data line with the internal pull-up as backup to the
/// board's 10 kΩ resistor.
fn dht_line(pin: AnyIOPin) -> Result<PinDriver<'static, AnyIOPin, InputOutput>> {
    let mut line = PinDriver::input_output_od(pin)?;
    line.set_pull(Pull::Up)?;
    Ok(line)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  MedBox v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config.validate().map_err(Error::from)?;
    info!("Config: {}", serde_json::to_string(&config)?);

    let peripherals = Peripherals::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 3. Door servo (LEDC timer 0, 14-bit) ──────────────────
    let timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new()
            .frequency(Hertz(config.servo_freq_hz))
            .resolution(Resolution::Bits14),
    )?;
    let pwm = LedcDriver::new(peripherals.ledc.channel0, timer, peripherals.pins.gpio13)?;
    let servo = ServoDriver::new(pwm, PulseRange::from_config(&config));

    // ── 4. Climate sensors ────────────────────────────────────
    let sensors = SensorBank::new([
        dht_line(peripherals.pins.gpio14.into())?,
        dht_line(peripherals.pins.gpio27.into())?,
        dht_line(peripherals.pins.gpio26.into())?,
    ]);
    let mut hw = HardwareAdapter::new(servo, sensors, Ets);

    // ── 5. Bluetooth serial link ──────────────────────────────
    let mut console = ConsoleSink::new();
    let mut bt = BtSerialAdapter::new(&config.device_name, &WIRELESS_RX);
    bt.start(peripherals.modem, nvs).map_err(Error::from)?;
    console.write_line(LINE_BT_READY, LineEnding::CrLf);

    // ── 6. Park the door, release the sensor lines ────────────
    let mut controller = DoorController::new(&config);
    let mut sinks = (LogEventSink::new(), ReportSink::new(console, bt));
    controller.start(&mut hw, &mut FreeRtos, &mut sinks);

    hw.begin().map_err(Error::from)?;
    sinks.1.console_mut().write_line(LINE_SENSORS_READY, LineEnding::CrLf);

    info!(
        "Pins: servo=GPIO{} dht=GPIO{:?}",
        pins::SERVO_GPIO,
        pins::DHT_GPIOS
    );
    info!("System ready. Entering command loop.");

    // ── 7. Command loop ───────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut commands = sinks.1.wireless().commands();
    loop {
        controller.poll(&mut commands, &mut hw, &mut FreeRtos, &mut sinks);

        if controller.mode() == MotionMode::Ticked {
            controller.tick(clock.uptime_ms(), &mut hw, &mut sinks);
        }

        if let Some(lost) = sinks.1.wireless_mut().take_new_drops() {
            warn!("Inbox full: {} byte(s) dropped", lost);
        }

        FreeRtos::delay_ms(config.poll_interval_ms);
    }
}
