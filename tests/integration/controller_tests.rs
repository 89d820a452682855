//! Integration tests for the command → DoorController → ports pipeline.
//!
//! These run on the host (x86_64) and drive the controller exactly the way
//! the firmware main loop does, with mock hardware behind the ports.

use medbox::adapters::bt_serial::BtSerialAdapter;
use medbox::adapters::report_sink::ReportSink;
use medbox::app::commands::Command;
use medbox::app::events::AppEvent;
use medbox::app::service::{DoorController, DoorGoal};
use medbox::config::{MotionMode, SystemConfig};
use medbox::inbox::Inbox;
use medbox::sensors::{ClimateSample, SensorId};

use crate::mock_hw::{EventLog, LineLog, MockDelay, MockHardware, ScriptedBytes};

fn config(mode: MotionMode) -> SystemConfig {
    SystemConfig {
        motion_mode: mode,
        ..SystemConfig::default()
    }
}

/// Started controller with the boot-time records cleared.
fn make_controller(
    mode: MotionMode,
) -> (DoorController, MockHardware, MockDelay, EventLog) {
    let mut ctl = DoorController::new(&config(mode));
    let mut hw = MockHardware::new();
    let mut delay = MockDelay::new();
    let mut sink = EventLog::new();
    ctl.start(&mut hw, &mut delay, &mut sink);
    hw.servo_writes.clear();
    delay.delays_ms.clear();
    delay.total_ns = 0;
    sink.events.clear();
    (ctl, hw, delay, sink)
}

fn send(
    bytes: &[u8],
    ctl: &mut DoorController,
    hw: &mut MockHardware,
    delay: &mut MockDelay,
    sink: &mut EventLog,
) {
    for &b in bytes {
        ctl.handle_command(Command::decode(b), hw, delay, sink);
    }
}

/// Writes for a full 0° → 90° ramp at 0.5° per step.
fn open_sequence() -> Vec<u8> {
    let mut v: Vec<u8> = (1..=179).map(|i| (i as f32 * 0.5) as u8).collect();
    v.push(90);
    v
}

/// Writes for a full 90° → 0° ramp at 0.5° per step.
fn close_sequence() -> Vec<u8> {
    let mut v: Vec<u8> = (1..=179).map(|i| (90.0 - i as f32 * 0.5) as u8).collect();
    v.push(0);
    v
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn start_parks_door_without_ramp() {
    let mut ctl = DoorController::new(&SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut delay = MockDelay::new();
    let mut sink = EventLog::new();

    ctl.start(&mut hw, &mut delay, &mut sink);

    assert_eq!(hw.servo_writes, [0]);
    assert_eq!(delay.delays_ms, [500]);
    assert_eq!(
        sink.events,
        [AppEvent::Started {
            angle: 0,
            sensor: SensorId::One
        }]
    );
    assert!(sink.lines().is_empty(), "boot prints nothing to the peer");
}

// ── Door motion (blocking) ────────────────────────────────────

#[test]
fn open_ramps_in_half_degree_steps() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);

    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);

    assert_eq!(hw.servo_writes, open_sequence());
    assert_eq!(delay.delays_ms.len(), 179);
    assert!(delay.delays_ms.iter().all(|&ms| ms == 20));
    assert_eq!(ctl.current_angle(), 90);
    assert_eq!(sink.lines(), ["门已开启"]);
}

#[test]
fn close_ramps_back_down() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);
    hw.servo_writes.clear();
    sink.events.clear();

    send(b"C", &mut ctl, &mut hw, &mut delay, &mut sink);

    assert_eq!(hw.servo_writes, close_sequence());
    assert_eq!(ctl.current_angle(), 0);
    assert_eq!(sink.lines(), ["门已关闭"]);
}

#[test]
fn every_write_stays_between_start_and_target() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);
    assert!(hw.servo_writes.iter().all(|&a| a <= 90));
    assert!(hw.servo_writes.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn open_when_already_open_just_snaps() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);
    hw.servo_writes.clear();
    delay.delays_ms.clear();
    sink.events.clear();

    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);

    assert_eq!(hw.servo_writes, [90]);
    assert!(delay.delays_ms.is_empty());
    assert_eq!(sink.lines(), ["门已开启"]);
}

#[test]
fn close_when_already_closed_just_snaps() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    send(b"C", &mut ctl, &mut hw, &mut delay, &mut sink);
    assert_eq!(hw.servo_writes, [0]);
    assert_eq!(sink.lines(), ["门已关闭"]);
}

#[test]
fn full_open_takes_about_three_and_a_half_seconds() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);
    assert_eq!(delay.total_ms(), 179 * 20);
}

#[test]
fn move_blocking_reports_step_count() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    let steps = ctl.move_blocking(DoorGoal::Open, &mut hw, &mut delay, &mut sink);
    assert_eq!(steps, 179);
    let steps = ctl.move_blocking(DoorGoal::Open, &mut hw, &mut delay, &mut sink);
    assert_eq!(steps, 0);
}

#[test]
fn custom_angles_and_step_size() {
    let cfg = SystemConfig {
        open_angle: 120,
        close_angle: 10,
        step_degrees: 1.0,
        ..SystemConfig::default()
    };
    let mut ctl = DoorController::new(&cfg);
    let mut hw = MockHardware::new();
    let mut delay = MockDelay::new();
    let mut sink = EventLog::new();
    ctl.start(&mut hw, &mut delay, &mut sink);
    assert_eq!(hw.servo_writes, [10]);
    hw.servo_writes.clear();

    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);

    let expected: Vec<u8> = (11..=120).collect();
    assert_eq!(hw.servo_writes, expected);
    assert_eq!(ctl.current_angle(), 120);
}

// ── Sensor selection and reporting ────────────────────────────

#[test]
fn digit_selects_and_reports() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);

    send(b"2", &mut ctl, &mut hw, &mut delay, &mut sink);

    assert_eq!(ctl.selected_sensor(), SensorId::Two);
    assert_eq!(hw.reads, [SensorId::Two]);
    assert_eq!(sink.lines(), ["传感器2 - 温度: 23.4°C, 湿度: 50.2%"]);
    assert!(hw.servo_writes.is_empty());
}

#[test]
fn read_reports_selected_sensor_each_time() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);

    send(b"R3RR", &mut ctl, &mut hw, &mut delay, &mut sink);

    assert_eq!(
        hw.reads,
        [SensorId::One, SensorId::Three, SensorId::Three, SensorId::Three]
    );
    assert_eq!(
        sink.lines(),
        [
            "传感器1 - 温度: 21.5°C, 湿度: 45.0%",
            "传感器3 - 温度: 19.8°C, 湿度: 61.0%",
            "传感器3 - 温度: 19.8°C, 湿度: 61.0%",
            "传感器3 - 温度: 19.8°C, 湿度: 61.0%",
        ]
    );
}

/// Lines printed for `bytes` on a fresh controller whose sensor `id`
/// returns `sample`.
fn report_lines(bytes: &[u8], id: SensorId, sample: ClimateSample) -> Vec<String> {
    let (mut ctl, _, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    let mut hw = MockHardware::new().with_sample(id, sample);
    send(bytes, &mut ctl, &mut hw, &mut delay, &mut sink);
    sink.lines()
}

#[test]
fn read_after_select_repeats_the_direct_report() {
    let samples = [ClimateSample::new(38.6, 24.1), ClimateSample::FAILED];
    for id in SensorId::ALL {
        let digit = b'0' + id.number();
        for sample in samples {
            let direct = report_lines(&[digit], id, sample);
            let then_read = report_lines(&[digit, b'R'], id, sample);

            assert_eq!(direct.len(), 1);
            assert_eq!(then_read, [direct[0].clone(), direct[0].clone()], "sensor {id}");
        }
    }
}

#[test]
fn failed_read_still_changes_selection() {
    let (mut ctl, _, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    let mut hw = MockHardware::new().with_sample(SensorId::Two, ClimateSample::FAILED);

    send(b"2", &mut ctl, &mut hw, &mut delay, &mut sink);

    assert_eq!(ctl.selected_sensor(), SensorId::Two);
    assert_eq!(sink.lines(), ["传感器2读取失败"]);
    assert_eq!(
        sink.events,
        [AppEvent::SensorReadFailed {
            sensor: SensorId::Two
        }]
    );
}

#[test]
fn nan_in_one_field_is_a_failure() {
    let (mut ctl, _, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    let mut hw = MockHardware::new()
        .with_sample(SensorId::One, ClimateSample::new(40.0, f32::NAN))
        .with_sample(SensorId::Three, ClimateSample::new(f32::NAN, 20.0));

    send(b"R3", &mut ctl, &mut hw, &mut delay, &mut sink);

    assert_eq!(sink.lines(), ["传感器1读取失败", "传感器3读取失败"]);
}

#[test]
fn negative_temperature_is_reported() {
    let (mut ctl, _, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    let mut hw = MockHardware::new().with_sample(SensorId::One, ClimateSample::new(80.0, -5.3));

    send(b"R", &mut ctl, &mut hw, &mut delay, &mut sink);

    assert_eq!(sink.lines(), ["传感器1 - 温度: -5.3°C, 湿度: 80.0%"]);
}

// ── Unrecognized input ────────────────────────────────────────

#[test]
fn unknown_bytes_change_nothing() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);

    send(b"ocrX04\r\n ", &mut ctl, &mut hw, &mut delay, &mut sink);

    assert!(hw.servo_writes.is_empty());
    assert!(hw.reads.is_empty());
    assert!(delay.delays_ms.is_empty());
    assert!(sink.lines().is_empty());
    assert!(sink
        .events
        .iter()
        .all(|e| matches!(e, AppEvent::CommandIgnored(_))));
    assert_eq!(ctl.current_angle(), 0);
    assert_eq!(ctl.selected_sensor(), SensorId::One);
    assert_eq!(ctl.commands_handled(), 9);
}

// ── Command reader ────────────────────────────────────────────

#[test]
fn poll_consumes_one_byte_per_call() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    let mut rx = ScriptedBytes::new(b"OR");

    assert_eq!(
        ctl.poll(&mut rx, &mut hw, &mut delay, &mut sink),
        Some(Command::Open)
    );
    assert_eq!(rx.remaining(), 1);
    assert!(hw.reads.is_empty());

    assert_eq!(
        ctl.poll(&mut rx, &mut hw, &mut delay, &mut sink),
        Some(Command::ReadSelected)
    );
    assert_eq!(ctl.poll(&mut rx, &mut hw, &mut delay, &mut sink), None);
    assert_eq!(sink.lines().len(), 2);
}

#[test]
fn queued_bytes_run_after_motion_in_order() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Blocking);
    let mut rx = ScriptedBytes::new(b"O1C");

    while ctl.poll(&mut rx, &mut hw, &mut delay, &mut sink).is_some() {}

    assert_eq!(
        sink.lines(),
        ["门已开启", "传感器1 - 温度: 21.5°C, 湿度: 45.0%", "门已关闭"]
    );
    let mut writes = open_sequence();
    writes.extend(close_sequence());
    assert_eq!(hw.servo_writes, writes);
}

#[test]
fn open_select_close_over_the_wireless_link() {
    let inbox: &'static Inbox = Box::leak(Box::new(Inbox::new()));
    let mut bt = BtSerialAdapter::new("ESP32_Door_Control", inbox);
    bt.start().unwrap();
    bt.sim_set_connected(true);

    let mut ctl = DoorController::new(&SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut delay = MockDelay::new();
    let mut sinks = (EventLog::new(), ReportSink::new(LineLog::default(), bt));
    ctl.start(&mut hw, &mut delay, &mut sinks);

    assert_eq!(inbox.push_slice(b"O2C"), 3);
    let mut commands = sinks.1.wireless().commands();
    while ctl.poll(&mut commands, &mut hw, &mut delay, &mut sinks).is_some() {}

    let expected = [
        "门已开启",
        "传感器2 - 温度: 23.4°C, 湿度: 50.2%",
        "门已关闭",
    ];
    let wire = "门已开启\r\n传感器2 - 温度: 23.4°C, 湿度: 50.2%\n门已关闭\r\n";
    assert_eq!(sinks.1.console().lines, expected);
    assert_eq!(sinks.1.console().raw, wire);
    assert_eq!(sinks.1.wireless().sim_wire(), wire.as_bytes());
    assert_eq!(sinks.0.lines(), expected);
    assert_eq!(ctl.current_angle(), 0);
    assert_eq!(ctl.selected_sensor(), SensorId::Two);
}

#[test]
fn console_still_reports_without_a_peer() {
    let inbox: &'static Inbox = Box::leak(Box::new(Inbox::new()));
    let mut bt = BtSerialAdapter::new("ESP32_Door_Control", inbox);
    bt.start().unwrap();

    let mut ctl = DoorController::new(&SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut delay = MockDelay::new();
    let mut sink = ReportSink::new(LineLog::default(), bt);

    ctl.handle_command(Command::ReadSelected, &mut hw, &mut delay, &mut sink);

    assert_eq!(sink.console().lines, ["传感器1 - 温度: 21.5°C, 湿度: 45.0%"]);
    assert!(sink.wireless().sim_wire().is_empty());
}

// ── Door motion (ticked) ──────────────────────────────────────

/// Tick every `step_ms` from `now` until the ramp finishes; returns the
/// time of arrival.
fn run_ticks(
    ctl: &mut DoorController,
    hw: &mut MockHardware,
    sink: &mut EventLog,
    mut now: u64,
    step_ms: u64,
) -> u64 {
    while ctl.tick(now, hw, sink) {
        now += step_ms;
    }
    now
}

#[test]
fn ticked_open_matches_blocking_sequence() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Ticked);

    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);
    assert!(ctl.is_moving());
    assert!(hw.servo_writes.is_empty());
    assert!(delay.delays_ms.is_empty());

    let arrived_at = run_ticks(&mut ctl, &mut hw, &mut sink, 0, 20);

    assert_eq!(arrived_at, 179 * 20);
    assert_eq!(hw.servo_writes, open_sequence());
    assert_eq!(ctl.current_angle(), 90);
    assert!(!ctl.is_moving());
    assert_eq!(sink.lines(), ["门已开启"]);
}

#[test]
fn ticks_before_the_step_period_do_nothing() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Ticked);
    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);

    assert!(ctl.tick(100, &mut hw, &mut sink));
    assert_eq!(hw.servo_writes.len(), 1);
    for now in 101..120 {
        assert!(ctl.tick(now, &mut hw, &mut sink));
    }
    assert_eq!(hw.servo_writes.len(), 1);
    assert!(ctl.tick(120, &mut hw, &mut sink));
    assert_eq!(hw.servo_writes.len(), 2);
}

#[test]
fn reversing_mid_step_waits_out_the_step_period() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Ticked);
    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);
    assert!(ctl.tick(1_000, &mut hw, &mut sink));
    assert_eq!(hw.servo_writes, [0]);

    send(b"C", &mut ctl, &mut hw, &mut delay, &mut sink);
    for now in 1_001..1_020 {
        assert!(ctl.tick(now, &mut hw, &mut sink));
    }
    assert_eq!(hw.servo_writes, [0], "no write inside the step period");

    assert!(!ctl.tick(1_020, &mut hw, &mut sink));
    assert_eq!(hw.servo_writes, [0, 0]);
    assert_eq!(sink.lines(), ["门已关闭"]);
}

#[test]
fn idle_tick_is_a_no_op() {
    let (mut ctl, mut hw, _, mut sink) = make_controller(MotionMode::Ticked);
    assert!(!ctl.tick(1_000, &mut hw, &mut sink));
    assert!(hw.servo_writes.is_empty());
    assert!(sink.events.is_empty());
}

#[test]
fn sensor_commands_are_served_mid_motion() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Ticked);
    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);
    for now in 0..10 {
        ctl.tick(now * 20, &mut hw, &mut sink);
    }

    send(b"3", &mut ctl, &mut hw, &mut delay, &mut sink);

    assert!(ctl.is_moving());
    assert_eq!(hw.reads, [SensorId::Three]);
    assert_eq!(sink.lines(), ["传感器3 - 温度: 19.8°C, 湿度: 61.0%"]);
}

#[test]
fn close_mid_motion_reverses_from_current_position() {
    let (mut ctl, mut hw, mut delay, mut sink) = make_controller(MotionMode::Ticked);
    send(b"O", &mut ctl, &mut hw, &mut delay, &mut sink);
    for i in 0..75 {
        ctl.tick(i * 20, &mut hw, &mut sink);
    }
    assert_eq!(hw.last_angle(), Some(37));
    hw.servo_writes.clear();

    send(b"C", &mut ctl, &mut hw, &mut delay, &mut sink);
    assert_eq!(ctl.motion_target(), Some(0));
    run_ticks(&mut ctl, &mut hw, &mut sink, 75 * 20, 20);

    assert_eq!(hw.servo_writes.len(), 75);
    assert_eq!(hw.servo_writes[0], 37);
    assert_eq!(hw.last_angle(), Some(0));
    assert_eq!(ctl.current_angle(), 0);
    assert_eq!(sink.lines(), ["门已关闭"], "the aborted open never reports");
}
