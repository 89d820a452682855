//! Application core: pure domain logic, zero I/O.
//!
//! Command decoding, door motion orchestration and sensor reporting.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
