//! Medicine-box firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod inbox;
pub mod pins;

// Hardware-facing modules; each carries its own host simulation so the
// crate builds and tests off-target.
pub mod adapters;
pub mod drivers;
pub mod sensors;
