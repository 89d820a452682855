//! Motion control.

pub mod motion;
