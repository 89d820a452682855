//! Linear servo ramp.
//!
//! [`ServoRamp`] walks a fractional position from a start angle toward a
//! target in fixed increments and yields the whole-degree angle to write
//! at every step, finishing with an exact snap to the target:
//!
//! ```text
//!   pos = start
//!   while |pos − target| > step:  pos ± step  →  Move(trunc(pos))
//!   Arrive(target)
//! ```
//!
//! The ramp owns no timing.  Whoever drives it decides how long to wait
//! after each [`RampStep::Move`] (a blocking delay or a main-loop tick).

/// One item produced by a [`ServoRamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampStep {
    /// Intermediate position; the driver waits one step period afterwards.
    Move(u8),
    /// Final snap to the exact target.  Always the last item.
    Arrive(u8),
}

impl RampStep {
    /// Angle to write to the servo for this step.
    pub fn angle(self) -> u8 {
        match self {
            Self::Move(a) | Self::Arrive(a) => a,
        }
    }
}

/// Lazy sequence of servo positions from one angle to another.
#[derive(Debug, Clone)]
pub struct ServoRamp {
    position: f32,
    target: u8,
    step: f32,
    arrived: bool,
}

impl ServoRamp {
    /// Ramp from `start` (may be fractional when retargeting mid-motion)
    /// to `target`, moving `step_degrees` per step.
    pub fn new(start: f32, target: u8, step_degrees: f32) -> Self {
        let magnitude = step_degrees.abs();
        let step = if f32::from(target) < start {
            -magnitude
        } else {
            magnitude
        };
        Self {
            position: start,
            target,
            step,
            arrived: false,
        }
    }

    /// Fractional position after the most recent step.
    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    pub fn is_finished(&self) -> bool {
        self.arrived
    }

    /// Intermediate steps still to come (excluding the final snap).
    pub fn remaining_moves(&self) -> usize {
        if self.arrived {
            return 0;
        }
        let gap = (self.position - f32::from(self.target)).abs();
        let step = self.step.abs();
        if gap <= step {
            return 0;
        }
        ((gap - step) / step).ceil() as usize
    }

    fn has_gap(&self) -> bool {
        (self.position - f32::from(self.target)).abs() > self.step.abs()
    }
}

impl Iterator for ServoRamp {
    type Item = RampStep;

    fn next(&mut self) -> Option<RampStep> {
        if self.arrived {
            return None;
        }
        if self.has_gap() {
            self.position += self.step;
            // `as` saturates, and the position never leaves [start, target].
            return Some(RampStep::Move(self.position as u8));
        }
        self.position = f32::from(self.target);
        self.arrived = true;
        Some(RampStep::Arrive(self.target))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining_moves() + usize::from(!self.arrived);
        (n, Some(n))
    }
}
