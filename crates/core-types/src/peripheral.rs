//! Seams for rotary encoder and push-button hardware.
//!
//! Two shapes are supported. An [`EdgePeripheral`] reports discrete rotation and press
//! edges. A [`RotaryPeripheral`] exposes a cumulative step counter and a button level
//! that the caller samples on its own schedule.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HardwareError {
    /// Platform or driver missing (no GPIO chip, not a Linux host).
    #[error("GPIO hardware unavailable: {0}")]
    Unavailable(String),
    /// Pin claim, permission or configuration failure.
    #[error("GPIO initialization failed: {0}")]
    Init(String),
    /// A sample or event read failed after initialization.
    #[error("GPIO read failed: {0}")]
    Read(String),
}

/// Discrete edge reported by an edge-mode peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEvent {
    Clockwise,
    CounterClockwise,
    Pressed,
}

pub trait EdgePeripheral: Send {
    /// Wait up to `timeout` for the next edge. `Ok(None)` means the timeout elapsed.
    fn next_event(&mut self, timeout: Duration) -> Result<Option<EdgeEvent>, HardwareError>;
}

pub trait RotaryPeripheral: Send {
    /// Current cumulative step count. May wrap within a configured modulus.
    fn steps(&mut self) -> Result<i64, HardwareError>;

    /// Whether the button is held down at this instant.
    fn button_pressed(&mut self) -> Result<bool, HardwareError>;
}
