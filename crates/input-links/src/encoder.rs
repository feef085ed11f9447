//! Encoder direction and button edge tracking.
//!
//! ## Polarity
//!
//! A positive step delta is a clockwise turn and maps to [`NavigationIntent::MoveUp`].
//! Edge-mode clockwise edges map the same way, so both encoder modes agree.

use bridge_protocol::GpioSettings;
use core_types::{EdgeEvent, HardwareError, NavigationIntent, RotaryPeripheral};
use std::time::{Duration, Instant};

/// Intent emitted for a positive step delta.
pub const POSITIVE_DELTA_INTENT: NavigationIntent = NavigationIntent::MoveUp;

/// Map an edge-mode event to its intent.
pub fn edge_intent(event: EdgeEvent) -> NavigationIntent {
    match event {
        EdgeEvent::Clockwise => POSITIVE_DELTA_INTENT,
        EdgeEvent::CounterClockwise => POSITIVE_DELTA_INTENT.reversed(),
        EdgeEvent::Pressed => NavigationIntent::Enter,
    }
}

/// Turns successive readings of a cumulative step counter into direction intents.
#[derive(Debug, Clone)]
pub struct CounterTracker {
    last_steps: i64,
    modulus: Option<i64>,
}

impl CounterTracker {
    /// `initial_steps` is the baseline; the first observation is measured from it.
    pub fn new(initial_steps: i64, wrap_modulus: Option<u32>) -> Self {
        Self {
            last_steps: initial_steps,
            modulus: wrap_modulus.map(i64::from).filter(|m| *m >= 2),
        }
    }

    pub fn last_steps(&self) -> i64 {
        self.last_steps
    }

    /// Signed distance from the last reading to `current`.
    ///
    /// With a modulus the distance is the shortest one in `(-m/2, m/2]`, so a counter
    /// rolling over from `m - 1` to `0` reads as a single step forward.
    pub fn delta_to(&self, current: i64) -> i64 {
        let raw = current.wrapping_sub(self.last_steps);
        match self.modulus {
            Some(m) => {
                let d = raw.rem_euclid(m);
                if d > m / 2 {
                    d - m
                } else {
                    d
                }
            }
            None => raw,
        }
    }

    /// Record a reading. At most one intent is emitted per observation.
    pub fn observe(&mut self, current: i64) -> Option<NavigationIntent> {
        let delta = self.delta_to(current);
        self.last_steps = current;

        match delta.signum() {
            1 => Some(POSITIVE_DELTA_INTENT),
            -1 => Some(POSITIVE_DELTA_INTENT.reversed()),
            _ => None,
        }
    }
}

/// Edge-triggered button with an optional debounce window.
///
/// A level change seen less than `debounce` after the last accepted change is treated
/// as bounce and ignored.
#[derive(Debug, Clone)]
pub struct ButtonTracker {
    pressed: bool,
    debounce: Duration,
    last_change: Option<Instant>,
}

impl ButtonTracker {
    /// A button held down at startup fires nothing until it has been released.
    pub fn new(initially_pressed: bool, debounce: Duration) -> Self {
        Self {
            pressed: initially_pressed,
            debounce,
            last_change: None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn observe(&mut self, pressed: bool) -> Option<NavigationIntent> {
        self.observe_at(pressed, Instant::now())
    }

    pub fn observe_at(&mut self, pressed: bool, now: Instant) -> Option<NavigationIntent> {
        if pressed == self.pressed || self.bouncing(now) {
            return None;
        }

        self.pressed = pressed;
        self.last_change = Some(now);
        pressed.then_some(NavigationIntent::Enter)
    }

    /// Filter for edge-mode press events, which carry no release.
    pub fn accept_press_at(&mut self, now: Instant) -> Option<NavigationIntent> {
        if self.bouncing(now) {
            return None;
        }
        self.last_change = Some(now);
        Some(NavigationIntent::Enter)
    }

    fn bouncing(&self, now: Instant) -> bool {
        self.last_change
            .is_some_and(|t| now.saturating_duration_since(t) < self.debounce)
    }
}

/// Encoder and button state owned by the single context that samples the peripheral.
#[derive(Debug, Clone)]
pub struct EncoderState {
    counter: CounterTracker,
    button: ButtonTracker,
}

impl EncoderState {
    /// Take the baseline readings the first delta and edge are measured from.
    pub fn baseline(
        peripheral: &mut dyn RotaryPeripheral,
        settings: &GpioSettings,
    ) -> Result<Self, HardwareError> {
        let steps = peripheral.steps()?;
        let pressed = peripheral.button_pressed()?;
        Ok(Self::new(steps, pressed, settings))
    }

    pub fn new(initial_steps: i64, initially_pressed: bool, settings: &GpioSettings) -> Self {
        Self {
            counter: CounterTracker::new(initial_steps, settings.wrap_modulus),
            button: ButtonTracker::new(initially_pressed, settings.button_debounce()),
        }
    }

    pub fn last_steps(&self) -> i64 {
        self.counter.last_steps()
    }

    /// Sample the counter and button once. Rotation is reported before the press.
    pub fn sample(
        &mut self,
        peripheral: &mut dyn RotaryPeripheral,
    ) -> Result<Vec<NavigationIntent>, HardwareError> {
        let steps = peripheral.steps()?;
        let pressed = peripheral.button_pressed()?;

        Ok(self
            .counter
            .observe(steps)
            .into_iter()
            .chain(self.button.observe(pressed))
            .collect())
    }
}
