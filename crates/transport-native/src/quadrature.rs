//! Quadrature decoding for a two-channel rotary encoder.
//!
//! The encoder state is the pair of line levels `(a << 1) | b`. Clockwise rotation
//! walks `00 → 10 → 11 → 01 → 00`; one detent is four transitions.

use core_types::EdgeEvent;
use std::cmp::Ordering;

/// Step contribution indexed by `(previous << 2) | current`. Invalid jumps count zero.
const TRANSITIONS: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

pub const TRANSITIONS_PER_DETENT: i64 = 4;

#[derive(Debug, Clone)]
pub struct QuadratureDecoder {
    state: u8,
    transitions: i64,
    wrap_modulus: Option<i64>,
}

impl QuadratureDecoder {
    pub fn new(a: bool, b: bool, wrap_modulus: Option<u32>) -> Self {
        Self {
            state: encode(a, b),
            transitions: 0,
            wrap_modulus: wrap_modulus.map(i64::from).filter(|m| *m >= 2),
        }
    }

    /// Feed the current line levels.
    pub fn update(&mut self, a: bool, b: bool) {
        let next = encode(a, b);
        let index = usize::from((self.state << 2) | next);
        if let Some(step) = TRANSITIONS.get(index) {
            self.transitions += i64::from(*step);
        }
        self.state = next;
    }

    /// Whole detents turned since creation, never wrapped.
    pub fn detents(&self) -> i64 {
        self.transitions / TRANSITIONS_PER_DETENT
    }

    /// Whole detents turned, wrapped into `0..modulus` when a modulus is set.
    pub fn steps(&self) -> i64 {
        let detents = self.detents();
        match self.wrap_modulus {
            Some(m) => detents.rem_euclid(m),
            None => detents,
        }
    }
}

/// Hands out accumulated detents as single edges, one per call.
#[derive(Debug, Clone)]
pub struct DetentCursor {
    reported: i64,
}

impl DetentCursor {
    pub fn new(detents: i64) -> Self {
        Self { reported: detents }
    }

    /// Next edge towards `detents`, or `None` once every detent has been reported.
    pub fn next_edge(&mut self, detents: i64) -> Option<EdgeEvent> {
        match detents.cmp(&self.reported) {
            Ordering::Greater => {
                self.reported += 1;
                Some(EdgeEvent::Clockwise)
            }
            Ordering::Less => {
                self.reported -= 1;
                Some(EdgeEvent::CounterClockwise)
            }
            Ordering::Equal => None,
        }
    }
}

fn encode(a: bool, b: bool) -> u8 {
    (u8::from(a) << 1) | u8::from(b)
}
