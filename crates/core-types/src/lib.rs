use serde::{Deserialize, Serialize};

pub mod peripheral;
pub mod transport;
pub use peripheral::{EdgeEvent, EdgePeripheral, HardwareError, RotaryPeripheral};
pub use transport::{PortOpener, SerialTransport, TransportError};

/// A normalized navigation action, independent of the input source that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationIntent {
    MoveUp,
    MoveDown,
    Enter,
}

impl NavigationIntent {
    /// Semantic description logged when the intent is dispatched.
    pub fn action_label(self) -> &'static str {
        match self {
            Self::MoveUp => "Rotated clockwise",
            Self::MoveDown => "Rotated counterclockwise",
            Self::Enter => "Button pressed",
        }
    }

    /// The opposite rotation. `Enter` has no opposite and maps to itself.
    pub fn reversed(self) -> Self {
        match self {
            Self::MoveUp => Self::MoveDown,
            Self::MoveDown => Self::MoveUp,
            Self::Enter => Self::Enter,
        }
    }
}

/// One complete line received from a serial link, terminator removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub bytes: Vec<u8>,
}

impl Frame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Decode the frame as UTF-8, dropping any byte sequence that is not valid UTF-8.
    ///
    /// Invalid sequences are removed rather than replaced, so a stray high byte in front
    /// of `UP` still yields `UP`.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.bytes.len());
        for chunk in self.bytes.utf8_chunks() {
            out.push_str(chunk.valid());
        }
        out
    }
}
