//! # Input Links
//!
//! Turns encoder and serial input into navigation intents for the UI.
//!
//! ## Links
//!
//! - **SerialLink**: candidate-port probing, line framing, cooperative poll or
//!   dedicated reader thread
//! - **GpioLink**: rotary encoder and button, edge events or a sampled step counter
//! - **InputBridge**: both links behind one serialized dispatcher

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod backoff;
pub mod bridge;
pub mod constants;
pub mod encoder;
pub mod gpio_link;
pub mod serial_link;

pub use bridge::{BridgeStatus, InputBridge};
pub use encoder::{ButtonTracker, CounterTracker, EncoderState, POSITIVE_DELTA_INTENT};
pub use gpio_link::{GpioBackend, GpioLink, GpioSource, NoGpio};
pub use serial_link::{classify_read_error, ReadErrorClass, SerialLink};
