//! # Native Transport
//!
//! Real drivers behind the bridge's transport and peripheral seams:
//! - **Serial**: `serialport`-backed [`NativePortOpener`]
//! - **GPIO**: character-device rotary encoder and button via `gpio-cdev` (Linux only;
//!   elsewhere [`NativeGpio`] reports the hardware as unavailable)

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod gpio;
pub mod quadrature;
pub mod serial;

pub use gpio::NativeGpio;
pub use serial::{NativePort, NativePortOpener};
