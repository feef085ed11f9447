//! # Bridge Protocol
//!
//! Shared vocabulary for the input bridge: the error taxonomy, the link state machine,
//! and the deployment configuration.
//!
//! This crate has no dependency on any serial or GPIO driver, so everything in it is
//! testable on any host.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod config;
pub mod errors;
pub mod state;

pub use config::{BridgeConfig, EncoderMode, GpioSettings, Scheduling, SerialSettings};
pub use errors::BridgeError;
pub use state::{LinkState, SharedLinkState};
