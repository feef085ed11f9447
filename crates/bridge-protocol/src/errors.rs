//! Error messages say what failed, why if known, and what to do when there is a
//! sensible user action.
//!
//! None of these errors ever reach the UI. Link managers log them and degrade the
//! affected channel to "no more intents".

use core_types::{HardwareError, TransportError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// GPIO library or platform missing
    #[error("GPIO hardware unavailable: {0}. Running without encoder input.")]
    HardwareUnavailable(String),

    /// Pin claim or permission failure
    #[error("GPIO initialization failed: {0}. Check pin numbers and access to the GPIO chip.")]
    HardwareInit(String),

    /// One candidate port could not be opened
    #[error("Failed to open serial port {port}: {reason}")]
    PortOpenFailure { port: String, reason: String },

    /// Every candidate failed
    #[error("Could not establish serial connection on any port (tried: {}). Check the device is plugged in.", .tried.join(", "))]
    NoPortAvailable { tried: Vec<String> },

    /// A single read failed but the connection still looks usable
    #[error("Transient serial read error: {0}")]
    TransientRead(String),

    /// The connection is gone
    #[error("Serial link lost: {0}")]
    FatalLink(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid link state transition: {0}")]
    InvalidTransition(String),
}

impl From<HardwareError> for BridgeError {
    fn from(e: HardwareError) -> Self {
        match e {
            HardwareError::Unavailable(msg) => BridgeError::HardwareUnavailable(msg),
            HardwareError::Init(msg) => BridgeError::HardwareInit(msg),
            HardwareError::Read(msg) => BridgeError::HardwareInit(msg),
        }
    }
}

impl BridgeError {
    pub fn port_open(port: &str, err: &TransportError) -> Self {
        BridgeError::PortOpenFailure {
            port: port.to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::PortOpenFailure {
            port: "/dev/ttyACM0".into(),
            reason: "No such file or directory".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to open serial port /dev/ttyACM0: No such file or directory"
        );
    }

    #[test]
    fn test_no_port_lists_candidates() {
        let err = BridgeError::NoPortAvailable {
            tried: vec!["/dev/ttyACM0".into(), "/dev/ttyACM1".into()],
        };
        assert!(err.to_string().contains("/dev/ttyACM0, /dev/ttyACM1"));
    }

    #[test]
    fn test_hardware_error_conversion() {
        let err: BridgeError = HardwareError::Unavailable("no gpiochip".into()).into();
        match err {
            BridgeError::HardwareUnavailable(msg) => assert_eq!(msg, "no gpiochip"),
            _ => panic!("Wrong variant"),
        }
    }
}
