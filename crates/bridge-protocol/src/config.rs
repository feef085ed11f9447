//! Deployment configuration for the input bridge.
//!
//! Every field has a default, so an empty JSON object is a valid configuration that
//! probes the two usual ACM device paths at 115200 baud and reads the encoder in edge
//! mode on pins 19/26 with the button on 22.

use crate::BridgeError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub use framing::lines::DEFAULT_MAX_LINE_LEN;

pub const DEFAULT_CANDIDATES: [&str; 2] = ["/dev/ttyACM0", "/dev/ttyACM1"];
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// How the serial channel is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheduling {
    /// Non-blocking check driven from the host's own timer
    #[default]
    Poll,
    /// Background thread doing blocking reads with a timeout
    Thread,
}

/// How the rotary encoder reports movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderMode {
    /// Discrete clockwise / counterclockwise edges
    #[default]
    Edge,
    /// Cumulative step counter sampled at a fixed interval
    Counter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Explicit device path. When set it is the only candidate.
    pub port: Option<String>,
    pub candidates: Vec<String>,
    pub baud_rate: u32,
    pub scheduling: Scheduling,
    pub poll_interval_ms: u64,
    pub read_timeout_ms: u64,
    pub max_line_len: usize,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            candidates: DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            baud_rate: DEFAULT_BAUD_RATE,
            scheduling: Scheduling::Poll,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl SerialSettings {
    pub fn with_port(port: impl Into<String>) -> Self {
        Self {
            port: Some(port.into()),
            ..Self::default()
        }
    }

    /// Ordered list of device paths to try.
    pub fn candidate_ports(&self) -> Vec<String> {
        match &self.port {
            Some(p) => vec![p.clone()],
            None => self.candidates.clone(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.baud_rate == 0 {
            return Err(BridgeError::Config("serial baud_rate must be > 0".into()));
        }
        if self.candidate_ports().iter().all(|p| p.trim().is_empty()) {
            return Err(BridgeError::Config(
                "serial needs at least one candidate port".into(),
            ));
        }
        if self.poll_interval_ms == 0 || self.read_timeout_ms == 0 {
            return Err(BridgeError::Config(
                "serial poll_interval_ms and read_timeout_ms must be > 0".into(),
            ));
        }
        if self.max_line_len == 0 {
            return Err(BridgeError::Config("serial max_line_len must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioSettings {
    pub chip: String,
    pub pin_a: u32,
    pub pin_b: u32,
    pub button_pin: u32,
    pub mode: EncoderMode,
    /// Number of distinct counter values before the step counter wraps.
    pub wrap_modulus: Option<u32>,
    pub poll_interval_ms: u64,
    pub button_debounce_ms: u64,
    /// Button pulls the line low when pressed.
    pub button_active_low: bool,
}

impl Default for GpioSettings {
    fn default() -> Self {
        Self {
            chip: DEFAULT_GPIO_CHIP.to_string(),
            pin_a: 19,
            pin_b: 26,
            button_pin: 22,
            mode: EncoderMode::Edge,
            wrap_modulus: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            button_debounce_ms: 0,
            button_active_low: true,
        }
    }
}

impl GpioSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn button_debounce(&self) -> Duration {
        Duration::from_millis(self.button_debounce_ms)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.pin_a == self.pin_b
            || self.pin_a == self.button_pin
            || self.pin_b == self.button_pin
        {
            return Err(BridgeError::Config(format!(
                "gpio pins must be distinct (a={}, b={}, button={})",
                self.pin_a, self.pin_b, self.button_pin
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(BridgeError::Config("gpio poll_interval_ms must be > 0".into()));
        }
        if matches!(self.wrap_modulus, Some(m) if m < 2) {
            return Err(BridgeError::Config("gpio wrap_modulus must be >= 2".into()));
        }
        Ok(())
    }
}

/// Top-level configuration. A `None` channel is not started at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub serial: Option<SerialSettings>,
    pub gpio: Option<GpioSettings>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            serial: Some(SerialSettings::default()),
            gpio: Some(GpioSettings::default()),
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, BridgeError> {
        let config: BridgeConfig = serde_json::from_str(json)
            .map_err(|e| BridgeError::Config(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if let Some(serial) = &self.serial {
            serial.validate()?;
        }
        if let Some(gpio) = &self.gpio {
            gpio.validate()?;
        }
        Ok(())
    }
}
