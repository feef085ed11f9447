use bridge_protocol::GpioSettings;
use core_types::HardwareError;
use input_links::{GpioBackend, GpioSource};

/// GPIO backend for the host this binary runs on.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeGpio;

#[cfg(not(target_os = "linux"))]
impl GpioBackend for NativeGpio {
    fn open(&self, _settings: &GpioSettings) -> Result<GpioSource, HardwareError> {
        Err(HardwareError::Unavailable(
            "GPIO character devices require Linux".into(),
        ))
    }
}

#[cfg(target_os = "linux")]
impl GpioBackend for NativeGpio {
    fn open(&self, settings: &GpioSettings) -> Result<GpioSource, HardwareError> {
        let encoder = cdev::CdevEncoder::open(settings)?;
        Ok(match settings.mode {
            bridge_protocol::EncoderMode::Edge => GpioSource::Edge(Box::new(encoder)),
            bridge_protocol::EncoderMode::Counter => GpioSource::Polling(Box::new(encoder)),
        })
    }
}

#[cfg(target_os = "linux")]
mod cdev {
    use crate::quadrature::{DetentCursor, QuadratureDecoder};
    use bridge_protocol::GpioSettings;
    use bridge_runtime::bridge_debug;
    use core_types::{EdgeEvent, EdgePeripheral, HardwareError, RotaryPeripheral};
    use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
    use std::path::Path;
    use std::thread;
    use std::time::{Duration, Instant};

    const CONSUMER: &str = "input-bridge";

    /// Line sampling period while waiting for an edge.
    const SAMPLE_PERIOD: Duration = Duration::from_millis(1);

    /// Rotary encoder on two input lines plus a push button on a third.
    ///
    /// Rotation is decoded in software from sampled line levels, so the same handle
    /// serves as an edge source and as a step counter.
    pub struct CdevEncoder {
        a: LineHandle,
        b: LineHandle,
        button: LineHandle,
        button_active_low: bool,
        decoder: QuadratureDecoder,
        cursor: DetentCursor,
        button_was_pressed: bool,
    }

    impl CdevEncoder {
        pub fn open(settings: &GpioSettings) -> Result<Self, HardwareError> {
            if !Path::new(&settings.chip).exists() {
                return Err(HardwareError::Unavailable(format!(
                    "{} not found",
                    settings.chip
                )));
            }

            let mut chip = Chip::new(&settings.chip)
                .map_err(|e| HardwareError::Init(format!("opening {}: {e}", settings.chip)))?;

            let mut request = |pin: u32, role: &str| -> Result<LineHandle, HardwareError> {
                chip.get_line(pin)
                    .and_then(|line| line.request(LineRequestFlags::INPUT, 0, CONSUMER))
                    .map_err(|e| HardwareError::Init(format!("requesting {role} line {pin}: {e}")))
            };

            let a = request(settings.pin_a, "encoder A")?;
            let b = request(settings.pin_b, "encoder B")?;
            let button = request(settings.button_pin, "button")?;

            let mut encoder = Self {
                a,
                b,
                button,
                button_active_low: settings.button_active_low,
                decoder: QuadratureDecoder::new(false, false, settings.wrap_modulus),
                cursor: DetentCursor::new(0),
                button_was_pressed: false,
            };

            let (a, b) = encoder.read_ab()?;
            encoder.decoder = QuadratureDecoder::new(a, b, settings.wrap_modulus);
            encoder.cursor = DetentCursor::new(encoder.decoder.detents());
            encoder.button_was_pressed = encoder.read_button()?;
            bridge_debug!(
                "Claimed {} lines {}/{}/{}",
                settings.chip,
                settings.pin_a,
                settings.pin_b,
                settings.button_pin
            );
            Ok(encoder)
        }

        fn read_ab(&self) -> Result<(bool, bool), HardwareError> {
            let a = read_line(&self.a)?;
            let b = read_line(&self.b)?;
            Ok((a, b))
        }

        fn read_button(&self) -> Result<bool, HardwareError> {
            let level = read_line(&self.button)?;
            Ok(level != self.button_active_low)
        }

        fn sample_rotation(&mut self) -> Result<(), HardwareError> {
            let (a, b) = self.read_ab()?;
            self.decoder.update(a, b);
            Ok(())
        }
    }

    fn read_line(handle: &LineHandle) -> Result<bool, HardwareError> {
        handle
            .get_value()
            .map(|v| v != 0)
            .map_err(|e| HardwareError::Read(e.to_string()))
    }

    impl RotaryPeripheral for CdevEncoder {
        fn steps(&mut self) -> Result<i64, HardwareError> {
            self.sample_rotation()?;
            Ok(self.decoder.steps())
        }

        fn button_pressed(&mut self) -> Result<bool, HardwareError> {
            self.read_button()
        }
    }

    impl EdgePeripheral for CdevEncoder {
        fn next_event(&mut self, timeout: Duration) -> Result<Option<EdgeEvent>, HardwareError> {
            let deadline = Instant::now() + timeout;
            loop {
                self.sample_rotation()?;
                if let Some(edge) = self.cursor.next_edge(self.decoder.detents()) {
                    return Ok(Some(edge));
                }

                let pressed = self.read_button()?;
                let rising = pressed && !self.button_was_pressed;
                self.button_was_pressed = pressed;
                if rising {
                    return Ok(Some(EdgeEvent::Pressed));
                }

                if Instant::now() >= deadline {
                    return Ok(None);
                }
                thread::sleep(SAMPLE_PERIOD);
            }
        }
    }
}
