use crate::gpio_link::{GpioBackend, GpioLink};
use crate::serial_link::SerialLink;
use bridge_protocol::{BridgeConfig, LinkState, Scheduling};
use bridge_runtime::{bridge_error, bridge_info, IntentDispatcher, NavigationTarget};
use core_types::PortOpener;
use std::time::Duration;

/// Per-channel state snapshot. `None` means the channel is not configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStatus {
    pub serial: Option<LinkState>,
    pub gpio: Option<LinkState>,
}

/// Both input links wired to one dispatcher.
///
/// Construction never fails. A channel whose configuration is invalid or whose
/// hardware is missing is Disabled and the other keeps working; with both Disabled the
/// host can still run its UI without input.
pub struct InputBridge {
    dispatcher: IntentDispatcher,
    serial: Option<SerialLink>,
    gpio: Option<GpioLink>,
}

impl InputBridge {
    pub fn start<T>(
        config: &BridgeConfig,
        target: T,
        opener: &dyn PortOpener,
        gpio_backend: &dyn GpioBackend,
    ) -> Self
    where
        T: NavigationTarget + 'static,
    {
        let dispatcher = IntentDispatcher::new(target);

        let gpio = config.gpio.as_ref().map(|settings| match settings.validate() {
            Ok(()) => GpioLink::start(gpio_backend, settings, dispatcher.clone()),
            Err(e) => {
                bridge_error!("{}", e);
                GpioLink::disabled()
            }
        });

        let serial = config.serial.as_ref().map(|settings| {
            if let Err(e) = settings.validate() {
                bridge_error!("{}", e);
                return SerialLink::disabled(settings.clone(), dispatcher.clone());
            }
            let mut link = SerialLink::new(settings.clone(), dispatcher.clone());
            // Failures are logged by the link and leave it Disabled
            if link.connect(opener).is_ok() {
                let _ = link.start();
            }
            link
        });

        let bridge = Self {
            dispatcher,
            serial,
            gpio,
        };
        bridge_info!("Input bridge started: {:?}", bridge.status());
        bridge
    }

    /// Drive cooperative work. Call from the host's timer every [`poll_interval`].
    ///
    /// [`poll_interval`]: InputBridge::poll_interval
    pub fn poll(&mut self) {
        if let Some(serial) = self.serial.as_mut() {
            serial.poll();
        }
    }

    /// Interval the host should call [`poll`](InputBridge::poll) at, if anything needs
    /// polling.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.serial
            .as_ref()
            .filter(|s| s.scheduling() == Scheduling::Poll && s.state().is_live())
            .map(|s| s.settings().poll_interval())
    }

    pub fn status(&self) -> BridgeStatus {
        BridgeStatus {
            serial: self.serial.as_ref().map(SerialLink::state),
            gpio: self.gpio.as_ref().map(GpioLink::state),
        }
    }

    /// Whether any channel can still produce intents.
    pub fn is_input_live(&self) -> bool {
        let status = self.status();
        [status.serial, status.gpio]
            .into_iter()
            .flatten()
            .any(|s| s.is_live())
    }

    pub fn dispatcher(&self) -> &IntentDispatcher {
        &self.dispatcher
    }

    /// Tear down both links. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(serial) = self.serial.as_mut() {
            serial.shutdown();
        }
        if let Some(gpio) = self.gpio.as_mut() {
            gpio.shutdown();
        }
    }
}

impl Drop for InputBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}
