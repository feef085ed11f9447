use crate::constants::gpio::SAMPLER_THREAD_NAME;
use crate::encoder::{edge_intent, ButtonTracker, EncoderState};
use bridge_protocol::{BridgeError, GpioSettings, LinkState, SharedLinkState};
use bridge_runtime::{
    bridge_debug, bridge_error, bridge_info, bridge_warn, IntentDispatcher, StopFlag,
};
use core_types::{EdgeEvent, EdgePeripheral, HardwareError, RotaryPeripheral};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// An opened encoder + button peripheral, in the shape selected by configuration.
pub enum GpioSource {
    /// Peripheral reports rotation and press edges itself
    Edge(Box<dyn EdgePeripheral>),
    /// Peripheral exposes a step counter and button level to be sampled
    Polling(Box<dyn RotaryPeripheral>),
}

/// Claims the encoder and button pins.
pub trait GpioBackend {
    fn open(&self, settings: &GpioSettings) -> Result<GpioSource, HardwareError>;
}

/// Backend for hosts without GPIO hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGpio;

impl GpioBackend for NoGpio {
    fn open(&self, _settings: &GpioSettings) -> Result<GpioSource, HardwareError> {
        Err(HardwareError::Unavailable("no GPIO backend on this host".into()))
    }
}

/// Owns the encoder and button for one bridge.
///
/// Initialization failures disable the link permanently after one log line; the rest
/// of the bridge keeps working and simply receives no encoder input.
pub struct GpioLink {
    state: SharedLinkState,
    stop: StopFlag,
    worker: Option<JoinHandle<()>>,
}

impl GpioLink {
    /// A link that never touches hardware.
    pub fn disabled() -> Self {
        let link = Self {
            state: SharedLinkState::new(LinkState::Uninitialized),
            stop: StopFlag::new(),
            worker: None,
        };
        let _ = link.state.transition(LinkState::Disabled);
        link
    }

    /// Open the peripheral and start watching it on a dedicated thread.
    ///
    /// Never fails: any error leaves the link Disabled.
    pub fn start(
        backend: &dyn GpioBackend,
        settings: &GpioSettings,
        dispatcher: IntentDispatcher,
    ) -> Self {
        let mut link = Self {
            state: SharedLinkState::new(LinkState::Uninitialized),
            stop: StopFlag::new(),
            worker: None,
        };

        if let Err(e) = link.try_start(backend, settings, dispatcher) {
            bridge_warn!("{}", e);
            let _ = link.state.transition(LinkState::Disabled);
        }
        link
    }

    fn try_start(
        &mut self,
        backend: &dyn GpioBackend,
        settings: &GpioSettings,
        dispatcher: IntentDispatcher,
    ) -> Result<(), BridgeError> {
        self.state.transition(LinkState::Connecting)?;

        let source = backend.open(settings)?;
        let interval = settings.poll_interval();
        let stop = self.stop.clone();
        let state = self.state.clone();

        let worker: Box<dyn FnOnce() + Send> = match source {
            GpioSource::Edge(peripheral) => {
                let button = ButtonTracker::new(false, settings.button_debounce());
                Box::new(move || edge_loop(peripheral, button, dispatcher, interval, stop, state))
            }
            GpioSource::Polling(mut peripheral) => {
                let encoder = EncoderState::baseline(peripheral.as_mut(), settings)?;
                bridge_debug!("Encoder baseline at {} steps", encoder.last_steps());
                Box::new(move || {
                    polling_loop(peripheral, encoder, dispatcher, interval, stop, state)
                })
            }
        };

        self.state.transition(LinkState::Connected)?;
        self.state.transition(LinkState::Reading)?;

        let handle = thread::Builder::new()
            .name(SAMPLER_THREAD_NAME.into())
            .spawn(worker)
            .map_err(|e| BridgeError::HardwareInit(format!("cannot spawn GPIO thread: {e}")))?;

        bridge_info!(
            "GPIO input active (encoder pins {}/{}, button pin {}, {:?} mode)",
            settings.pin_a,
            settings.pin_b,
            settings.button_pin,
            settings.mode
        );
        self.worker = Some(handle);
        Ok(())
    }

    pub fn state(&self) -> LinkState {
        self.state.get()
    }

    /// Stop sampling and release the peripheral.
    ///
    /// The peripheral lives on the sampling thread and is dropped when that thread
    /// exits, which happens within one poll interval. Idempotent.
    pub fn shutdown(&mut self) {
        self.stop.stop();

        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                bridge_error!("GPIO sampling thread panicked");
            }
            bridge_info!("GPIO input released");
        }

        if self.state.get() != LinkState::Disabled {
            let _ = self.state.transition(LinkState::Closed);
        }
    }
}

impl Drop for GpioLink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for GpioLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpioLink")
            .field("state", &self.state())
            .finish()
    }
}

fn disable_after(err: HardwareError, state: &SharedLinkState) {
    bridge_error!("{}; GPIO input disabled", err);
    let _ = state.transition(LinkState::Disabled);
}

fn edge_loop(
    mut peripheral: Box<dyn EdgePeripheral>,
    mut button: ButtonTracker,
    dispatcher: IntentDispatcher,
    interval: Duration,
    stop: StopFlag,
    state: SharedLinkState,
) {
    while !stop.is_stopped() {
        match peripheral.next_event(interval) {
            Ok(Some(event)) => {
                if stop.is_stopped() {
                    break;
                }
                let intent = match event {
                    EdgeEvent::Pressed => button.accept_press_at(Instant::now()),
                    other => Some(edge_intent(other)),
                };
                if let Some(intent) = intent {
                    dispatcher.dispatch(intent);
                }
            }
            Ok(None) => {}
            Err(e) => {
                disable_after(e, &state);
                break;
            }
        }
    }
}

fn polling_loop(
    mut peripheral: Box<dyn RotaryPeripheral>,
    mut encoder: EncoderState,
    dispatcher: IntentDispatcher,
    interval: Duration,
    stop: StopFlag,
    state: SharedLinkState,
) {
    while stop.sleep(interval) {
        match encoder.sample(peripheral.as_mut()) {
            Ok(intents) => {
                for intent in intents {
                    if stop.is_stopped() {
                        return;
                    }
                    dispatcher.dispatch(intent);
                }
            }
            Err(e) => {
                disable_after(e, &state);
                return;
            }
        }
    }
}
