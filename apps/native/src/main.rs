mod menu;

use anyhow::Context;
use bridge_protocol::BridgeConfig;
use bridge_runtime::IntentForwarder;
use input_links::InputBridge;
use menu::Menu;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use transport_native::{NativeGpio, NativePortOpener};

/// Tick used when no channel asks for cooperative polling.
const IDLE_TICK: Duration = Duration::from_millis(10);

const INTENT_QUEUE_CAPACITY: usize = 64;

fn load_config() -> anyhow::Result<BridgeConfig> {
    match std::env::args().nth(1) {
        Some(path) => BridgeConfig::from_file(&path)
            .with_context(|| format!("failed to load bridge config from {}", path)),
        None => Ok(BridgeConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let (forwarder, mut intents) = IntentForwarder::channel(INTENT_QUEUE_CAPACITY);
    let mut menu = Menu::new(["Status", "Settings", "Network", "About"]);

    let mut bridge = InputBridge::start(&config, forwarder, &NativePortOpener, &NativeGpio);
    if let Some(item) = menu.selected() {
        tracing::info!("Selected: {}", item);
    }

    while bridge.is_input_live() {
        bridge.poll();

        while let Ok(Some(intent)) = intents.try_next() {
            if let Some(item) = menu.apply(intent) {
                tracing::info!("Activated: {}", item);
            } else if let Some(item) = menu.selected() {
                tracing::info!("Selected: {}", item);
            }
        }

        std::thread::sleep(bridge.poll_interval().unwrap_or(IDLE_TICK));
    }

    tracing::warn!("No input channel is live, exiting");
    bridge.shutdown();
    Ok(())
}
