/// Logging macros for the input links.
///
/// Thin wrappers over `tracing` so every link logs with the same target and the
/// host decides filtering and output through its subscriber.
///
/// # Example
/// ```
/// use bridge_runtime::bridge_debug;
/// bridge_debug!("SerialLink: {:?} → {:?}", "Connecting", "Connected");
/// ```
#[macro_export]
macro_rules! bridge_debug {
    ($($arg:tt)*) => {
        $crate::tracing::debug!(target: "input_bridge", $($arg)*)
    };
}

/// Log info-level message
///
/// Use for connection lifecycle and dispatched actions
#[macro_export]
macro_rules! bridge_info {
    ($($arg:tt)*) => {
        $crate::tracing::info!(target: "input_bridge", $($arg)*)
    };
}

/// Log warning-level message
///
/// Use for recoverable errors, unknown commands and degraded channels
#[macro_export]
macro_rules! bridge_warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!(target: "input_bridge", $($arg)*)
    };
}

/// Log error-level message
///
/// Use when a channel stops producing intents for good
#[macro_export]
macro_rules! bridge_error {
    ($($arg:tt)*) => {
        $crate::tracing::error!(target: "input_bridge", $($arg)*)
    };
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    #[test]
    fn test_logging_macros_compile() {
        bridge_debug!("test debug");
        bridge_info!("test info");
        bridge_warn!("test warn");
        bridge_error!("test error");
    }

    #[test]
    fn test_logging_with_format_args() {
        bridge_debug!("SerialLink: {} → {}", "Connected", "Reading");
        bridge_info!("Port opened at {} baud", 115200);
        bridge_warn!("Retry attempt {}/{}", 1, 5);
        bridge_error!("Failed to open port: {}", "Access denied");
    }
}
