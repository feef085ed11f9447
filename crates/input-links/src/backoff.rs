use crate::constants::serial::MAX_TRANSIENT_BACKOFF_MS;
use std::time::Duration;

/// Calculates the retry delay in milliseconds for a given attempt number.
///
/// Uses exponential backoff:
/// - Base delay: 100ms
/// - Multiplier: 2^(attempt - 1)
///
/// # Arguments
/// * `attempt` - The current retry attempt number (1-based)
///
/// # Returns
/// Delay in milliseconds
pub fn calculate_retry_delay(attempt: u32) -> u64 {
    if attempt == 0 {
        return 0;
    }

    let attempt_idx = attempt.saturating_sub(1);
    let shift = attempt_idx.min(30); // Prevent overflow of u64 shift

    100u64.saturating_mul(1 << shift)
}

/// Pause after the `consecutive`-th transient read error in a row.
pub fn transient_read_delay(consecutive: u32) -> Duration {
    Duration::from_millis(calculate_retry_delay(consecutive).min(MAX_TRANSIENT_BACKOFF_MS))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_retry_delay(0), 0);
        assert_eq!(calculate_retry_delay(1), 100);
        assert_eq!(calculate_retry_delay(2), 200);
        assert_eq!(calculate_retry_delay(3), 400);
        assert_eq!(calculate_retry_delay(10), 51200);
    }

    #[test]
    fn test_safety_overflow() {
        let delay = calculate_retry_delay(100);
        assert!(delay > 0);
    }

    #[test]
    fn test_transient_delay_is_capped() {
        assert_eq!(transient_read_delay(1), Duration::from_millis(100));
        assert_eq!(transient_read_delay(4), Duration::from_millis(800));
        assert_eq!(transient_read_delay(5), Duration::from_millis(1000));
        assert_eq!(transient_read_delay(64), Duration::from_millis(1000));
    }
}
