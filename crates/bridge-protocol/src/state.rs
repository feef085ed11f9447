use crate::BridgeError;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// # Link State Machine
///
/// Shared by the serial and GPIO link managers.
///
/// ```text
/// Uninitialized ──► Connecting ──► Connected ──► Reading ──► Closed
///       │               │              │            │
///       └───────────────┴──────────────┴────────────┴──────► Disabled
/// ```
///
/// Uninitialized and Connected may also go straight to Closed when torn down early.
///
/// ## Invariants
///
/// - **Disabled** is terminal for the process lifetime. Nothing reconnects it.
/// - **Closed** is reached only through teardown, and repeated teardown stays Closed.
/// - At most one open connection exists while in Connected or Reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LinkState {
    /// Manager constructed, nothing attempted yet
    Uninitialized,

    /// Probing candidates or claiming pins
    Connecting,

    /// Resource open, no input activity scheduled yet
    Connected,

    /// Poll timer or background loop active
    Reading,

    /// Torn down on request
    Closed,

    /// Channel permanently inert
    Disabled,
}

impl LinkState {
    /// Whether the channel can still produce intents.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connected | Self::Reading)
    }

    /// Validate if transition to new_state is allowed from current state
    pub fn can_transition_to(&self, new_state: LinkState) -> bool {
        use LinkState::*;

        match (self, new_state) {
            (Uninitialized, Connecting) => true,
            (Uninitialized, Disabled) => true, // Driver missing, nothing to try
            (Uninitialized, Closed) => true,   // Shut down before start

            (Connecting, Connected) => true,
            (Connecting, Disabled) => true, // All candidates failed

            (Connected, Reading) => true,
            (Connected, Closed) => true,
            (Connected, Disabled) => true,

            (Reading, Closed) => true,
            (Reading, Disabled) => true, // Link lost mid-session

            // Idempotent teardown
            (Closed, Closed) => true,
            (Disabled, Disabled) => true,

            _ => false,
        }
    }

    /// Convert state to u8 value for atomic storage
    pub fn to_u8(self) -> u8 {
        match self {
            LinkState::Uninitialized => 0,
            LinkState::Connecting => 1,
            LinkState::Connected => 2,
            LinkState::Reading => 3,
            LinkState::Closed => 4,
            LinkState::Disabled => 5,
        }
    }

    /// Convert u8 value back to state
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(LinkState::Uninitialized),
            1 => Some(LinkState::Connecting),
            2 => Some(LinkState::Connected),
            3 => Some(LinkState::Reading),
            4 => Some(LinkState::Closed),
            5 => Some(LinkState::Disabled),
            _ => None,
        }
    }
}

/// A [`LinkState`] shared between a link manager and its background activity.
///
/// Every change goes through [`LinkState::can_transition_to`], applied with a
/// compare-and-swap so a reader thread marking the link Disabled and the manager
/// closing it cannot overwrite each other.
#[derive(Clone, Debug)]
pub struct SharedLinkState {
    inner: Arc<AtomicU8>,
}

impl SharedLinkState {
    pub fn new(state: LinkState) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(state.to_u8())),
        }
    }

    pub fn get(&self) -> LinkState {
        LinkState::from_u8(self.inner.load(Ordering::Acquire)).unwrap_or(LinkState::Disabled)
    }

    /// Move to `new_state`, returning the state it replaced.
    pub fn transition(&self, new_state: LinkState) -> Result<LinkState, BridgeError> {
        let mut current = self.inner.load(Ordering::Acquire);
        loop {
            let from = LinkState::from_u8(current).unwrap_or(LinkState::Disabled);
            if !from.can_transition_to(new_state) {
                return Err(BridgeError::InvalidTransition(format!(
                    "{:?} → {:?}",
                    from, new_state
                )));
            }
            match self.inner.compare_exchange(
                current,
                new_state.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(from),
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_state_conversion_roundtrip() {
        let states = [
            LinkState::Uninitialized,
            LinkState::Connecting,
            LinkState::Connected,
            LinkState::Reading,
            LinkState::Closed,
            LinkState::Disabled,
        ];

        for state in states {
            assert_eq!(LinkState::from_u8(state.to_u8()), Some(state));
        }
        assert_eq!(LinkState::from_u8(42), None);
    }

    #[test]
    fn test_valid_transitions() {
        assert!(LinkState::Uninitialized.can_transition_to(LinkState::Connecting));
        assert!(LinkState::Connecting.can_transition_to(LinkState::Connected));
        assert!(LinkState::Connected.can_transition_to(LinkState::Reading));
        assert!(LinkState::Reading.can_transition_to(LinkState::Closed));
        assert!(LinkState::Reading.can_transition_to(LinkState::Disabled));
    }

    #[test]
    fn test_disabled_is_terminal() {
        for next in [
            LinkState::Uninitialized,
            LinkState::Connecting,
            LinkState::Connected,
            LinkState::Reading,
            LinkState::Closed,
        ] {
            assert!(!LinkState::Disabled.can_transition_to(next), "{next:?}");
        }
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!LinkState::Uninitialized.can_transition_to(LinkState::Reading));
        assert!(!LinkState::Closed.can_transition_to(LinkState::Connecting));
    }

    #[test]
    fn test_shared_state_transitions() {
        let shared = SharedLinkState::new(LinkState::Uninitialized);
        let remote = shared.clone();
        assert_eq!(shared.transition(LinkState::Connecting).unwrap(), LinkState::Uninitialized);
        assert_eq!(remote.get(), LinkState::Connecting);
        assert!(matches!(
            remote.transition(LinkState::Reading),
            Err(BridgeError::InvalidTransition(_))
        ));
        assert_eq!(shared.get(), LinkState::Connecting);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&LinkState::Reading).unwrap();
        let back: LinkState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, LinkState::Reading);
    }
}
