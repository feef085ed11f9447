//! # Bridge Runtime
//!
//! Runtime pieces shared by every input link:
//! - **Logging macros**: one log vocabulary for all links, backed by `tracing`
//! - **Cancellation**: the stop flag observed by background loops
//! - **Dispatcher**: the single choke point that delivers intents to the UI
//!
//! ## Delivery Flow
//!
//! ```text
//! GPIO link ──┐
//!             ├──► IntentDispatcher ──(lock)──► NavigationTarget::{move_up, move_down, enter}
//! Serial link ┘
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod cancellation;
pub mod dispatcher;
pub mod logging;

#[doc(hidden)]
pub use tracing;

pub use cancellation::StopFlag;
pub use dispatcher::{IntentDispatcher, IntentForwarder, NavigationTarget};
