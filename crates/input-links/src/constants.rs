//! Timing and sizing constants for the input links.
//!
//! Intervals that deployments tune live in the configuration; these are the values
//! that only change with the code.

/// Serial link read loop
pub mod serial {
    /// Bytes read per call
    ///
    /// **Value**: 1024 bytes
    ///
    /// Command lines are a handful of bytes. One chunk drains several seconds of a
    /// chatty device at 115200 baud, so the poll timer never falls behind.
    pub const READ_CHUNK_SIZE: usize = 1024;

    /// Consecutive transient read errors before the link is treated as dead
    ///
    /// **Value**: 10
    ///
    /// A single EINTR or a glitch on a USB CDC bridge recovers on the next read. Ten in
    /// a row without one good read means the device is gone even if the OS has not said
    /// so yet.
    pub const MAX_CONSECUTIVE_TRANSIENT_ERRORS: u32 = 10;

    /// Ceiling for the backoff after a transient read error (milliseconds)
    ///
    /// **Value**: 1000ms
    ///
    /// Keeps the reader responsive to a stop request and to a recovering device.
    pub const MAX_TRANSIENT_BACKOFF_MS: u64 = 1000;

    /// Reader thread name
    pub const READER_THREAD_NAME: &str = "serial-reader";
}

/// GPIO link sampling
pub mod gpio {
    /// Sampling thread name
    pub const SAMPLER_THREAD_NAME: &str = "gpio-sampler";
}

/// Linux errno values that mean the serial device has disappeared.
pub mod errno {
    pub const EIO: i32 = 5;
    pub const ENXIO: i32 = 6;
    pub const EBADF: i32 = 9;
    pub const ENODEV: i32 = 19;
}
