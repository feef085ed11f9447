use core_types::Frame;

pub mod lines;
pub use lines::LineFramer;

/// Trait for converting a stream of bytes into discrete Frames.
pub trait Framer: Send {
    /// Ingest new bytes and return any complete frames found.
    ///
    /// Bytes of an incomplete frame are held until a later call completes it.
    fn push(&mut self, bytes: &[u8]) -> Vec<Frame>;

    /// Reset internal state (e.g., clear buffers).
    fn reset(&mut self);

    /// Number of bytes held for an incomplete frame.
    fn pending(&self) -> usize;

    /// Get the name of the framer.
    fn name(&self) -> &'static str;
}
