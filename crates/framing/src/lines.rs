use crate::Framer;
use core_types::Frame;

/// Default upper bound for a single unterminated line.
pub const DEFAULT_MAX_LINE_LEN: usize = 256;

/// Buffers input and emits a frame whenever a newline is encountered.
///
/// The `\n` terminator is not part of the emitted frame, and a `\r` directly before it
/// is stripped as well. A partial line that grows past `max_len` without a terminator is
/// discarded; everything up to the next `\n` is then dropped too so that the tail of an
/// oversized line is never mistaken for a command.
pub struct LineFramer {
    buffer: Vec<u8>,
    max_len: usize,
    discarding: bool,
    overflows: u64,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_len.min(1024)),
            max_len: max_len.max(1),
            discarding: false,
            overflows: 0,
        }
    }

    /// How many oversized lines have been thrown away since creation.
    pub fn overflow_count(&self) -> u64 {
        self.overflows
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer for LineFramer {
    fn push(&mut self, bytes: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();

        for &b in bytes {
            if b == b'\n' {
                if self.discarding {
                    self.discarding = false;
                    continue;
                }
                if self.buffer.last() == Some(&b'\r') {
                    self.buffer.pop();
                }
                frames.push(Frame::new(std::mem::take(&mut self.buffer)));
                continue;
            }

            if self.discarding {
                continue;
            }

            if self.buffer.len() >= self.max_len {
                self.buffer.clear();
                self.discarding = true;
                self.overflows += 1;
                continue;
            }
            self.buffer.push(b);
        }

        frames
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn name(&self) -> &'static str {
        "Lines"
    }
}
