//! Growable receive accumulator.
//!
//! Frames arrive in arbitrary-sized reads and must be held until the codec
//! can parse a complete one out of the front of the buffer. `RecvBuffer`
//! tracks how many bytes at the front are logically filled (`used`)
//! separately from the backing `Vec`'s own capacity, so the receive pump can
//! compact and grow it without the codec ever seeing stale tail bytes.

const MIN_TAIL: usize = 4 * 1024;
const GROW_BY: usize = 16 * 1024;

#[derive(Debug, Default)]
pub struct RecvBuffer {
    bytes: Vec<u8>,
    used: usize,
}

impl RecvBuffer {
    pub fn new() -> Self {
        Self { bytes: Vec::new(), used: 0 }
    }

    /// The logically-filled prefix `[0, used)`.
    pub fn filled(&self) -> &[u8] {
        &self.bytes[..self.used]
    }

    pub fn used(&self) -> usize {
        self.used
    }

    /// Ensures at least `MIN_TAIL` bytes of writable capacity after `used`,
    /// growing by `GROW_BY` if there is less, then returns the writable tail.
    pub fn reserve_tail(&mut self) -> &mut [u8] {
        let spare = self.bytes.len() - self.used;
        if spare < MIN_TAIL {
            self.bytes.resize(self.bytes.len() + GROW_BY, 0);
        }
        &mut self.bytes[self.used..]
    }

    /// Records that `n` freshly-read bytes landed in the tail returned by
    /// the last `reserve_tail` call.
    pub fn advance(&mut self, n: usize) {
        self.used += n;
        debug_assert!(self.used <= self.bytes.len());
    }

    /// Drops the first `frame_size` bytes, shifting the remaining
    /// `used - frame_size` trailing bytes down to offset 0.
    pub fn consume(&mut self, frame_size: usize) {
        debug_assert!(frame_size <= self.used);
        self.bytes.copy_within(frame_size..self.used, 0);
        self.used -= frame_size;
    }
}
