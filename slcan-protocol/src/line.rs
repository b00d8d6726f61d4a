//! Host command line accumulation
//!
//! Bytes from the host are fed one at a time; a carriage return completes
//! a line. Lines longer than [`LINE_CAPACITY`] are dropped whole: the
//! buffer is reset and every byte up to and including the next terminator
//! is discarded, so the line after it starts clean.

use heapless::Vec;

/// Line terminator used in both directions
pub const LINE_TERMINATOR: u8 = b'\r';

/// Maximum bytes buffered before a terminator
pub const LINE_CAPACITY: usize = 30;

/// A complete host line, terminator stripped
pub type Line = Vec<u8, LINE_CAPACITY>;

/// Errors reported while accumulating a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Input exceeded the line capacity; the partial line was discarded
    Overflow,
}

/// Accumulator for inbound host lines
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    buffer: Line,
    discarding: bool,
}

impl LineBuffer {
    /// Create an empty line buffer
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            discarding: false,
        }
    }

    /// Discard any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Check if the rest of an over-long line is being skipped
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Number of bytes currently buffered
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Feed a single byte to the accumulator
    ///
    /// Returns `Ok(Some(line))` when a terminator completes a line,
    /// `Ok(None)` when more bytes are needed, or `Err` once when a line
    /// overflows. The terminator ending an overflowed line completes
    /// nothing.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        if self.discarding {
            if byte == LINE_TERMINATOR {
                self.discarding = false;
            }
            return Ok(None);
        }

        if byte == LINE_TERMINATOR {
            let line = self.buffer.clone();
            self.buffer.clear();
            return Ok(Some(line));
        }

        if self.buffer.push(byte).is_err() {
            self.buffer.clear();
            self.discarding = true;
            return Err(LineError::Overflow);
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(buffer: &mut LineBuffer, bytes: &[u8]) -> Option<Line> {
        let mut last = None;
        for &byte in bytes {
            if let Ok(Some(line)) = buffer.feed(byte) {
                last = Some(line);
            }
        }
        last
    }

    #[test]
    fn test_line_completes_on_terminator() {
        let mut buffer = LineBuffer::new();
        let line = feed_all(&mut buffer, b"S4\r").unwrap();

        assert_eq!(line.as_slice(), b"S4");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_empty_line() {
        let mut buffer = LineBuffer::new();
        let line = buffer.feed(LINE_TERMINATOR).unwrap().unwrap();
        assert!(line.is_empty());
    }

    #[test]
    fn test_full_capacity_line_is_accepted() {
        let mut buffer = LineBuffer::new();
        for _ in 0..LINE_CAPACITY {
            assert_eq!(buffer.feed(b'0'), Ok(None));
        }
        let line = buffer.feed(LINE_TERMINATOR).unwrap().unwrap();
        assert_eq!(line.len(), LINE_CAPACITY);
    }

    #[test]
    fn test_overflow_one_past_capacity() {
        let mut buffer = LineBuffer::new();
        for _ in 0..LINE_CAPACITY {
            buffer.feed(b'x').unwrap();
        }

        assert_eq!(buffer.feed(b'x'), Err(LineError::Overflow));
        assert!(buffer.is_empty());
        assert!(buffer.is_discarding());

        // Terminator of the dropped line completes nothing
        assert_eq!(buffer.feed(LINE_TERMINATOR), Ok(None));
        assert!(!buffer.is_discarding());

        let line = feed_all(&mut buffer, b"O\r").unwrap();
        assert_eq!(line.as_slice(), b"O");
    }

    #[test]
    fn test_overflow_far_past_capacity() {
        let mut buffer = LineBuffer::new();
        let mut overflows = 0;
        for _ in 0..(3 * LINE_CAPACITY) {
            if buffer.feed(b'x').is_err() {
                overflows += 1;
            }
        }

        assert_eq!(overflows, 1);
        assert!(buffer.is_empty());

        // Tail of the long line is dropped with it
        assert_eq!(feed_all(&mut buffer, b"xxO\r"), None);
        let line = feed_all(&mut buffer, b"t1230\r").unwrap();
        assert_eq!(line.as_slice(), b"t1230");
    }

    #[test]
    fn test_reset_ends_discarding() {
        let mut buffer = LineBuffer::new();
        for _ in 0..=LINE_CAPACITY {
            let _ = buffer.feed(b'x');
        }

        buffer.reset();
        assert!(!buffer.is_discarding());
        assert_eq!(feed_all(&mut buffer, b"C\r").unwrap().as_slice(), b"C");
    }
}
