//! Host serial transport abstractions
//!
//! The host side of the adapter is a byte-oriented duplex channel (USB
//! CDC-ACM on real hardware). Both halves are non-blocking: the poll loop
//! must never wait on the host.

/// Serial receiver
///
/// Non-blocking trait for pulling host bytes out of the transport.
pub trait SerialRx {
    /// Error type for receive operations
    type Error;

    /// Read whatever bytes are currently available
    ///
    /// Returns `Ok(0)` when no input is pending. Never waits for more data.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Serial transmitter
///
/// Non-blocking trait for pushing encoded lines back to the host.
pub trait SerialTx {
    /// Error type for transmit operations
    type Error;

    /// Queue `data` for transmission to the host
    ///
    /// Implementations accept the whole slice or fail; a partially written
    /// line would desynchronise the host's line parser.
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data towards the host
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Combined serial interface
///
/// For transports that provide both directions on a single object.
pub trait Serial: SerialTx + SerialRx {}

// Blanket implementation
impl<T: SerialTx + SerialRx> Serial for T {}

/// Errors reported by byte transports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// Outbound buffer has no room for the whole line
    Overflow,
}
