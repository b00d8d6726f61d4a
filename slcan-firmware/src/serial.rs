//! Non-blocking host link over the USB pipes

use slcan_hal::{SerialError, SerialRx, SerialTx};

use crate::channels::HostPipe;

/// The poll loop's side of the USB bridge
pub struct PipeSerial {
    rx: &'static HostPipe,
    tx: &'static HostPipe,
}

impl PipeSerial {
    pub const fn new(rx: &'static HostPipe, tx: &'static HostPipe) -> Self {
        Self { rx, tx }
    }
}

impl SerialRx for PipeSerial {
    type Error = SerialError;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        // An empty pipe is the only failure
        Ok(self.rx.try_read(buf).unwrap_or(0))
    }
}

impl SerialTx for PipeSerial {
    type Error = SerialError;

    /// Queue `data` whole, or not at all
    fn write_all(&mut self, data: &[u8]) -> Result<(), SerialError> {
        if self.tx.free_capacity() < data.len() {
            return Err(SerialError::Overflow);
        }

        let mut rest = data;
        while !rest.is_empty() {
            match self.tx.try_write(rest) {
                Ok(written) => rest = &rest[written..],
                Err(_) => return Err(SerialError::Overflow),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        // The USB task drains the pipe on its own
        Ok(())
    }
}
