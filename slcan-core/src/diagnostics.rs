//! Fault and traffic counters
//!
//! Every silently dropped frame or line is counted here so the firmware
//! can report it on the debug link. Counters saturate.

/// Reasons the adapter discards something
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Transmit queue full, host frame dropped
    QueueFull,
    /// TX mailbox refused a dequeued frame
    TxRejected,
    /// Host line did not decode
    ParseError,
    /// Host line exceeded the line buffer
    LineOverflow,
    /// Controller lost received frames or reported a bus error
    RxError,
    /// Controller did not confirm a mode change
    HardwareTimeout,
    /// Peripheral clock cannot produce the selected bitrate
    UnsupportedBitrate,
    /// Host transport refused a read or write
    HostIo,
}

/// Adapter counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    pub queue_full: u32,
    pub tx_rejected: u32,
    pub parse_errors: u32,
    pub line_overflows: u32,
    pub rx_errors: u32,
    pub hw_timeouts: u32,
    pub bitrate_rejections: u32,
    pub host_io_errors: u32,
    pub frames_sent: u32,
    pub frames_received: u32,
}

impl Diagnostics {
    pub const fn new() -> Self {
        Self {
            queue_full: 0,
            tx_rejected: 0,
            parse_errors: 0,
            line_overflows: 0,
            rx_errors: 0,
            hw_timeouts: 0,
            bitrate_rejections: 0,
            host_io_errors: 0,
            frames_sent: 0,
            frames_received: 0,
        }
    }

    /// Count one fault
    pub fn record(&mut self, fault: Fault) {
        let counter = match fault {
            Fault::QueueFull => &mut self.queue_full,
            Fault::TxRejected => &mut self.tx_rejected,
            Fault::ParseError => &mut self.parse_errors,
            Fault::LineOverflow => &mut self.line_overflows,
            Fault::RxError => &mut self.rx_errors,
            Fault::HardwareTimeout => &mut self.hw_timeouts,
            Fault::UnsupportedBitrate => &mut self.bitrate_rejections,
            Fault::HostIo => &mut self.host_io_errors,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn frame_sent(&mut self) {
        self.frames_sent = self.frames_sent.saturating_add(1);
    }

    pub fn frame_received(&mut self) {
        self.frames_received = self.frames_received.saturating_add(1);
    }

    /// Sum of all fault counters
    pub fn total_faults(&self) -> u32 {
        [
            self.queue_full,
            self.tx_rejected,
            self.parse_errors,
            self.line_overflows,
            self.rx_errors,
            self.hw_timeouts,
            self.bitrate_rejections,
            self.host_io_errors,
        ]
        .iter()
        .fold(0u32, |acc, n| acc.saturating_add(*n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_faults() {
        let mut diag = Diagnostics::new();
        diag.record(Fault::QueueFull);
        diag.record(Fault::QueueFull);
        diag.record(Fault::ParseError);

        assert_eq!(diag.queue_full, 2);
        assert_eq!(diag.parse_errors, 1);
        assert_eq!(diag.total_faults(), 3);
        assert_eq!(diag.frames_sent, 0);
    }

    #[test]
    fn test_counters_saturate() {
        let mut diag = Diagnostics {
            rx_errors: u32::MAX,
            frames_received: u32::MAX,
            ..Diagnostics::new()
        };
        diag.record(Fault::RxError);
        diag.frame_received();

        assert_eq!(diag.rx_errors, u32::MAX);
        assert_eq!(diag.frames_received, u32::MAX);
        assert_eq!(diag.total_faults(), u32::MAX);
    }
}
