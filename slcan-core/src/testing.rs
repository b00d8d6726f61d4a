//! Host-side doubles for the hardware traits

use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use std::vec::Vec;

use slcan_hal::{BitTiming, CanPeripheral, MailboxBusy, MailboxFrame, OutputPin, SerialRx, SerialTx};

/// Simulated CAN controller
///
/// Mode requests complete instantly unless one of the fault switches is
/// set. Written frames stay "in flight" until `complete_tx`.
#[derive(Debug, Default)]
pub struct MockPeripheral {
    pub resets: u32,
    pub frozen: bool,
    pub masked: bool,
    pub timing: Option<BitTiming>,
    pub listen_only: bool,
    pub accepts_all: bool,
    pub tx_busy: bool,
    pub sent: Vec<MailboxFrame>,
    pub rx: VecDeque<MailboxFrame>,
    pub releases: u32,
    pub rx_error: bool,
    /// Never acknowledge freeze mode
    pub ignore_freeze: bool,
    /// Never leave freeze mode
    pub stuck_frozen: bool,
    /// Refuse mailbox writes even when idle
    pub refuse_writes: bool,
    /// Record whether the unfreeze request ran inside a critical section
    pub track_masking: bool,
    pub masked_during_unfreeze: Option<bool>,
}

impl MockPeripheral {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish the in-flight transmission
    pub fn complete_tx(&mut self) {
        self.tx_busy = false;
    }

    /// Queue a frame as if received from the bus
    pub fn inject(&mut self, frame: MailboxFrame) {
        self.rx.push_back(frame);
    }
}

impl CanPeripheral for MockPeripheral {
    fn request_reset(&mut self) {
        self.resets += 1;
        self.frozen = false;
        self.timing = None;
        self.listen_only = false;
        self.accepts_all = false;
    }

    fn reset_complete(&self) -> bool {
        true
    }

    fn request_freeze(&mut self) {
        if !self.ignore_freeze {
            self.frozen = true;
        }
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn set_bit_timing(&mut self, timing: BitTiming) {
        assert!(self.frozen, "timing written outside freeze mode");
        self.timing = Some(timing);
    }

    fn set_listen_only(&mut self, enabled: bool) {
        assert!(self.frozen, "mode written outside freeze mode");
        self.listen_only = enabled;
    }

    fn accept_all(&mut self) {
        self.accepts_all = true;
    }

    fn request_unfreeze(&mut self) {
        if self.track_masking {
            self.masked_during_unfreeze = Some(critical_section_held());
        }
        if !self.stuck_frozen {
            self.frozen = false;
            self.masked = false;
        }
    }

    fn mask(&mut self) {
        self.masked = true;
    }

    fn tx_in_progress(&self) -> bool {
        self.tx_busy
    }

    fn write_tx_mailbox(&mut self, frame: &MailboxFrame) -> Result<(), MailboxBusy> {
        if self.tx_busy || self.refuse_writes {
            return Err(MailboxBusy);
        }
        self.sent.push(*frame);
        self.tx_busy = true;
        Ok(())
    }

    fn rx_pending(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn read_rx_fifo(&mut self) -> MailboxFrame {
        self.rx.front().copied().unwrap_or_default()
    }

    fn release_rx_fifo(&mut self) {
        self.rx.pop_front();
        self.releases += 1;
    }

    fn take_rx_error(&mut self) -> bool {
        core::mem::take(&mut self.rx_error)
    }
}

/// Check whether any thread holds the global critical section
fn critical_section_held() -> bool {
    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        critical_section::with(|_| ());
        let _ = done_tx.send(());
    });
    done_rx.recv_timeout(Duration::from_millis(500)).is_err()
}

/// Host serial link backed by byte queues
#[derive(Debug, Default)]
pub struct MockSerial {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
    pub flushes: u32,
    /// Bytes handed out per `read_available` call
    pub chunk: usize,
}

impl MockSerial {
    pub fn new() -> Self {
        Self {
            chunk: 64,
            ..Self::default()
        }
    }

    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.output)
    }
}

impl SerialRx for MockSerial {
    type Error = ();

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let n = buf.len().min(self.chunk).min(self.input.len());
        for slot in buf[..n].iter_mut() {
            *slot = self.input.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

impl SerialTx for MockSerial {
    type Error = ();

    fn write_all(&mut self, data: &[u8]) -> Result<(), ()> {
        self.output.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ()> {
        self.flushes += 1;
        Ok(())
    }
}

/// LED pin that remembers its level and how often it changed
#[derive(Debug, Default)]
pub struct MockPin {
    pub high: bool,
    pub transitions: u32,
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        if !self.high {
            self.transitions += 1;
        }
        self.high = true;
    }

    fn set_low(&mut self) {
        if self.high {
            self.transitions += 1;
        }
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}
