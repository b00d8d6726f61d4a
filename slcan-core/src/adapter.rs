//! The adapter poll loop
//!
//! [`AdapterContext`] owns every piece of adapter state: the controller
//! driver (and its transmit queue), the host link, the line accumulator,
//! the status LEDs and the diagnostic counters. The firmware calls
//! [`AdapterContext::poll`] forever; each call runs one fixed sequence:
//!
//! 1. Drain all available host bytes into lines and execute them
//! 2. Turn off LEDs whose on time has elapsed
//! 3. Move at most one queued frame into the TX mailbox
//! 4. Forward at most one received frame to the host
//!
//! Nothing here blocks. Errors never leave the loop; they are counted in
//! [`Diagnostics`] and the offending line or frame is dropped.

use slcan_hal::{CanPeripheral, OutputPin, Serial};
use slcan_protocol::{
    Command, DecodeError, Line, LineBuffer, LineError, LINE_TERMINATOR, MAX_LINE_LEN,
};

use crate::config::AdapterConfig;
use crate::diagnostics::{Diagnostics, Fault};
use crate::driver::{CanController, ControllerError, TxService};
use crate::led::StatusLeds;

/// Bytes pulled from the host link per read
const INPUT_CHUNK: usize = 64;

/// Single-instance adapter state, owned by the poll loop
pub struct AdapterContext<P, S, B, A>
where
    P: CanPeripheral,
    S: Serial,
    B: OutputPin,
    A: OutputPin,
{
    controller: CanController<P>,
    serial: S,
    line: LineBuffer,
    leds: StatusLeds<B, A>,
    diagnostics: Diagnostics,
    version_line: Option<&'static [u8]>,
}

impl<P, S, B, A> AdapterContext<P, S, B, A>
where
    P: CanPeripheral,
    S: Serial,
    B: OutputPin,
    A: OutputPin,
{
    /// Assemble the adapter, off the bus with an empty queue
    pub fn new(peripheral: P, serial: S, leds: StatusLeds<B, A>, config: &AdapterConfig) -> Self {
        Self {
            controller: CanController::new(peripheral, config),
            serial,
            line: LineBuffer::new(),
            leds,
            diagnostics: Diagnostics::new(),
            version_line: config.version_line,
        }
    }

    pub fn controller(&self) -> &CanController<P> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut CanController<P> {
        &mut self.controller
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn leds(&self) -> &StatusLeds<B, A> {
        &self.leds
    }

    /// Counters accumulated since startup
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Run one iteration of the poll loop
    pub fn poll(&mut self, now_ms: u32) {
        self.drain_host_input(now_ms);
        self.leds.service(now_ms);
        self.service_transmit(now_ms);
        self.forward_received(now_ms);
    }

    /// Pull every available host byte through the line accumulator
    ///
    /// Reads and line bookkeeping run with interrupts masked so the line
    /// buffer is never observed half-updated. Completed lines execute
    /// outside the critical section.
    fn drain_host_input(&mut self, now_ms: u32) {
        let mut chunk = [0u8; INPUT_CHUNK];
        loop {
            let read = critical_section::with(|_| self.serial.read_available(&mut chunk));
            let count = match read {
                Ok(0) => break,
                Ok(count) => count,
                Err(_) => {
                    self.diagnostics.record(Fault::HostIo);
                    break;
                }
            };

            for &byte in &chunk[..count] {
                let fed = critical_section::with(|_| self.line.feed(byte));
                self.accept_fed(fed, now_ms);
            }
        }
    }

    fn accept_fed(&mut self, fed: Result<Option<Line>, LineError>, now_ms: u32) {
        match fed {
            Ok(Some(line)) => {
                // Failures are counted inside; the host gets no reply
                let _ = self.handle_line(&line, now_ms);
            }
            Ok(None) => {}
            Err(LineError::Overflow) => {
                self.diagnostics.record(Fault::LineOverflow);
                #[cfg(feature = "defmt")]
                defmt::warn!("host line overflow, discarded");
            }
        }
    }

    /// Decode and execute one complete host line (terminator stripped)
    pub fn handle_line(&mut self, line: &[u8], now_ms: u32) -> Result<(), DecodeError> {
        match Command::parse(line) {
            Ok(command) => {
                self.execute(command, now_ms);
                Ok(())
            }
            Err(e) => {
                self.diagnostics.record(Fault::ParseError);
                #[cfg(feature = "defmt")]
                defmt::debug!("rejected host line: {}", e);
                Err(e)
            }
        }
    }

    fn execute(&mut self, command: Command, now_ms: u32) {
        match command {
            Command::Open => {
                match self.controller.enable() {
                    Ok(()) => {}
                    Err(ControllerError::Timeout(_)) => {
                        self.diagnostics.record(Fault::HardwareTimeout)
                    }
                    Err(ControllerError::UnsupportedBitrate(_)) => {
                        self.diagnostics.record(Fault::UnsupportedBitrate)
                    }
                }
                self.leds.bus.set_steady(self.controller.is_on_bus(), now_ms);
            }
            Command::Close => {
                self.controller.disable();
                self.leds.bus.set_steady(false, now_ms);
            }
            Command::SetBitrate(bitrate) => self.controller.set_bitrate(bitrate),
            Command::SetListenOnly(enabled) => self.controller.set_listen_only(enabled),
            Command::SetAutoRetransmit(enabled) => self.controller.set_auto_retransmit(enabled),
            Command::Version => {
                if let Some(version) = self.version_line {
                    self.send_line(version);
                }
            }
            Command::Transmit(frame) => {
                if self.controller.transmit_enqueue(frame).is_err() {
                    self.diagnostics.record(Fault::QueueFull);
                    #[cfg(feature = "defmt")]
                    defmt::warn!("TX queue full, frame {:x} dropped", frame.id().as_raw());
                }
            }
        }
    }

    fn service_transmit(&mut self, now_ms: u32) {
        match self.controller.service_transmit() {
            TxService::Idle => {}
            TxService::Sent(_) => {
                self.diagnostics.frame_sent();
                self.leds.activity.flash(now_ms);
            }
            TxService::Dropped(_) => self.diagnostics.record(Fault::TxRejected),
        }
    }

    fn forward_received(&mut self, now_ms: u32) {
        if self.controller.take_rx_error() {
            self.diagnostics.record(Fault::RxError);
            #[cfg(feature = "defmt")]
            defmt::warn!("CAN receive error");
        }

        if !self.controller.receive_pending() {
            return;
        }

        let frame = self.controller.receive_drain();
        self.diagnostics.frame_received();
        self.leds.activity.flash(now_ms);

        let mut line = [0u8; MAX_LINE_LEN];
        if let Some(len) = frame.encode(&mut line).ok().filter(|len| *len > 0) {
            self.write_host(&line[..len]);
        }
    }

    /// Write `body` plus a terminator
    fn send_line(&mut self, body: &[u8]) {
        let result = self
            .serial
            .write_all(body)
            .and_then(|()| self.serial.write_all(&[LINE_TERMINATOR]))
            .and_then(|()| self.serial.flush());
        if result.is_err() {
            self.diagnostics.record(Fault::HostIo);
        }
    }

    fn write_host(&mut self, bytes: &[u8]) {
        let result = self
            .serial
            .write_all(bytes)
            .and_then(|()| self.serial.flush());
        if result.is_err() {
            self.diagnostics.record(Fault::HostIo);
        }
    }
}
