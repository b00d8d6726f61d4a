//! CAN controller driver
//!
//! Owns the peripheral and the transmit queue, and tracks whether the
//! adapter is on the bus. Configuration setters only take effect while
//! off the bus; the stored values are applied on the next `enable`.
//!
//! ```text
//!            enable (reset, freeze, configure, unfreeze)
//!   OffBus ───────────────────────────────────────────▶ OnBus
//!     ▲                                                   │
//!     └──────────────────── disable (mask) ───────────────┘
//! ```

use slcan_hal::{BitTiming, CanPeripheral, MailboxFrame};
use slcan_protocol::{Bitrate, CanFrame, FrameKind, Id};

use super::tx_queue::{QueueFull, TxQueue};
use crate::config::AdapterConfig;

/// Whether the controller participates in bus traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// Masked; configuration may change
    #[default]
    OffBus,
    /// Transmitting and receiving
    OnBus,
}

/// Mode transition that a status bit failed to confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Soft reset
    Reset,
    /// Entering freeze mode
    Freeze,
    /// Leaving freeze mode
    Unfreeze,
}

/// Errors bringing the controller onto the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerError {
    /// A status bit did not change within the polling budget
    Timeout(Phase),
    /// The peripheral clock cannot produce the selected bitrate
    UnsupportedBitrate(Bitrate),
}

/// Configuration applied on the next `enable`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerSettings {
    /// Nominal bitrate
    pub bitrate: Bitrate,
    /// Listen-only (silent) mode
    pub listen_only: bool,
    /// Automatic retransmission; stored but not applied to hardware
    pub auto_retransmit: bool,
}

/// Result of one transmit service pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxService {
    /// Nothing was moved (queue empty, mailbox busy or off the bus)
    Idle,
    /// The oldest queued frame was loaded into the mailbox
    Sent(CanFrame),
    /// The mailbox refused the dequeued frame; it is gone
    Dropped(CanFrame),
}

/// Driver for a single CAN controller
pub struct CanController<P: CanPeripheral> {
    peripheral: P,
    state: BusState,
    settings: ControllerSettings,
    clock_hz: u32,
    wait_limit: u32,
    tx_queue: TxQueue,
}

impl<P: CanPeripheral> CanController<P> {
    /// Take ownership of the peripheral, off the bus with default settings
    ///
    /// The peripheral is masked so it stays silent until `enable`.
    pub fn new(mut peripheral: P, config: &AdapterConfig) -> Self {
        peripheral.mask();

        Self {
            peripheral,
            state: BusState::OffBus,
            settings: ControllerSettings {
                bitrate: config.default_bitrate,
                listen_only: false,
                auto_retransmit: true,
            },
            clock_hz: config.peripheral_clock_hz,
            wait_limit: config.hw_wait_iterations,
            tx_queue: TxQueue::new(),
        }
    }

    /// Current bus state
    pub fn state(&self) -> BusState {
        self.state
    }

    /// Check if the controller is on the bus
    pub fn is_on_bus(&self) -> bool {
        self.state == BusState::OnBus
    }

    /// Settings that the next `enable` will apply
    pub fn settings(&self) -> ControllerSettings {
        self.settings
    }

    /// Frames waiting for the TX mailbox
    pub fn tx_queue(&self) -> &TxQueue {
        &self.tx_queue
    }

    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.peripheral
    }

    /// Bring the controller onto the bus
    ///
    /// Soft reset, freeze, program timing/mode/filter, then unfreeze. A
    /// no-op when already on the bus. On failure the peripheral is masked
    /// again and the state stays `OffBus`.
    pub fn enable(&mut self) -> Result<(), ControllerError> {
        if self.is_on_bus() {
            return Ok(());
        }

        if let Err(e) = self.start() {
            self.peripheral.mask();
            #[cfg(feature = "defmt")]
            defmt::warn!("CAN enable failed: {}", e);
            return Err(e);
        }

        self.state = BusState::OnBus;
        #[cfg(feature = "defmt")]
        defmt::info!(
            "CAN on bus at {} bit/s (listen-only: {})",
            self.settings.bitrate.bits_per_second(),
            self.settings.listen_only
        );
        Ok(())
    }

    fn start(&mut self) -> Result<(), ControllerError> {
        let bitrate = self.settings.bitrate;
        let timing = BitTiming::for_bitrate(self.clock_hz, bitrate.bits_per_second())
            .ok_or(ControllerError::UnsupportedBitrate(bitrate))?;

        self.peripheral.request_reset();
        self.wait_for(Phase::Reset, |p| p.reset_complete())?;

        self.peripheral.request_freeze();
        self.wait_for(Phase::Freeze, |p| p.is_frozen())?;

        self.peripheral.set_bit_timing(timing);
        self.peripheral.set_listen_only(self.settings.listen_only);
        self.peripheral.accept_all();

        self.peripheral.request_unfreeze();
        self.wait_for(Phase::Unfreeze, |p| !p.is_frozen())
    }

    /// Poll `done` until it holds or the wait budget runs out
    fn wait_for(&self, phase: Phase, done: impl Fn(&P) -> bool) -> Result<(), ControllerError> {
        for _ in 0..self.wait_limit {
            if done(&self.peripheral) {
                return Ok(());
            }
        }
        Err(ControllerError::Timeout(phase))
    }

    /// Take the controller off the bus
    ///
    /// Queued frames are kept. No-op when already off the bus.
    pub fn disable(&mut self) {
        if !self.is_on_bus() {
            return;
        }

        self.peripheral.mask();
        self.state = BusState::OffBus;
        #[cfg(feature = "defmt")]
        defmt::info!("CAN off bus ({} frames queued)", self.tx_queue.len());
    }

    /// Select the bitrate for the next `enable`; ignored while on the bus
    pub fn set_bitrate(&mut self, bitrate: Bitrate) {
        if self.reject_while_on_bus() {
            return;
        }
        self.settings.bitrate = bitrate;
    }

    /// Select the bitrate by slcan selector; anything above 8 means 1 Mbit/s
    pub fn set_bitrate_index(&mut self, selector: u8) {
        self.set_bitrate(Bitrate::from_selector(selector));
    }

    /// Select listen-only mode for the next `enable`; ignored while on the bus
    pub fn set_listen_only(&mut self, enabled: bool) {
        if self.reject_while_on_bus() {
            return;
        }
        self.settings.listen_only = enabled;
    }

    /// Store the retransmission preference; ignored while on the bus
    pub fn set_auto_retransmit(&mut self, enabled: bool) {
        if self.reject_while_on_bus() {
            return;
        }
        self.settings.auto_retransmit = enabled;
    }

    fn reject_while_on_bus(&self) -> bool {
        #[cfg(feature = "defmt")]
        if self.is_on_bus() {
            defmt::debug!("setting ignored while on bus");
        }
        self.is_on_bus()
    }

    /// Queue a frame for transmission
    pub fn transmit_enqueue(&mut self, frame: CanFrame) -> Result<(), QueueFull> {
        self.tx_queue.push(frame)
    }

    /// Move at most one frame from the queue into the TX mailbox
    ///
    /// Does nothing off the bus or while the mailbox is still sending, so
    /// queued frames survive a close/open cycle. A frame the mailbox
    /// refuses is dropped.
    pub fn service_transmit(&mut self) -> TxService {
        if !self.is_on_bus() || self.peripheral.tx_in_progress() {
            return TxService::Idle;
        }

        let Some(frame) = self.tx_queue.pop() else {
            return TxService::Idle;
        };

        match self.peripheral.write_tx_mailbox(&mailbox_from_frame(&frame)) {
            Ok(()) => TxService::Sent(frame),
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("TX mailbox refused frame {:x}", frame.id().as_raw());
                TxService::Dropped(frame)
            }
        }
    }

    /// Check whether a received frame is waiting in the FIFO
    pub fn receive_pending(&mut self) -> bool {
        self.is_on_bus() && self.peripheral.rx_pending()
    }

    /// Read the oldest received frame and release its FIFO slot
    ///
    /// Only meaningful after `receive_pending` returned true.
    pub fn receive_drain(&mut self) -> CanFrame {
        let raw = self.peripheral.read_rx_fifo();
        self.peripheral.release_rx_fifo();
        frame_from_mailbox(&raw)
    }

    /// Check and clear the receive-path error latch
    pub fn take_rx_error(&mut self) -> bool {
        self.peripheral.take_rx_error()
    }
}

/// Register view of a frame, for the TX mailbox
pub fn mailbox_from_frame(frame: &CanFrame) -> MailboxFrame {
    MailboxFrame {
        id: frame.id().as_raw(),
        extended: frame.id().is_extended(),
        remote: frame.is_remote(),
        dlc: frame.len(),
        data: *frame.slots(),
    }
}

/// Frame from an RX mailbox
///
/// Identifier bits above the format's width are discarded and a DLC above
/// 8 is clamped, as classic CAN defines for DLC 9-15.
pub fn frame_from_mailbox(raw: &MailboxFrame) -> CanFrame {
    let id = if raw.extended {
        Id::Extended(raw.id & slcan_hal::can::MAX_EXTENDED_ID)
    } else {
        Id::Standard((raw.id & slcan_hal::can::MAX_STANDARD_ID) as u16)
    };
    let kind = if raw.remote {
        FrameKind::Remote
    } else {
        FrameKind::Data
    };

    CanFrame::new(id, kind, raw.dlc.min(8), raw.data).unwrap_or_default()
}
