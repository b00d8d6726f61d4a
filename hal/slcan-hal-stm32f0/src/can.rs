//! bxCAN controller for STM32F0
//!
//! [`CanPeripheral`] over the embassy-stm32 `Can` driver. Freeze mode maps
//! onto the driver's sleep mode: timing and mode are staged while asleep
//! and written through `modify_config` on unfreeze. Filter bank 0 feeds
//! FIFO 0; the other banks stay disabled.
//!
//! The driver's async calls (`enable`, `sleep`) are polled once and never
//! awaited; their completion is read back through the status getters so
//! the poll loop keeps its own wait budget.

use core::num::{NonZeroU16, NonZeroU8};

use embassy_futures::poll_once;
use embassy_stm32::can::filter::Mask32;
use embassy_stm32::can::enums::TryReadError;
use embassy_stm32::can::frame::Header;
use embassy_stm32::can::util::NominalBitTiming;
use embassy_stm32::can::{
    Can, ExtendedId, Fifo, Frame, Id, Mailbox, StandardId,
};
use slcan_hal::{BitTiming, CanPeripheral, MailboxBusy, MailboxFrame};

const FILTER_BANK: u8 = 0;

/// Hardware FIFO depth, bounds the drain on reset
const RX_FIFO_DEPTH: usize = 3;

const TX_MAILBOXES: [Mailbox; 3] = [Mailbox::Mailbox0, Mailbox::Mailbox1, Mailbox::Mailbox2];

/// The STM32F0 bxCAN controller
pub struct BxCan {
    can: Can<'static>,
    timing: Option<NominalBitTiming>,
    listen_only: bool,
    latched: Option<Frame>,
    rx_error: bool,
}

impl BxCan {
    /// Wrap a constructed driver and hold it off the bus
    ///
    /// The firmware builds the `Can` (pins and interrupt bindings are
    /// board wiring); nothing joins the bus until the first unfreeze.
    pub fn new(can: Can<'static>) -> Self {
        let mut this = Self {
            can,
            timing: None,
            listen_only: false,
            latched: None,
            rx_error: false,
        };
        this.mask();
        this
    }
}

fn nominal_timing(timing: BitTiming) -> Option<NominalBitTiming> {
    Some(NominalBitTiming {
        prescaler: NonZeroU16::new(timing.prescaler)?,
        seg1: NonZeroU8::new(timing.seg1)?,
        seg2: NonZeroU8::new(timing.seg2)?,
        sync_jump_width: NonZeroU8::new(timing.sjw)?,
    })
}

/// Driver frame for a mailbox write, `None` if the identifier overflows its format
fn frame_for_mailbox(raw: &MailboxFrame) -> Option<Frame> {
    let id = if raw.extended {
        Id::Extended(ExtendedId::new(raw.id)?)
    } else {
        Id::Standard(StandardId::new(u16::try_from(raw.id).ok()?)?)
    };
    let len = raw.dlc.min(8);
    Frame::new(Header::new(id, len, raw.remote), &raw.data[..usize::from(len)]).ok()
}

fn mailbox_for_frame(frame: &Frame) -> MailboxFrame {
    let header = frame.header();
    let (id, extended) = match *header.id() {
        Id::Standard(id) => (u32::from(id.as_raw()), false),
        Id::Extended(id) => (id.as_raw(), true),
    };

    let payload = frame.data();
    let count = payload.len().min(8);
    let mut data = [0u8; 8];
    data[..count].copy_from_slice(&payload[..count]);

    MailboxFrame {
        id,
        extended,
        remote: header.rtr(),
        dlc: header.len(),
        data,
    }
}

impl CanPeripheral for BxCan {
    fn request_reset(&mut self) {
        for mailbox in TX_MAILBOXES {
            self.can.abort(mailbox);
        }

        self.latched = None;
        for _ in 0..RX_FIFO_DEPTH {
            if self.can.try_read().is_err() {
                break;
            }
        }
        self.rx_error = false;
    }

    fn reset_complete(&self) -> bool {
        self.can.is_transmitter_idle()
    }

    fn request_freeze(&mut self) {
        let _ = poll_once(self.can.sleep());
    }

    fn is_frozen(&self) -> bool {
        self.can.is_sleeping()
    }

    fn set_bit_timing(&mut self, timing: BitTiming) {
        self.timing = nominal_timing(timing);
        #[cfg(feature = "defmt")]
        if self.timing.is_none() {
            defmt::error!("bit timing {} has a zero field", timing);
        }
    }

    fn set_listen_only(&mut self, enabled: bool) {
        self.listen_only = enabled;
    }

    fn accept_all(&mut self) {
        self.can
            .modify_filters()
            .enable_bank(FILTER_BANK, Fifo::Fifo0, Mask32::accept_all());
    }

    fn request_unfreeze(&mut self) {
        {
            let config = self
                .can
                .modify_config()
                .set_loopback(false)
                .set_silent(self.listen_only);
            if let Some(timing) = self.timing {
                config.set_bit_timing(timing);
            }
        }

        let _ = poll_once(self.can.enable());
    }

    fn mask(&mut self) {
        let _ = poll_once(self.can.sleep());
    }

    fn tx_in_progress(&self) -> bool {
        !self.can.is_transmitter_idle()
    }

    fn write_tx_mailbox(&mut self, frame: &MailboxFrame) -> Result<(), MailboxBusy> {
        if self.tx_in_progress() {
            return Err(MailboxBusy);
        }

        let frame = frame_for_mailbox(frame).ok_or(MailboxBusy)?;
        self.can.try_write(&frame).map(|_| ()).map_err(|_| MailboxBusy)
    }

    fn rx_pending(&mut self) -> bool {
        if self.latched.is_none() {
            match self.can.try_read() {
                Ok(envelope) => self.latched = Some(envelope.frame),
                Err(TryReadError::Empty) => {}
                Err(TryReadError::BusError(_e)) => {
                    self.rx_error = true;
                    #[cfg(feature = "defmt")]
                    defmt::debug!("CAN bus error: {}", _e);
                }
            }
        }
        self.latched.is_some()
    }

    fn read_rx_fifo(&mut self) -> MailboxFrame {
        self.latched
            .as_ref()
            .map(mailbox_for_frame)
            .unwrap_or_default()
    }

    fn release_rx_fifo(&mut self) {
        self.latched = None;
    }

    fn take_rx_error(&mut self) -> bool {
        core::mem::take(&mut self.rx_error)
    }
}
