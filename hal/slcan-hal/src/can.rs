//! CAN controller abstractions
//!
//! The adapter's controller driver speaks to the CAN peripheral through
//! [`CanPeripheral`]: a thin view of the controller's mode changes, its TX
//! mailbox, its receive FIFO and its acceptance filter. Sequencing, mode
//! gating and the bounded waits on status bits live in the driver, not
//! here.
//!
//! Every method is non-blocking. Status bits are exposed as plain reads so
//! the caller decides how long it is willing to poll them.

/// Number of time quanta per bit used by [`BitTiming::for_bitrate`]
pub const QUANTA_PER_BIT: u32 = 16;

/// Bit segment 1 length in time quanta (propagation + phase 1)
pub const DEFAULT_SEG1: u8 = 13;

/// Bit segment 2 length in time quanta (phase 2)
pub const DEFAULT_SEG2: u8 = 2;

/// Resynchronisation jump width in time quanta
pub const DEFAULT_SJW: u8 = 1;

/// Largest prescaler the timing register can hold
pub const MAX_PRESCALER: u16 = 1024;

/// Largest standard (11-bit) identifier
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Largest extended (29-bit) identifier
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Nominal bit timing in controller terms
///
/// All segment values are in time quanta, not register encodings; the
/// chip HAL subtracts one where its registers expect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    /// Peripheral clock divider producing one time quantum
    pub prescaler: u16,
    /// Segment 1 (before the sample point, excluding the sync quantum)
    pub seg1: u8,
    /// Segment 2 (after the sample point)
    pub seg2: u8,
    /// Resynchronisation jump width
    pub sjw: u8,
}

impl BitTiming {
    /// Compute timing for `bitrate` bits/s from a `clock_hz` peripheral clock
    ///
    /// Uses a fixed 16-quantum bit (sample point 87.5%). Returns `None` if
    /// the clock cannot be divided down to the requested rate exactly or
    /// the prescaler would not fit the register.
    pub fn for_bitrate(clock_hz: u32, bitrate: u32) -> Option<Self> {
        let quantum_rate = bitrate.checked_mul(QUANTA_PER_BIT)?;
        if quantum_rate == 0 || clock_hz % quantum_rate != 0 {
            return None;
        }

        let prescaler = clock_hz / quantum_rate;
        if prescaler == 0 || prescaler > u32::from(MAX_PRESCALER) {
            return None;
        }

        Some(Self {
            prescaler: prescaler as u16,
            seg1: DEFAULT_SEG1,
            seg2: DEFAULT_SEG2,
            sjw: DEFAULT_SJW,
        })
    }

    /// Total time quanta in one bit, including the sync quantum
    pub fn quanta_per_bit(&self) -> u32 {
        1 + u32::from(self.seg1) + u32::from(self.seg2)
    }

    /// Resulting bit rate for a given peripheral clock
    pub fn bitrate(&self, clock_hz: u32) -> u32 {
        clock_hz / (u32::from(self.prescaler) * self.quanta_per_bit())
    }
}

/// Contents of one hardware mailbox
///
/// This is the register view of a classic CAN frame: a right-aligned
/// identifier plus the IDE/RTR flags, the DLC and both data words as
/// bytes. Data slots past `dlc` are carried as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MailboxFrame {
    /// Identifier, right-aligned (11 or 29 significant bits)
    pub id: u32,
    /// IDE flag: extended (29-bit) identifier
    pub extended: bool,
    /// RTR flag: remote transmission request
    pub remote: bool,
    /// Data length code (0-8)
    pub dlc: u8,
    /// Data words 0 and 1 as bytes
    pub data: [u8; 8],
}

/// The TX mailbox refused a write because a frame is still pending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MailboxBusy;

/// Access to a single CAN controller
///
/// Implementations own the peripheral. The driver keeps at most one frame
/// in the TX mailboxes and reads the first RX FIFO.
pub trait CanPeripheral {
    /// Request a soft reset: pending transmissions and unread frames are dropped
    fn request_reset(&mut self);

    /// Check whether a requested soft reset has finished
    fn reset_complete(&self) -> bool;

    /// Request freeze mode, holding the controller off the bus
    ///
    /// Bit timing, operating mode and filters are only applied while the
    /// controller acknowledges freeze mode.
    fn request_freeze(&mut self);

    /// Check whether the controller acknowledges freeze mode
    fn is_frozen(&self) -> bool;

    /// Stage nominal bit timing for the next unfreeze
    fn set_bit_timing(&mut self, timing: BitTiming);

    /// Stage listen-only (silent) or normal mode for the next unfreeze
    fn set_listen_only(&mut self, enabled: bool);

    /// Program the global receive filter to accept every identifier
    fn accept_all(&mut self);

    /// Apply staged settings, leave freeze mode and join the bus
    ///
    /// Completion is observed as [`is_frozen`](Self::is_frozen) turning false.
    fn request_unfreeze(&mut self);

    /// Take the controller off the bus and mask its activity
    fn mask(&mut self);

    /// Check whether a frame is still pending in the TX mailboxes
    fn tx_in_progress(&self) -> bool;

    /// Load a TX mailbox and request transmission
    fn write_tx_mailbox(&mut self, frame: &MailboxFrame) -> Result<(), MailboxBusy>;

    /// Check whether a received frame is waiting
    fn rx_pending(&mut self) -> bool;

    /// Read the oldest received frame
    ///
    /// Latches the frame; the caller commits to it and must call
    /// [`release_rx_fifo`](Self::release_rx_fifo) afterwards.
    fn read_rx_fifo(&mut self) -> MailboxFrame;

    /// Release the latched frame so the next one can be read
    fn release_rx_fifo(&mut self);

    /// Check and clear the receive-path error latch (FIFO overrun or bus error)
    fn take_rx_error(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOCK_48MHZ: u32 = 48_000_000;

    #[test]
    fn test_timing_for_standard_rates() {
        let expected = [
            (10_000, 300),
            (20_000, 150),
            (50_000, 60),
            (100_000, 30),
            (125_000, 24),
            (250_000, 12),
            (500_000, 6),
            (750_000, 4),
            (1_000_000, 3),
        ];

        for (rate, prescaler) in expected {
            let timing = BitTiming::for_bitrate(CLOCK_48MHZ, rate).unwrap();
            assert_eq!(timing.prescaler, prescaler);
            assert_eq!(timing.bitrate(CLOCK_48MHZ), rate);
        }
    }

    #[test]
    fn test_sample_point_layout() {
        let timing = BitTiming::for_bitrate(CLOCK_48MHZ, 125_000).unwrap();
        assert_eq!(timing.quanta_per_bit(), QUANTA_PER_BIT);
        assert_eq!(timing.sjw, 1);
    }

    #[test]
    fn test_timing_rejects_inexact_rate() {
        assert_eq!(BitTiming::for_bitrate(CLOCK_48MHZ, 33_333), None);
    }

    #[test]
    fn test_timing_rejects_zero_rate() {
        assert_eq!(BitTiming::for_bitrate(CLOCK_48MHZ, 0), None);
    }

    #[test]
    fn test_timing_rejects_prescaler_overflow() {
        // 48 MHz / (1 kbit/s * 16) = 3000 > 1024
        assert_eq!(BitTiming::for_bitrate(CLOCK_48MHZ, 1_000), None);
    }
}
