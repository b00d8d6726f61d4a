//! Inbound host command decoding
//!
//! One dispatch on the first character of a line. Everything after the
//! command letter is converted from ASCII hex to nybbles in a single pass
//! before any field is read, so the command letter itself is never taken
//! as data.
//!
//! Frame commands read their payload as nybble pairs filling the 8 data
//! slots in order. Full-width lines (16 payload digits) and short lines
//! (exactly `2 * DLC` digits) are both accepted; slots the host did not
//! send are zero.

use crate::frame::{CanFrame, FrameKind, Id, EXTENDED_ID_DIGITS, MAX_DATA_LEN, STANDARD_ID_DIGITS};
use crate::hex::{to_nybbles, INVALID_NYBBLE};
use crate::line::LINE_CAPACITY;

/// Errors decoding a host line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Line had no command character
    Empty,
    /// First character is not a known command
    UnknownCommand,
    /// Line is longer than any valid command
    TooLong,
    /// A field contained a non-hex character
    InvalidHex,
    /// A single-digit argument was missing
    MissingArgument,
    /// Bitrate selector outside 0-8
    InvalidBitrate,
    /// Identifier does not fit its format
    IdOutOfRange,
    /// DLC above 8
    InvalidLength,
    /// Frame line ended before all declared fields
    Truncated,
}

/// Standard slcan bitrate selectors (`S0` to `S8`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bitrate {
    Kbit10,
    Kbit20,
    Kbit50,
    Kbit100,
    Kbit125,
    Kbit250,
    Kbit500,
    Kbit750,
    Kbit1000,
}

impl Bitrate {
    /// Number of valid selectors
    pub const COUNT: u8 = 9;

    /// Map a selector strictly, `None` for anything above 8
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Bitrate::Kbit10),
            1 => Some(Bitrate::Kbit20),
            2 => Some(Bitrate::Kbit50),
            3 => Some(Bitrate::Kbit100),
            4 => Some(Bitrate::Kbit125),
            5 => Some(Bitrate::Kbit250),
            6 => Some(Bitrate::Kbit500),
            7 => Some(Bitrate::Kbit750),
            8 => Some(Bitrate::Kbit1000),
            _ => None,
        }
    }

    /// Map a selector the way the controller does: unknown values select 1 Mbit/s
    pub fn from_selector(selector: u8) -> Self {
        Self::from_index(selector).unwrap_or(Bitrate::Kbit1000)
    }

    /// Selector digit for this rate
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Nominal rate in bits per second
    pub fn bits_per_second(self) -> u32 {
        match self {
            Bitrate::Kbit10 => 10_000,
            Bitrate::Kbit20 => 20_000,
            Bitrate::Kbit50 => 50_000,
            Bitrate::Kbit100 => 100_000,
            Bitrate::Kbit125 => 125_000,
            Bitrate::Kbit250 => 250_000,
            Bitrate::Kbit500 => 500_000,
            Bitrate::Kbit750 => 750_000,
            Bitrate::Kbit1000 => 1_000_000,
        }
    }
}

/// A decoded host command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `O`: open the channel (go on bus)
    Open,
    /// `C`: close the channel (go off bus)
    Close,
    /// `Sn`: select a standard bitrate
    SetBitrate(Bitrate),
    /// `Mn`/`mn`: listen-only (1) or normal (anything else)
    SetListenOnly(bool),
    /// `An`/`an`: automatic retransmission on (1) or off (anything else)
    SetAutoRetransmit(bool),
    /// `V`: version query
    Version,
    /// `t`/`T`/`r`/`R`: queue a frame for transmission
    Transmit(CanFrame),
}

impl Command {
    /// Decode one host line (terminator already stripped)
    pub fn parse(line: &[u8]) -> Result<Self, DecodeError> {
        let (&cmd, args) = line.split_first().ok_or(DecodeError::Empty)?;

        let mut scratch = [0u8; LINE_CAPACITY];
        let nybbles = scratch
            .get_mut(..args.len())
            .ok_or(DecodeError::TooLong)?;
        nybbles.copy_from_slice(args);
        to_nybbles(nybbles);

        let mut fields = Fields::new(nybbles);

        match cmd {
            b'O' => Ok(Command::Open),
            b'C' => Ok(Command::Close),
            b'S' => {
                let index = fields.digit()?;
                Bitrate::from_index(index)
                    .map(Command::SetBitrate)
                    .ok_or(DecodeError::InvalidBitrate)
            }
            b'm' | b'M' => Ok(Command::SetListenOnly(fields.digit()? == 1)),
            b'a' | b'A' => Ok(Command::SetAutoRetransmit(fields.digit()? == 1)),
            b'V' => Ok(Command::Version),
            b't' => parse_frame(&mut fields, FrameKind::Data, false),
            b'T' => parse_frame(&mut fields, FrameKind::Data, true),
            b'r' => parse_frame(&mut fields, FrameKind::Remote, false),
            b'R' => parse_frame(&mut fields, FrameKind::Remote, true),
            _ => Err(DecodeError::UnknownCommand),
        }
    }
}

/// Sequential reader over a nybble buffer
struct Fields<'a> {
    nybbles: &'a [u8],
    pos: usize,
}

impl<'a> Fields<'a> {
    fn new(nybbles: &'a [u8]) -> Self {
        Self { nybbles, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.nybbles.len() - self.pos
    }

    fn digit(&mut self) -> Result<u8, DecodeError> {
        let value = *self
            .nybbles
            .get(self.pos)
            .ok_or(DecodeError::MissingArgument)?;
        if value == INVALID_NYBBLE {
            return Err(DecodeError::InvalidHex);
        }
        self.pos += 1;
        Ok(value)
    }

    /// Big-endian multi-digit value
    fn value(&mut self, digits: usize) -> Result<u32, DecodeError> {
        let mut value = 0u32;
        for _ in 0..digits {
            value = (value << 4) | u32::from(self.digit()?);
        }
        Ok(value)
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let high = self.digit()?;
        let low = self.digit()?;
        Ok((high << 4) | low)
    }
}

fn parse_frame(fields: &mut Fields<'_>, kind: FrameKind, extended: bool) -> Result<Command, DecodeError> {
    let id_digits = if extended {
        EXTENDED_ID_DIGITS
    } else {
        STANDARD_ID_DIGITS
    };
    if fields.remaining() < id_digits + 1 {
        return Err(DecodeError::Truncated);
    }

    let raw_id = fields.value(id_digits)?;
    let id = if extended {
        Id::extended(raw_id)
    } else {
        u16::try_from(raw_id).ok().and_then(Id::standard)
    }
    .ok_or(DecodeError::IdOutOfRange)?;

    let len = fields.digit()?;
    if usize::from(len) > MAX_DATA_LEN {
        return Err(DecodeError::InvalidLength);
    }

    let mut data = [0u8; MAX_DATA_LEN];
    let pairs = (fields.remaining() / 2).min(MAX_DATA_LEN);
    for slot in data.iter_mut().take(pairs) {
        *slot = fields.byte()?;
    }
    if kind == FrameKind::Data && pairs < usize::from(len) {
        return Err(DecodeError::Truncated);
    }

    CanFrame::new(id, kind, len, data)
        .map(Command::Transmit)
        .map_err(|_| DecodeError::InvalidLength)
}
