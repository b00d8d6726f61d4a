//! CAN frame model and slcan line encoding
//!
//! Line format for a frame:
//! - CMD (1 char): `t` standard data, `T` extended data, `r`/`R` remote
//! - ID (3 or 8 chars): identifier, upper case hex, most significant first
//! - DLC (1 char): data length 0-8
//! - DATA (16 chars): all 8 payload slots, two hex digits each
//! - CR (1 char): `\r` terminator
//!
//! The payload is always written full width, whatever the DLC says; hosts
//! that only look at the first `2 * DLC` digits are unaffected.

use heapless::Vec;

use crate::hex::write_hex;
use crate::line::LINE_TERMINATOR;

/// Maximum payload bytes in a classic CAN frame
pub const MAX_DATA_LEN: usize = 8;

/// Identifier digits for standard frames
pub const STANDARD_ID_DIGITS: usize = 3;

/// Identifier digits for extended frames
pub const EXTENDED_ID_DIGITS: usize = 8;

/// Payload digits on the wire (all slots, full width)
pub const PAYLOAD_DIGITS: usize = 2 * MAX_DATA_LEN;

/// Largest standard identifier
pub const MAX_STANDARD_ID: u16 = 0x7FF;

/// Largest extended identifier
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Maximum encoded line size (CMD + extended ID + DLC + DATA + CR)
pub const MAX_LINE_LEN: usize = 1 + EXTENDED_ID_DIGITS + 1 + PAYLOAD_DIGITS + 1;

/// Errors constructing a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Identifier does not fit its format
    IdOutOfRange,
    /// Length exceeds 8 bytes
    InvalidLength,
}

/// Errors encoding a frame to a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Buffer too small for the encoded line
    BufferTooSmall,
}

/// CAN identifier, tagged by format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Id {
    /// 11-bit identifier
    Standard(u16),
    /// 29-bit identifier
    Extended(u32),
}

impl Id {
    /// Create a standard identifier, `None` if above 0x7FF
    pub fn standard(raw: u16) -> Option<Self> {
        (raw <= MAX_STANDARD_ID).then_some(Id::Standard(raw))
    }

    /// Create an extended identifier, `None` if above 0x1FFF_FFFF
    pub fn extended(raw: u32) -> Option<Self> {
        (raw <= MAX_EXTENDED_ID).then_some(Id::Extended(raw))
    }

    /// Raw numeric identifier
    pub fn as_raw(&self) -> u32 {
        match *self {
            Id::Standard(raw) => u32::from(raw),
            Id::Extended(raw) => raw,
        }
    }

    /// Check if this is a 29-bit identifier
    pub fn is_extended(&self) -> bool {
        matches!(self, Id::Extended(_))
    }

    /// Number of hex digits this identifier occupies on the wire
    pub fn digits(&self) -> usize {
        if self.is_extended() {
            EXTENDED_ID_DIGITS
        } else {
            STANDARD_ID_DIGITS
        }
    }
}

/// Frame type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameKind {
    /// Data frame
    Data,
    /// Remote transmission request
    Remote,
}

/// One classic CAN message
///
/// All 8 payload slots are stored whatever the length, so a frame read
/// from a mailbox or a full-width line survives a round trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanFrame {
    id: Id,
    kind: FrameKind,
    len: u8,
    data: [u8; MAX_DATA_LEN],
}

impl Default for CanFrame {
    /// Empty standard data frame with identifier 0
    fn default() -> Self {
        Self {
            id: Id::Standard(0),
            kind: FrameKind::Data,
            len: 0,
            data: [0; MAX_DATA_LEN],
        }
    }
}

impl CanFrame {
    /// Create a frame from all of its parts
    pub fn new(id: Id, kind: FrameKind, len: u8, data: [u8; MAX_DATA_LEN]) -> Result<Self, FrameError> {
        if usize::from(len) > MAX_DATA_LEN {
            return Err(FrameError::InvalidLength);
        }
        let in_range = match id {
            Id::Standard(raw) => raw <= MAX_STANDARD_ID,
            Id::Extended(raw) => raw <= MAX_EXTENDED_ID,
        };
        if !in_range {
            return Err(FrameError::IdOutOfRange);
        }

        Ok(Self { id, kind, len, data })
    }

    /// Create a data frame carrying `payload`
    pub fn data_frame(id: Id, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_DATA_LEN {
            return Err(FrameError::InvalidLength);
        }
        let mut data = [0u8; MAX_DATA_LEN];
        data[..payload.len()].copy_from_slice(payload);
        Self::new(id, FrameKind::Data, payload.len() as u8, data)
    }

    /// Create a remote frame requesting `len` bytes
    pub fn remote_frame(id: Id, len: u8) -> Result<Self, FrameError> {
        Self::new(id, FrameKind::Remote, len, [0; MAX_DATA_LEN])
    }

    /// Frame identifier
    pub fn id(&self) -> Id {
        self.id
    }

    /// Frame type
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Data length code
    pub fn len(&self) -> u8 {
        self.len
    }

    /// Check if the frame declares no payload
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Payload bytes covered by the length
    pub fn data(&self) -> &[u8] {
        &self.data[..usize::from(self.len)]
    }

    /// All 8 payload slots, including those past the length
    pub fn slots(&self) -> &[u8; MAX_DATA_LEN] {
        &self.data
    }

    /// Check if this is a remote frame
    pub fn is_remote(&self) -> bool {
        self.kind == FrameKind::Remote
    }

    /// Command character that introduces this frame on the wire
    pub fn command_char(&self) -> u8 {
        match (self.kind, self.id.is_extended()) {
            (FrameKind::Data, false) => b't',
            (FrameKind::Data, true) => b'T',
            (FrameKind::Remote, false) => b'r',
            (FrameKind::Remote, true) => b'R',
        }
    }

    /// Size of this frame's encoded line, terminator included
    pub fn encoded_len(&self) -> usize {
        1 + self.id.digits() + 1 + PAYLOAD_DIGITS + 1
    }

    /// Encode this frame as an slcan line into a byte buffer
    ///
    /// Returns the number of bytes written, terminator included.
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let line_len = self.encoded_len();
        if buffer.len() < line_len {
            return Err(EncodeError::BufferTooSmall);
        }

        let id_digits = self.id.digits();
        buffer[0] = self.command_char();
        write_hex(self.id.as_raw(), id_digits, &mut buffer[1..]);

        let mut pos = 1 + id_digits;
        write_hex(u32::from(self.len), 1, &mut buffer[pos..]);
        pos += 1;

        for &byte in self.data.iter() {
            write_hex(u32::from(byte), 2, &mut buffer[pos..]);
            pos += 2;
        }

        buffer[pos] = LINE_TERMINATOR;
        Ok(line_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_LINE_LEN>, EncodeError> {
        let mut buffer = [0u8; MAX_LINE_LEN];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| EncodeError::BufferTooSmall)?;
        Ok(vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_short_standard_frame_full_width() {
        let frame = CanFrame::data_frame(Id::Standard(0x7FF), &[0xAA, 0xBB]).unwrap();
        let encoded = frame.encode_to_vec().unwrap();

        assert_eq!(encoded.as_slice(), b"t7FF2AABB000000000000\r");
    }

    #[test]
    fn test_encode_extended_frame() {
        let frame = CanFrame::data_frame(
            Id::Extended(0x1234_5678),
            &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88],
        )
        .unwrap();
        let mut buffer = [0u8; MAX_LINE_LEN];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, MAX_LINE_LEN);
        assert_eq!(&buffer[..len], b"T1234567881122334455667788\r");
    }

    #[test]
    fn test_encode_remote_frames() {
        let std_rtr = CanFrame::remote_frame(Id::Standard(0x001), 4).unwrap();
        assert_eq!(
            std_rtr.encode_to_vec().unwrap().as_slice(),
            b"r00140000000000000000\r"
        );

        let ext_rtr = CanFrame::remote_frame(Id::Extended(0x1FFF_FFFF), 0).unwrap();
        assert_eq!(ext_rtr.command_char(), b'R');
        assert_eq!(ext_rtr.encoded_len(), MAX_LINE_LEN);
    }

    #[test]
    fn test_encode_keeps_slots_past_length() {
        let frame = CanFrame::new(
            Id::Standard(0x100),
            FrameKind::Data,
            1,
            [0x01, 0x02, 0, 0, 0, 0, 0, 0xFF],
        )
        .unwrap();
        let encoded = frame.encode_to_vec().unwrap();

        assert_eq!(encoded.as_slice(), b"t100101020000000000FF\r");
        assert_eq!(frame.data(), &[0x01]);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let frame = CanFrame::data_frame(Id::Standard(0x123), &[]).unwrap();
        let mut buffer = [0u8; 10];
        assert_eq!(frame.encode(&mut buffer), Err(EncodeError::BufferTooSmall));
    }

    #[test]
    fn test_frame_rejects_bad_length() {
        assert_eq!(
            CanFrame::new(Id::Standard(1), FrameKind::Data, 9, [0; 8]),
            Err(FrameError::InvalidLength)
        );
        assert_eq!(
            CanFrame::data_frame(Id::Standard(1), &[0u8; 9]),
            Err(FrameError::InvalidLength)
        );
    }

    #[test]
    fn test_frame_rejects_bad_id() {
        assert_eq!(
            CanFrame::new(Id::Standard(0x800), FrameKind::Data, 0, [0; 8]),
            Err(FrameError::IdOutOfRange)
        );
        assert_eq!(Id::standard(0x800), None);
        assert_eq!(Id::extended(0x2000_0000), None);
        assert_eq!(Id::extended(0x1FFF_FFFF), Some(Id::Extended(0x1FFF_FFFF)));
    }
}
