//! ASCII hex helpers
//!
//! Inbound digits may be upper or lower case; outbound digits are always
//! upper case.

/// Marker left in a nybble buffer where the source byte was not a hex digit
pub const INVALID_NYBBLE: u8 = 0xFF;

/// Convert one ASCII hex digit to its value
pub fn nybble_from_ascii(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Convert a nybble (0-15) to an upper case ASCII hex digit
///
/// Only the low four bits of `n` are used.
pub fn ascii_from_nybble(n: u8) -> u8 {
    let n = n & 0x0F;
    if n < 10 {
        n + b'0'
    } else {
        n - 10 + b'A'
    }
}

/// Convert a buffer of ASCII hex digits to nybble values in place
///
/// Bytes that are not hex digits become [`INVALID_NYBBLE`] so that field
/// readers can reject them without rescanning the source.
pub fn to_nybbles(buf: &mut [u8]) {
    for byte in buf.iter_mut() {
        *byte = nybble_from_ascii(*byte).unwrap_or(INVALID_NYBBLE);
    }
}

/// Write `value` as `digits` upper case hex characters, most significant first
///
/// `out` must hold at least `digits` bytes.
pub fn write_hex(value: u32, digits: usize, out: &mut [u8]) {
    for (i, slot) in out[..digits].iter_mut().enumerate() {
        let shift = 4 * (digits - 1 - i);
        *slot = ascii_from_nybble((value >> shift) as u8);
    }
}
