//! Teeth encoding
//!
//! MIDI SysEx payloads may only carry 7-bit bytes; any byte with bit 7 set is
//! a status byte and would end the message. Teeth moves the high bits out of
//! the data so arbitrary 8-bit buffers can ride inside a SysEx message.
//!
//! # Format
//!
//! Input is processed in groups of up to four bytes. Each group is emitted as
//! one header byte followed by the group's bytes with bit 7 cleared:
//!
//! ```text
//! +--------------------+----------+----------+----------+----------+
//! | 0 0 0 0 h0 h1 h2 h3| d0 & 7F  | d1 & 7F  | d2 & 7F  | d3 & 7F  |
//! +--------------------+----------+----------+----------+----------+
//! ```
//!
//! where `hN` is bit 7 of input byte `dN`. A short trailing group emits the
//! header plus only the bytes present, so encoding never pads.
//!
//! # Example
//!
//! ```rust
//! let encoded = teeth_codec::encode(&[0xFF, 0x01]);
//! assert_eq!(encoded, vec![0x08, 0x7F, 0x01]);
//! assert_eq!(teeth_codec::decode(&encoded).unwrap(), vec![0xFF, 0x01]);
//! ```

mod error;

pub use error::*;

/// Number of data bytes carried by one encoded group.
pub const GROUP_SIZE: usize = 4;

const SEVEN_BIT_MASK: u8 = 0x7F;
const HIGH_BIT: u8 = 0x80;

/// Length of the teeth encoding of `src_len` bytes.
pub fn encoded_len(src_len: usize) -> usize {
    src_len + src_len.div_ceil(GROUP_SIZE)
}

/// Length of the data recovered from `encoded_len` encoded bytes.
///
/// Returns `None` if no input of any length encodes to `encoded_len` bytes.
pub fn decoded_len(encoded_len: usize) -> Option<usize> {
    let groups = encoded_len.div_ceil(GROUP_SIZE + 1);
    match encoded_len % (GROUP_SIZE + 1) {
        1 => None,
        _ => Some(encoded_len - groups),
    }
}

/// Encode arbitrary bytes into 7-bit safe bytes.
pub fn encode(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(src.len()));

    for group in src.chunks(GROUP_SIZE) {
        let mut header = 0u8;
        for (i, byte) in group.iter().enumerate() {
            if byte & HIGH_BIT != 0 {
                header |= 1 << (GROUP_SIZE - 1 - i);
            }
        }
        out.push(header);
        out.extend(group.iter().map(|byte| byte & SEVEN_BIT_MASK));
    }

    out
}

/// Decode teeth-encoded bytes back into the original data.
pub fn decode(src: &[u8]) -> Result<Vec<u8>, TeethError> {
    if let Some((index, &byte)) = src.iter().enumerate().find(|(_, b)| **b & HIGH_BIT != 0) {
        return Err(TeethError::NotSevenBit { index, byte });
    }

    let mut out = Vec::with_capacity(src.len());

    for (n, group) in src.chunks(GROUP_SIZE + 1).enumerate() {
        let index = n * (GROUP_SIZE + 1);
        let header = group[0];
        let data = &group[1..];

        if data.is_empty() {
            return Err(TeethError::TruncatedGroup { index });
        }

        // Bits for bytes that aren't present (including bits 4..7) must be clear.
        let valid_bits = (0xF0u8 >> data.len()) & 0x0F;
        if header & !valid_bits != 0 {
            return Err(TeethError::UnusedHighBits { index, header });
        }

        for (i, byte) in data.iter().enumerate() {
            let high = (header >> (GROUP_SIZE - 1 - i)) & 1;
            out.push(byte | (high << 7));
        }
    }

    Ok(out)
}
