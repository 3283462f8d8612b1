//! Teeth decoding errors.

use thiserror::Error;

/// Errors that can occur when decoding teeth-encoded data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TeethError {
    /// Encoded data contained a byte with bit 7 set.
    #[error("byte 0x{byte:02X} at offset {index} is not 7-bit")]
    NotSevenBit {
        /// Offset of the offending byte.
        index: usize,
        /// The offending byte.
        byte: u8,
    },

    /// A group header was not followed by any data bytes.
    #[error("group at offset {index} has a header but no data")]
    TruncatedGroup {
        /// Offset of the group header.
        index: usize,
    },

    /// A group header set high bits for bytes the group doesn't carry.
    #[error("group header 0x{header:02X} at offset {index} sets unused bits")]
    UnusedHighBits {
        /// Offset of the group header.
        index: usize,
        /// The header byte.
        header: u8,
    },
}
