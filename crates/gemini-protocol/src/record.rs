//! Packed records exchanged with the firmware.
//!
//! The settings record and the monitor update are fixed binary structures
//! whose field layouts belong to the firmware. This crate only moves their
//! packed bytes; callers supply the layout by implementing [`Record`].

use crate::error::RecordError;

/// A value with a fixed packed representation.
pub trait Record: Sized {
    /// Pack into the firmware's byte layout.
    fn pack(&self) -> Vec<u8>;

    /// Unpack from the firmware's byte layout.
    fn unpack(data: &[u8]) -> Result<Self, RecordError>;
}

/// A record kept as its packed bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord(pub Vec<u8>);

impl RawRecord {
    /// Get the packed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Record for RawRecord {
    fn pack(&self) -> Vec<u8> {
        self.0.clone()
    }

    fn unpack(data: &[u8]) -> Result<Self, RecordError> {
        Ok(RawRecord(data.to_vec()))
    }
}

impl AsRef<[u8]> for RawRecord {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
