//! Ramp look-up table.
//!
//! The firmware compensates the ramp amplitude loss at high frequencies with a
//! table of charge DAC codes indexed by oscillator timer period. Calibration
//! measures one code per oscillator for each period and uploads the table
//! entry by entry before committing it to NVM.

use crate::constants::MAX_LUT_ENTRIES;
use crate::error::{ProtocolError, ProtocolResult};
use crate::types::LutEntry;
use serde::{Deserialize, Serialize};

/// One calibrated period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampRow {
    /// Oscillator timer period.
    pub period: u32,
    /// Castor charge DAC code.
    pub castor: u16,
    /// Pollux charge DAC code.
    pub pollux: u16,
}

/// An ordered ramp table, lowest period first as measured.
///
/// Serializes as a `rows` list so a measured table can be saved between
/// calibration and upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampTable {
    rows: Vec<RampRow>,
}

impl RampTable {
    /// Create an empty table.
    pub fn new() -> Self {
        RampTable::default()
    }

    /// Append a row.
    pub fn push(&mut self, period: u32, castor: u16, pollux: u16) {
        self.rows.push(RampRow {
            period,
            castor,
            pollux,
        });
    }

    pub fn rows(&self) -> &[RampRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The LUT entries to upload, indexed by row position.
    pub fn entries(&self) -> ProtocolResult<Vec<LutEntry>> {
        if self.rows.len() > MAX_LUT_ENTRIES {
            return Err(ProtocolError::ValueOutOfRange {
                name: "ramp table length",
                value: self.rows.len() as f64,
            });
        }

        Ok(self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| LutEntry {
                index: index as u8,
                period: row.period,
                castor: row.castor,
                pollux: row.pollux,
            })
            .collect())
    }

    /// XOR of the Castor codes, as reported after a factory upload.
    pub fn checksum(&self) -> u16 {
        self.rows.iter().fold(0, |acc, row| acc ^ row.castor)
    }
}

impl FromIterator<RampRow> for RampTable {
    fn from_iter<I: IntoIterator<Item = RampRow>>(iter: I) -> Self {
        RampTable {
            rows: iter.into_iter().collect(),
        }
    }
}
