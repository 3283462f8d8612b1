//! 16.16 fixed-point conversion.
//!
//! The firmware has no floating point on the wire; frequencies travel as a
//! signed 32-bit integer scaled by 2^16. Conversion rounds half away from
//! zero, matching libfixmath's `fix16_from_float` bit for bit.

use crate::constants::FIX16_ONE;

/// Convert a real value into its 16.16 fixed-point representation.
///
/// Values outside the representable range saturate to `i32::MIN`/`i32::MAX`.
pub fn encode_fix16(value: f64) -> i32 {
    let scaled = value * FIX16_ONE;
    let rounded = if value >= 0.0 {
        (scaled + 0.5).floor()
    } else {
        (scaled - 0.5).ceil()
    };
    rounded as i32
}

/// Convert a 16.16 fixed-point value back into a real value.
pub fn decode_fix16(raw: i32) -> f64 {
    raw as f64 / FIX16_ONE
}
