//! Frame checksum validation.
//!
//! Two frame shapes are checked:
//!
//! - **Clear** (5 bytes): `[function, msb, lsb, checksum, terminator]`.
//!   Valid iff `msb + lsb + function == checksum` (mod 256). The terminator
//!   is not inspected.
//! - **Decrypted** (8 bytes): same first four bytes, plus byte 4 must be the
//!   `0x0D` sentinel. Both conditions are required.
//!
//! The `check_*` functions report why a frame was rejected so callers can
//! log it; the `validate_*` functions are the boolean shorthand.
//!
//! # Examples
//!
//! ```
//! use airco2_protocol::validate_clear;
//!
//! assert!(validate_clear(&[0x42, 0x12, 0x34, 0x88, 0x0D]));
//! assert!(!validate_clear(&[0x42, 0x12, 0x34, 0x89, 0x0D]));
//! ```

use airco2_core::{
    Error, Result,
    constants::{
        CLEAR_FRAME_LEN, FRAME_SENTINEL, IDX_CHECKSUM, IDX_FUNCTION, IDX_LSB, IDX_MSB,
        IDX_SENTINEL, OBFUSCATED_FRAME_LEN,
    },
};

/// Wrapping sum of the function and payload bytes.
#[must_use]
pub fn checksum(function: u8, msb: u8, lsb: u8) -> u8 {
    msb.wrapping_add(lsb).wrapping_add(function)
}

fn check_checksum(frame: &[u8]) -> Result<()> {
    let expected = checksum(frame[IDX_FUNCTION], frame[IDX_MSB], frame[IDX_LSB]);
    let actual = frame[IDX_CHECKSUM];
    if expected != actual {
        return Err(Error::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

/// Check a clear-mode frame.
///
/// # Errors
///
/// Returns `Error::ChecksumMismatch` if the checksum byte is wrong.
pub fn check_clear(frame: &[u8; CLEAR_FRAME_LEN]) -> Result<()> {
    check_checksum(frame)
}

/// Check a deobfuscated 8-byte frame.
///
/// The sentinel is checked first: a wrong sentinel usually means the
/// report was not obfuscated at all.
///
/// # Errors
///
/// Returns `Error::InvalidSentinel` if byte 4 is not `0x0D`, or
/// `Error::ChecksumMismatch` if the checksum byte is wrong.
pub fn check_decrypted(frame: &[u8; OBFUSCATED_FRAME_LEN]) -> Result<()> {
    let sentinel = frame[IDX_SENTINEL];
    if sentinel != FRAME_SENTINEL {
        return Err(Error::InvalidSentinel { actual: sentinel });
    }
    check_checksum(frame)
}

/// Whether a clear-mode frame carries a correct checksum.
#[must_use]
pub fn validate_clear(frame: &[u8; CLEAR_FRAME_LEN]) -> bool {
    check_clear(frame).is_ok()
}

/// Whether a deobfuscated frame carries the sentinel and a correct checksum.
#[must_use]
pub fn validate_decrypted(frame: &[u8; OBFUSCATED_FRAME_LEN]) -> bool {
    check_decrypted(frame).is_ok()
}
