//! Common frame builders for integration tests.
//!
//! Helpers build frames the way a device would emit them, so tests can state
//! the measurement they want rather than hand-computing checksums.

#![allow(dead_code)]

use airco2_protocol::{cipher, validation::checksum};

/// Clear-mode frame with a correct checksum.
pub fn clear_frame(function: u8, msb: u8, lsb: u8, terminator: u8) -> [u8; 5] {
    [function, msb, lsb, checksum(function, msb, lsb), terminator]
}

/// Clear-mode frame carrying a 16-bit value.
pub fn clear_value(function: u8, value: u16) -> [u8; 5] {
    let [msb, lsb] = value.to_be_bytes();
    clear_frame(function, msb, lsb, 0x0D)
}

/// Obfuscated report whose decrypted form carries the given measurement.
pub fn obfuscated_report(function: u8, msb: u8, lsb: u8, tail: [u8; 3]) -> [u8; 8] {
    let plain = [
        function,
        msb,
        lsb,
        checksum(function, msb, lsb),
        0x0D,
        tail[0],
        tail[1],
        tail[2],
    ];
    cipher::encrypt(&plain)
}

/// Obfuscated report carrying a 16-bit value.
pub fn obfuscated_value(function: u8, value: u16) -> [u8; 8] {
    let [msb, lsb] = value.to_be_bytes();
    obfuscated_report(function, msb, lsb, [0; 3])
}
