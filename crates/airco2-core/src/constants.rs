//! Core constants for the AirCO2ntrol HID report protocol.
//!
//! This module defines the protocol-level constants shared by the frame
//! decoder, the polling engine and the device backends. Cipher tables live
//! next to the cipher itself in `airco2_protocol::cipher`.
//!
//! # Frame Structure
//!
//! Every report carries a single measurement. Once deobfuscated (or when the
//! device speaks the clear dialect) its layout is:
//!
//! ```text
//! +----------+-----+-----+----------+------+-----------------+
//! | function | MSB | LSB | checksum | 0x0D | unused (obfusc.) |
//! +----------+-----+-----+----------+------+-----------------+
//!     0         1     2       3         4        5..7
//! ```
//!
//! The checksum is the wrapping byte sum of the first three bytes.
//!
//! # Usage
//!
//! ```
//! use airco2_core::constants::*;
//!
//! assert_eq!(FUNCTION_CO2, 0x50);
//! assert_eq!(CLEAR_FRAME_LEN, 5);
//! assert_eq!(OBFUSCATED_FRAME_LEN, 8);
//! ```

use std::time::Duration;

// ============================================================================
// Frame Layout
// ============================================================================

/// Length of a frame read in clear mode.
pub const CLEAR_FRAME_LEN: usize = 5;

/// Length of a frame read in obfuscated mode.
pub const OBFUSCATED_FRAME_LEN: usize = 8;

/// Index of the function code byte.
pub const IDX_FUNCTION: usize = 0;

/// Index of the value high byte.
pub const IDX_MSB: usize = 1;

/// Index of the value low byte.
pub const IDX_LSB: usize = 2;

/// Index of the checksum byte.
pub const IDX_CHECKSUM: usize = 3;

/// Index of the sentinel byte in a deobfuscated frame.
pub const IDX_SENTINEL: usize = 4;

/// Sentinel every deobfuscated frame must carry at [`IDX_SENTINEL`].
///
/// Clear frames also end with this byte but it is not checked there.
pub const FRAME_SENTINEL: u8 = 0x0D;

// ============================================================================
// Function Codes
// ============================================================================

/// Function code for CO2 concentration (ppm).
pub const FUNCTION_CO2: u8 = 0x50;

/// Function code for temperature (1/16 Kelvin).
pub const FUNCTION_TEMPERATURE: u8 = 0x42;

/// Function code for relative humidity (1/100 percent).
pub const FUNCTION_HUMIDITY: u8 = 0x41;

// ============================================================================
// Conversion
// ============================================================================

/// Divisor turning the raw temperature code into Kelvin.
pub const TEMPERATURE_DIVISOR: f64 = 16.0;

/// Offset between Kelvin and Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Divisor turning the raw humidity code into percent.
pub const HUMIDITY_DIVISOR: f64 = 100.0;

// ============================================================================
// Device Handshake
// ============================================================================

/// Feature report sent once after opening the device.
///
/// Report id `0x00` followed by the 8-byte vendor key. The device does not
/// answer it; without it most units stay silent.
pub const HANDSHAKE_REPORT: [u8; 9] = [0x00, 0xC4, 0xC6, 0xC0, 0x92, 0x40, 0x23, 0xDC, 0x96];

/// Substrings of `HID_NAME` identifying supported sensors.
pub const DEFAULT_NAME_KEYWORDS: &[&str] = &["Holtek", "zyTemp"];

/// Default sysfs class directory enumerated for hidraw nodes.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/hidraw";

/// Default directory holding hidraw device nodes.
pub const DEFAULT_DEV_ROOT: &str = "/dev";

// ============================================================================
// Polling Defaults
// ============================================================================

/// Read attempts per polling round.
///
/// The device cycles through many function codes, only three of which are
/// interesting, so a round needs several reads to see all of them.
pub const DEFAULT_POLL_ATTEMPTS: usize = 20;

/// Upper plausibility bound for CO2 readings.
///
/// The first reads after power-on are known to report values around
/// 25,000 ppm. Anything above this bound is skipped.
pub const DEFAULT_CO2_MAX_PPM: u16 = 10_000;

/// Interval between polling rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);
