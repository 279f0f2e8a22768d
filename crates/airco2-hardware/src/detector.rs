//! One-shot dialect detection for a freshly opened sensor.
//!
//! A probe reads one frame in the clear dialect and validates it. If that
//! fails, one more frame is read in the obfuscated dialect, decrypted and
//! validated. The first probe that validates decides the mode for the
//! lifetime of the handle.
//!
//! ```text
//! read 5 bytes ── valid? ──yes──► Clear(sample)
//!                   │
//!                   no
//!                   ▼
//! read 8 bytes ── decrypt ── valid? ──yes──► Obfuscated(sample)
//!                              │
//!                              no
//!                              ▼
//!                          Undetected
//! ```

use crate::{Result, traits::ByteSource};
use airco2_core::{
    DecodedSample, PollMode,
    constants::{CLEAR_FRAME_LEN, OBFUSCATED_FRAME_LEN},
};
use airco2_protocol::RawFrame;
use tracing::{debug, info, warn};

/// Result of probing a sensor.
///
/// A successful probe carries the sample it validated so the caller does
/// not lose the reading that was consumed while probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// The sensor speaks the clear 5-byte dialect.
    Clear(DecodedSample),

    /// The sensor speaks the obfuscated 8-byte dialect.
    Obfuscated(DecodedSample),

    /// Neither probe produced a valid frame.
    Undetected,
}

impl Detection {
    #[must_use]
    pub fn mode(&self) -> PollMode {
        match self {
            Self::Clear(_) => PollMode::Clear,
            Self::Obfuscated(_) => PollMode::Obfuscated,
            Self::Undetected => PollMode::Undetected,
        }
    }

    /// The sample validated by the successful probe.
    #[must_use]
    pub fn sample(&self) -> Option<DecodedSample> {
        match self {
            Self::Clear(sample) | Self::Obfuscated(sample) => Some(*sample),
            Self::Undetected => None,
        }
    }
}

/// Probe a sensor for its dialect.
///
/// Performs at most two reads: one clear frame, then one obfuscated report.
///
/// # Errors
///
/// Read errors are returned as-is; the handle must be discarded. A probe
/// that reads fine but never validates is not an error, it yields
/// [`Detection::Undetected`].
///
/// # Examples
///
/// ```
/// use airco2_core::PollMode;
/// use airco2_hardware::detector::detect;
/// use airco2_hardware::mock::{Dialect, MockByteSource};
///
/// let (mut source, handle) = MockByteSource::new(Dialect::Obfuscated);
/// handle.push_sample(0x50, 800);
/// handle.push_sample(0x50, 810);
///
/// let detection = detect(&mut source).unwrap();
/// assert_eq!(detection.mode(), PollMode::Obfuscated);
/// assert_eq!(detection.sample().unwrap().value, 810);
/// ```
pub fn detect<S: ByteSource>(source: &mut S) -> Result<Detection> {
    let mut clear = [0u8; CLEAR_FRAME_LEN];
    source.read_exact(&mut clear)?;
    let frame = RawFrame::Clear(clear);
    match frame.decode() {
        Ok(sample) => {
            info!("Sensor speaks the clear dialect");
            return Ok(Detection::Clear(sample));
        }
        Err(e) => debug!("Clear probe rejected {}: {}", frame, e),
    }

    let mut obfuscated = [0u8; OBFUSCATED_FRAME_LEN];
    source.read_exact(&mut obfuscated)?;
    let frame = RawFrame::Obfuscated(obfuscated);
    match frame.decode() {
        Ok(sample) => {
            info!("Sensor speaks the obfuscated dialect");
            Ok(Detection::Obfuscated(sample))
        }
        Err(e) => {
            debug!("Obfuscated probe rejected {}: {}", frame, e);
            warn!("No valid frame in either dialect");
            Ok(Detection::Undetected)
        }
    }
}
