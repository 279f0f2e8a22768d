use crate::{cipher, validation};
use airco2_core::{
    DecodedSample, Error, PollMode, Result,
    constants::{CLEAR_FRAME_LEN, IDX_FUNCTION, IDX_LSB, IDX_MSB, OBFUSCATED_FRAME_LEN},
};
use std::fmt;

/// A report exactly as read from the device.
///
/// The variant records which dialect the bytes were read in, and therefore
/// how they must be decoded.
///
/// # Examples
///
/// ```
/// use airco2_protocol::RawFrame;
///
/// let frame = RawFrame::Clear([0x42, 0x12, 0x34, 0x88, 0x0D]);
/// let sample = frame.decode().unwrap();
///
/// assert_eq!(sample.function, 0x42);
/// assert_eq!(sample.value, 0x1234);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFrame {
    /// 5-byte frame from a device speaking the clear dialect.
    Clear([u8; CLEAR_FRAME_LEN]),

    /// 8-byte report from a device speaking the obfuscated dialect.
    Obfuscated([u8; OBFUSCATED_FRAME_LEN]),
}

impl RawFrame {
    /// Number of bytes to read for a frame in the given mode.
    ///
    /// `None` when the mode has not been detected yet.
    #[must_use]
    pub fn len_for(mode: PollMode) -> Option<usize> {
        match mode {
            PollMode::Clear => Some(CLEAR_FRAME_LEN),
            PollMode::Obfuscated => Some(OBFUSCATED_FRAME_LEN),
            PollMode::Undetected => None,
        }
    }

    /// Wrap bytes read in clear mode.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFrameLength` unless exactly 5 bytes are given.
    pub fn clear(bytes: &[u8]) -> Result<Self> {
        let frame = bytes
            .try_into()
            .map_err(|_| Error::InvalidFrameLength {
                expected: CLEAR_FRAME_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self::Clear(frame))
    }

    /// Wrap bytes read in obfuscated mode.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFrameLength` unless exactly 8 bytes are given.
    pub fn obfuscated(bytes: &[u8]) -> Result<Self> {
        let frame = bytes
            .try_into()
            .map_err(|_| Error::InvalidFrameLength {
                expected: OBFUSCATED_FRAME_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self::Obfuscated(frame))
    }

    /// Dialect the frame was read in.
    #[must_use]
    pub fn mode(&self) -> PollMode {
        match self {
            Self::Clear(_) => PollMode::Clear,
            Self::Obfuscated(_) => PollMode::Obfuscated,
        }
    }

    /// The raw bytes as read.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Clear(bytes) => bytes,
            Self::Obfuscated(bytes) => bytes,
        }
    }

    /// Validate the frame and extract its sample.
    ///
    /// Obfuscated reports are decrypted first.
    ///
    /// # Errors
    ///
    /// Returns `Error::ChecksumMismatch` or `Error::InvalidSentinel` when the
    /// frame does not validate. Both are transient: the next frame may be
    /// fine.
    pub fn decode(&self) -> Result<DecodedSample> {
        match self {
            Self::Clear(bytes) => {
                validation::check_clear(bytes)?;
                Ok(sample_from(bytes))
            }
            Self::Obfuscated(bytes) => {
                let decrypted = cipher::decrypt(bytes);
                validation::check_decrypted(&decrypted)?;
                Ok(sample_from(&decrypted))
            }
        }
    }
}

fn sample_from(bytes: &[u8]) -> DecodedSample {
    DecodedSample::from_bytes(bytes[IDX_FUNCTION], bytes[IDX_MSB], bytes[IDX_LSB])
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: Vec<String> = self
            .as_bytes()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();
        write!(f, "{}[{}]", self.mode(), hex.join(" "))
    }
}
