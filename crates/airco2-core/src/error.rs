use thiserror::Error;

/// Reasons a single frame is rejected.
///
/// None of these end the connection; the reader skips the frame and reads on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Invalid sentinel: expected 0x0d, got {actual:#04x}")]
    InvalidSentinel { actual: u8 },

    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidFrameLength { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_mismatch_display() {
        let error = Error::ChecksumMismatch {
            expected: 0x3B,
            actual: 0xEB,
        };
        assert_eq!(
            error.to_string(),
            "Checksum mismatch: expected 0x3b, got 0xeb"
        );
    }

    #[test]
    fn test_invalid_sentinel_display() {
        let error = Error::InvalidSentinel { actual: 0x00 };
        assert_eq!(error.to_string(), "Invalid sentinel: expected 0x0d, got 0x00");
    }

    #[test]
    fn test_invalid_frame_length_display() {
        let error = Error::InvalidFrameLength {
            expected: 8,
            actual: 5,
        };
        assert_eq!(error.to_string(), "Invalid frame length: expected 8, got 5");
    }
}
