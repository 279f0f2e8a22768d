//! Frame reader bound to one open sensor handle.

use crate::{
    HardwareError,
    detector::{Detection, detect},
    traits::ByteSource,
};
use airco2_core::{
    DecodedSample, PollMode,
    constants::{CLEAR_FRAME_LEN, OBFUSCATED_FRAME_LEN},
};
use airco2_protocol::RawFrame;
use tracing::debug;

/// Outcome of one read attempt.
///
/// The polling engine dispatches on this instead of catching errors: only
/// [`ReadOutcome::Undetected`] and [`ReadOutcome::ConnectionLost`] end the
/// life of a handle.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A valid frame was decoded.
    Sample(DecodedSample),

    /// A frame was read but failed validation. The handle is still usable.
    Rejected(airco2_core::Error),

    /// Dialect detection found no valid frame.
    Undetected,

    /// The handle failed and must be discarded.
    ConnectionLost(HardwareError),
}

impl ReadOutcome {
    /// The decoded sample, if any.
    #[must_use]
    pub fn sample(&self) -> Option<DecodedSample> {
        match self {
            Self::Sample(sample) => Some(*sample),
            _ => None,
        }
    }
}

/// Reads and decodes frames from one byte source.
///
/// The dialect is probed on the first read and then fixed: a reader never
/// switches dialect, and never probes twice. A new handle gets a new reader.
///
/// # Examples
///
/// ```
/// use airco2_core::PollMode;
/// use airco2_hardware::mock::{Dialect, MockByteSource};
/// use airco2_hardware::reader::FrameReader;
///
/// let (source, handle) = MockByteSource::new(Dialect::Clear);
/// handle.push_sample(0x50, 1000);
/// handle.push_sample(0x41, 4512);
///
/// let mut reader = FrameReader::new(source);
/// assert_eq!(reader.next_sample().sample().unwrap().value, 1000);
/// assert_eq!(reader.mode(), PollMode::Clear);
/// assert_eq!(reader.next_sample().sample().unwrap().value, 4512);
/// ```
#[derive(Debug)]
pub struct FrameReader<S> {
    source: S,
    mode: PollMode,
    probed: bool,
}

impl<S: ByteSource> FrameReader<S> {
    /// Wrap a freshly opened source; the dialect is probed on first read.
    pub fn new(source: S) -> Self {
        Self {
            source,
            mode: PollMode::Undetected,
            probed: false,
        }
    }

    /// Wrap a source whose dialect is already known.
    pub fn with_mode(source: S, mode: PollMode) -> Self {
        Self {
            source,
            mode,
            probed: mode.is_detected(),
        }
    }

    pub fn mode(&self) -> PollMode {
        self.mode
    }

    /// Read the next frame.
    ///
    /// The first call probes the dialect and returns the probe's sample. If
    /// probing failed, every later call reports
    /// [`ReadOutcome::Undetected`] without touching the device.
    pub fn next_sample(&mut self) -> ReadOutcome {
        let frame = match self.mode {
            PollMode::Undetected => return self.probe(),
            PollMode::Clear => {
                let mut buf = [0u8; CLEAR_FRAME_LEN];
                if let Err(e) = self.source.read_exact(&mut buf) {
                    return ReadOutcome::ConnectionLost(e);
                }
                RawFrame::Clear(buf)
            }
            PollMode::Obfuscated => {
                let mut buf = [0u8; OBFUSCATED_FRAME_LEN];
                if let Err(e) = self.source.read_exact(&mut buf) {
                    return ReadOutcome::ConnectionLost(e);
                }
                RawFrame::Obfuscated(buf)
            }
        };

        match frame.decode() {
            Ok(sample) => ReadOutcome::Sample(sample),
            Err(e) => {
                debug!("Rejected {}: {}", frame, e);
                ReadOutcome::Rejected(e)
            }
        }
    }

    fn probe(&mut self) -> ReadOutcome {
        if self.probed {
            return ReadOutcome::Undetected;
        }
        self.probed = true;

        match detect(&mut self.source) {
            Ok(Detection::Undetected) => ReadOutcome::Undetected,
            Ok(detection) => {
                self.mode = detection.mode();
                detection
                    .sample()
                    .map_or(ReadOutcome::Undetected, ReadOutcome::Sample)
            }
            Err(e) => ReadOutcome::ConnectionLost(e),
        }
    }

    /// Give back the byte source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Dialect, MockByteSource};
    use rstest::rstest;

    #[rstest]
    #[case(Dialect::Clear, PollMode::Clear, 5)]
    #[case(Dialect::Obfuscated, PollMode::Obfuscated, 8)]
    fn test_reads_in_detected_dialect(
        #[case] dialect: Dialect,
        #[case] mode: PollMode,
        #[case] frame_len: usize,
    ) {
        let (source, handle) = MockByteSource::new(dialect);
        for value in [1000, 4660, 4512, 1010] {
            handle.push_sample(0x50, value);
        }

        let mut reader = FrameReader::new(source);
        let values: Vec<u16> = (0..3)
            .filter_map(|_| reader.next_sample().sample())
            .map(|s| s.value)
            .collect();

        assert_eq!(reader.mode(), mode);
        assert_eq!(values.len(), 3);
        assert!(
            handle
                .reads()
                .iter()
                .rev()
                .take(2)
                .all(|len| *len == frame_len)
        );
    }

    #[test]
    fn test_invalid_frame_is_rejected_not_fatal() {
        let (source, handle) = MockByteSource::new(Dialect::Clear);
        handle.push_sample(0x50, 1000);
        handle.push_raw(vec![0x50, 0x03, 0xE8, 0xEB, 0x0D]);
        handle.push_sample(0x42, 0x1234);

        let mut reader = FrameReader::new(source);
        assert!(reader.next_sample().sample().is_some());
        assert!(matches!(
            reader.next_sample(),
            ReadOutcome::Rejected(airco2_core::Error::ChecksumMismatch {
                expected: 0x3B,
                actual: 0xEB
            })
        ));
        assert_eq!(reader.next_sample().sample().unwrap().function, 0x42);
    }

    #[test]
    fn test_read_error_is_connection_lost() {
        let (source, handle) = MockByteSource::new(Dialect::Clear);
        handle.push_sample(0x50, 1000);

        let mut reader = FrameReader::new(source);
        assert!(reader.next_sample().sample().is_some());
        assert!(matches!(
            reader.next_sample(),
            ReadOutcome::ConnectionLost(_)
        ));
    }

    #[test]
    fn test_failed_probe_is_not_repeated() {
        let (source, handle) = MockByteSource::new(Dialect::Clear);
        handle.push_raw([0x50, 0x03, 0xE8, 0xEB, 0x0D, 0x00, 0x00, 0x00]);
        handle.push_raw([0x00; 8]);
        handle.set_looping(true);

        let mut reader = FrameReader::new(source);
        assert!(matches!(reader.next_sample(), ReadOutcome::Undetected));
        assert!(matches!(reader.next_sample(), ReadOutcome::Undetected));
        assert_eq!(handle.reads(), vec![5, 8]);
    }

    #[test]
    fn test_with_known_mode_skips_probe() {
        let (source, handle) = MockByteSource::new(Dialect::Obfuscated);
        handle.push_sample(0x42, 0x1234);

        let mut reader = FrameReader::with_mode(source, PollMode::Obfuscated);
        assert_eq!(reader.next_sample().sample().unwrap().value, 0x1234);
        assert_eq!(handle.reads(), vec![8]);

        let _source = reader.into_inner();
    }
}
