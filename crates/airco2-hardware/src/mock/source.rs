//! Mock byte source for testing and development.
//!
//! This module provides a simulated sensor that replays a script of reports
//! in either dialect. Tests drive it through a `MockByteSourceHandle`, which
//! can append reports, inject a read failure and inspect what the reader
//! asked for.

use crate::{HardwareError, Result, traits::ByteSource};
use airco2_core::constants::{FRAME_SENTINEL, OBFUSCATED_FRAME_LEN};
use airco2_core::constants::{FUNCTION_CO2, FUNCTION_HUMIDITY, FUNCTION_TEMPERATURE};
use airco2_protocol::{encrypt, validation::checksum};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Wire dialect spoken by a mock sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Reports carry the frame in clear.
    #[default]
    Clear,

    /// Reports are passed through the vendor cipher.
    Obfuscated,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => write!(f, "clear"),
            Self::Obfuscated => write!(f, "obfuscated"),
        }
    }
}

/// Build the 8-byte report a sensor sends for one reading.
///
/// The report is `[function, msb, lsb, checksum, 0x0D, 0, 0, 0]`, encrypted
/// for obfuscated sensors.
///
/// # Examples
///
/// ```
/// use airco2_hardware::mock::{Dialect, report};
///
/// assert_eq!(
///     report(Dialect::Clear, 0x50, 1000),
///     [0x50, 0x03, 0xE8, 0x3B, 0x0D, 0x00, 0x00, 0x00]
/// );
/// ```
pub fn report(dialect: Dialect, function: u8, value: u16) -> [u8; OBFUSCATED_FRAME_LEN] {
    let [msb, lsb] = value.to_be_bytes();
    let plain = [
        function,
        msb,
        lsb,
        checksum(function, msb, lsb),
        FRAME_SENTINEL,
        0x00,
        0x00,
        0x00,
    ];

    match dialect {
        Dialect::Clear => plain,
        Dialect::Obfuscated => encrypt(&plain),
    }
}

#[derive(Debug, Default)]
struct State {
    dialect: Dialect,
    script: Vec<Vec<u8>>,
    cursor: usize,
    looping: bool,
    fail_on_read: Option<usize>,
    closed: bool,
    reads: Vec<usize>,
    handshakes: Vec<Vec<u8>>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock sensor byte source.
///
/// Each read consumes the next scripted report and returns as many of its
/// bytes as requested, like a hidraw node does. A read fails when the
/// report is shorter than requested, when the script is exhausted (unless
/// looping), on the injected failure read, and after the source has been
/// closed. Once a read fails, every later read fails too.
///
/// # Examples
///
/// ```
/// use airco2_hardware::mock::{Dialect, MockByteSource};
/// use airco2_hardware::traits::ByteSource;
///
/// let (mut source, handle) = MockByteSource::new(Dialect::Clear);
/// handle.push_sample(0x42, 0x1234);
///
/// let mut frame = [0u8; 5];
/// source.read_exact(&mut frame).unwrap();
/// assert_eq!(frame, [0x42, 0x12, 0x34, 0x88, 0x0D]);
/// assert_eq!(handle.reads(), vec![5]);
/// ```
#[derive(Debug)]
pub struct MockByteSource {
    state: Arc<Mutex<State>>,
}

impl MockByteSource {
    /// Create a mock source with an empty script.
    ///
    /// Returns the source and a handle controlling it.
    pub fn new(dialect: Dialect) -> (Self, MockByteSourceHandle) {
        let state = Arc::new(Mutex::new(State {
            dialect,
            ..Default::default()
        }));

        (
            Self {
                state: Arc::clone(&state),
            },
            MockByteSourceHandle { state },
        )
    }

    /// Create a mock source replaying a plausible sensor forever.
    ///
    /// The script opens with the spurious ~25,000 ppm reading sensors emit
    /// after power-on, includes a report with an unknown function code, and
    /// then cycles through CO2, temperature and humidity.
    pub fn simulated(dialect: Dialect) -> (Self, MockByteSourceHandle) {
        let (source, handle) = Self::new(dialect);
        handle.push_sample(FUNCTION_CO2, 25_000);
        handle.push_sample(0x6D, 0x0B4A);
        handle.push_sample(FUNCTION_CO2, 642);
        handle.push_sample(FUNCTION_TEMPERATURE, 4_730);
        handle.push_sample(FUNCTION_HUMIDITY, 4_512);
        handle.push_sample(FUNCTION_CO2, 655);
        handle.push_sample(FUNCTION_TEMPERATURE, 4_732);
        handle.push_sample(FUNCTION_HUMIDITY, 4_498);
        handle.set_looping(true);
        (source, handle)
    }
}

impl ByteSource for MockByteSource {
    fn configure(&mut self, handshake: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(HardwareError::disconnected("mock sensor"));
        }
        state.handshakes.push(handshake.to_vec());
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut state = lock(&self.state);
        state.reads.push(buf.len());

        if state.closed {
            return Err(HardwareError::disconnected("mock sensor"));
        }

        if state.fail_on_read == Some(state.reads.len()) {
            state.closed = true;
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "injected read failure",
            )
            .into());
        }

        if state.cursor >= state.script.len() {
            if state.looping && !state.script.is_empty() {
                state.cursor = 0;
            } else {
                state.closed = true;
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "mock script exhausted",
                )
                .into());
            }
        }

        let cursor = state.cursor;
        let available = state.script[cursor].len();
        if available < buf.len() {
            state.closed = true;
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("short read: {} of {} bytes", available, buf.len()),
            )
            .into());
        }

        buf.copy_from_slice(&state.script[cursor][..buf.len()]);
        state.cursor += 1;
        Ok(())
    }
}

/// Handle for controlling a mock byte source.
///
/// It can be cloned and kept by the test while the source itself is moved
/// into a reader or polling engine.
#[derive(Debug, Clone)]
pub struct MockByteSourceHandle {
    state: Arc<Mutex<State>>,
}

impl MockByteSourceHandle {
    /// Append a well-formed report for one reading.
    pub fn push_sample(&self, function: u8, value: u16) {
        let mut state = lock(&self.state);
        let bytes = report(state.dialect, function, value);
        state.script.push(bytes.to_vec());
    }

    /// Append a report verbatim.
    pub fn push_raw(&self, bytes: impl Into<Vec<u8>>) {
        lock(&self.state).script.push(bytes.into());
    }

    /// Restart the script from the top once exhausted.
    pub fn set_looping(&self, looping: bool) {
        lock(&self.state).looping = looping;
    }

    /// Fail the `n`-th read (1-based) and every read after it.
    pub fn fail_on_read(&self, n: usize) {
        lock(&self.state).fail_on_read = Some(n);
    }

    /// Unplug the sensor: every later operation fails.
    pub fn disconnect(&self) {
        lock(&self.state).closed = true;
    }

    pub fn dialect(&self) -> Dialect {
        lock(&self.state).dialect
    }

    /// Lengths of all reads attempted so far, in order.
    pub fn reads(&self) -> Vec<usize> {
        lock(&self.state).reads.clone()
    }

    pub fn read_count(&self) -> usize {
        lock(&self.state).reads.len()
    }

    /// Feature reports received through `configure`.
    pub fn handshakes(&self) -> Vec<Vec<u8>> {
        lock(&self.state).handshakes.clone()
    }

    /// Reports not consumed yet.
    pub fn remaining(&self) -> usize {
        let state = lock(&self.state);
        state.script.len().saturating_sub(state.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Dialect::Clear, [0x50, 0x03, 0xE8, 0x3B, 0x0D, 0x00, 0x00, 0x00])]
    #[case(Dialect::Obfuscated, [0x30, 0xE4, 0x66, 0x20, 0x97, 0x46, 0xBF, 0x1A])]
    fn test_report_encoding(#[case] dialect: Dialect, #[case] expected: [u8; 8]) {
        assert_eq!(report(dialect, 0x50, 1000), expected);
    }

    #[test]
    fn test_read_truncates_report() {
        let (mut source, handle) = MockByteSource::new(Dialect::Clear);
        handle.push_sample(0x41, 0x1194);

        let mut frame = [0u8; 5];
        source.read_exact(&mut frame).unwrap();

        assert_eq!(frame, [0x41, 0x11, 0x94, 0xE6, 0x0D]);
        assert_eq!(handle.remaining(), 0);
    }

    #[test]
    fn test_exhausted_script_fails() {
        let (mut source, handle) = MockByteSource::new(Dialect::Clear);
        handle.push_sample(0x50, 800);

        let mut buf = [0u8; 5];
        source.read_exact(&mut buf).unwrap();
        assert!(matches!(
            source.read_exact(&mut buf),
            Err(HardwareError::Io(_))
        ));
    }

    #[test]
    fn test_looping_script_restarts() {
        let (mut source, handle) = MockByteSource::new(Dialect::Clear);
        handle.push_sample(0x50, 800);
        handle.push_sample(0x41, 4000);
        handle.set_looping(true);

        let mut buf = [0u8; 5];
        for _ in 0..5 {
            source.read_exact(&mut buf).unwrap();
        }
        assert_eq!(buf[0], 0x50);
        assert_eq!(handle.read_count(), 5);
    }

    #[test]
    fn test_short_report_fails() {
        let (mut source, handle) = MockByteSource::new(Dialect::Clear);
        handle.push_raw(vec![0x50, 0x03]);

        let mut buf = [0u8; 5];
        assert!(source.read_exact(&mut buf).is_err());
    }

    #[test]
    fn test_injected_failure_is_permanent() {
        let (mut source, handle) = MockByteSource::new(Dialect::Clear);
        for _ in 0..5 {
            handle.push_sample(0x50, 800);
        }
        handle.fail_on_read(2);

        let mut buf = [0u8; 5];
        assert!(source.read_exact(&mut buf).is_ok());
        assert!(source.read_exact(&mut buf).is_err());
        assert!(matches!(
            source.read_exact(&mut buf),
            Err(HardwareError::Disconnected { .. })
        ));
    }

    #[test]
    fn test_configure_records_handshake() {
        let (mut source, handle) = MockByteSource::new(Dialect::Obfuscated);
        source.configure(&[0x00, 0x01, 0x02]).unwrap();

        assert_eq!(handle.handshakes(), vec![vec![0x00, 0x01, 0x02]]);
    }

    #[test]
    fn test_disconnect_fails_configure() {
        let (mut source, handle) = MockByteSource::new(Dialect::Clear);
        handle.disconnect();

        assert!(source.configure(&[0x00]).is_err());
    }

    #[test]
    fn test_simulated_script_loops() {
        let (mut source, handle) = MockByteSource::simulated(Dialect::Obfuscated);
        let mut buf = [0u8; 8];
        for _ in 0..100 {
            source.read_exact(&mut buf).unwrap();
        }
        assert_eq!(handle.dialect(), Dialect::Obfuscated);
    }
}
