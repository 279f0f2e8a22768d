//! Mock device discovery for testing and development.

use super::source::{Dialect, MockByteSource};
use crate::{HardwareError, Result, traits::DeviceDiscovery, types::DeviceLocation};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    sources: VecDeque<MockByteSource>,
    simulate: Option<Dialect>,
    discover_calls: usize,
    open_calls: usize,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock discovery handing out queued mock sources.
///
/// Every successful `open` consumes the next queued source, so a test that
/// queues two sources can observe a reconnect switching from the first to
/// the second. With nothing queued, discovery reports the device as absent.
///
/// # Examples
///
/// ```
/// use airco2_hardware::mock::{Dialect, MockByteSource, MockDiscovery};
/// use airco2_hardware::traits::DeviceDiscovery;
///
/// let (mut discovery, handle) = MockDiscovery::new();
/// assert!(discovery.discover().unwrap_err().is_device_not_found());
///
/// let (source, _source_handle) = MockByteSource::new(Dialect::Clear);
/// handle.add_source(source);
///
/// let location = discovery.discover().unwrap();
/// assert!(discovery.open(&location).is_ok());
/// assert_eq!(handle.discover_calls(), 2);
/// ```
#[derive(Debug)]
pub struct MockDiscovery {
    state: Arc<Mutex<State>>,
}

impl MockDiscovery {
    /// Create a discovery with no sources queued.
    pub fn new() -> (Self, MockDiscoveryHandle) {
        let state = Arc::new(Mutex::new(State::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockDiscoveryHandle { state },
        )
    }

    /// Create a discovery that always finds a simulated sensor.
    ///
    /// Queued sources still take precedence; once they are used up, every
    /// open yields a fresh [`MockByteSource::simulated`] source.
    pub fn simulated(dialect: Dialect) -> (Self, MockDiscoveryHandle) {
        let (discovery, handle) = Self::new();
        lock(&handle.state).simulate = Some(dialect);
        (discovery, handle)
    }
}

impl DeviceDiscovery for MockDiscovery {
    type Source = MockByteSource;

    fn discover(&mut self) -> Result<DeviceLocation> {
        let mut state = lock(&self.state);
        state.discover_calls += 1;

        if state.sources.is_empty() && state.simulate.is_none() {
            return Err(HardwareError::device_not_found("No mock sensor queued"));
        }

        Ok(DeviceLocation::new(format!("/dev/mock-hidraw{}", state.open_calls))
            .with_unique_id("04D9:A052")
            .with_name("Mock USB-zyTemp"))
    }

    fn open(&mut self, location: &DeviceLocation) -> Result<MockByteSource> {
        let mut state = lock(&self.state);
        state.open_calls += 1;

        if let Some(source) = state.sources.pop_front() {
            return Ok(source);
        }
        match state.simulate {
            Some(dialect) => Ok(MockByteSource::simulated(dialect).0),
            None => Err(HardwareError::device_not_found(format!(
                "{} vanished before open",
                location.path().display()
            ))),
        }
    }
}

/// Handle for controlling a mock discovery.
#[derive(Debug, Clone)]
pub struct MockDiscoveryHandle {
    state: Arc<Mutex<State>>,
}

impl MockDiscoveryHandle {
    /// Queue a source to be handed out by the next `open`.
    pub fn add_source(&self, source: MockByteSource) {
        lock(&self.state).sources.push_back(source);
    }

    /// Number of `discover` calls so far.
    pub fn discover_calls(&self) -> usize {
        lock(&self.state).discover_calls
    }

    /// Number of `open` calls so far.
    pub fn open_calls(&self) -> usize {
        lock(&self.state).open_calls
    }

    pub fn queued(&self) -> usize {
        lock(&self.state).sources.len()
    }
}
