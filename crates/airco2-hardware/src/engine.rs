//! Polling engine: turns a stream of frames into a measurement snapshot.
//!
//! Each call to [`PollingEngine::poll_once`] runs one bounded round:
//!
//! 1. Without an open connection, discover the sensor, open it and send the
//!    handshake. Failure ends the round with `available = false`.
//! 2. Read up to `attempts` frames, converting and storing each plausible
//!    reading, until CO2, temperature and humidity have all been refreshed.
//! 3. If the handle fails or no dialect validates, drop the connection. The
//!    next round starts again from discovery.
//!
//! Readings are sticky: a value is only replaced by a newer plausible
//! reading of the same kind, never cleared, including across reconnects.
//!
//! # Examples
//!
//! ```
//! use airco2_hardware::engine::{PollConfig, PollingEngine};
//! use airco2_hardware::mock::{Dialect, MockByteSource, MockDiscovery};
//!
//! let (discovery, discovery_handle) = MockDiscovery::new();
//! let (source, sensor) = MockByteSource::new(Dialect::Clear);
//! sensor.push_sample(0x50, 1000);
//! sensor.push_sample(0x42, 0x1234);
//! discovery_handle.add_source(source);
//!
//! let mut engine = PollingEngine::new(discovery, PollConfig { attempts: 2, ..Default::default() });
//! let snapshot = engine.poll_once();
//!
//! assert_eq!(snapshot.co2, Some(1000));
//! assert!(snapshot.available);
//! ```

use crate::{
    HardwareError, Result,
    reader::{FrameReader, ReadOutcome},
    traits::{ByteSource, DeviceDiscovery},
    types::DeviceLocation,
};
use airco2_core::{
    DecodedSample, Measurement, MeasurementSnapshot, PollMode, RefreshSet,
    constants::{DEFAULT_CO2_MAX_PPM, DEFAULT_POLL_ATTEMPTS, HANDSHAKE_REPORT},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, trace, warn};

/// Configuration for a polling round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Maximum frames read per round; 0 is treated as 1.
    pub attempts: usize,

    /// CO2 readings above this are discarded as implausible.
    pub co2_max_ppm: u16,
}

impl PollConfig {
    /// Per-round read budget; a round always reads at least one frame.
    pub fn attempts(&self) -> usize {
        self.attempts.max(1)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_POLL_ATTEMPTS,
            co2_max_ppm: DEFAULT_CO2_MAX_PPM,
        }
    }
}

/// How a polling round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// The round ran to completion on an open connection.
    Completed,

    /// No connection could be established.
    NotConnected,

    /// The connection was dropped because no dialect validated.
    ModeUndetected,

    /// The connection was dropped after a read failure.
    ConnectionLost,
}

impl fmt::Display for RoundOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::NotConnected => write!(f, "not connected"),
            Self::ModeUndetected => write!(f, "mode undetected"),
            Self::ConnectionLost => write!(f, "connection lost"),
        }
    }
}

/// Diagnostics for one polling round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub outcome: RoundOutcome,

    /// Read attempts made.
    pub attempts: usize,

    /// Kinds refreshed by this round.
    pub refreshed: RefreshSet,

    /// Frames that failed validation.
    pub rejected: usize,

    /// CO2 readings dropped by the plausibility filter.
    pub implausible: usize,

    /// Valid frames with a function code that is not tracked.
    pub ignored: usize,
}

impl RoundReport {
    fn new() -> Self {
        Self {
            outcome: RoundOutcome::Completed,
            attempts: 0,
            refreshed: RefreshSet::default(),
            rejected: 0,
            implausible: 0,
            ignored: 0,
        }
    }
}

struct Connection<S> {
    reader: FrameReader<S>,
    location: DeviceLocation,
}

/// Why a round stopped using its connection.
enum Teardown {
    Undetected,
    Lost(HardwareError),
}

/// Drives one sensor: discovery, recovery and bounded polling rounds.
///
/// The engine is synchronous. Rounds must not overlap; the monitor runs it
/// on a blocking thread, one round at a time.
pub struct PollingEngine<D: DeviceDiscovery> {
    discovery: D,
    config: PollConfig,
    connection: Option<Connection<D::Source>>,
    snapshot: MeasurementSnapshot,
    last_error: Option<String>,
    last_round: Option<RoundReport>,
    device_id: Option<String>,
}

impl<D: DeviceDiscovery> PollingEngine<D> {
    /// Create an engine; nothing is opened until the first round.
    pub fn new(discovery: D, config: PollConfig) -> Self {
        Self {
            discovery,
            config,
            connection: None,
            snapshot: MeasurementSnapshot::default(),
            last_error: None,
            last_round: None,
            device_id: None,
        }
    }

    /// Run one polling round and return the updated snapshot.
    ///
    /// Never fails: problems are reflected in `available`,
    /// [`last_error`](Self::last_error) and [`last_round`](Self::last_round).
    pub fn poll_once(&mut self) -> &MeasurementSnapshot {
        let report = self.run_round();
        debug!(
            "Round {}: {} attempts, {} rejected, {} implausible, {}",
            report.outcome, report.attempts, report.rejected, report.implausible, self.snapshot
        );
        self.last_round = Some(report);
        &self.snapshot
    }

    fn run_round(&mut self) -> RoundReport {
        let mut report = RoundReport::new();

        if self.connection.is_none() {
            match self.connect() {
                Ok(connection) => {
                    self.device_id = Some(connection.location.id());
                    self.connection = Some(connection);
                }
                Err(e) => {
                    if e.is_device_not_found() {
                        warn!("{}", e);
                    } else {
                        error!("Failed to open sensor: {}", e);
                    }
                    self.drop_connection(e.to_string());
                    report.outcome = RoundOutcome::NotConnected;
                    return report;
                }
            }
        }

        let Some(connection) = self.connection.as_mut() else {
            report.outcome = RoundOutcome::NotConnected;
            return report;
        };
        self.snapshot.available = true;

        let mut teardown = None;
        while report.attempts < self.config.attempts() && !report.refreshed.is_complete() {
            report.attempts += 1;
            match connection.reader.next_sample() {
                ReadOutcome::Sample(sample) => {
                    Self::record(&mut self.snapshot, &self.config, sample, &mut report);
                }
                ReadOutcome::Rejected(_) => report.rejected += 1,
                ReadOutcome::Undetected => {
                    teardown = Some(Teardown::Undetected);
                    break;
                }
                ReadOutcome::ConnectionLost(e) => {
                    teardown = Some(Teardown::Lost(e));
                    break;
                }
            }
        }

        match teardown {
            None => self.last_error = None,
            Some(Teardown::Undetected) => {
                warn!("No valid frame from sensor, reopening next round");
                self.drop_connection("Mode detection failed".to_string());
                report.outcome = RoundOutcome::ModeUndetected;
            }
            Some(Teardown::Lost(e)) => {
                warn!("Connection to sensor lost: {}", e);
                self.drop_connection(e.to_string());
                report.outcome = RoundOutcome::ConnectionLost;
            }
        }

        report
    }

    /// Convert a sample and store it unless it is implausible.
    fn record(
        snapshot: &mut MeasurementSnapshot,
        config: &PollConfig,
        sample: DecodedSample,
        report: &mut RoundReport,
    ) {
        let Some(measurement) = sample.to_measurement() else {
            trace!("Ignoring function {:#04x}", sample.function);
            report.ignored += 1;
            return;
        };

        if let Measurement::CarbonDioxide(ppm) = measurement
            && ppm > config.co2_max_ppm
        {
            debug!("Discarding implausible CO2 reading of {} ppm", ppm);
            report.implausible += 1;
            return;
        }

        trace!("Stored {:?}", measurement);
        report.refreshed.insert(measurement.kind());
        snapshot.apply(measurement);
    }

    fn connect(&mut self) -> Result<Connection<D::Source>> {
        let location = self.discovery.discover()?;
        info!("Opening sensor at {}", location);

        let mut source = self.discovery.open(&location)?;
        source.configure(&HANDSHAKE_REPORT)?;

        Ok(Connection {
            reader: FrameReader::new(source),
            location,
        })
    }

    fn drop_connection(&mut self, reason: String) {
        self.connection = None;
        self.snapshot.available = false;
        self.last_error = Some(reason);
    }

    /// Latest snapshot, without polling.
    pub fn snapshot(&self) -> &MeasurementSnapshot {
        &self.snapshot
    }

    /// Reason the last round failed; cleared by a completed round.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_round(&self) -> Option<&RoundReport> {
        self.last_round.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Dialect of the open connection; `Undetected` when closed.
    pub fn mode(&self) -> PollMode {
        self.connection
            .as_ref()
            .map_or(PollMode::Undetected, |c| c.reader.mode())
    }

    /// Location of the open connection.
    pub fn device(&self) -> Option<&DeviceLocation> {
        self.connection.as_ref().map(|c| &c.location)
    }

    /// Id of the most recently opened sensor; kept across disconnects.
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }
}

impl<D: DeviceDiscovery> fmt::Debug for PollingEngine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingEngine")
            .field("config", &self.config)
            .field("device", &self.device())
            .field("mode", &self.mode())
            .field("snapshot", &self.snapshot)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
