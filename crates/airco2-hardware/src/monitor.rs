//! Periodic polling on top of the tokio runtime.
//!
//! The polling engine is synchronous and its reads block, so the monitor
//! moves it onto the blocking thread pool for each round and takes it back
//! afterwards. Rounds therefore never overlap. Every finished round is
//! published on a `watch` channel; slow consumers simply see the latest
//! update.
//!
//! ```text
//! ┌──────────────┐ tick  ┌──────────────────┐  update  ┌──────────────┐
//! │ interval     │──────►│ spawn_blocking   │─────────►│ watch channel│──► consumers
//! │ (Delay)      │       │ engine.poll_once │          └──────────────┘
//! └──────────────┘       └──────────────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use airco2_hardware::engine::PollingEngine;
//! use airco2_hardware::mock::{Dialect, MockDiscovery};
//! use airco2_hardware::monitor::{Monitor, MonitorConfig};
//!
//! #[tokio::main]
//! async fn main() -> airco2_hardware::Result<()> {
//!     let config = MonitorConfig::default();
//!     let (discovery, _handle) = MockDiscovery::simulated(Dialect::Clear);
//!     let engine = PollingEngine::new(discovery, config.poll);
//!
//!     let mut handle = Monitor::new(engine, config).start();
//!     while let Some(update) = handle.recv().await {
//!         println!("{}", update.snapshot);
//!     }
//!
//!     handle.shutdown().await
//! }
//! ```

use crate::{
    HardwareError, Result,
    engine::{PollConfig, PollingEngine, RoundReport},
    traits::DeviceDiscovery,
    types::DeviceLocation,
};
use airco2_core::{MeasurementSnapshot, constants::DEFAULT_POLL_INTERVAL};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Configuration for periodic polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between the start of two rounds.
    pub interval_secs: u64,

    /// Settings for each round.
    pub poll: PollConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            poll: PollConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// State published after every round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorUpdate {
    pub snapshot: MeasurementSnapshot,

    /// Diagnostics of the round; `None` before the first round.
    pub report: Option<RoundReport>,

    /// Why the last round failed, if it did.
    pub last_error: Option<String>,

    /// Sensor currently open.
    pub device: Option<DeviceLocation>,

    /// Id of the last sensor opened, even if it is gone now.
    pub device_id: Option<String>,
}

impl MonitorUpdate {
    /// Capture the current state of an engine.
    pub fn from_engine<D: DeviceDiscovery>(engine: &PollingEngine<D>) -> Self {
        Self {
            snapshot: engine.snapshot().clone(),
            report: engine.last_round().copied(),
            last_error: engine.last_error().map(str::to_string),
            device: engine.device().cloned(),
            device_id: engine.device_id().map(str::to_string),
        }
    }
}

/// Runs a polling engine on a fixed interval.
pub struct Monitor<D: DeviceDiscovery> {
    engine: PollingEngine<D>,
    config: MonitorConfig,
}

impl<D> Monitor<D>
where
    D: DeviceDiscovery + 'static,
    D::Source: 'static,
{
    pub fn new(engine: PollingEngine<D>, config: MonitorConfig) -> Self {
        Self { engine, config }
    }

    /// Spawn the polling task and return a handle to it.
    ///
    /// The first round starts immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> MonitorHandle {
        let (update_tx, update_rx) = watch::channel(MonitorUpdate::from_engine(&self.engine));
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(Self::run(
            self.engine,
            self.config.interval(),
            update_tx,
            stop_rx,
        ));

        MonitorHandle {
            updates: update_rx,
            stop: stop_tx,
            task,
        }
    }

    async fn run(
        mut engine: PollingEngine<D>,
        period: Duration,
        updates: watch::Sender<MonitorUpdate>,
        mut stop: watch::Receiver<bool>,
    ) -> Result<()> {
        info!("Polling every {:?}", period);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = stop.changed() => break,
                _ = ticker.tick() => {
                    let (returned, update) = tokio::task::spawn_blocking(move || {
                        engine.poll_once();
                        let update = MonitorUpdate::from_engine(&engine);
                        (engine, update)
                    })
                    .await
                    .map_err(|e| HardwareError::other(format!("Polling round failed: {e}")))?;
                    engine = returned;

                    if updates.send(update).is_err() {
                        debug!("No update receivers left");
                        break;
                    }
                }
            }
        }

        info!("Monitor stopped");
        Ok(())
    }
}

/// Handle to a running monitor.
pub struct MonitorHandle {
    updates: watch::Receiver<MonitorUpdate>,
    stop: watch::Sender<bool>,
    task: JoinHandle<Result<()>>,
}

impl MonitorHandle {
    /// Wait for the next round to finish.
    ///
    /// Returns `None` once the monitor has stopped.
    pub async fn recv(&mut self) -> Option<MonitorUpdate> {
        self.updates.changed().await.ok()?;
        Some(self.updates.borrow_and_update().clone())
    }

    /// Most recent update, without waiting.
    pub fn latest(&self) -> MonitorUpdate {
        self.updates.borrow().clone()
    }

    /// Another receiver for the same updates.
    pub fn subscribe(&self) -> watch::Receiver<MonitorUpdate> {
        self.updates.clone()
    }

    /// Stop polling and wait for the task to finish.
    ///
    /// A round already in progress is allowed to complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the polling task panicked.
    pub async fn shutdown(self) -> Result<()> {
        // Fails only if the task already ended.
        let _ = self.stop.send(true);

        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(HardwareError::other(format!("Monitor task panicked: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Dialect, MockDiscovery};

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(20));
        assert_eq!(config.poll, PollConfig::default());
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = MonitorConfig {
            interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_monitor_config_deserialize_partial() {
        let config: MonitorConfig =
            serde_json::from_str(r#"{"interval_secs": 5, "poll": {"attempts": 8}}"#).unwrap();
        assert_eq!(config.interval_secs, 5);
        assert_eq!(config.poll.attempts, 8);
        assert_eq!(config.poll.co2_max_ppm, 10_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_update_before_first_round() {
        let (discovery, _handle) = MockDiscovery::simulated(Dialect::Clear);
        let engine = PollingEngine::new(discovery, PollConfig::default());
        let handle = Monitor::new(engine, MonitorConfig::default()).start();

        let initial = handle.latest();
        assert!(initial.report.is_none());
        assert!(!initial.snapshot.available);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_graceful_shutdown() {
        let (discovery, _handle) = MockDiscovery::new();
        let engine = PollingEngine::new(discovery, PollConfig::default());
        let mut handle = Monitor::new(engine, MonitorConfig::default()).start();

        let update = handle.recv().await.unwrap();
        assert!(!update.snapshot.available);
        assert!(update.last_error.is_some());

        handle.shutdown().await.unwrap();
    }
}
