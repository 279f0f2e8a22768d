//! Device layer for zyTemp-family USB CO2 sensors.
//!
//! This crate turns a sensor's raw HID reports into a
//! [`MeasurementSnapshot`](airco2_core::MeasurementSnapshot). It owns
//! everything that touches the device: finding it, opening it, probing its
//! dialect, reading frames and recovering when it goes away.
//!
//! # Layers
//!
//! ```text
//! Monitor ──► PollingEngine ──► FrameReader ──► detect (first read only)
//!   tokio        sync rounds       one handle        │
//!                    │                               ▼
//!                    └──► DeviceDiscovery ──► ByteSource (hidraw / mock)
//! ```
//!
//! - [`traits`]: the [`DeviceDiscovery`] and [`ByteSource`] seams.
//! - [`hidraw`]: Linux backend (sysfs enumeration, `HIDIOCSFEATURE`).
//! - [`mock`]: scripted sensor for tests and the simulator.
//! - [`detector`] and [`reader`]: dialect probing and frame decoding.
//! - [`engine`]: bounded polling rounds, plausibility filter, recovery.
//! - [`monitor`]: periodic rounds on a blocking thread, published over
//!   a `watch` channel.
//!
//! # Error Handling
//!
//! Fallible operations return [`Result<T>`][error::Result] with a
//! [`HardwareError`]. The polling engine itself never fails: problems show
//! up as `available = false` plus a last-error string.
//!
//! [`DeviceDiscovery`]: traits::DeviceDiscovery
//! [`ByteSource`]: traits::ByteSource

pub mod detector;
pub mod devices;
pub mod engine;
pub mod error;
pub mod hidraw;
pub mod mock;
pub mod monitor;
pub mod reader;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::{AnyDiscovery, AnySource};
pub use engine::{PollConfig, PollingEngine, RoundOutcome, RoundReport};
pub use error::{HardwareError, Result};
pub use hidraw::{HidrawConfig, HidrawDiscovery};
pub use monitor::{Monitor, MonitorConfig, MonitorHandle, MonitorUpdate};
pub use traits::{ByteSource, DeviceDiscovery};
pub use types::DeviceLocation;
