//! Enum wrappers for backend dispatch.
//!
//! The polling engine is generic over its discovery. Hosts that choose the
//! backend at runtime (the CLI picks hidraw or the simulator from a flag)
//! wrap the concrete types in these enums instead of boxing trait objects,
//! which keeps the associated `Source` type concrete.
//!
//! # Examples
//!
//! ```
//! use airco2_hardware::devices::AnyDiscovery;
//! use airco2_hardware::engine::{PollConfig, PollingEngine};
//! use airco2_hardware::mock::{Dialect, MockDiscovery};
//!
//! let (discovery, _handle) = MockDiscovery::simulated(Dialect::Obfuscated);
//! let mut engine = PollingEngine::new(AnyDiscovery::Mock(discovery), PollConfig::default());
//!
//! assert!(engine.poll_once().available);
//! ```

use crate::hidraw::{HidrawDevice, HidrawDiscovery};
use crate::mock::{MockByteSource, MockDiscovery};
use crate::traits::{ByteSource, DeviceDiscovery};
use crate::{DeviceLocation, Result};

/// Enum wrapper for discovery dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyDiscovery {
    /// Linux hidraw nodes.
    Hidraw(HidrawDiscovery),

    /// Simulated sensor for development and testing.
    Mock(MockDiscovery),
}

impl DeviceDiscovery for AnyDiscovery {
    type Source = AnySource;

    fn discover(&mut self) -> Result<DeviceLocation> {
        match self {
            Self::Hidraw(discovery) => discovery.discover(),
            Self::Mock(discovery) => discovery.discover(),
        }
    }

    fn open(&mut self, location: &DeviceLocation) -> Result<AnySource> {
        match self {
            Self::Hidraw(discovery) => discovery.open(location).map(AnySource::Hidraw),
            Self::Mock(discovery) => discovery.open(location).map(AnySource::Mock),
        }
    }
}

/// Enum wrapper for byte source dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnySource {
    /// Opened hidraw node.
    Hidraw(HidrawDevice),

    /// Simulated sensor.
    Mock(MockByteSource),
}

impl ByteSource for AnySource {
    fn configure(&mut self, handshake: &[u8]) -> Result<()> {
        match self {
            Self::Hidraw(source) => source.configure(handshake),
            Self::Mock(source) => source.configure(handshake),
        }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        match self {
            Self::Hidraw(source) => source.read_exact(buf),
            Self::Mock(source) => source.read_exact(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hidraw::HidrawConfig;
    use crate::mock::{Dialect, MockByteSource};
    use std::path::PathBuf;

    #[test]
    fn test_mock_dispatch() {
        let (discovery, handle) = MockDiscovery::new();
        let (source, sensor) = MockByteSource::new(Dialect::Clear);
        sensor.push_sample(0x50, 900);
        handle.add_source(source);

        let mut any = AnyDiscovery::Mock(discovery);
        let location = any.discover().unwrap();
        let mut source = any.open(&location).unwrap();
        assert!(matches!(source, AnySource::Mock(_)));

        let mut frame = [0u8; 5];
        source.read_exact(&mut frame).unwrap();
        assert_eq!(frame[0], 0x50);
    }

    #[test]
    fn test_hidraw_dispatch_not_found() {
        let mut any = AnyDiscovery::Hidraw(HidrawDiscovery::new(HidrawConfig {
            sysfs_root: PathBuf::from("/nonexistent/sys/class/hidraw"),
            ..Default::default()
        }));

        assert!(any.discover().unwrap_err().is_device_not_found());
    }
}
