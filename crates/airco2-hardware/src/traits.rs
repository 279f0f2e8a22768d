//! Device collaborator trait definitions.
//!
//! These traits establish the contract between the polling core and the
//! platform: where the sensor lives ([`DeviceDiscovery`]) and how its bytes
//! are read ([`ByteSource`]). They enable easy substitution between the
//! hidraw backend and mock implementations.
//!
//! Both traits are synchronous. Reads block; a host that needs non-blocking
//! behavior runs the polling engine on a blocking thread (see
//! [`crate::monitor`]).

use crate::error::Result;
use crate::types::DeviceLocation;

/// Raw byte stream of an opened sensor.
///
/// # Examples
///
/// ```
/// use airco2_hardware::traits::ByteSource;
/// use airco2_hardware::Result;
///
/// fn read_report<S: ByteSource>(source: &mut S) -> Result<[u8; 8]> {
///     let mut report = [0u8; 8];
///     source.read_exact(&mut report)?;
///     Ok(report)
/// }
/// ```
pub trait ByteSource: Send {
    /// Send the one-time handshake feature report.
    ///
    /// Called exactly once per successful open, before any read. The
    /// payload is opaque to the source.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the report or is gone.
    fn configure(&mut self, handshake: &[u8]) -> Result<()>;

    /// Fill `buf` completely with the next bytes from the device.
    ///
    /// # Errors
    ///
    /// Returns an error on a short read or when the handle is closed. Any
    /// error means the handle must be discarded.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;
}

/// Locates the sensor and opens byte sources for it.
///
/// # Examples
///
/// ```
/// use airco2_hardware::traits::{ByteSource, DeviceDiscovery};
/// use airco2_hardware::Result;
///
/// fn open_first<D: DeviceDiscovery>(discovery: &mut D) -> Result<D::Source> {
///     let location = discovery.discover()?;
///     discovery.open(&location)
/// }
/// ```
pub trait DeviceDiscovery: Send {
    /// Byte source produced when opening a discovered device.
    type Source: ByteSource;

    /// Find the sensor.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::DeviceNotFound` if no matching device exists.
    fn discover(&mut self) -> Result<DeviceLocation>;

    /// Open a fresh handle to a discovered device.
    ///
    /// # Errors
    ///
    /// Returns an error if the device node cannot be opened.
    fn open(&mut self, location: &DeviceLocation) -> Result<Self::Source>;
}
