//! Common types shared across device backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a sensor was found.
///
/// Produced by discovery and handed back to it when opening the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLocation {
    /// Device node path (e.g., "/dev/hidraw0").
    pub path: PathBuf,

    /// Stable identifier (`HID_UNIQ`, or `VID:PID` when that is empty).
    pub unique_id: Option<String>,

    /// Device name as reported by the kernel (`HID_NAME`).
    pub name: Option<String>,
}

impl DeviceLocation {
    /// Create a new DeviceLocation for a device node.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            unique_id: None,
            name: None,
        }
    }

    /// Set the unique identifier.
    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    /// Set the device name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique id, falling back to the device path.
    pub fn id(&self) -> String {
        self.unique_id
            .clone()
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl fmt::Display for DeviceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_builder() {
        let location = DeviceLocation::new("/dev/hidraw1")
            .with_unique_id("04d9:a052")
            .with_name("Holtek USB-zyTemp");

        assert_eq!(location.path(), Path::new("/dev/hidraw1"));
        assert_eq!(location.id(), "04d9:a052");
        assert_eq!(location.to_string(), "/dev/hidraw1 (Holtek USB-zyTemp)");
    }

    #[test]
    fn test_location_id_falls_back_to_path() {
        let location = DeviceLocation::new("/dev/hidraw3");
        assert_eq!(location.id(), "/dev/hidraw3");
        assert_eq!(location.to_string(), "/dev/hidraw3");
    }
}
