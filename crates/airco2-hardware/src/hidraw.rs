//! Linux hidraw backend.
//!
//! Discovery walks `/sys/class/hidraw/*/device/uevent`, picks the first node
//! whose `HID_NAME` contains one of the configured keywords and maps it to
//! `/dev/<node>`. The opened node is a plain file: the handshake is sent with
//! the `HIDIOCSFEATURE` ioctl and reports are read with blocking reads, one
//! report per `read(2)`.
//!
//! ```text
//! /sys/class/hidraw/hidraw0/device/uevent
//!     HID_ID=0003:000004D9:0000A052
//!     HID_NAME=Holtek USB-zyTemp
//!     HID_UNIQ=
//!            │
//!            ▼
//! DeviceLocation { path: /dev/hidraw0, unique_id: 000004D9:0000A052, .. }
//! ```

use crate::error::{HardwareError, Result};
use crate::traits::{ByteSource, DeviceDiscovery};
use crate::types::DeviceLocation;
use airco2_core::constants::{DEFAULT_DEV_ROOT, DEFAULT_NAME_KEYWORDS, DEFAULT_SYSFS_ROOT};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Configuration for hidraw discovery.
///
/// # Example
///
/// ```
/// use airco2_hardware::hidraw::HidrawConfig;
///
/// let config = HidrawConfig {
///     device_path: Some("/dev/hidraw2".into()),
///     ..Default::default()
/// };
/// assert_eq!(config.name_keywords, vec!["Holtek", "zyTemp"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HidrawConfig {
    /// Directory enumerated for hidraw nodes.
    pub sysfs_root: PathBuf,

    /// Directory holding the device nodes.
    pub dev_root: PathBuf,

    /// Substrings of `HID_NAME` identifying the sensor.
    pub name_keywords: Vec<String>,

    /// Fixed device node; skips enumeration when set.
    pub device_path: Option<PathBuf>,
}

impl Default for HidrawConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            dev_root: PathBuf::from(DEFAULT_DEV_ROOT),
            name_keywords: DEFAULT_NAME_KEYWORDS
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
            device_path: None,
        }
    }
}

/// Fields of interest from a hidraw `uevent` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uevent {
    /// `HID_NAME`
    pub name: Option<String>,
    /// `HID_UNIQ`
    pub uniq: Option<String>,
    /// `HID_ID` as `bus:vendor:product`
    pub hid_id: Option<String>,
}

impl Uevent {
    /// Parse the `KEY=value` lines of a uevent file.
    pub fn parse(contents: &str) -> Self {
        let mut uevent = Self::default();
        for line in contents.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            match key {
                "HID_NAME" => uevent.name = Some(value.to_string()),
                "HID_UNIQ" => uevent.uniq = Some(value.to_string()),
                "HID_ID" => uevent.hid_id = Some(value.to_string()),
                _ => {}
            }
        }
        uevent
    }

    /// Stable device identifier.
    ///
    /// Prefers a non-empty `HID_UNIQ`; otherwise `VID:PID` taken from
    /// `HID_ID` as the kernel writes it (zero-padded to 8 digits).
    pub fn unique_id(&self) -> Option<String> {
        if let Some(uniq) = self.uniq.as_deref().filter(|u| !u.is_empty()) {
            return Some(uniq.to_string());
        }

        let parts: Vec<&str> = self.hid_id.as_deref()?.split(':').collect();
        if parts.len() < 3 {
            return None;
        }
        Some(format!("{}:{}", parts[1], parts[2]))
    }

    /// Whether `HID_NAME` contains any of the keywords.
    pub fn matches(&self, keywords: &[String]) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| keywords.iter().any(|k| name.contains(k.as_str())))
    }
}

/// Finds the sensor among hidraw nodes.
#[derive(Debug, Clone, Default)]
pub struct HidrawDiscovery {
    config: HidrawConfig,
}

impl HidrawDiscovery {
    pub fn new(config: HidrawConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HidrawConfig {
        &self.config
    }

    fn uevent_path(&self, node: &str) -> PathBuf {
        self.config.sysfs_root.join(node).join("device").join("uevent")
    }

    /// Location for an explicitly configured node, enriched from sysfs when possible.
    fn fixed_location(&self, path: &Path) -> DeviceLocation {
        let mut location = DeviceLocation::new(path);
        let uevent = path
            .file_name()
            .and_then(|node| node.to_str())
            .and_then(|node| fs::read_to_string(self.uevent_path(node)).ok())
            .map(|contents| Uevent::parse(&contents));

        if let Some(uevent) = uevent {
            location.unique_id = uevent.unique_id();
            location.name = uevent.name;
        }
        location
    }

    fn scan(&self) -> Result<DeviceLocation> {
        let entries = fs::read_dir(&self.config.sysfs_root).map_err(|e| {
            HardwareError::device_not_found(format!(
                "Cannot enumerate {}: {}",
                self.config.sysfs_root.display(),
                e
            ))
        })?;

        let mut nodes: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        nodes.sort();

        for node in nodes {
            let uevent_path = self.uevent_path(&node);
            let contents = match fs::read_to_string(&uevent_path) {
                Ok(contents) => contents,
                Err(e) => {
                    warn!("Cannot read {}, skipping: {}", uevent_path.display(), e);
                    continue;
                }
            };

            let uevent = Uevent::parse(&contents);
            trace!("{}: {:?}", node, uevent);
            if !uevent.matches(&self.config.name_keywords) {
                continue;
            }

            let mut location = DeviceLocation::new(self.config.dev_root.join(&node));
            location.unique_id = uevent.unique_id();
            location.name = uevent.name;
            debug!("Found sensor at {}", location);
            return Ok(location);
        }

        Err(HardwareError::device_not_found("No matching HID device found"))
    }
}

impl DeviceDiscovery for HidrawDiscovery {
    type Source = HidrawDevice;

    fn discover(&mut self) -> Result<DeviceLocation> {
        match &self.config.device_path {
            Some(path) => Ok(self.fixed_location(path)),
            None => self.scan(),
        }
    }

    fn open(&mut self, location: &DeviceLocation) -> Result<HidrawDevice> {
        HidrawDevice::open(location.path())
    }
}

/// An opened hidraw node.
#[derive(Debug)]
pub struct HidrawDevice {
    file: File,
    path: PathBuf,
}

impl HidrawDevice {
    /// Open a device node for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::DeviceNotFound` if the node does not exist, or
    /// an I/O error for any other failure (typically permissions).
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    HardwareError::device_not_found(format!("{}: {}", path.display(), e))
                }
                _ => HardwareError::Io(e),
            })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for HidrawDevice {
    #[cfg(target_os = "linux")]
    fn configure(&mut self, handshake: &[u8]) -> Result<()> {
        use std::os::fd::AsRawFd;

        // The ioctl is read-write, so it needs a mutable buffer.
        let mut report = handshake.to_vec();
        unsafe { ioctl::hidraw_ioc_set_feature(self.file.as_raw_fd(), &mut report) }.map_err(
            |errno| {
                HardwareError::initialization_failed(format!(
                    "HIDIOCSFEATURE on {} failed: {}",
                    self.path.display(),
                    errno
                ))
            },
        )?;
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn configure(&mut self, _handshake: &[u8]) -> Result<()> {
        Err(HardwareError::unsupported("hidraw feature report"))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.file.read_exact(buf)?;
        trace!("{}: read {:02X?}", self.path.display(), buf);
        Ok(())
    }
}

#[cfg(target_os = "linux")]
mod ioctl {
    //! The IOCTL calls we need from linux/hidraw.h

    use nix::ioctl_readwrite_buf;

    const HIDRAW_IOC_MAGIC: u8 = b'H';
    const HIDRAW_SET_FEATURE: u8 = 0x06;

    ioctl_readwrite_buf!(
        hidraw_ioc_set_feature,
        HIDRAW_IOC_MAGIC,
        HIDRAW_SET_FEATURE,
        u8
    );
}
