//! Application configuration.
//!
//! Settings come from an optional JSON file; command-line flags override
//! individual fields. Every field has a default, so an empty file (or no
//! file at all) is a valid configuration.
//!
//! ```json
//! {
//!   "monitor": { "interval_secs": 30, "poll": { "attempts": 10 } },
//!   "hidraw": { "name_keywords": ["zyTemp"] }
//! }
//! ```

use airco2_hardware::{HidrawConfig, MonitorConfig};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete configuration of the `airco2` binary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub hidraw: HidrawConfig,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub interval_secs: Option<u64>,
    pub attempts: Option<usize>,
    pub device: Option<PathBuf>,
}

impl AppConfig {
    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(interval) = overrides.interval_secs {
            self.monitor.interval_secs = interval;
        }
        if let Some(attempts) = overrides.attempts {
            self.monitor.poll.attempts = attempts;
        }
        if let Some(device) = overrides.device {
            self.hidraw.device_path = Some(device);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.monitor.poll.attempts == 0 {
            bail!("poll.attempts must be at least 1");
        }
        if self.monitor.interval_secs == 0 {
            bail!("interval_secs must be at least 1");
        }
        if self.hidraw.device_path.is_none() && self.hidraw.name_keywords.is_empty() {
            bail!("hidraw.name_keywords must not be empty without a device path");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.monitor.interval_secs, 20);
        assert_eq!(config.monitor.poll.attempts, 20);
        assert_eq!(config.monitor.poll.co2_max_ppm, 10_000);
        assert_eq!(config.hidraw.name_keywords, vec!["Holtek", "zyTemp"]);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"monitor": {"poll": {"co2_max_ppm": 5000}}}"#).unwrap();

        assert_eq!(config.monitor.poll.co2_max_ppm, 5000);
        assert_eq!(config.monitor.poll.attempts, 20);
        assert_eq!(config.hidraw, HidrawConfig::default());
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"monitor": {{"interval_secs": 60}}, "hidraw": {{"device_path": "/dev/hidraw3"}}}}"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.monitor.interval_secs, 60);
        assert_eq!(config.hidraw.device_path, Some(PathBuf::from("/dev/hidraw3")));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let error = AppConfig::load(file.path()).unwrap_err();
        assert!(error.to_string().starts_with("Invalid config file"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(AppConfig::load(Path::new("/nonexistent/airco2.json")).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let config = AppConfig::default()
            .with_overrides(Overrides {
                interval_secs: Some(5),
                attempts: Some(7),
                device: Some(PathBuf::from("/dev/hidraw1")),
            })
            .unwrap();

        assert_eq!(config.monitor.interval_secs, 5);
        assert_eq!(config.monitor.poll.attempts, 7);
        assert_eq!(config.hidraw.device_path, Some(PathBuf::from("/dev/hidraw1")));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = AppConfig::default().with_overrides(Overrides {
            attempts: Some(0),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
