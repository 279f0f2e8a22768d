//! Error types for device operations.
//!
//! This module defines the errors raised while discovering, opening and
//! reading the sensor. Rejected frames are not errors at this level; the
//! reader reports them as `ReadOutcome::Rejected`.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// No matching device node was found.
    #[error("Device not found: {message}")]
    DeviceNotFound { message: String },

    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Operation is not supported on this platform or device.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new device not found error.
    pub fn device_not_found(message: impl Into<String>) -> Self {
        Self::DeviceNotFound {
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether the device is simply absent, as opposed to failing.
    ///
    /// Both are retried the same way; the distinction only changes how the
    /// condition is reported to the user.
    pub fn is_device_not_found(&self) -> bool {
        matches!(self, Self::DeviceNotFound { .. })
    }
}
