//! Mock device implementations for testing and development.
//!
//! This module provides a simulated sensor and discovery that can be
//! controlled programmatically without requiring physical hardware.

pub mod discovery;
pub mod source;

// Re-export commonly used types
pub use discovery::{MockDiscovery, MockDiscoveryHandle};
pub use source::{Dialect, MockByteSource, MockByteSourceHandle, report};
