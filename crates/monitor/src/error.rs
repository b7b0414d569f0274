//! Error types for the battery monitor.

use cellgauge_platform::PlatformError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MonitorError {
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// The sliding window holds fewer samples than an average needs.
    /// Not a hard failure; callers usually fall back or wait.
    #[error("Insufficient data: {have} of {need} samples in window")]
    InsufficientData { have: usize, need: usize },

    #[error("Calibration aborted")]
    CalibrationAborted,

    #[error("Calibration produced an invalid average voltage: {measured}")]
    CalibrationInvalid { measured: f32 },

    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },

    #[error("A collector is already running for this monitor")]
    CollectorRunning,
}

impl MonitorError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        MonitorError::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
