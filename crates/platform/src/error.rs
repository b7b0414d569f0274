//! Errors surfaced by platform primitives.

/// Failure of a platform primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("ADC channel for pin {pin} is unavailable")]
    ChannelUnavailable { pin: u8 },

    #[error("ADC conversion failed on pin {pin}: {reason}")]
    Conversion { pin: u8, reason: String },
}
