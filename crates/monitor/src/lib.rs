//! Battery state-of-charge estimation for cells read through an ADC.
//!
//! The crate turns raw conversions into corrected voltages, maps them onto a
//! linear charge curve, smooths them over a sliding time window, suppresses
//! one-off spikes before reporting a level change, and calibrates the
//! correction coefficient against the charger-unplug event.
//!
//! Hardware and time come in through the traits in `cellgauge-platform`, so
//! the whole crate runs against simulated cells in tests.

pub mod calibration;
pub mod collector;
pub mod config;
pub mod curve;
pub mod detector;
pub mod error;
pub mod events;
pub mod monitor;
pub mod rounding;
pub mod sampler;
pub mod window;

pub use calibration::{Calibration, CalibrationHandle, CalibrationState};
pub use collector::{Collector, SharedMonitor};
pub use config::{
    CalibrationConfig, CheckConfig, CheckKind, CoefficientConfig, DataMode, MonitorConfig,
    ThoroughConfig, WindowConfig,
};
pub use curve::{ChargeCurve, Level, Reading};
pub use detector::{ChangeKey, Verdict};
pub use error::{MonitorError, Result};
pub use events::Handler;
pub use monitor::{BatteryMonitor, TickOutcome};
pub use rounding::{round_to_precision, MAX_PRECISION};
pub use sampler::{SampleOptions, Sampler};
pub use window::{Sample, Window};
