//! Host platform boundary for the cellgauge battery monitor.
//!
//! The monitor never touches hardware directly. It consumes three small
//! capabilities from the host:
//!
//! - [`AdcReader`] - single-shot raw ADC conversion on a pin
//! - [`Clock`] - monotonic milliseconds
//! - [`Sleeper`] - blocking delay
//!
//! Std-backed implementations ([`SystemClock`], [`ThreadSleeper`]) cover
//! host builds. The `sim` feature adds deterministic doubles used by the
//! test suites and the CLI's simulated cell.
//!
//! # Example
//!
//! ```ignore
//! use cellgauge_platform::sim::{ManualClock, ScriptedAdc, SimSleeper};
//!
//! let clock = ManualClock::new();
//! let sleeper = SimSleeper::new(clock.clone());
//! let adc = ScriptedAdc::repeating(2600);
//! ```

mod adc;
mod error;
mod time;

pub use adc::{AdcProfile, AdcReader};
pub use error::PlatformError;
pub use time::{millis, Clock, Sleeper, SystemClock, ThreadSleeper};

#[cfg(feature = "sim")]
pub mod sim;
