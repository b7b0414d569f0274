//! Deterministic stand-ins for the host primitives.
//!
//! Simulated time only moves when something sleeps or a test advances it,
//! so blocking procedures (thorough sampling, fluke re-checks, calibration)
//! run instantly and reproducibly.

mod cell;
mod clock;
mod scripted;

pub use cell::{CellModel, SimulatedCell};
pub use clock::{ManualClock, SimSleeper};
pub use scripted::ScriptedAdc;
