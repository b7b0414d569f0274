//! Guided calibration against the charger-unplug event.
//!
//! The procedure needs no user input beyond pulling the charger:
//!
//! 1. **WaitingForUnplug** - poll raw voltage until two consecutive reads
//!    differ by more than the unplug threshold.
//! 2. **Settling** - wait out the sag that follows the unplug.
//! 3. **Measuring** - average several raw high-precision reads. Each read is
//!    rounded; the average is not.
//! 4. **Done** - the coefficient is `fully_charged / average`.
//!
//! A stop request is honoured after each wait of the procedure and ends in
//! `Cancelled`
//! without touching the coefficient. A degenerate average ends in `Failed`.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use cellgauge_platform::{AdcReader, Sleeper};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::config::CalibrationConfig;
use crate::error::{MonitorError, Result};
use crate::sampler::Sampler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CalibrationState {
    Idle = 0,
    WaitingForUnplug = 1,
    Settling = 2,
    Measuring = 3,
    Done = 4,
    Cancelled = 5,
    Failed = 6,
}

impl CalibrationState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => CalibrationState::WaitingForUnplug,
            2 => CalibrationState::Settling,
            3 => CalibrationState::Measuring,
            4 => CalibrationState::Done,
            5 => CalibrationState::Cancelled,
            6 => CalibrationState::Failed,
            _ => CalibrationState::Idle,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CalibrationState::Idle => "Idle",
            CalibrationState::WaitingForUnplug => "Waiting for charger unplug",
            CalibrationState::Settling => "Settling",
            CalibrationState::Measuring => "Measuring",
            CalibrationState::Done => "Done",
            CalibrationState::Cancelled => "Cancelled",
            CalibrationState::Failed => "Failed",
        }
    }

    /// True while the procedure is blocking its caller.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            CalibrationState::WaitingForUnplug
                | CalibrationState::Settling
                | CalibrationState::Measuring
        )
    }
}

#[derive(Debug, Default)]
struct Control {
    stop: AtomicBool,
    state: AtomicU8,
}

/// Shared view of a monitor's calibration: request a stop or watch progress
/// from another thread while `calibrate_battery` blocks.
#[derive(Debug, Clone, Default)]
pub struct CalibrationHandle {
    control: Arc<Control>,
}

impl CalibrationHandle {
    pub fn stop(&self) {
        self.control.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.control.stop.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> CalibrationState {
        CalibrationState::from_u8(self.control.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: CalibrationState) {
        self.control.state.store(state as u8, Ordering::SeqCst);
    }

    fn begin(&self) {
        self.control.stop.store(false, Ordering::SeqCst);
        self.set_state(CalibrationState::WaitingForUnplug);
    }

    fn bail_if_stopped(&self) -> Result<()> {
        if self.is_stop_requested() {
            info!("Calibration cancelled");
            return Err(MonitorError::CalibrationAborted);
        }
        Ok(())
    }
}

/// Result of a successful calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Calibration {
    /// Average raw voltage measured after the unplug.
    pub measured: f32,
    pub coefficient: f32,
}

/// Inputs that come from the monitor rather than the calibration section.
pub(crate) struct Reference {
    pub fully_charged: f32,
    /// Precision used while watching for the unplug.
    pub watch_precision: u8,
    /// Precision of the measurement reads.
    pub measure_precision: u8,
}

pub(crate) fn run<A: AdcReader, S: Sleeper>(
    sampler: &mut Sampler<A>,
    sleeper: &mut S,
    handle: &CalibrationHandle,
    config: &CalibrationConfig,
    reference: &Reference,
) -> Result<Calibration> {
    handle.begin();
    let result = procedure(sampler, sleeper, handle, config, reference);
    let end = match &result {
        Ok(_) => CalibrationState::Done,
        Err(MonitorError::CalibrationAborted) => CalibrationState::Cancelled,
        Err(_) => CalibrationState::Failed,
    };
    handle.set_state(end);
    result
}

fn procedure<A: AdcReader, S: Sleeper>(
    sampler: &mut Sampler<A>,
    sleeper: &mut S,
    handle: &CalibrationHandle,
    config: &CalibrationConfig,
    reference: &Reference,
) -> Result<Calibration> {
    info!(
        threshold = config.unplug_threshold,
        "Calibration started, waiting for charger unplug"
    );

    let mut previous = sampler.read(1.0, reference.watch_precision)?;
    loop {
        handle.bail_if_stopped()?;
        sleeper.sleep_millis(config.poll_ms);
        let current = sampler.read(1.0, reference.watch_precision)?;
        let delta = (current - previous).abs();
        trace!(previous, current, delta, "waiting for unplug");
        if delta > config.unplug_threshold {
            info!(from = previous, to = current, "Charger unplug detected");
            break;
        }
        previous = current;
    }

    handle.set_state(CalibrationState::Settling);
    debug!(settle_ms = config.settle_ms, "Settling");
    sleeper.sleep_millis(config.settle_ms);
    handle.bail_if_stopped()?;

    handle.set_state(CalibrationState::Measuring);
    let measured = measure(sampler, sleeper, handle, config, reference.measure_precision)?;
    debug!(measured, iterations = config.iterations, "Measured raw voltage");

    if !measured.is_finite() || measured <= 0.0 {
        warn!(measured, "Calibration rejected degenerate measurement");
        return Err(MonitorError::CalibrationInvalid { measured });
    }
    let coefficient = reference.fully_charged / measured;
    if !coefficient.is_finite() || coefficient <= 0.0 {
        warn!(measured, coefficient, "Calibration rejected invalid coefficient");
        return Err(MonitorError::CalibrationInvalid { measured });
    }

    info!(measured, coefficient, "Calibration complete");
    Ok(Calibration {
        measured,
        coefficient,
    })
}

/// Mean of `iterations` rounded raw reads. The mean itself is not rounded.
fn measure<A: AdcReader, S: Sleeper>(
    sampler: &mut Sampler<A>,
    sleeper: &mut S,
    handle: &CalibrationHandle,
    config: &CalibrationConfig,
    precision: u8,
) -> Result<f32> {
    let iterations = config.iterations.max(1);
    let mut sum = 0.0f64;
    for i in 0..iterations {
        if i > 0 {
            sleeper.sleep_millis(config.sample_delay_ms);
            handle.bail_if_stopped()?;
        }
        sum += sampler.read(1.0, precision)? as f64;
    }
    Ok((sum / iterations as f64) as f32)
}
