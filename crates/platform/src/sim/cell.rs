use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adc::{AdcProfile, AdcReader};
use crate::error::PlatformError;
use crate::time::Clock;

const MS_PER_MINUTE: f32 = 60_000.0;

/// Parameters of the simulated single Li-ion cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellModel {
    /// Open-circuit voltage when discharge starts.
    pub resting_voltage: f32,
    /// Linear discharge slope in volts per minute.
    pub drain_per_min: f32,
    /// The cell never reads below this.
    pub floor_voltage: f32,
    pub charger_connected: bool,
    /// Extra voltage seen at the pin while the charger is connected.
    pub charger_lift: f32,
    /// Transient sag right after the charger is removed.
    pub unplug_dip: f32,
    pub unplug_dip_ms: u64,
    /// Ratio of what the ADC sees to the true cell voltage, after the nominal
    /// divider. Models resistor and reference tolerance; calibration should
    /// recover `1 / gain`.
    pub gain: f32,
    /// Offsets cycled through on successive reads.
    pub jitter: Vec<f32>,
}

impl Default for CellModel {
    fn default() -> Self {
        Self {
            resting_voltage: 4.2,
            drain_per_min: 0.01,
            floor_voltage: 3.0,
            charger_connected: false,
            charger_lift: 0.35,
            unplug_dip: 0.15,
            unplug_dip_ms: 300,
            gain: 1.0 / 1.1,
            jitter: vec![0.0, 0.003, -0.002, 0.004, -0.003],
        }
    }
}

#[derive(Debug)]
struct CellState {
    charger_connected: bool,
    discharge_from: u64,
    unplugged_at: Option<u64>,
    scheduled_unplug: Option<u64>,
    jitter_index: usize,
}

/// A cell whose voltage follows [`CellModel`] over the time reported by a
/// [`Clock`]. Clones share state, so a handle kept by the host can plug or
/// unplug the charger while the monitor owns the reader.
#[derive(Debug, Clone)]
pub struct SimulatedCell<C> {
    clock: C,
    profile: AdcProfile,
    model: Arc<CellModel>,
    state: Arc<Mutex<CellState>>,
}

impl<C: Clock> SimulatedCell<C> {
    pub fn new(model: CellModel, profile: AdcProfile, clock: C) -> Self {
        let now = clock.now_millis();
        let state = CellState {
            charger_connected: model.charger_connected,
            discharge_from: now,
            unplugged_at: None,
            scheduled_unplug: None,
            jitter_index: 0,
        };
        Self {
            clock,
            profile,
            model: Arc::new(model),
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, CellState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn plug_in(&self) {
        let mut state = self.state();
        state.charger_connected = true;
        state.scheduled_unplug = None;
        debug!("simulated charger connected");
    }

    pub fn unplug(&self) {
        let now = self.clock.now_millis();
        Self::unplug_at(&mut self.state(), now);
    }

    /// Remove the charger once the clock reaches `at_ms`.
    pub fn schedule_unplug(&self, at_ms: u64) {
        self.state().scheduled_unplug = Some(at_ms);
    }

    pub fn is_charger_connected(&self) -> bool {
        let now = self.clock.now_millis();
        let mut state = self.state();
        Self::apply_schedule(&mut state, now);
        state.charger_connected
    }

    fn unplug_at(state: &mut CellState, at: u64) {
        if state.charger_connected {
            state.charger_connected = false;
            state.discharge_from = at;
            state.unplugged_at = Some(at);
            debug!(at_ms = at, "simulated charger removed");
        }
        state.scheduled_unplug = None;
    }

    fn apply_schedule(state: &mut CellState, now: u64) {
        if let Some(at) = state.scheduled_unplug {
            if now >= at {
                Self::unplug_at(state, at);
            }
        }
    }

    /// Cell voltage at the current clock time, without gain or jitter.
    pub fn true_voltage(&self) -> f32 {
        let now = self.clock.now_millis();
        let mut state = self.state();
        Self::apply_schedule(&mut state, now);
        self.voltage_at(&state, now)
    }

    fn voltage_at(&self, state: &CellState, now: u64) -> f32 {
        let model = &self.model;
        if state.charger_connected {
            return model.resting_voltage + model.charger_lift;
        }

        let minutes = now.saturating_sub(state.discharge_from) as f32 / MS_PER_MINUTE;
        let mut volts = (model.resting_voltage - model.drain_per_min * minutes)
            .max(model.floor_voltage);

        if let Some(at) = state.unplugged_at {
            if now.saturating_sub(at) < model.unplug_dip_ms {
                volts -= model.unplug_dip;
            }
        }
        volts
    }
}

impl<C: Clock> AdcReader for SimulatedCell<C> {
    fn read_raw(&mut self, _pin: u8) -> Result<u16, PlatformError> {
        let now = self.clock.now_millis();
        let mut state = self.state();
        Self::apply_schedule(&mut state, now);

        let mut seen = self.voltage_at(&state, now) * self.model.gain;
        if !self.model.jitter.is_empty() {
            seen += self.model.jitter[state.jitter_index % self.model.jitter.len()];
            state.jitter_index = state.jitter_index.wrapping_add(1);
        }
        Ok(self.profile.volts_to_counts(seen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ManualClock;

    fn quiet_model() -> CellModel {
        CellModel {
            gain: 1.0,
            jitter: Vec::new(),
            ..CellModel::default()
        }
    }

    #[test]
    fn test_charger_lifts_voltage() {
        let clock = ManualClock::new();
        let cell = SimulatedCell::new(
            CellModel {
                charger_connected: true,
                ..quiet_model()
            },
            AdcProfile::default(),
            clock,
        );
        assert!((cell.true_voltage() - 4.55).abs() < 1e-5);
    }

    #[test]
    fn test_drains_linearly_to_floor() {
        let clock = ManualClock::new();
        let cell = SimulatedCell::new(quiet_model(), AdcProfile::default(), clock.clone());
        clock.advance(10 * 60_000);
        assert!((cell.true_voltage() - 4.1).abs() < 1e-4);
        clock.advance(1_000 * 60_000);
        assert!((cell.true_voltage() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_scheduled_unplug_dips_then_recovers() {
        let clock = ManualClock::new();
        let cell = SimulatedCell::new(
            CellModel {
                charger_connected: true,
                drain_per_min: 0.0,
                ..quiet_model()
            },
            AdcProfile::default(),
            clock.clone(),
        );
        cell.schedule_unplug(1_000);

        clock.set(999);
        assert!(cell.is_charger_connected());

        clock.set(1_100);
        assert!(!cell.is_charger_connected());
        assert!((cell.true_voltage() - 4.05).abs() < 1e-5);

        clock.set(1_400);
        assert!((cell.true_voltage() - 4.2).abs() < 1e-5);
    }

    #[test]
    fn test_read_raw_applies_gain() {
        let clock = ManualClock::new();
        let profile = AdcProfile::default();
        let mut cell = SimulatedCell::new(
            CellModel {
                gain: 0.5,
                drain_per_min: 0.0,
                jitter: Vec::new(),
                ..CellModel::default()
            },
            profile,
            clock,
        );
        let counts = cell.read_raw(0).unwrap();
        assert_eq!(counts, profile.volts_to_counts(2.1));
    }
}
