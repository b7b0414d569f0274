#![allow(dead_code)]

use cellgauge_monitor::{BatteryMonitor, MonitorConfig};
use cellgauge_platform::sim::{ManualClock, ScriptedAdc, SimSleeper};
use cellgauge_platform::AdcProfile;

pub type SimMonitor = BatteryMonitor<ScriptedAdc, ManualClock, SimSleeper>;

/// A monitor on a scripted ADC and a manual clock, plus handles to both.
pub struct Rig {
    pub monitor: SimMonitor,
    pub adc: ScriptedAdc,
    pub clock: ManualClock,
    pub sleeper: SimSleeper,
}

pub fn rig(config: MonitorConfig) -> Rig {
    let adc = ScriptedAdc::new();
    let clock = ManualClock::new();
    let sleeper = SimSleeper::new(clock.clone());
    let monitor = BatteryMonitor::new(config, adc.clone(), clock.clone(), sleeper.clone())
        .expect("valid config");
    Rig {
        monitor,
        adc,
        clock,
        sleeper,
    }
}

/// Counts that read back as `volts` at precision 1 under the default 1.1
/// coefficient.
pub fn corrected(volts: f32) -> u16 {
    AdcProfile::default().volts_to_counts(volts / 1.1)
}

/// Counts that read back as `volts` with no correction.
pub fn raw(volts: f32) -> u16 {
    AdcProfile::default().volts_to_counts(volts)
}
