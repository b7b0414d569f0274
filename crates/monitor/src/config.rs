//! Monitor configuration.
//!
//! Every section is `#[serde(default)]`, so a partial TOML file fills in the
//! rest from [`MonitorConfig::default`].

use std::time::Duration;

use cellgauge_platform::AdcProfile;
use serde::{Deserialize, Serialize};

use crate::curve::ChargeCurve;
use crate::error::{MonitorError, Result};
use crate::rounding::MAX_PRECISION;

/// Where readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    /// Every query samples the ADC.
    #[default]
    Instant,
    /// Queries read the sliding-window average kept up by `tick()`.
    Averaged,
}

impl DataMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "instant" => Some(DataMode::Instant),
            "averaged" | "average" | "avg" => Some(DataMode::Averaged),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DataMode::Instant => "instant",
            DataMode::Averaged => "averaged",
        }
    }
}

/// Which derived value decides whether the battery "changed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    #[default]
    Section,
    Percentage,
    Voltage,
}

impl CheckKind {
    pub const ALL: [CheckKind; 3] = [CheckKind::Section, CheckKind::Percentage, CheckKind::Voltage];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "section" | "sections" => Some(CheckKind::Section),
            "percentage" | "percent" => Some(CheckKind::Percentage),
            "voltage" => Some(CheckKind::Voltage),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Section => "section",
            CheckKind::Percentage => "percentage",
            CheckKind::Voltage => "voltage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoefficientConfig {
    /// Factory correction applied until a calibration replaces it.
    pub default: f32,
}

impl Default for CoefficientConfig {
    fn default() -> Self {
        Self { default: 1.1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThoroughConfig {
    pub samples: u32,
    pub delay_ms: u64,
}

impl Default for ThoroughConfig {
    fn default() -> Self {
        Self {
            samples: 5,
            delay_ms: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Re-samples taken before a change is accepted.
    pub repeats: u32,
    pub delay_ms: u64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            repeats: 5,
            delay_ms: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub retention_secs: u64,
    pub recheck_secs: u64,
    pub min_samples: usize,
    pub min_task_interval_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            retention_secs: 60,
            recheck_secs: 10,
            min_samples: 3,
            min_task_interval_ms: 1000,
        }
    }
}

impl WindowConfig {
    pub fn retention_ms(&self) -> u64 {
        self.retention_secs.saturating_mul(1000)
    }

    pub fn recheck_ms(&self) -> u64 {
        self.recheck_secs.saturating_mul(1000)
    }

    /// How often a background collector wakes up: at least the configured
    /// minimum, never slower than the recheck interval.
    pub fn poll_interval(&self) -> Duration {
        let ms = self.min_task_interval_ms.max(1).min(self.recheck_ms().max(1));
        Duration::from_millis(ms)
    }

    /// Upper bound on window length when samples arrive every recheck
    /// interval.
    pub fn capacity(&self) -> usize {
        (self.retention_secs / self.recheck_secs.max(1)) as usize + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub iterations: u32,
    /// Jump between consecutive raw readings that means the charger was
    /// removed, in volts.
    pub unplug_threshold: f32,
    pub poll_ms: u64,
    pub settle_ms: u64,
    pub sample_delay_ms: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            unplug_threshold: 0.3,
            poll_ms: 100,
            settle_ms: 750,
            sample_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub pin: u8,
    pub precision: u8,
    pub data_mode: DataMode,
    pub check_kind: CheckKind,
    pub low_percent: u8,
    pub adc: AdcProfile,
    pub curve: ChargeCurve,
    pub coefficient: CoefficientConfig,
    pub thorough: ThoroughConfig,
    pub check: CheckConfig,
    pub window: WindowConfig,
    pub calibration: CalibrationConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            pin: 35,
            precision: 1,
            data_mode: DataMode::Instant,
            check_kind: CheckKind::Section,
            low_percent: 10,
            adc: AdcProfile::default(),
            curve: ChargeCurve::default(),
            coefficient: CoefficientConfig::default(),
            thorough: ThoroughConfig::default(),
            check: CheckConfig::default(),
            window: WindowConfig::default(),
            calibration: CalibrationConfig::default(),
        }
    }
}

pub(crate) fn check_precision(precision: i32) -> Result<u8> {
    if precision < 0 {
        return Err(MonitorError::invalid("precision", "must not be negative"));
    }
    if precision > MAX_PRECISION as i32 {
        return Err(MonitorError::invalid(
            "precision",
            format!("at most {} decimal places", MAX_PRECISION),
        ));
    }
    Ok(precision as u8)
}

pub(crate) fn check_curve(curve: &ChargeCurve) -> Result<()> {
    let finite = [
        curve.fully_uncharged,
        curve.fully_charged,
        curve.charging_threshold,
    ]
    .iter()
    .all(|v| v.is_finite());
    if !finite {
        return Err(MonitorError::invalid("curve", "voltages must be finite"));
    }
    if curve.fully_uncharged >= curve.fully_charged {
        return Err(MonitorError::invalid(
            "curve",
            "fully_uncharged must be below fully_charged",
        ));
    }
    if curve.fully_charged > curve.charging_threshold {
        return Err(MonitorError::invalid(
            "curve",
            "charging_threshold must not be below fully_charged",
        ));
    }
    if curve.sections == 0 {
        return Err(MonitorError::invalid("sections", "must be at least 1"));
    }
    Ok(())
}

pub(crate) fn check_coefficient(field: &'static str, c: f32) -> Result<()> {
    if !c.is_finite() || c <= 0.0 {
        return Err(MonitorError::invalid(field, "must be a positive number"));
    }
    Ok(())
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        check_precision(self.precision as i32)?;
        check_curve(&self.curve)?;
        check_coefficient("coefficient.default", self.coefficient.default)?;

        if self.low_percent > 100 {
            return Err(MonitorError::invalid("low_percent", "must be 0..=100"));
        }
        if self.adc.max_count == 0 {
            return Err(MonitorError::invalid("adc.max_count", "must be positive"));
        }
        if !(self.adc.span() > 0.0 && self.adc.span().is_finite()) {
            return Err(MonitorError::invalid(
                "adc",
                "reference_voltage * divider must be positive",
            ));
        }
        if self.thorough.samples == 0 {
            return Err(MonitorError::invalid("thorough.samples", "must be at least 1"));
        }
        if self.window.recheck_secs == 0 {
            return Err(MonitorError::invalid("window.recheck_secs", "must be positive"));
        }
        if self.window.retention_secs < self.window.recheck_secs {
            return Err(MonitorError::invalid(
                "window.retention_secs",
                "must be at least the recheck interval",
            ));
        }
        if self.window.min_samples == 0 {
            return Err(MonitorError::invalid("window.min_samples", "must be at least 1"));
        }
        if self.calibration.iterations == 0 {
            return Err(MonitorError::invalid(
                "calibration.iterations",
                "must be at least 1",
            ));
        }
        let threshold = self.calibration.unplug_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(MonitorError::invalid(
                "calibration.unplug_threshold",
                "must be a positive voltage",
            ));
        }
        Ok(())
    }
}
