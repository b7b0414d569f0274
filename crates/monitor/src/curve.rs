//! Linear charge curve: voltage to percentage and coarse sections.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rounding::snap;

/// A percentage or section value, or the charging marker.
///
/// While the charger holds the cell above the charging threshold the
/// voltage says nothing about the charge level, so no number is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Charging,
    Value(u8),
}

impl Level {
    pub fn is_charging(&self) -> bool {
        matches!(self, Level::Charging)
    }

    pub fn value(&self) -> Option<u8> {
        match self {
            Level::Charging => None,
            Level::Value(v) => Some(*v),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Charging => write!(f, "charging"),
            Level::Value(v) => write!(f, "{}", v),
        }
    }
}

/// Voltage landmarks of a single Li-ion cell and the section count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeCurve {
    pub fully_uncharged: f32,
    pub fully_charged: f32,
    /// At or above this the charger is assumed to be connected.
    pub charging_threshold: f32,
    pub sections: u8,
}

impl Default for ChargeCurve {
    fn default() -> Self {
        Self {
            fully_uncharged: 3.7,
            fully_charged: 4.2,
            charging_threshold: 4.3,
            sections: 5,
        }
    }
}

impl ChargeCurve {
    pub fn is_charging(&self, voltage: f32) -> bool {
        voltage >= self.charging_threshold
    }

    pub fn is_empty(&self, voltage: f32) -> bool {
        voltage <= self.fully_uncharged
    }

    /// Position of `voltage` between empty and full, in `0.0..=1.0`.
    fn fraction(&self, voltage: f32) -> f64 {
        let empty = self.fully_uncharged as f64;
        let full = self.fully_charged as f64;
        let span = full - empty;
        if span <= 0.0 {
            return 0.0;
        }
        ((voltage as f64).min(full) - empty) / span
    }

    pub fn percentage(&self, voltage: f32) -> Level {
        if self.is_charging(voltage) {
            return Level::Charging;
        }
        let pct = snap(self.fraction(voltage) * 100.0).round().clamp(0.0, 100.0);
        Level::Value(pct as u8)
    }

    /// Section `1..=sections`; a cell at or below empty sits in section 1.
    pub fn section(&self, voltage: f32) -> Level {
        if self.is_charging(voltage) {
            return Level::Charging;
        }
        let sections = self.sections.max(1);
        let section = snap(self.fraction(voltage) * sections as f64)
            .ceil()
            .clamp(1.0, sections as f64);
        Level::Value(section as u8)
    }

    pub fn reading(&self, voltage: f32) -> Reading {
        Reading {
            voltage,
            percentage: self.percentage(voltage),
            section: self.section(voltage),
        }
    }
}

/// One voltage together with everything derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub voltage: f32,
    pub percentage: Level,
    pub section: Level,
}

impl Reading {
    pub fn is_charging(&self) -> bool {
        self.percentage.is_charging()
    }
}
