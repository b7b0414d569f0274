pub mod calibrate;
pub mod config;
pub mod sample;
pub mod watch;

use cellgauge_monitor::{Level, Reading};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One reading as printed by `sample` and `watch`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub voltage: f32,
    /// `None` while charging.
    pub percentage: Option<u8>,
    pub section: Option<u8>,
    pub charging: bool,
    pub empty: bool,
    pub coefficient: f32,
    pub calibrated: bool,
}

impl Report {
    pub fn new(reading: Reading, empty: bool, coefficient: f32, calibrated: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            voltage: reading.voltage,
            percentage: reading.percentage.value(),
            section: reading.section.value(),
            charging: reading.is_charging(),
            empty,
            coefficient,
            calibrated,
        }
    }

    pub fn summary(&self) -> String {
        let level = match (self.percentage, self.section) {
            (Some(p), Some(s)) => format!("{:>3}%  section {}", p, s),
            _ => Level::Charging.to_string(),
        };
        let mut line = format!("{:.3} V  {}", self.voltage, level);
        if self.empty {
            line.push_str("  EMPTY");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgauge_monitor::ChargeCurve;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_line() {
        let curve = ChargeCurve::default();
        let report = Report::new(curve.reading(4.0), false, 1.1, false);
        assert_eq!(report.summary(), "4.000 V   60%  section 3");

        let charging = Report::new(curve.reading(4.5), false, 1.1, false);
        assert_eq!(charging.summary(), "4.500 V  charging");
        assert_eq!(charging.percentage, None);
    }
}
