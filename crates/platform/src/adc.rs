//! Raw ADC access and the fixed count-to-volts transform.

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Single-shot analog sampling, provided by the host.
pub trait AdcReader {
    /// Read one raw conversion from `pin`.
    fn read_raw(&mut self, pin: u8) -> Result<u16, PlatformError>;
}

impl<T: AdcReader + ?Sized> AdcReader for Box<T> {
    fn read_raw(&mut self, pin: u8) -> Result<u16, PlatformError> {
        (**self).read_raw(pin)
    }
}

/// Electrical description of the measurement path.
///
/// The cell is read through a resistor divider, so the voltage seen at the
/// pin is `cell / divider`. With the defaults (12-bit ADC, 3.3 V reference,
/// 2:1 divider) a full-scale count maps to 6.6 V.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcProfile {
    pub max_count: u16,
    pub reference_voltage: f32,
    pub divider: f32,
}

impl Default for AdcProfile {
    fn default() -> Self {
        Self {
            max_count: 4095,
            reference_voltage: 3.3,
            divider: 2.0,
        }
    }
}

impl AdcProfile {
    /// Cell voltage represented by a full-scale count.
    pub fn span(&self) -> f32 {
        self.reference_voltage * self.divider
    }

    /// Linear transform from a raw count to cell volts.
    ///
    /// Counts above `max_count` saturate, which keeps the transform
    /// monotonic over the whole `u16` range.
    pub fn counts_to_volts(&self, count: u16) -> f32 {
        if self.max_count == 0 {
            return 0.0;
        }
        let count = count.min(self.max_count);
        count as f32 / self.max_count as f32 * self.span()
    }

    /// Inverse of [`counts_to_volts`](Self::counts_to_volts), rounded to the
    /// nearest count and clamped to the converter range.
    pub fn volts_to_counts(&self, volts: f32) -> u16 {
        let span = self.span();
        if span <= 0.0 || !volts.is_finite() {
            return 0;
        }
        let counts = (volts / span * self.max_count as f32).round();
        counts.clamp(0.0, self.max_count as f32) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_span() {
        let profile = AdcProfile::default();
        assert!((profile.span() - 6.6).abs() < 1e-6);
    }

    #[test]
    fn test_counts_to_volts_endpoints() {
        let profile = AdcProfile::default();
        assert_eq!(profile.counts_to_volts(0), 0.0);
        assert!((profile.counts_to_volts(4095) - 6.6).abs() < 1e-5);
    }

    #[test]
    fn test_counts_to_volts_is_monotonic() {
        let profile = AdcProfile::default();
        let mut previous = profile.counts_to_volts(0);
        for count in 1..=u16::MAX {
            let volts = profile.counts_to_volts(count);
            assert!(volts >= previous, "count {} went backwards", count);
            previous = volts;
        }
    }

    #[test]
    fn test_volts_to_counts_clamps() {
        let profile = AdcProfile::default();
        assert_eq!(profile.volts_to_counts(-1.0), 0);
        assert_eq!(profile.volts_to_counts(100.0), 4095);
        assert_eq!(profile.volts_to_counts(f32::NAN), 0);
    }

    #[test]
    fn test_volts_round_trip_within_one_count() {
        let profile = AdcProfile::default();
        let counts = profile.volts_to_counts(3.9);
        let volts = profile.counts_to_volts(counts);
        assert!((volts - 3.9).abs() <= profile.span() / profile.max_count as f32);
    }

    #[test]
    fn test_zero_max_count_is_safe() {
        let profile = AdcProfile {
            max_count: 0,
            ..AdcProfile::default()
        };
        assert_eq!(profile.counts_to_volts(100), 0.0);
    }
}
