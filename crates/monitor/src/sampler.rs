//! Voltage sampler: raw counts to corrected, rounded volts.

use cellgauge_platform::{AdcProfile, AdcReader, Sleeper};
use tracing::trace;

use crate::error::Result;
use crate::rounding::round_to_precision;

/// How a single `sample()` call should read the cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleOptions {
    /// Ignore the correction coefficient (use 1.0).
    pub raw: bool,
    /// Average several reads instead of taking one.
    pub thorough: bool,
    /// Leave the monitor's last observed values untouched.
    pub no_update: bool,
    pub precision: Option<u8>,
    pub coefficient: Option<f32>,
}

impl SampleOptions {
    pub fn instant() -> Self {
        Self::default()
    }

    pub fn thorough() -> Self {
        Self {
            thorough: true,
            ..Self::default()
        }
    }

    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    pub fn no_update(mut self) -> Self {
        self.no_update = true;
        self
    }

    pub fn precision(mut self, precision: u8) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn coefficient(mut self, coefficient: f32) -> Self {
        self.coefficient = Some(coefficient);
        self
    }
}

/// Owns the ADC reader and the fixed electrical transform.
#[derive(Debug)]
pub struct Sampler<A> {
    adc: A,
    pin: u8,
    profile: AdcProfile,
}

impl<A: AdcReader> Sampler<A> {
    pub fn new(adc: A, pin: u8, profile: AdcProfile) -> Self {
        Self { adc, pin, profile }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn set_pin(&mut self, pin: u8) {
        self.pin = pin;
    }

    pub fn profile(&self) -> &AdcProfile {
        &self.profile
    }

    /// Uncorrected, unrounded cell volts from one conversion.
    pub fn raw_volts(&mut self) -> Result<f32> {
        let count = self.adc.read_raw(self.pin)?;
        let volts = self.profile.counts_to_volts(count);
        trace!(pin = self.pin, count, volts, "adc read");
        Ok(volts)
    }

    /// One conversion, corrected by `coefficient` and rounded.
    pub fn read(&mut self, coefficient: f32, precision: u8) -> Result<f32> {
        let volts = self.raw_volts()?;
        Ok(round_to_precision(volts * coefficient, precision))
    }

    /// `samples` reads spaced by `delay_ms`. Each read is rounded, then the
    /// mean is rounded again.
    pub fn read_thorough<S: Sleeper>(
        &mut self,
        sleeper: &mut S,
        samples: u32,
        delay_ms: u64,
        coefficient: f32,
        precision: u8,
    ) -> Result<f32> {
        let samples = samples.max(1);
        let mut sum = 0.0f64;
        for i in 0..samples {
            if i > 0 {
                sleeper.sleep_millis(delay_ms);
            }
            sum += self.read(coefficient, precision)? as f64;
        }
        let mean = (sum / samples as f64) as f32;
        let volts = round_to_precision(mean, precision);
        trace!(samples, mean, volts, "thorough read");
        Ok(volts)
    }
}
