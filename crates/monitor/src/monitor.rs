//! The battery monitor facade.
//!
//! [`BatteryMonitor`] ties the sampler, the sliding window, the change
//! detector and the calibration controller to one configuration and one set
//! of last-observed values. Everything is synchronous; hosts drive the
//! window through [`BatteryMonitor::tick`], either directly or with a
//! [`Collector`](crate::Collector) thread.

use std::time::Duration;

use cellgauge_platform::{millis, AdcReader, Clock, Sleeper};
use tracing::{debug, info, info_span, trace, warn, Span};

use crate::calibration::{self, Calibration, CalibrationHandle, CalibrationState, Reference};
use crate::config::{
    check_coefficient, check_curve, check_precision, CheckKind, DataMode, MonitorConfig,
};
use crate::curve::{ChargeCurve, Level, Reading};
use crate::detector::{self, ChangeKey, Verdict};
use crate::error::{MonitorError, Result};
use crate::events::{Handler, Handlers};
use crate::sampler::{SampleOptions, Sampler};
use crate::window::{Sample, Window};

/// What a call to [`BatteryMonitor::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The newest window sample is younger than the recheck interval.
    Skipped,
    Sampled {
        sample: Sample,
        /// The averaged reading moved under the configured check kind.
        changed: bool,
    },
}

/// Pending "has it changed since you last asked" flags for averaged mode.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ChangeFlags {
    section: bool,
    percentage: bool,
    voltage: bool,
}

impl ChangeFlags {
    fn slot(&mut self, kind: CheckKind) -> &mut bool {
        match kind {
            CheckKind::Section => &mut self.section,
            CheckKind::Percentage => &mut self.percentage,
            CheckKind::Voltage => &mut self.voltage,
        }
    }

    fn take(&mut self, kind: CheckKind) -> bool {
        std::mem::take(self.slot(kind))
    }
}

#[derive(Debug, Clone, Default)]
struct LastSeen {
    voltage: Option<f32>,
    percentage: Option<Level>,
    section: Option<Level>,
    charging: Option<bool>,
    check_ms: Option<u64>,
    was_empty: bool,
}

pub struct BatteryMonitor<A, C, S> {
    config: MonitorConfig,
    sampler: Sampler<A>,
    clock: C,
    sleeper: S,
    window: Window,
    last: LastSeen,
    pending: ChangeFlags,
    coefficient: f32,
    calibrated: bool,
    collecting: bool,
    pub(crate) collector_attached: bool,
    calibration: CalibrationHandle,
    handlers: Handlers,
    span: Span,
}

impl<A: AdcReader, C: Clock, S: Sleeper> BatteryMonitor<A, C, S> {
    pub fn new(config: MonitorConfig, adc: A, clock: C, sleeper: S) -> Result<Self> {
        config.validate()?;
        let span = info_span!("battery_monitor", pin = config.pin);
        let collecting = config.data_mode == DataMode::Averaged;
        Ok(Self {
            sampler: Sampler::new(adc, config.pin, config.adc),
            window: Window::with_capacity(config.window.capacity()),
            coefficient: config.coefficient.default,
            calibrated: false,
            collecting,
            collector_attached: false,
            last: LastSeen::default(),
            pending: ChangeFlags::default(),
            calibration: CalibrationHandle::default(),
            handlers: Handlers::default(),
            config,
            clock,
            sleeper,
            span,
        })
    }

    /// Replace the span every monitor event is recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn curve(&self) -> &ChargeCurve {
        &self.config.curve
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // Configuration

    pub fn pin(&self) -> u8 {
        self.config.pin
    }

    pub fn set_pin(&mut self, pin: u8) {
        self.config.pin = pin;
        self.sampler.set_pin(pin);
        self.span.record("pin", pin);
    }

    pub fn voltage_precision(&self) -> u8 {
        self.config.precision
    }

    pub fn set_voltage_precision(&mut self, precision: i32) -> Result<()> {
        self.config.precision = check_precision(precision)?;
        Ok(())
    }

    pub fn sections(&self) -> u8 {
        self.config.curve.sections
    }

    pub fn set_sections(&mut self, sections: u8) -> Result<()> {
        let curve = ChargeCurve {
            sections,
            ..self.config.curve
        };
        check_curve(&curve)?;
        self.config.curve = curve;
        Ok(())
    }

    pub fn low_percent(&self) -> u8 {
        self.config.low_percent
    }

    pub fn set_low_percent(&mut self, percent: u8) -> Result<()> {
        if percent > 100 {
            return Err(MonitorError::invalid("low_percent", "must be 0..=100"));
        }
        self.config.low_percent = percent;
        Ok(())
    }

    pub fn calibration_iterations(&self) -> u32 {
        self.config.calibration.iterations
    }

    pub fn set_calibration_iterations(&mut self, iterations: u32) -> Result<()> {
        if iterations == 0 {
            return Err(MonitorError::invalid(
                "calibration.iterations",
                "must be at least 1",
            ));
        }
        self.config.calibration.iterations = iterations;
        Ok(())
    }

    pub fn check_repeats(&self) -> u32 {
        self.config.check.repeats
    }

    /// Zero accepts any difference without re-sampling.
    pub fn set_check_repeats(&mut self, repeats: u32) {
        self.config.check.repeats = repeats;
    }

    pub fn check_delay(&self) -> Duration {
        Duration::from_millis(self.config.check.delay_ms)
    }

    /// Saturates at `u64::MAX` milliseconds.
    pub fn set_check_delay(&mut self, delay: Duration) {
        self.config.check.delay_ms = millis(delay);
    }

    pub fn check_kind(&self) -> CheckKind {
        self.config.check_kind
    }

    pub fn set_check_kind(&mut self, kind: CheckKind) {
        self.config.check_kind = kind;
    }

    pub fn data_mode(&self) -> DataMode {
        self.config.data_mode
    }

    /// Switching to averaged mode also turns collection on.
    pub fn set_data_mode(&mut self, mode: DataMode) {
        self.config.data_mode = mode;
        if mode == DataMode::Averaged && !self.collecting {
            self.start_collecting_data();
        }
    }

    pub fn set_voltage_range(
        &mut self,
        fully_uncharged: f32,
        fully_charged: f32,
        charging_threshold: f32,
    ) -> Result<()> {
        let curve = ChargeCurve {
            fully_uncharged,
            fully_charged,
            charging_threshold,
            ..self.config.curve
        };
        check_curve(&curve)?;
        debug!(
            fully_uncharged,
            fully_charged, charging_threshold, "Voltage range updated"
        );
        self.config.curve = curve;
        Ok(())
    }

    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }

    pub fn set_coefficient(&mut self, coefficient: f32) -> Result<()> {
        check_coefficient("coefficient", coefficient)?;
        self.coefficient = coefficient;
        Ok(())
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    pub fn set_calibrated(&mut self, calibrated: bool) {
        self.calibrated = calibrated;
    }

    // Last observed values

    pub fn last_voltage(&self) -> Option<f32> {
        self.last.voltage
    }

    pub fn set_last_voltage(&mut self, voltage: f32) {
        self.last.voltage = Some(voltage);
    }

    pub fn last_percentage(&self) -> Option<Level> {
        self.last.percentage
    }

    pub fn set_last_percentage(&mut self, percentage: Level) {
        self.last.percentage = Some(percentage);
    }

    pub fn last_section(&self) -> Option<Level> {
        self.last.section
    }

    pub fn set_last_section(&mut self, section: Level) {
        self.last.section = Some(section);
    }

    pub fn last_check_time(&self) -> Option<u64> {
        self.last.check_ms
    }

    /// `None` stamps the current clock time.
    pub fn set_last_check_time(&mut self, at_ms: Option<u64>) {
        self.last.check_ms = Some(at_ms.unwrap_or_else(|| self.clock.now_millis()));
    }

    // Events

    pub fn on_empty(&mut self, handler: impl FnMut() + Send + 'static) {
        self.handlers.on_empty = Handler::new(handler);
    }

    pub fn on_level_change(&mut self, handler: impl FnMut() + Send + 'static) {
        self.handlers.on_level_change = Handler::new(handler);
    }

    // Sampling

    /// Read the cell once (or thoroughly) under `opts`.
    ///
    /// Unless `no_update` is set the result becomes the last observed
    /// voltage.
    pub fn sample(&mut self, opts: SampleOptions) -> Result<f32> {
        let _enter = self.span.enter();
        let precision = opts.precision.unwrap_or(self.config.precision);
        let coefficient = if opts.raw {
            1.0
        } else {
            opts.coefficient.unwrap_or(self.coefficient)
        };

        let volts = if opts.thorough {
            self.sampler.read_thorough(
                &mut self.sleeper,
                self.config.thorough.samples,
                self.config.thorough.delay_ms,
                coefficient,
                precision,
            )?
        } else {
            self.sampler.read(coefficient, precision)?
        };

        if !opts.no_update {
            self.last.voltage = Some(volts);
        }
        trace!(volts, raw = opts.raw, thorough = opts.thorough, "sample");
        Ok(volts)
    }

    fn instant_reading(&mut self) -> Result<Reading> {
        let volts = self.sample(SampleOptions::instant().no_update())?;
        Ok(self.config.curve.reading(volts))
    }

    /// Current reading under the configured data mode.
    ///
    /// Instant mode samples once and records the result. Averaged mode reads
    /// the window average, or an unrecorded instant sample while the window
    /// is still filling.
    pub fn reading(&mut self) -> Result<Reading> {
        match self.config.data_mode {
            DataMode::Averaged => match self.averaged_reading() {
                Ok(reading) => Ok(reading),
                Err(MonitorError::InsufficientData { have, need }) => {
                    trace!(have, need, "window short, falling back to instant read");
                    self.instant_reading()
                }
                Err(e) => Err(e),
            },
            DataMode::Instant => {
                let reading = self.instant_reading()?;
                self.record(reading);
                Ok(reading)
            }
        }
    }

    pub fn voltage(&mut self) -> Result<f32> {
        Ok(self.reading()?.voltage)
    }

    pub fn percentage(&mut self) -> Result<Level> {
        Ok(self.reading()?.percentage)
    }

    pub fn section(&mut self) -> Result<Level> {
        Ok(self.reading()?.section)
    }

    pub fn is_charging(&mut self) -> Result<bool> {
        Ok(self.reading()?.is_charging())
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        let volts = self.voltage()?;
        Ok(self.config.curve.is_empty(volts))
    }

    /// At or below the low-battery percentage. Never true while charging.
    pub fn is_low(&mut self) -> Result<bool> {
        let low = self.config.low_percent;
        Ok(self.percentage()?.value().is_some_and(|p| p <= low))
    }

    // Window

    /// Mean voltage over the window, rounded at the current precision.
    ///
    /// `normalized` rescales the mean from the current coefficient to the
    /// default one, for comparing across calibrations.
    pub fn averaged_voltage(&self, normalized: bool) -> Result<f32> {
        let need = self.config.window.min_samples;
        let have = self.window.len();
        let mean = match self.window.mean_voltage() {
            Some(mean) if have >= need => mean,
            _ => return Err(MonitorError::InsufficientData { have, need }),
        };
        let volts = crate::rounding::round_to_precision(mean, self.config.precision);
        if normalized {
            Ok(volts * self.config.coefficient.default / self.coefficient)
        } else {
            Ok(volts)
        }
    }

    pub fn averaged_reading(&self) -> Result<Reading> {
        Ok(self.config.curve.reading(self.averaged_voltage(false)?))
    }

    pub fn flush_window(&mut self) {
        if !self.window.is_empty() {
            debug!(dropped = self.window.len(), "Window flushed");
        }
        self.window.clear();
    }

    pub fn start_collecting_data(&mut self) {
        if !self.collecting {
            info!(
                recheck_secs = self.config.window.recheck_secs,
                retention_secs = self.config.window.retention_secs,
                "Data collection started"
            );
        }
        self.collecting = true;
    }

    pub fn stop_collecting_data(&mut self) {
        if self.collecting {
            info!("Data collection stopped");
        }
        self.collecting = false;
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// One collection step: add a thorough sample to the window when the
    /// recheck interval has elapsed, evict stale samples and refresh the
    /// per-kind change flags from the new average.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let now = self.clock.now_millis();
        if !self.window.is_due(now, self.config.window.recheck_ms()) {
            return Ok(TickOutcome::Skipped);
        }

        let volts = self.sample(SampleOptions::thorough().no_update())?;
        let sample = Sample::new(now, self.config.curve.reading(volts));

        let span = self.span.clone();
        let _enter = span.enter();
        if self
            .window
            .newest()
            .is_some_and(|newest| newest.is_charging() != sample.is_charging())
        {
            debug!(
                charging = sample.is_charging(),
                "Charging state flipped, window flushed"
            );
            self.window.clear();
        }
        self.window.push(sample);
        let evicted = self.window.evict(now, self.config.window.retention_ms());
        trace!(
            volts,
            len = self.window.len(),
            evicted,
            "window sample added"
        );

        let changed = match self.averaged_reading() {
            Ok(average) => self.observe_average(average),
            Err(_) => false,
        };
        Ok(TickOutcome::Sampled { sample, changed })
    }

    fn observe_average(&mut self, average: Reading) -> bool {
        let crossed = self.crossed_charging(&average);
        for kind in CheckKind::ALL {
            if crossed || self.last_key(kind) != Some(kind.key(&average)) {
                *self.pending.slot(kind) = true;
            }
        }
        let changed = crossed || self.last_key(self.config.check_kind)
            != Some(self.config.check_kind.key(&average));

        self.record(average);
        if changed {
            info!(
                voltage = average.voltage,
                section = %average.section,
                percentage = %average.percentage,
                "Battery level changed"
            );
            self.handlers.on_level_change.fire();
        }
        changed
    }

    // Change detection

    fn last_key(&self, kind: CheckKind) -> Option<ChangeKey> {
        match kind {
            CheckKind::Section => self.last.section.map(ChangeKey::Level),
            CheckKind::Percentage => self.last.percentage.map(ChangeKey::Level),
            CheckKind::Voltage => self.last.voltage.map(ChangeKey::Voltage),
        }
    }

    fn crossed_charging(&self, reading: &Reading) -> bool {
        let charging = reading.is_charging();
        self.last.charging.is_some_and(|was| was != charging)
            || self
                .last
                .section
                .is_some_and(|s| s.is_charging() != charging)
    }

    fn record(&mut self, reading: Reading) {
        self.last.voltage = Some(reading.voltage);
        self.last.percentage = Some(reading.percentage);
        self.last.section = Some(reading.section);
        self.last.charging = Some(reading.is_charging());

        let empty = self.config.curve.is_empty(reading.voltage);
        if empty && !self.last.was_empty {
            warn!(voltage = reading.voltage, "Battery empty");
            self.handlers.on_empty.fire();
        }
        self.last.was_empty = empty;
    }

    fn accept_change(&mut self, reading: Reading) {
        self.record(reading);
        self.window.clear();
        info!(
            voltage = reading.voltage,
            section = %reading.section,
            percentage = %reading.percentage,
            "Battery level changed"
        );
        self.handlers.on_level_change.fire();
    }

    /// Has `kind` changed since it was last recorded?
    ///
    /// In averaged mode this consumes the flag set by the collector, unless
    /// `force_instant` asks for a fresh fluke-checked sample instead. A
    /// confirmed change is recorded, flushes the window and fires
    /// `on_level_change`.
    pub fn voltage_changed(&mut self, kind: CheckKind, force_instant: bool) -> Result<bool> {
        self.last.check_ms = Some(self.clock.now_millis());
        if self.config.data_mode == DataMode::Averaged && !force_instant {
            return Ok(self.pending.take(kind));
        }

        let fresh = self.instant_reading()?;
        let previous = self.last_key(kind);
        let repeats = self.config.check.repeats;
        let delay_ms = self.config.check.delay_ms;
        let precision = self.config.precision;
        let coefficient = self.coefficient;

        let verdict = {
            let Self {
                sampler,
                sleeper,
                config,
                ..
            } = self;
            detector::classify(kind, previous, fresh, repeats, || {
                sleeper.sleep_millis(delay_ms);
                let volts = sampler.read(coefficient, precision)?;
                Ok::<_, MonitorError>(config.curve.reading(volts))
            })?
        };

        let span = self.span.clone();
        let _enter = span.enter();
        match verdict {
            Verdict::Changed(reading) => {
                self.accept_change(reading);
                Ok(true)
            }
            Verdict::Fluke => {
                debug!(kind = kind.label(), voltage = fresh.voltage, "Fluke rejected");
                Ok(false)
            }
            Verdict::Unchanged if self.crossed_charging(&fresh) => {
                self.accept_change(fresh);
                Ok(true)
            }
            Verdict::Unchanged => Ok(false),
        }
    }

    /// [`voltage_changed`](Self::voltage_changed) for the configured kind.
    pub fn check_changed(&mut self) -> Result<bool> {
        self.voltage_changed(self.config.check_kind, false)
    }

    // Calibration

    /// Run the guided calibration, blocking until it finishes or is stopped
    /// through [`calibration_handle`](Self::calibration_handle).
    ///
    /// On success the coefficient becomes `fully_charged / measured`, the
    /// monitor is marked calibrated and the window is flushed. Any error
    /// leaves the coefficient untouched.
    pub fn calibrate_battery(&mut self, precision: i32) -> Result<Calibration> {
        let measure_precision = check_precision(precision)?;
        let _enter = self.span.enter();
        let reference = Reference {
            fully_charged: self.config.curve.fully_charged,
            watch_precision: self.config.precision,
            measure_precision,
        };
        let calibration = calibration::run(
            &mut self.sampler,
            &mut self.sleeper,
            &self.calibration,
            &self.config.calibration,
            &reference,
        )?;
        self.coefficient = calibration.coefficient;
        self.calibrated = true;
        self.window.clear();
        Ok(calibration)
    }

    pub fn stop_calibration(&self) {
        self.calibration.stop();
    }

    pub fn calibration_handle(&self) -> CalibrationHandle {
        self.calibration.clone()
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.calibration.state()
    }

    /// Back to the default coefficient, uncalibrated.
    pub fn reset_battery(&mut self) {
        let _enter = self.span.enter();
        self.coefficient = self.config.coefficient.default;
        self.calibrated = false;
        self.window.clear();
        info!(coefficient = self.coefficient, "Calibration reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgauge_platform::sim::{ManualClock, ScriptedAdc, SimSleeper};
    use cellgauge_platform::AdcProfile;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type TestMonitor = BatteryMonitor<ScriptedAdc, ManualClock, SimSleeper>;

    fn monitor(config: MonitorConfig, adc: ScriptedAdc) -> (TestMonitor, ManualClock) {
        let clock = ManualClock::new();
        let sleeper = SimSleeper::new(clock.clone());
        let m = BatteryMonitor::new(config, adc, clock.clone(), sleeper).unwrap();
        (m, clock)
    }

    /// Counts that read as `volts` after the default 1.1 correction.
    fn counts(volts: f32) -> u16 {
        AdcProfile::default().volts_to_counts(volts / 1.1)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = MonitorConfig {
            precision: 7,
            ..MonitorConfig::default()
        };
        let clock = ManualClock::new();
        let result = BatteryMonitor::new(
            config,
            ScriptedAdc::repeating(0),
            clock.clone(),
            SimSleeper::new(clock),
        );
        assert!(matches!(
            result,
            Err(MonitorError::InvalidConfiguration { field: "precision", .. })
        ));
    }

    #[test]
    fn test_sample_records_unless_no_update() {
        let (mut m, _) = monitor(MonitorConfig::default(), ScriptedAdc::repeating(3100));
        assert_eq!(m.last_voltage(), None);
        assert_eq!(m.sample(SampleOptions::instant().no_update()).unwrap(), 5.5);
        assert_eq!(m.last_voltage(), None);
        assert_eq!(m.sample(SampleOptions::instant().raw()).unwrap(), 5.0);
        assert_eq!(m.last_voltage(), Some(5.0));
    }

    #[test]
    fn test_high_reading_is_charging() {
        let (mut m, _) = monitor(MonitorConfig::default(), ScriptedAdc::repeating(3100));
        let reading = m.reading().unwrap();
        assert_eq!(reading.voltage, 5.5);
        assert_eq!(reading.section, Level::Charging);
        assert_eq!(reading.percentage, Level::Charging);
        assert!(m.is_charging().unwrap());
        assert!(!m.is_low().unwrap());
    }

    #[test]
    fn test_setters_reject_invalid_values() {
        let (mut m, _) = monitor(MonitorConfig::default(), ScriptedAdc::repeating(0));
        assert!(m.set_voltage_precision(-1).is_err());
        assert!(m.set_sections(0).is_err());
        assert!(m.set_voltage_range(4.2, 3.7, 4.3).is_err());
        assert!(m.set_coefficient(0.0).is_err());
        assert!(m.set_coefficient(f32::NAN).is_err());
        assert!(m.set_calibration_iterations(0).is_err());
        assert!(m.set_low_percent(120).is_err());

        assert_eq!(m.voltage_precision(), 1);
        assert_eq!(m.sections(), 5);
        assert_eq!(m.coefficient(), 1.1);
    }

    #[test]
    fn test_check_delay_saturates() {
        let (mut m, _) = monitor(MonitorConfig::default(), ScriptedAdc::repeating(0));
        m.set_check_delay(Duration::from_millis(35));
        assert_eq!(m.check_delay(), Duration::from_millis(35));

        m.set_check_delay(Duration::MAX);
        assert_eq!(m.check_delay(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_on_empty_fires_once_per_crossing() {
        let adc = ScriptedAdc::new();
        adc.push_many([counts(3.6), counts(3.5), counts(4.0), counts(3.6)]);
        let (mut m, _) = monitor(MonitorConfig::default(), adc);
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = fired.clone();
        m.on_empty(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(m.is_empty().unwrap());
        assert!(m.is_empty().unwrap());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!m.is_empty().unwrap());
        assert!(m.is_empty().unwrap());
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_averaged_voltage_needs_min_samples() {
        let (mut m, clock) = monitor(MonitorConfig::default(), ScriptedAdc::repeating(counts(4.0)));
        assert_eq!(
            m.averaged_voltage(false),
            Err(MonitorError::InsufficientData { have: 0, need: 3 })
        );

        m.tick().unwrap();
        clock.advance(10_000);
        m.tick().unwrap();
        assert_eq!(
            m.averaged_voltage(false),
            Err(MonitorError::InsufficientData { have: 2, need: 3 })
        );
        clock.advance(10_000);
        m.tick().unwrap();
        assert_eq!(m.averaged_voltage(false).unwrap(), 4.0);
    }

    #[test]
    fn test_normalized_average_rescales_to_default_coefficient() {
        let adc = ScriptedAdc::repeating(AdcProfile::default().volts_to_counts(4.0 / 1.2));
        let (mut m, clock) = monitor(MonitorConfig::default(), adc);
        m.set_coefficient(1.2).unwrap();
        for _ in 0..3 {
            m.tick().unwrap();
            clock.advance(10_000);
        }
        let normalized = m.averaged_voltage(true).unwrap();
        assert!((normalized - 4.0 * 1.1 / 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_tick_skips_until_recheck_elapses() {
        let (mut m, clock) = monitor(MonitorConfig::default(), ScriptedAdc::repeating(counts(4.0)));
        assert!(matches!(m.tick().unwrap(), TickOutcome::Sampled { .. }));
        clock.advance(9_000);
        assert_eq!(m.tick().unwrap(), TickOutcome::Skipped);
        clock.advance(1_000);
        assert!(matches!(m.tick().unwrap(), TickOutcome::Sampled { .. }));
        assert_eq!(m.window().len(), 2);
    }

    #[test]
    fn test_change_flags_are_consumed() {
        let config = MonitorConfig {
            data_mode: DataMode::Averaged,
            window: crate::config::WindowConfig {
                min_samples: 1,
                ..Default::default()
            },
            ..MonitorConfig::default()
        };
        let (mut m, _) = monitor(config, ScriptedAdc::repeating(counts(4.0)));
        assert!(m.is_collecting());
        m.tick().unwrap();

        assert!(m.voltage_changed(CheckKind::Section, false).unwrap());
        assert!(!m.voltage_changed(CheckKind::Section, false).unwrap());
        assert!(m.voltage_changed(CheckKind::Voltage, false).unwrap());
        assert_eq!(m.last_section(), Some(Level::Value(3)));
        assert!(m.last_check_time().is_some());
    }

    #[test]
    fn test_reset_battery_restores_default() {
        let (mut m, _) = monitor(MonitorConfig::default(), ScriptedAdc::repeating(0));
        m.set_coefficient(1.3).unwrap();
        m.set_calibrated(true);
        m.reset_battery();
        assert_eq!(m.coefficient(), 1.1);
        assert!(!m.is_calibrated());
    }
}
