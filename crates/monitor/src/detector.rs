//! Change/fluke classification.
//!
//! A difference between the last recorded value and a fresh one is only
//! believed once `repeats` further samples all disagree with the old value.
//! A single re-sample that matches the old value marks the difference as a
//! fluke, which trades responsiveness for a steady display.

use crate::config::CheckKind;
use crate::curve::{Level, Reading};

/// The part of a reading a [`CheckKind`] compares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChangeKey {
    Level(Level),
    Voltage(f32),
}

impl CheckKind {
    pub fn key(&self, reading: &Reading) -> ChangeKey {
        match self {
            CheckKind::Section => ChangeKey::Level(reading.section),
            CheckKind::Percentage => ChangeKey::Level(reading.percentage),
            CheckKind::Voltage => ChangeKey::Voltage(reading.voltage),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Fresh value equals the recorded one.
    Unchanged,
    /// A re-sample went back to the recorded value.
    Fluke,
    /// Every re-sample disagreed with the recorded value; carries the most
    /// recent reading.
    Changed(Reading),
}

impl Verdict {
    pub fn is_changed(&self) -> bool {
        matches!(self, Verdict::Changed(_))
    }
}

/// Classify `fresh` against `previous` under `kind`.
///
/// With no previous value the first observation counts as a change.
/// `resample` is called at most `repeats` times and is expected to wait the
/// inter-check delay itself.
pub fn classify<E, F>(
    kind: CheckKind,
    previous: Option<ChangeKey>,
    fresh: Reading,
    repeats: u32,
    mut resample: F,
) -> Result<Verdict, E>
where
    F: FnMut() -> Result<Reading, E>,
{
    let Some(previous) = previous else {
        return Ok(Verdict::Changed(fresh));
    };

    if kind.key(&fresh) == previous {
        return Ok(Verdict::Unchanged);
    }

    let mut latest = fresh;
    for _ in 0..repeats {
        latest = resample()?;
        if kind.key(&latest) == previous {
            return Ok(Verdict::Fluke);
        }
    }
    Ok(Verdict::Changed(latest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::ChargeCurve;
    use std::collections::VecDeque;
    use std::convert::Infallible;

    fn reading(volts: f32) -> Reading {
        ChargeCurve::default().reading(volts)
    }

    fn run(
        kind: CheckKind,
        previous: f32,
        fresh: f32,
        resamples: &[f32],
        repeats: u32,
    ) -> (Verdict, usize) {
        let mut queue: VecDeque<f32> = resamples.iter().copied().collect();
        let mut calls = 0;
        let verdict = classify::<Infallible, _>(
            kind,
            Some(kind.key(&reading(previous))),
            reading(fresh),
            repeats,
            || {
                calls += 1;
                Ok(reading(queue.pop_front().unwrap_or(fresh)))
            },
        )
        .unwrap();
        (verdict, calls)
    }

    #[test]
    fn test_equal_values_do_not_resample() {
        let (verdict, calls) = run(CheckKind::Voltage, 3.9, 3.9, &[], 5);
        assert_eq!(verdict, Verdict::Unchanged);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_confirmed_change() {
        let (verdict, calls) = run(CheckKind::Voltage, 3.9, 3.8, &[3.8, 3.8, 3.8, 3.8, 3.8], 5);
        assert_eq!(verdict, Verdict::Changed(reading(3.8)));
        assert_eq!(calls, 5);
    }

    #[test]
    fn test_any_matching_resample_is_a_fluke() {
        for position in 0..5 {
            let mut resamples = vec![3.8; 5];
            resamples[position] = 3.9;
            let (verdict, calls) = run(CheckKind::Voltage, 3.9, 3.8, &resamples, 5);
            assert_eq!(verdict, Verdict::Fluke, "dissent at {}", position);
            assert_eq!(calls, position + 1);
        }
    }

    #[test]
    fn test_wandering_resamples_still_count_as_change() {
        // None of these equal the recorded 3.9, so the change stands.
        let (verdict, _) = run(CheckKind::Voltage, 3.9, 3.8, &[3.7, 3.8, 4.0, 3.8, 3.75], 5);
        assert_eq!(verdict, Verdict::Changed(reading(3.75)));
    }

    #[test]
    fn test_section_kind_ignores_voltage_noise() {
        // 3.82 and 3.88 both sit in section 2.
        let (verdict, _) = run(CheckKind::Section, 3.82, 3.88, &[], 5);
        assert_eq!(verdict, Verdict::Unchanged);
    }

    #[test]
    fn test_first_observation_is_a_change() {
        let verdict = classify::<Infallible, _>(
            CheckKind::Section,
            None,
            reading(4.0),
            5,
            || unreachable!(),
        )
        .unwrap();
        assert!(verdict.is_changed());
    }

    #[test]
    fn test_zero_repeats_accepts_immediately() {
        let (verdict, calls) = run(CheckKind::Percentage, 4.0, 3.9, &[], 0);
        assert_eq!(verdict, Verdict::Changed(reading(3.9)));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_resample_error_propagates() {
        let result = classify(
            CheckKind::Voltage,
            Some(ChangeKey::Voltage(3.9)),
            reading(3.8),
            5,
            || Err("adc gone"),
        );
        assert_eq!(result, Err("adc gone"));
    }
}
