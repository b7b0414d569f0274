mod common;

use std::thread;
use std::time::{Duration, Instant};

use cellgauge_monitor::{CalibrationState, DataMode, MonitorConfig, MonitorError, WindowConfig};
use common::{corrected, raw, rig, Rig};
use pretty_assertions::assert_eq;

/// Charger on at 4.5 V raw for a few polls, then pulled to 3.8 V raw.
fn script_unplug(r: &Rig) {
    r.adc.push_many([raw(4.5); 3]);
    r.adc.push(raw(3.8));
}

#[test]
fn test_calibration_sets_coefficient_from_measured_average() {
    let mut r = rig(MonitorConfig::default());
    script_unplug(&r);

    let calibration = r.monitor.calibrate_battery(3).unwrap();
    assert_eq!(calibration.measured, 3.8);
    assert!((calibration.coefficient - 4.2 / 3.8).abs() < 1e-6);
    assert_eq!(r.monitor.coefficient(), calibration.coefficient);
    assert!(r.monitor.is_calibrated());
    assert_eq!(r.monitor.calibration_state(), CalibrationState::Done);
}

#[test]
fn test_calibration_divides_by_the_unrounded_mean() {
    let mut r = rig(MonitorConfig::default());
    script_unplug(&r);
    for _ in 0..5 {
        r.adc.push_many([raw(4.1), raw(4.2)]);
    }

    // The 3.8 V read ends the unplug watch; the ten measurement reads
    // alternate 4.1 V and 4.2 V and average to 4.15 V.
    let calibration = r.monitor.calibrate_battery(1).unwrap();
    assert!((calibration.measured - 4.15).abs() < 1e-5);
    assert!((calibration.coefficient - 4.2 / 4.15).abs() < 1e-5);
    assert_eq!(r.monitor.coefficient(), calibration.coefficient);
}

#[test]
fn test_calibration_is_deterministic() {
    let run = || {
        let mut r = rig(MonitorConfig::default());
        script_unplug(&r);
        r.monitor.calibrate_battery(3).unwrap().coefficient
    };
    assert_eq!(run(), run());
}

#[test]
fn test_calibration_waits_settle_and_sample_delays() {
    let mut r = rig(MonitorConfig::default());
    script_unplug(&r);
    r.monitor.calibrate_battery(3).unwrap();

    // Three 100 ms unplug polls, 750 ms settle, nine 100 ms gaps between
    // ten measurement reads.
    assert_eq!(r.sleeper.total_slept(), 3 * 100 + 750 + 9 * 100);
}

#[test]
fn test_calibration_flushes_window() {
    let config = MonitorConfig {
        data_mode: DataMode::Averaged,
        window: WindowConfig {
            min_samples: 1,
            ..WindowConfig::default()
        },
        ..MonitorConfig::default()
    };
    let mut r = rig(config);
    r.adc.push(corrected(4.0));
    r.monitor.tick().unwrap();
    assert_eq!(r.monitor.window().len(), 1);

    script_unplug(&r);
    r.monitor.calibrate_battery(3).unwrap();
    assert!(r.monitor.window().is_empty());
}

#[test]
fn test_zero_average_is_rejected() {
    let mut r = rig(MonitorConfig::default());
    r.adc.push_many([raw(4.5), raw(4.5)]);
    r.adc.push(0);

    let result = r.monitor.calibrate_battery(3);
    assert_eq!(result, Err(MonitorError::CalibrationInvalid { measured: 0.0 }));
    assert_eq!(r.monitor.coefficient(), 1.1);
    assert!(!r.monitor.is_calibrated());
    assert_eq!(r.monitor.calibration_state(), CalibrationState::Failed);
}

#[test]
fn test_invalid_precision_is_rejected_before_starting() {
    let mut r = rig(MonitorConfig::default());
    assert!(matches!(
        r.monitor.calibrate_battery(-1),
        Err(MonitorError::InvalidConfiguration { field: "precision", .. })
    ));
    assert_eq!(r.monitor.calibration_state(), CalibrationState::Idle);
    assert_eq!(r.adc.reads(), 0);
}

#[test]
fn test_stop_while_waiting_leaves_state_untouched() {
    let mut r = rig(MonitorConfig::default());
    // The charger never comes out.
    r.adc.push(raw(4.5));
    r.monitor.set_coefficient(1.05).unwrap();
    let handle = r.monitor.calibration_handle();

    let mut monitor = r.monitor;
    let worker = thread::spawn(move || {
        let result = monitor.calibrate_battery(3);
        (monitor, result)
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    while handle.state() != CalibrationState::WaitingForUnplug {
        assert!(Instant::now() < deadline, "calibration never started");
        thread::sleep(Duration::from_millis(1));
    }
    handle.stop();

    let (monitor, result) = worker.join().unwrap();
    assert_eq!(result, Err(MonitorError::CalibrationAborted));
    assert_eq!(monitor.coefficient(), 1.05);
    assert!(!monitor.is_calibrated());
    assert_eq!(handle.state(), CalibrationState::Cancelled);
}

#[test]
fn test_reset_after_calibration() {
    let mut r = rig(MonitorConfig::default());
    script_unplug(&r);
    r.monitor.calibrate_battery(3).unwrap();

    r.monitor.reset_battery();
    assert_eq!(r.monitor.coefficient(), 1.1);
    assert!(!r.monitor.is_calibrated());
}
