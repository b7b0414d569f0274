use std::time::Duration;

use cellgauge_monitor::{Calibration, CalibrationState, MonitorError};
use cellgauge_platform::sim::CellModel;
use cellgauge_platform::{millis, Clock};
use color_eyre::eyre::Result;
use serde_json::json;
use tracing::info;

use crate::config::UserConfig;
use crate::device::{self, CliMonitor};

pub struct CalibrateArgs {
    pub precision: i32,
    pub unplug_after: Duration,
    pub json: bool,
}

pub fn run(config: &UserConfig, args: CalibrateArgs) -> Result<()> {
    let model = CellModel {
        charger_connected: true,
        ..config.simulator.clone()
    };
    let device = device::open(config.monitor.clone(), model)?;
    let unplug_at = device
        .clock
        .now_millis()
        .saturating_add(millis(args.unplug_after));
    device.cell.schedule_unplug(unplug_at);

    if !args.json {
        println!(
            "Charger connected. It will be removed in {} (Ctrl-C to cancel).",
            humantime::format_duration(args.unplug_after)
        );
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (monitor, result) = runtime.block_on(calibrate(device.monitor, args.precision))?;

    match result {
        Ok(calibration) => report(&calibration, args.json),
        Err(MonitorError::CalibrationAborted) => {
            if args.json {
                println!(
                    "{}",
                    json!({ "state": CalibrationState::Cancelled, "coefficient": monitor.coefficient() })
                );
            } else {
                println!(
                    "Calibration cancelled; coefficient unchanged at {:.4}",
                    monitor.coefficient()
                );
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn calibrate(
    mut monitor: CliMonitor,
    precision: i32,
) -> Result<(CliMonitor, cellgauge_monitor::Result<Calibration>)> {
    let handle = monitor.calibration_handle();
    let mut worker = tokio::task::spawn_blocking(move || {
        let result = monitor.calibrate_battery(precision);
        (monitor, result)
    });

    let mut poll = tokio::time::interval(Duration::from_millis(200));
    let mut shown = CalibrationState::Idle;
    let mut stopping = false;

    loop {
        tokio::select! {
            joined = &mut worker => return Ok(joined?),
            _ = poll.tick() => {
                let state = handle.state();
                if stopping && state.is_active() && !handle.is_stop_requested() {
                    handle.stop();
                }
                if state != shown && state.is_active() {
                    eprintln!("{}...", state.label());
                    shown = state;
                }
            }
            _ = tokio::signal::ctrl_c(), if !stopping => {
                info!("Stopping calibration");
                handle.stop();
                stopping = true;
            }
        }
    }
}

fn report(calibration: &Calibration, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(calibration)?);
    } else {
        println!("Measured:    {:.4} V", calibration.measured);
        println!("Coefficient: {:.4}", calibration.coefficient);
    }
    Ok(())
}
