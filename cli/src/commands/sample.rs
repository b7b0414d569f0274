use cellgauge_monitor::SampleOptions;
use color_eyre::eyre::Result;

use super::Report;
use crate::config::UserConfig;
use crate::device;

pub struct SampleArgs {
    pub raw: bool,
    pub thorough: bool,
    pub precision: Option<i32>,
    pub json: bool,
}

pub fn run(config: &UserConfig, args: SampleArgs) -> Result<()> {
    let mut device = device::open(config.monitor.clone(), config.simulator.clone())?;
    let monitor = &mut device.monitor;

    if let Some(precision) = args.precision {
        monitor.set_voltage_precision(precision)?;
    }

    let mut opts = if args.thorough {
        SampleOptions::thorough()
    } else {
        SampleOptions::instant()
    };
    if args.raw {
        opts = opts.raw();
    }

    let volts = monitor.sample(opts)?;
    let curve = monitor.curve();
    let report = Report::new(
        curve.reading(volts),
        curve.is_empty(volts),
        monitor.coefficient(),
        monitor.is_calibrated(),
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", report.summary());
    println!(
        "pin {}  coefficient {:.4}{}",
        monitor.pin(),
        report.coefficient,
        if report.calibrated { " (calibrated)" } else { "" }
    );

    Ok(())
}
