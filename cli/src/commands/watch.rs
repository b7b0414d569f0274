use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cellgauge_monitor::{CheckKind, Collector, DataMode, MonitorConfig};
use color_eyre::eyre::{eyre, Result};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::Report;
use crate::config::UserConfig;
use crate::device::{self, CliMonitor};

pub struct WatchArgs {
    pub duration: Option<Duration>,
    pub mode: Option<String>,
    pub kind: Option<String>,
    pub interval: Duration,
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Event {
    LevelChanged,
    Empty,
}

#[derive(Debug, Serialize)]
struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<Event>,
    #[serde(flatten)]
    report: Report,
    window: usize,
}

fn lock(monitor: &Mutex<CliMonitor>) -> MutexGuard<'_, CliMonitor> {
    monitor.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn run(config: &UserConfig, args: WatchArgs) -> Result<()> {
    let mut monitor_config = config.monitor.clone();
    if let Some(mode) = &args.mode {
        monitor_config.data_mode =
            DataMode::from_str(mode).ok_or_else(|| eyre!("Unknown data mode: {}", mode))?;
    }
    if let Some(kind) = &args.kind {
        monitor_config.check_kind =
            CheckKind::from_str(kind).ok_or_else(|| eyre!("Unknown check kind: {}", kind))?;
    }

    if args.interval.is_zero() {
        return Err(eyre!("Interval must be greater than zero"));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch(config, monitor_config, args))
}

async fn watch(
    config: &UserConfig,
    monitor_config: MonitorConfig,
    args: WatchArgs,
) -> Result<()> {
    let mode = monitor_config.data_mode;
    let kind = monitor_config.check_kind;
    let mut device = device::open(monitor_config, config.simulator.clone())?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let tx = event_tx.clone();
    device.monitor.on_level_change(move || {
        let _ = tx.send(Event::LevelChanged);
    });
    device.monitor.on_empty(move || {
        let _ = event_tx.send(Event::Empty);
    });

    let monitor = Arc::new(Mutex::new(device.monitor));
    let collector = match mode {
        DataMode::Averaged => Some(Collector::spawn(monitor.clone())?),
        DataMode::Instant => None,
    };

    info!(
        mode = mode.label(),
        kind = kind.label(),
        interval = %humantime::format_duration(args.interval),
        "Watching battery"
    );
    if !args.json {
        println!(
            "Watching ({} mode, {} changes). Ctrl-C to stop.",
            mode.label(),
            kind.label()
        );
    }

    let mut poll = tokio::time::interval(args.interval);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let deadline = async {
        match args.duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut lines = 0usize;
    loop {
        tokio::select! {
            _ = poll.tick() => {
                let line = {
                    let mut guard = lock(&monitor);
                    observe(&mut guard)?
                };
                print_line(&line, args.json)?;
                lines += 1;
            }
            Some(event) = event_rx.recv() => {
                let line = {
                    let mut guard = lock(&monitor);
                    Line { event: Some(event), ..snapshot(&mut guard)? }
                };
                print_line(&line, args.json)?;
            }
            _ = &mut deadline => {
                debug!("Watch duration elapsed");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    if let Some(collector) = collector {
        collector.stop();
    }
    debug!(lines, "Watch finished");
    Ok(())
}

/// Run the change check, then report the current reading.
fn observe(monitor: &mut CliMonitor) -> Result<Line> {
    monitor.check_changed()?;
    snapshot(monitor)
}

fn snapshot(monitor: &mut CliMonitor) -> Result<Line> {
    let reading = monitor.reading()?;
    let empty = monitor.curve().is_empty(reading.voltage);
    Ok(Line {
        event: None,
        report: Report::new(
            reading,
            empty,
            monitor.coefficient(),
            monitor.is_calibrated(),
        ),
        window: monitor.window().len(),
    })
}

fn print_line(line: &Line, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(line)?);
        return Ok(());
    }

    let stamp = line.report.timestamp.format("%H:%M:%S");
    match line.event {
        Some(Event::LevelChanged) => println!("{}  changed  {}", stamp, line.report.summary()),
        Some(Event::Empty) => println!("{}  EMPTY    {}", stamp, line.report.summary()),
        None => println!(
            "{}           {}  [window {}]",
            stamp,
            line.report.summary(),
            line.window
        ),
    }
    Ok(())
}
