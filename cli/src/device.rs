//! The monitor the CLI talks to: a simulated cell on the host clock.

use cellgauge_monitor::{BatteryMonitor, MonitorConfig};
use cellgauge_platform::sim::{CellModel, SimulatedCell};
use cellgauge_platform::{SystemClock, ThreadSleeper};
use color_eyre::eyre::Result;

pub type Cell = SimulatedCell<SystemClock>;
pub type CliMonitor = BatteryMonitor<Cell, SystemClock, ThreadSleeper>;

pub struct Device {
    pub monitor: CliMonitor,
    /// Shares state with the reader inside `monitor`.
    pub cell: Cell,
    pub clock: SystemClock,
}

/// Build a monitor for `monitor_config` over a cell following `model`.
/// Every run starts from the default coefficient.
pub fn open(monitor_config: MonitorConfig, model: CellModel) -> Result<Device> {
    let clock = SystemClock::new();
    let cell = SimulatedCell::new(model, monitor_config.adc, clock);
    let monitor = BatteryMonitor::new(monitor_config, cell.clone(), clock, ThreadSleeper)?;

    Ok(Device {
        monitor,
        cell,
        clock,
    })
}
