//! Background data collection.
//!
//! A [`Collector`] owns a thread that calls [`BatteryMonitor::tick`] every
//! poll interval for as long as the monitor keeps collecting. The monitor
//! is shared behind a mutex so foreground calls and the collector never
//! touch the window at the same time.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cellgauge_platform::{millis, AdcReader, Clock, Sleeper};
use tracing::{debug, warn};

use crate::error::{MonitorError, Result};
use crate::monitor::{BatteryMonitor, TickOutcome};

pub type SharedMonitor<A, C, S> = Arc<Mutex<BatteryMonitor<A, C, S>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a running collection thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct Collector {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Collector {
    /// Start collecting for `monitor`. Turns collection on and fails with
    /// [`MonitorError::CollectorRunning`] if another collector is attached.
    pub fn spawn<A, C, S>(monitor: SharedMonitor<A, C, S>) -> Result<Self>
    where
        A: AdcReader + Send + 'static,
        C: Clock + Send + 'static,
        S: Sleeper + Send + 'static,
    {
        let interval = {
            let mut guard = lock(&monitor);
            if guard.collector_attached {
                return Err(MonitorError::CollectorRunning);
            }
            guard.collector_attached = true;
            guard.start_collecting_data();
            guard.config().window.poll_interval()
        };

        let (stop_tx, stop_rx) = mpsc::channel();
        let thread = thread::spawn(move || {
            debug!(interval_ms = millis(interval), "Collector started");
            run(&monitor, &stop_rx, interval);
            lock(&monitor).collector_attached = false;
            debug!("Collector stopped");
        });

        Ok(Self {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// False once the thread has exited, either through [`stop`](Self::stop)
    /// or because the monitor stopped collecting.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the thread, wait for it and turn the monitor's collection off.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Collector thread panicked");
            }
        }
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<A, C, S>(
    monitor: &Mutex<BatteryMonitor<A, C, S>>,
    stop_rx: &mpsc::Receiver<()>,
    interval: Duration,
) where
    A: AdcReader,
    C: Clock,
    S: Sleeper,
{
    loop {
        {
            let mut guard = lock(monitor);
            if !guard.is_collecting() {
                return;
            }
            match guard.tick() {
                Ok(TickOutcome::Sampled { changed: true, .. }) => {
                    debug!("Collector observed a level change")
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Collection tick failed"),
            }
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                lock(monitor).stop_collecting_data();
                return;
            }
        }
    }
}
