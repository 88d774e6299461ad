use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::events::StateChanged;
use crate::folders::FolderSet;

pub const DEFAULT_INTERVAL_MS: u64 = 10_000;

/// Timer-driven scheduler for full analysis passes.
///
/// Stopped -> Running -> Stopped. `start` launches a background loop that
/// runs one pass immediately, then alternates sleep(interval) / analyze;
/// because the loop is sequential there is never more than one pass in
/// flight, however long a pass takes relative to the interval. `stop` flags
/// the loop and wakes the sleeper but never cancels an in-flight pass.
pub struct AutoRefresher {
    folders: Arc<FolderSet>,
    interval_ms: Arc<AtomicU64>,
    run: Mutex<Option<RunState>>,
}

struct RunState {
    _task: JoinHandle<()>,
    stop_flag: Arc<AtomicBool>,
    stop: Arc<Notify>,
}

impl AutoRefresher {
    pub fn new(folders: Arc<FolderSet>) -> Self {
        Self::with_interval(folders, DEFAULT_INTERVAL_MS)
    }

    pub fn with_interval(folders: Arc<FolderSet>, interval_ms: u64) -> Self {
        Self {
            folders,
            interval_ms: Arc::new(AtomicU64::new(interval_ms)),
            run: Mutex::new(None),
        }
    }

    /// Begin refreshing. No-op when already running.
    pub fn start(&self) {
        let mut run = self.run.lock().expect("refresher lock poisoned");
        if run.is_some() {
            return;
        }

        let folders = self.folders.clone();
        let interval_ms = self.interval_ms.clone();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(Notify::new());

        let task = tokio::spawn({
            let stop_flag = stop_flag.clone();
            let stop = stop.clone();
            async move {
                loop {
                    if stop_flag.load(Ordering::SeqCst) {
                        break;
                    }
                    info!("auto-refresh pass started");
                    if let Err(e) = folders.analyze().await {
                        error!(error = %e, "analysis pass failed");
                    }
                    info!("auto-refresh pass finished");

                    let period = Duration::from_millis(interval_ms.load(Ordering::SeqCst));
                    tokio::select! {
                        _ = tokio::time::sleep(period) => {}
                        _ = stop.notified() => {}
                    }
                }
            }
        });

        *run = Some(RunState {
            _task: task,
            stop_flag,
            stop,
        });
    }

    /// Stop scheduling future passes. No-op when not running. An in-flight
    /// pass runs to completion.
    pub fn stop(&self) {
        let mut run = self.run.lock().expect("refresher lock poisoned");
        if let Some(state) = run.take() {
            state.stop_flag.store(true, Ordering::SeqCst);
            state.stop.notify_one();
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.lock().expect("refresher lock poisoned").is_some()
    }

    /// Update the period read before each sleep; the running cycle is not
    /// restarted.
    pub fn set_interval(&self, interval_ms: u64) {
        self.interval_ms.store(interval_ms, Ordering::SeqCst);
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms.load(Ordering::SeqCst)
    }

    /// Pure relay of the folder set's state-changed events.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChanged> {
        self.folders.subscribe()
    }
}
