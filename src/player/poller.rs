//! Periodic refresh of the volatile player properties.

use crate::player::supervisor::PlayerSupervisor;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::constants::DEFAULT_POLL_INTERVAL_MS;

/// Repeating timer that asks the supervisor to re-query pause state and
/// playback position while media is loaded. The guard against polling an
/// absent or idle player lives in [`PlayerSupervisor::poll_tick`]; ticks
/// fired at the wrong moment are cheap no-ops.
pub struct StatusPoller {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Start polling at the default 1 second cadence
    pub fn start(supervisor: Arc<PlayerSupervisor>) -> Self {
        Self::with_interval(supervisor, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))
    }

    /// Start polling at a custom cadence
    pub fn with_interval(supervisor: Arc<PlayerSupervisor>, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();

        let handle = thread::spawn(move || {
            debug!("status poller started, interval {:?}", interval);
            while thread_running.load(Ordering::SeqCst) {
                thread::sleep(interval);
                if !thread_running.load(Ordering::SeqCst) {
                    break;
                }
                supervisor.poll_tick();
            }
            debug!("status poller stopped");
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stop the poller and wait for its thread to finish
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
