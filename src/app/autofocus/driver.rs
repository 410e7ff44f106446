// SPDX-License-Identifier: GPL-3.0-only

//! Background driver for simulated continuous autofocus
//!
//! Wakes once per tick and, unless a barcode was seen within the detection
//! window, runs one single-shot sweep on the actuator. The actuator lives on
//! the driver thread for the whole loop and is dropped when the thread exits.

use crate::app::detection::DetectionState;
use crate::app::timing::Clock;
use crate::backends::camera::focus::FocusActuator;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Cancellation token shared between the controller and the driver thread
#[derive(Debug, Default)]
struct CancelToken {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancelToken {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.cancelled.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn cancel(&self) {
        *self.lock() = true;
        self.wake.notify_all();
    }

    fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Sleep for `tick` unless cancelled first; returns true when cancelled
    fn wait(&self, tick: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .wake
            .wait_timeout_while(guard, tick, |cancelled| !*cancelled)
            .unwrap_or_else(|p| p.into_inner());
        *guard
    }
}

/// Timing of the driver loop
#[derive(Debug, Clone, Copy)]
pub struct DriverTiming {
    pub tick: Duration,
    pub detection_window: Duration,
}

/// Handle to a running driver thread
pub struct FocusDriver {
    token: Arc<CancelToken>,
    handle: Option<JoinHandle<()>>,
    done: mpsc::Receiver<()>,
}

impl FocusDriver {
    /// Spawn the driver loop, handing it exclusive ownership of the actuator
    pub fn spawn(
        mut actuator: Box<dyn FocusActuator>,
        detection: Arc<DetectionState>,
        clock: Arc<dyn Clock>,
        timing: DriverTiming,
    ) -> std::io::Result<Self> {
        let token = Arc::new(CancelToken::default());
        let thread_token = Arc::clone(&token);
        let (done_tx, done) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("autofocus-driver".into())
            .spawn(move || {
                info!(
                    actuator = actuator.name(),
                    tick_ms = timing.tick.as_millis(),
                    "Autofocus driver started"
                );
                let mut sweeps = 0u64;

                loop {
                    if thread_token.wait(timing.tick) {
                        break;
                    }

                    if !detection.should_sweep(clock.now(), timing.detection_window) {
                        trace!("Barcode seen recently, skipping sweep");
                        continue;
                    }

                    // Issue under the token lock so cancellation cannot slip in
                    // between the check and the command
                    let sweep = {
                        let cancelled = thread_token.lock();
                        if *cancelled {
                            break;
                        }
                        actuator.start_focus()
                    };
                    sweeps += 1;

                    let result = pollster::block_on(sweep);
                    if thread_token.is_cancelled() {
                        debug!(sweep = sweeps, "Driver cancelled during sweep, discarding result");
                        break;
                    }

                    match result {
                        Ok(()) => trace!(sweep = sweeps, "Focus sweep complete"),
                        Err(e) => warn!(sweep = sweeps, error = %e, "Focus sweep failed"),
                    }
                }

                drop(actuator);
                info!(sweeps, "Autofocus driver exiting");
                let _ = done_tx.send(());
            })?;

        Ok(Self {
            token,
            handle: Some(handle),
            done,
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the loop and wait up to `timeout` for it to exit
    ///
    /// A sweep still in flight after `timeout` keeps the thread alive; it is
    /// detached and exits on its own once the sweep completes. Returns true
    /// if the thread was joined.
    pub fn shutdown(mut self, timeout: Duration) -> bool {
        self.token.cancel();

        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(handle) = self.handle.take() {
                    if handle.join().is_err() {
                        warn!("Autofocus driver thread panicked");
                    }
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    timeout_ms = timeout.as_millis(),
                    "Autofocus driver busy with a sweep, detaching"
                );
                self.handle.take();
                false
            }
        }
    }
}

impl Drop for FocusDriver {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
