// SPDX-License-Identifier: GPL-3.0-only

//! Simulated focus actuator
//!
//! Stands in for a lens when no focus hardware is attached: capabilities,
//! sweep latency and failures are all configurable, and every interaction is
//! counted so callers can observe what the autofocus controller did.

use crate::backends::camera::focus::{AutoFocusRange, FocusActuator, FocusMode, FocusSettings};
use crate::constants::virtual_camera::SIMULATED_SWEEP_DURATION;
use crate::errors::FocusError;
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

/// Counters shared between a simulated actuator and its observers
#[derive(Debug, Default)]
pub struct ActuatorStats {
    configure_calls: AtomicUsize,
    focus_commands: AtomicUsize,
    releases: AtomicUsize,
    last_settings: std::sync::Mutex<Option<FocusSettings>>,
}

impl ActuatorStats {
    /// Number of `configure` calls
    pub fn configure_calls(&self) -> usize {
        self.configure_calls.load(Ordering::SeqCst)
    }

    /// Number of focus commands started
    pub fn focus_commands(&self) -> usize {
        self.focus_commands.load(Ordering::SeqCst)
    }

    /// Number of times the actuator handle was released (dropped)
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Settings applied by the most recent successful `configure`
    pub fn last_settings(&self) -> Option<FocusSettings> {
        *self
            .last_settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A focus actuator with scripted behavior
pub struct SimulatedFocusActuator {
    modes: Vec<FocusMode>,
    ranges: Vec<AutoFocusRange>,
    sweep_duration: Duration,
    fail_sweeps: Arc<AtomicBool>,
    reject_configuration: bool,
    stats: Arc<ActuatorStats>,
    settings: Option<FocusSettings>,
}

impl SimulatedFocusActuator {
    /// Actuator with native continuous focus over the full range
    pub fn continuous() -> Self {
        Self::with_capabilities(
            vec![FocusMode::Continuous, FocusMode::Single],
            vec![AutoFocusRange::FullRange, AutoFocusRange::Normal],
        )
    }

    /// Actuator that can only run single sweeps
    pub fn single_shot() -> Self {
        Self::with_capabilities(vec![FocusMode::Single], vec![AutoFocusRange::Normal])
    }

    /// Fixed-focus lens
    pub fn fixed() -> Self {
        Self::with_capabilities(Vec::new(), Vec::new())
    }

    pub fn with_capabilities(modes: Vec<FocusMode>, ranges: Vec<AutoFocusRange>) -> Self {
        Self {
            modes,
            ranges,
            sweep_duration: SIMULATED_SWEEP_DURATION,
            fail_sweeps: Arc::new(AtomicBool::new(false)),
            reject_configuration: false,
            stats: Arc::new(ActuatorStats::default()),
            settings: None,
        }
    }

    /// Time each waited-for sweep takes to complete
    pub fn with_sweep_duration(mut self, duration: Duration) -> Self {
        self.sweep_duration = duration;
        self
    }

    /// Make every sweep report failure (e.g. a scene without texture)
    pub fn with_failing_sweeps(self) -> Self {
        self.fail_sweeps.store(true, Ordering::SeqCst);
        self
    }

    /// Make `configure` fail
    pub fn with_rejected_configuration(mut self) -> Self {
        self.reject_configuration = true;
        self
    }

    /// Shared counters, valid after the actuator has been moved away
    pub fn stats(&self) -> Arc<ActuatorStats> {
        Arc::clone(&self.stats)
    }

    /// Switch sweep failure on or off while the actuator is in use
    pub fn failure_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fail_sweeps)
    }
}

impl FocusActuator for SimulatedFocusActuator {
    fn name(&self) -> &str {
        "simulated"
    }

    fn supported_focus_modes(&self) -> Vec<FocusMode> {
        self.modes.clone()
    }

    fn supported_focus_ranges(&self) -> Vec<AutoFocusRange> {
        self.ranges.clone()
    }

    fn configure(&mut self, settings: &FocusSettings) -> Result<(), FocusError> {
        self.stats.configure_calls.fetch_add(1, Ordering::SeqCst);

        if self.reject_configuration {
            return Err(FocusError::ConfigurationFailed(
                "simulated actuator rejected settings".into(),
            ));
        }
        if !self.modes.contains(&settings.mode) || !self.ranges.contains(&settings.range) {
            return Err(FocusError::ConfigurationFailed(format!(
                "unsupported mode {:?} / range {:?}",
                settings.mode, settings.range
            )));
        }

        debug!(?settings, "Simulated actuator configured");
        self.settings = Some(*settings);
        *self
            .stats
            .last_settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(*settings);
        Ok(())
    }

    fn start_focus(&mut self) -> BoxFuture<'static, Result<(), FocusError>> {
        let Some(settings) = self.settings else {
            return futures::future::ready(Err(FocusError::InvalidState(
                "actuator not configured".into(),
            )))
            .boxed();
        };

        let command = self.stats.focus_commands.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(command, "Simulated focus command");

        let outcome = if self.fail_sweeps.load(Ordering::SeqCst) {
            Err(FocusError::FocusFailed("not enough texture".into()))
        } else {
            Ok(())
        };

        if !settings.wait_for_focus || self.sweep_duration.is_zero() {
            return futures::future::ready(outcome).boxed();
        }

        // Complete from another thread, like a driver interrupt would
        let (tx, rx) = oneshot::channel();
        let duration = self.sweep_duration;
        let spawned = thread::Builder::new()
            .name("simulated-focus".into())
            .spawn(move || {
                thread::sleep(duration);
                let _ = tx.send(outcome);
            });

        match spawned {
            Ok(_) => async move { rx.await.unwrap_or(Err(FocusError::Cancelled)) }.boxed(),
            Err(e) => futures::future::ready(Err(FocusError::Device(e.to_string()))).boxed(),
        }
    }
}

impl Drop for SimulatedFocusActuator {
    fn drop(&mut self) {
        self.stats.releases.fetch_add(1, Ordering::SeqCst);
    }
}
