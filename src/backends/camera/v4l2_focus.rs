// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 focus actuator
//!
//! Maps [`FocusActuator`] onto the camera-class focus controls:
//! `FOCUS_AUTO` for continuous focus, `AUTO_FOCUS_START` plus a poll of
//! `AUTO_FOCUS_STATUS` for single sweeps. Sweep completion is polled on a
//! helper thread and reported through a oneshot channel so the returned
//! future does not block whoever polls it.

use super::focus::{AutoFocusRange, FocusActuator, FocusMode, FocusSettings};
use super::v4l2_controls::{self, *};
use crate::constants::focus as focus_timing;
use crate::errors::FocusError;
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Focus actuator backed by a V4L2 device node
pub struct V4l2FocusActuator {
    device_path: String,
    settings: Option<FocusSettings>,
}

impl V4l2FocusActuator {
    /// Create an actuator for a device path (e.g. `/dev/video0`)
    pub fn new(device_path: &str) -> Self {
        info!(device_path, "Creating V4L2 focus actuator");
        Self {
            device_path: device_path.to_string(),
            settings: None,
        }
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

fn range_to_menu(range: AutoFocusRange) -> i32 {
    match range {
        AutoFocusRange::FullRange => V4L2_AUTO_FOCUS_RANGE_AUTO,
        AutoFocusRange::Normal => V4L2_AUTO_FOCUS_RANGE_NORMAL,
        AutoFocusRange::Macro => V4L2_AUTO_FOCUS_RANGE_MACRO,
        AutoFocusRange::Infinity => V4L2_AUTO_FOCUS_RANGE_INFINITY,
    }
}

fn menu_to_range(index: i32) -> Option<AutoFocusRange> {
    match index {
        V4L2_AUTO_FOCUS_RANGE_AUTO => Some(AutoFocusRange::FullRange),
        V4L2_AUTO_FOCUS_RANGE_NORMAL => Some(AutoFocusRange::Normal),
        V4L2_AUTO_FOCUS_RANGE_MACRO => Some(AutoFocusRange::Macro),
        V4L2_AUTO_FOCUS_RANGE_INFINITY => Some(AutoFocusRange::Infinity),
        _ => None,
    }
}

/// Poll the focus status control until the sweep settles
fn wait_for_sweep(device_path: &str) -> Result<(), FocusError> {
    let deadline = Instant::now() + focus_timing::V4L2_SWEEP_TIMEOUT;

    loop {
        let status =
            v4l2_controls::get_control(device_path, V4L2_CID_AUTO_FOCUS_STATUS)
                .map_err(FocusError::Device)?;

        if status & V4L2_AUTO_FOCUS_STATUS_FAILED != 0 {
            return Err(FocusError::FocusFailed("driver reported focus failure".into()));
        }
        if status & V4L2_AUTO_FOCUS_STATUS_BUSY == 0 {
            if status & V4L2_AUTO_FOCUS_STATUS_REACHED == 0 {
                debug!(device_path, status, "Sweep ended without reaching focus");
            }
            return Ok(());
        }
        if Instant::now() >= deadline {
            let _ = v4l2_controls::set_control(device_path, V4L2_CID_AUTO_FOCUS_STOP, 1);
            return Err(FocusError::FocusFailed("focus sweep timed out".into()));
        }

        thread::sleep(focus_timing::V4L2_STATUS_POLL_INTERVAL);
    }
}

impl FocusActuator for V4l2FocusActuator {
    fn name(&self) -> &str {
        &self.device_path
    }

    fn supported_focus_modes(&self) -> Vec<FocusMode> {
        let mut modes = Vec::new();
        if v4l2_controls::has_control(&self.device_path, V4L2_CID_FOCUS_AUTO) {
            modes.push(FocusMode::Continuous);
        }
        if v4l2_controls::has_control(&self.device_path, V4L2_CID_AUTO_FOCUS_START) {
            modes.push(FocusMode::Single);
        }
        if v4l2_controls::has_control(&self.device_path, V4L2_CID_FOCUS_ABSOLUTE) {
            modes.push(FocusMode::Manual);
        }
        modes
    }

    fn supported_focus_ranges(&self) -> Vec<AutoFocusRange> {
        match v4l2_controls::query_control(&self.device_path, V4L2_CID_AUTO_FOCUS_RANGE) {
            Some(info) if !info.is_disabled() => v4l2_controls::menu_indices(
                &self.device_path,
                V4L2_CID_AUTO_FOCUS_RANGE,
                info.maximum,
            )
            .into_iter()
            .filter_map(menu_to_range)
            .collect(),
            // Devices without a range control search their whole travel
            _ if !self.supported_focus_modes().is_empty() => vec![AutoFocusRange::FullRange],
            _ => Vec::new(),
        }
    }

    fn configure(&mut self, settings: &FocusSettings) -> Result<(), FocusError> {
        let path = self.device_path.as_str();

        if v4l2_controls::has_control(path, V4L2_CID_AUTO_FOCUS_RANGE) {
            v4l2_controls::set_control(path, V4L2_CID_AUTO_FOCUS_RANGE, range_to_menu(settings.range))
                .map_err(FocusError::ConfigurationFailed)?;
        }

        match settings.mode {
            FocusMode::Continuous => {
                v4l2_controls::set_control(path, V4L2_CID_FOCUS_AUTO, 1)
                    .map_err(FocusError::ConfigurationFailed)?;
            }
            FocusMode::Single | FocusMode::Auto
                if !v4l2_controls::has_control(path, V4L2_CID_AUTO_FOCUS_START) =>
            {
                return Err(FocusError::NotSupported);
            }
            FocusMode::Single | FocusMode::Auto | FocusMode::Manual => {
                // Continuous focus must be off for AUTO_FOCUS_START to take effect
                if v4l2_controls::has_control(path, V4L2_CID_FOCUS_AUTO) {
                    v4l2_controls::set_control(path, V4L2_CID_FOCUS_AUTO, 0)
                        .map_err(FocusError::ConfigurationFailed)?;
                }
            }
        }

        debug!(device_path = path, ?settings, "Configured V4L2 focus");
        self.settings = Some(*settings);
        Ok(())
    }

    fn start_focus(&mut self) -> BoxFuture<'static, Result<(), FocusError>> {
        let Some(settings) = self.settings else {
            return futures::future::ready(Err(FocusError::InvalidState(
                "actuator not configured".into(),
            )))
            .boxed();
        };

        // Continuous mode tracks focus by itself; nothing to trigger.
        if settings.mode == FocusMode::Continuous {
            return futures::future::ready(Ok(())).boxed();
        }

        if let Err(e) =
            v4l2_controls::set_control(&self.device_path, V4L2_CID_AUTO_FOCUS_START, 1)
        {
            return futures::future::ready(Err(FocusError::Device(e))).boxed();
        }

        if !settings.wait_for_focus {
            return futures::future::ready(Ok(())).boxed();
        }

        let (tx, rx) = oneshot::channel();
        let device_path = self.device_path.clone();
        let spawned = thread::Builder::new()
            .name("v4l2-focus-wait".into())
            .spawn(move || {
                let _ = tx.send(wait_for_sweep(&device_path));
            });

        if let Err(e) = spawned {
            warn!(error = %e, "Failed to spawn focus wait thread");
            return futures::future::ready(Err(FocusError::Device(e.to_string()))).boxed();
        }

        async move { rx.await.unwrap_or(Err(FocusError::Cancelled)) }.boxed()
    }
}
