// SPDX-License-Identifier: GPL-3.0-only

//! Autofocus control for one capture session
//!
//! [`AutoFocusController`] negotiates a focus strategy with the actuator once
//! at start and then keeps the lens in focus:
//!
//! - `ContinuousNative`: the actuator tracks focus by itself after one command
//! - `SimulatedLoop`: a background driver issues single-shot sweeps each tick
//!   unless a barcode was detected recently
//! - `Disabled`: fixed-focus lens, nothing to do
//!
//! Autofocus never blocks frame analysis: failures are reported from
//! `start()` or logged by the driver, and the session carries on.

mod driver;

pub use driver::DriverTiming;

use crate::app::detection::DetectionState;
use crate::app::timing::{Clock, SystemClock};
use crate::backends::camera::focus::{AutoFocusRange, FocusActuator, FocusMode, FocusSettings};
use crate::config::FocusTimingSettings;
use crate::errors::FocusError;
use driver::FocusDriver;
use futures::FutureExt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle state of an [`AutoFocusController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoFocusState {
    Uninitialized,
    Negotiating,
    ContinuousNative,
    SimulatedLoop,
    Disabled,
    Disposed,
}

impl std::fmt::Display for AutoFocusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Negotiating => "negotiating",
            Self::ContinuousNative => "continuous (native)",
            Self::SimulatedLoop => "continuous (simulated)",
            Self::Disabled => "disabled",
            Self::Disposed => "disposed",
        };
        write!(f, "{}", name)
    }
}

/// Focus strategy chosen from actuator capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPlan {
    /// Configure and let the actuator focus continuously
    Native(FocusSettings),
    /// Configure for single sweeps and drive them from a loop
    Simulated(FocusSettings),
    /// No usable autofocus
    Disabled,
}

impl FocusPlan {
    /// Pick a strategy: range first (full, else normal), then mode
    /// (continuous, else single or auto)
    pub fn negotiate(modes: &[FocusMode], ranges: &[AutoFocusRange]) -> Self {
        let range = if ranges.contains(&AutoFocusRange::FullRange) {
            AutoFocusRange::FullRange
        } else if ranges.contains(&AutoFocusRange::Normal) {
            AutoFocusRange::Normal
        } else {
            return Self::Disabled;
        };

        let settings = |mode, wait_for_focus| FocusSettings {
            mode,
            range,
            wait_for_focus,
            disable_driver_fallback: false,
        };

        if modes.contains(&FocusMode::Continuous) {
            Self::Native(settings(FocusMode::Continuous, false))
        } else if modes.contains(&FocusMode::Single) {
            Self::Simulated(settings(FocusMode::Single, true))
        } else if modes.contains(&FocusMode::Auto) {
            Self::Simulated(settings(FocusMode::Auto, true))
        } else {
            Self::Disabled
        }
    }
}

struct Inner {
    state: AutoFocusState,
    /// Held here in the ContinuousNative and Disabled states; the driver
    /// thread owns it in SimulatedLoop
    actuator: Option<Box<dyn FocusActuator>>,
    driver: Option<FocusDriver>,
}

/// Start/stop lifecycle around a focus actuator
///
/// All methods take `&self` and may be called from any thread.
pub struct AutoFocusController {
    detection: Arc<DetectionState>,
    clock: Arc<dyn Clock>,
    timing: FocusTimingSettings,
    inner: Mutex<Inner>,
}

impl AutoFocusController {
    pub fn new(detection: Arc<DetectionState>, timing: FocusTimingSettings) -> Self {
        Self::with_clock(detection, timing, Arc::new(SystemClock))
    }

    /// Controller reading detection time from `clock`
    pub fn with_clock(
        detection: Arc<DetectionState>,
        timing: FocusTimingSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            detection,
            clock,
            timing,
            inner: Mutex::new(Inner {
                state: AutoFocusState::Uninitialized,
                actuator: None,
                driver: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn state(&self) -> AutoFocusState {
        self.lock().state
    }

    /// Whether the simulated-focus driver thread is alive
    pub fn is_loop_running(&self) -> bool {
        self.lock().driver.as_ref().is_some_and(FocusDriver::is_running)
    }

    pub fn detection(&self) -> &Arc<DetectionState> {
        &self.detection
    }

    /// Negotiate with the actuator and start focusing
    ///
    /// Takes ownership of the actuator for the rest of the session. In the
    /// simulated mode this blocks until the first sweep completes. A
    /// configuration failure leaves the controller `Disabled` and is returned
    /// to the caller; a fixed-focus actuator is not an error.
    pub fn start(&self, mut actuator: Box<dyn FocusActuator>) -> Result<AutoFocusState, FocusError> {
        {
            let mut inner = self.lock();
            if inner.state != AutoFocusState::Uninitialized {
                return Err(FocusError::InvalidState(format!(
                    "autofocus already {}",
                    inner.state
                )));
            }
            inner.state = AutoFocusState::Negotiating;
        }

        let modes = actuator.supported_focus_modes();
        let ranges = actuator.supported_focus_ranges();
        let plan = FocusPlan::negotiate(&modes, &ranges);
        debug!(actuator = actuator.name(), ?modes, ?ranges, ?plan, "Negotiated focus plan");

        let settings = match plan {
            FocusPlan::Native(settings) | FocusPlan::Simulated(settings) => settings,
            FocusPlan::Disabled => {
                info!(actuator = actuator.name(), "No usable autofocus, focus disabled");
                return Ok(self.finish(AutoFocusState::Disabled, Some(actuator)));
            }
        };

        if let Err(e) = actuator.configure(&settings) {
            warn!(actuator = actuator.name(), error = %e, "Autofocus configuration failed");
            self.finish(AutoFocusState::Disabled, None);
            return Err(e);
        }

        let Some(first) = self.issue(&mut *actuator) else {
            return Ok(AutoFocusState::Disposed);
        };

        match plan {
            FocusPlan::Simulated(_) => {
                // Settle the lens before the first frame
                if let Err(e) = pollster::block_on(first) {
                    warn!(actuator = actuator.name(), error = %e, "Initial focus failed");
                }
                Ok(self.spawn_driver(actuator))
            }
            _ => {
                match first.now_or_never() {
                    Some(Err(e)) => {
                        warn!(actuator = actuator.name(), error = %e, "Initial focus failed")
                    }
                    Some(Ok(())) => {}
                    None => debug!("Continuous focus command still running, not waiting"),
                }
                Ok(self.finish(AutoFocusState::ContinuousNative, Some(actuator)))
            }
        }
    }

    /// Start one focus command unless the controller was disposed meanwhile
    fn issue(
        &self,
        actuator: &mut dyn FocusActuator,
    ) -> Option<futures::future::BoxFuture<'static, Result<(), FocusError>>> {
        let inner = self.lock();
        if inner.state == AutoFocusState::Disposed {
            debug!("Disposed during negotiation, not issuing focus command");
            return None;
        }
        Some(actuator.start_focus())
    }

    /// Settle into `state` keeping `actuator`, unless disposal won the race
    fn finish(
        &self,
        state: AutoFocusState,
        actuator: Option<Box<dyn FocusActuator>>,
    ) -> AutoFocusState {
        let mut inner = self.lock();
        if inner.state == AutoFocusState::Disposed {
            return AutoFocusState::Disposed;
        }
        inner.state = state;
        inner.actuator = actuator;
        info!(state = %state, "Autofocus negotiation finished");
        state
    }

    fn spawn_driver(&self, actuator: Box<dyn FocusActuator>) -> AutoFocusState {
        let mut inner = self.lock();
        if inner.state == AutoFocusState::Disposed {
            return AutoFocusState::Disposed;
        }

        let timing = DriverTiming {
            tick: self.timing.tick(),
            detection_window: self.timing.detection_window(),
        };
        match FocusDriver::spawn(
            actuator,
            Arc::clone(&self.detection),
            Arc::clone(&self.clock),
            timing,
        ) {
            Ok(driver) => {
                inner.driver = Some(driver);
                inner.state = AutoFocusState::SimulatedLoop;
            }
            Err(e) => {
                warn!(error = %e, "Failed to spawn autofocus driver, focus disabled");
                inner.state = AutoFocusState::Disabled;
            }
        }
        info!(state = %inner.state, "Autofocus negotiation finished");
        inner.state
    }

    /// Stop autofocus and release the actuator
    ///
    /// Idempotent and safe before or during `start()`. Once this returns no
    /// new focus command is issued; a sweep already in flight may finish in
    /// the background and its result is discarded.
    pub fn stop(&self) {
        let (previous, driver, actuator) = {
            let mut inner = self.lock();
            if inner.state == AutoFocusState::Disposed {
                return;
            }
            let previous = inner.state;
            inner.state = AutoFocusState::Disposed;
            (previous, inner.driver.take(), inner.actuator.take())
        };

        if let Some(driver) = driver {
            driver.shutdown(self.stop_timeout());
        }
        drop(actuator);

        info!(previous = %previous, "Autofocus stopped");
    }

    fn stop_timeout(&self) -> Duration {
        self.timing.stop_timeout()
    }
}

impl Drop for AutoFocusController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::timing::ManualClock;
    use crate::backends::virtual_camera::SimulatedFocusActuator;
    use std::thread;

    fn fast_timing() -> FocusTimingSettings {
        FocusTimingSettings {
            tick_ms: 10,
            detection_window_ms: 1000,
            stop_timeout_ms: 1000,
        }
    }

    fn controller(clock: Arc<ManualClock>) -> AutoFocusController {
        AutoFocusController::with_clock(Arc::new(DetectionState::new()), fast_timing(), clock)
    }

    #[test]
    fn test_negotiate_prefers_full_range_continuous() {
        let plan = FocusPlan::negotiate(
            &[FocusMode::Single, FocusMode::Continuous],
            &[AutoFocusRange::Normal, AutoFocusRange::FullRange],
        );
        match plan {
            FocusPlan::Native(settings) => {
                assert_eq!(settings.range, AutoFocusRange::FullRange);
                assert!(!settings.wait_for_focus);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_negotiate_single_shot_simulates() {
        let plan = FocusPlan::negotiate(&[FocusMode::Auto], &[AutoFocusRange::Normal]);
        match plan {
            FocusPlan::Simulated(settings) => {
                assert_eq!(settings.mode, FocusMode::Auto);
                assert!(settings.wait_for_focus);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_negotiate_without_range_disables() {
        assert_eq!(
            FocusPlan::negotiate(&[FocusMode::Continuous], &[AutoFocusRange::Macro]),
            FocusPlan::Disabled
        );
        assert_eq!(
            FocusPlan::negotiate(&[FocusMode::Manual], &[AutoFocusRange::Normal]),
            FocusPlan::Disabled
        );
    }

    #[test]
    fn test_fixed_focus_is_disabled_without_loop() {
        let controller = controller(Arc::new(ManualClock::new()));
        let actuator = SimulatedFocusActuator::fixed();
        let stats = actuator.stats();

        assert_eq!(controller.start(Box::new(actuator)), Ok(AutoFocusState::Disabled));
        assert!(!controller.is_loop_running());
        assert_eq!(stats.focus_commands(), 0);

        controller.stop();
        assert_eq!(stats.releases(), 1);
    }

    #[test]
    fn test_native_continuous_issues_one_command() {
        let controller = controller(Arc::new(ManualClock::new()));
        let actuator = SimulatedFocusActuator::continuous();
        let stats = actuator.stats();

        assert_eq!(
            controller.start(Box::new(actuator)),
            Ok(AutoFocusState::ContinuousNative)
        );
        thread::sleep(Duration::from_millis(50));

        assert!(!controller.is_loop_running());
        assert_eq!(stats.focus_commands(), 1);
    }

    /// Continuous-focus actuator whose commands never report completion
    struct NeverSettles;

    impl FocusActuator for NeverSettles {
        fn name(&self) -> &str {
            "never-settles"
        }

        fn supported_focus_modes(&self) -> Vec<FocusMode> {
            vec![FocusMode::Continuous]
        }

        fn supported_focus_ranges(&self) -> Vec<AutoFocusRange> {
            vec![AutoFocusRange::FullRange]
        }

        fn configure(&mut self, _settings: &FocusSettings) -> Result<(), FocusError> {
            Ok(())
        }

        fn start_focus(&mut self) -> futures::future::BoxFuture<'static, Result<(), FocusError>> {
            futures::future::pending().boxed()
        }
    }

    #[test]
    fn test_native_continuous_does_not_wait_for_command() {
        let (tx, rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let controller = controller(Arc::new(ManualClock::new()));
            let _ = tx.send(controller.start(Box::new(NeverSettles)));
        });

        let result = rx.recv_timeout(Duration::from_secs(2));
        assert_eq!(result, Ok(Ok(AutoFocusState::ContinuousNative)));
    }

    #[test]
    fn test_configuration_failure_is_reported() {
        let controller = controller(Arc::new(ManualClock::new()));
        let actuator = SimulatedFocusActuator::single_shot().with_rejected_configuration();
        let stats = actuator.stats();

        let result = controller.start(Box::new(actuator));
        assert!(matches!(result, Err(FocusError::ConfigurationFailed(_))));
        assert_eq!(controller.state(), AutoFocusState::Disabled);
        assert_eq!(stats.releases(), 1);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let controller = controller(Arc::new(ManualClock::new()));
        controller
            .start(Box::new(SimulatedFocusActuator::fixed()))
            .unwrap();
        let second = controller.start(Box::new(SimulatedFocusActuator::fixed()));
        assert!(matches!(second, Err(FocusError::InvalidState(_))));
    }

    #[test]
    fn test_simulated_loop_sweeps_and_stops_cleanly() {
        let controller = controller(Arc::new(ManualClock::new()));
        let actuator = SimulatedFocusActuator::single_shot().with_sweep_duration(Duration::ZERO);
        let stats = actuator.stats();

        assert_eq!(
            controller.start(Box::new(actuator)),
            Ok(AutoFocusState::SimulatedLoop)
        );
        assert!(controller.is_loop_running());

        thread::sleep(Duration::from_millis(100));
        controller.stop();
        let issued = stats.focus_commands();
        assert!(issued >= 2, "expected initial focus plus sweeps, got {}", issued);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(stats.focus_commands(), issued);
        assert_eq!(stats.releases(), 1);
        assert_eq!(controller.state(), AutoFocusState::Disposed);
    }

    #[test]
    fn test_recent_detection_suppresses_sweeps() {
        let clock = Arc::new(ManualClock::new());
        let controller = controller(Arc::clone(&clock));
        controller.detection().record_result(true, clock.now());

        let actuator = SimulatedFocusActuator::single_shot().with_sweep_duration(Duration::ZERO);
        let stats = actuator.stats();
        controller.start(Box::new(actuator)).unwrap();

        // Only the initial focus while the detection is fresh
        thread::sleep(Duration::from_millis(80));
        assert_eq!(stats.focus_commands(), 1);

        clock.advance(Duration::from_millis(1100));
        thread::sleep(Duration::from_millis(80));
        assert!(stats.focus_commands() > 1);

        controller.stop();
    }

    #[test]
    fn test_sweep_failures_are_swallowed() {
        let controller = controller(Arc::new(ManualClock::new()));
        let actuator = SimulatedFocusActuator::single_shot()
            .with_sweep_duration(Duration::ZERO)
            .with_failing_sweeps();
        let stats = actuator.stats();

        controller.start(Box::new(actuator)).unwrap();
        thread::sleep(Duration::from_millis(80));

        assert!(controller.is_loop_running());
        assert!(stats.focus_commands() >= 2);
        controller.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let controller = controller(Arc::new(ManualClock::new()));
        let actuator = SimulatedFocusActuator::single_shot().with_sweep_duration(Duration::ZERO);
        let stats = actuator.stats();
        controller.start(Box::new(actuator)).unwrap();

        controller.stop();
        controller.stop();
        drop(controller);

        assert_eq!(stats.releases(), 1);
    }

    #[test]
    fn test_stop_before_start() {
        let controller = controller(Arc::new(ManualClock::new()));
        controller.stop();
        assert_eq!(controller.state(), AutoFocusState::Disposed);

        let actuator = SimulatedFocusActuator::continuous();
        let stats = actuator.stats();
        assert!(controller.start(Box::new(actuator)).is_err());
        assert_eq!(stats.releases(), 1);
        assert_eq!(stats.focus_commands(), 0);
    }

    #[test]
    fn test_stop_during_initial_focus_releases_actuator() {
        let controller = Arc::new(controller(Arc::new(ManualClock::new())));
        let actuator =
            SimulatedFocusActuator::single_shot().with_sweep_duration(Duration::from_millis(150));
        let stats = actuator.stats();

        let starter = {
            let controller = Arc::clone(&controller);
            thread::spawn(move || controller.start(Box::new(actuator)))
        };

        // Wait for the initial sweep to be in flight
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while stats.focus_commands() == 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        controller.stop();

        assert_eq!(starter.join().unwrap(), Ok(AutoFocusState::Disposed));
        assert!(!controller.is_loop_running());
        assert_eq!(stats.focus_commands(), 1);
        assert_eq!(stats.releases(), 1);
    }

    #[test]
    fn test_stop_mid_sweep_detaches_driver() {
        let timing = FocusTimingSettings {
            tick_ms: 10,
            detection_window_ms: 1000,
            stop_timeout_ms: 250,
        };
        let controller =
            AutoFocusController::with_clock(Arc::new(DetectionState::new()), timing, Arc::new(ManualClock::new()));
        let actuator =
            SimulatedFocusActuator::single_shot().with_sweep_duration(Duration::from_millis(800));
        let stats = actuator.stats();

        assert_eq!(
            controller.start(Box::new(actuator)),
            Ok(AutoFocusState::SimulatedLoop)
        );

        // First loop sweep is in flight
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while stats.focus_commands() < 2 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(stats.focus_commands(), 2);

        let stopping = std::time::Instant::now();
        controller.stop();
        assert!(stopping.elapsed() < Duration::from_millis(500));
        assert_eq!(controller.state(), AutoFocusState::Disposed);

        // The detached driver drops the actuator once the sweep finishes
        let deadline = std::time::Instant::now() + Duration::from_secs(3);
        while stats.releases() == 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(stats.releases(), 1);

        thread::sleep(Duration::from_millis(100));
        assert_eq!(stats.focus_commands(), 2);
    }
}
