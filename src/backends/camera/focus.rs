// SPDX-License-Identifier: GPL-3.0-only

//! Focus actuator abstraction
//!
//! A [`FocusActuator`] is the lens-control handle of one capture session.
//! The autofocus controller owns it exclusively and only ever touches it from
//! one thread at a time, so implementations need `Send` but not `Sync`.

use crate::errors::FocusError;
use futures::future::BoxFuture;

/// Autofocus mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusMode {
    /// Autofocus disabled
    Manual,
    /// Driver-chosen automatic focus preset
    Auto,
    /// Single-shot autofocus, one sweep per command
    Single,
    /// Continuous autofocus, the actuator tracks focus by itself
    Continuous,
}

/// Autofocus search range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoFocusRange {
    /// Whole lens travel
    FullRange,
    /// Normal range (excludes macro)
    Normal,
    /// Close-up range only
    Macro,
    /// Infinity only
    Infinity,
}

/// Settings applied to an actuator before focus commands are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusSettings {
    pub mode: FocusMode,
    pub range: AutoFocusRange,
    /// Whether a focus command completes only once focus has settled
    pub wait_for_focus: bool,
    /// Forbid the driver from substituting a different mode
    pub disable_driver_fallback: bool,
}

/// Lens focus control of a capture device
pub trait FocusActuator: Send {
    /// Human readable name for logging
    fn name(&self) -> &str;

    /// Focus modes the device supports
    fn supported_focus_modes(&self) -> Vec<FocusMode>;

    /// Focus ranges the device supports
    fn supported_focus_ranges(&self) -> Vec<AutoFocusRange>;

    /// Apply focus settings
    fn configure(&mut self, settings: &FocusSettings) -> Result<(), FocusError>;

    /// Start one focus operation using the configured settings
    ///
    /// The command is sent to the device by this call. The returned future
    /// only reports the outcome: it resolves when the operation completes
    /// (or, when configured without `wait_for_focus`, as soon as it was
    /// accepted), and dropping it does not cancel the operation.
    fn start_focus(&mut self) -> BoxFuture<'static, Result<(), FocusError>>;
}
