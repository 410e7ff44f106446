// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! Software stand-ins for capture hardware: a file-backed frame stream and a
//! scripted focus actuator. Used by the CLI simulation and by tests.

mod file_source;
mod focus;

pub use file_source::{FileFrameSource, frame_from_rgba, load_image_as_frame};
pub use focus::{ActuatorStats, SimulatedFocusActuator};
