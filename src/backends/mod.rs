// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for frame capture and focus control
//!
//! # Modules
//!
//! - [`camera`]: Frame model, frame delivery loop, V4L2 focus control
//! - [`virtual_camera`]: File-backed frame source and simulated focus actuator

pub mod camera;
pub mod virtual_camera;
