// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! Only the capture-side surface the scanner needs lives here: the frame
//! model, the frame delivery loop, and lens focus control.
//!
//! ```text
//! ┌──────────────────────┐      frames       ┌──────────────────────┐
//! │  Capture source      │ ────────────────► │ FrameAnalysisPipeline│
//! │  (frame_loop)        │                   └──────────────────────┘
//! └──────────────────────┘
//! ┌──────────────────────┐   focus commands  ┌──────────────────────┐
//! │ AutoFocusController  │ ────────────────► │ FocusActuator        │
//! └──────────────────────┘                   │ (V4L2 / simulated)   │
//!                                            └──────────────────────┘
//! ```

pub mod focus;
pub mod frame_loop;
pub mod types;
pub mod v4l2_controls;
pub mod v4l2_focus;

pub use focus::{AutoFocusRange, FocusActuator, FocusMode, FocusSettings};
pub use frame_loop::{FrameLoopController, LoopAction};
pub use types::*;
pub use v4l2_focus::V4l2FocusActuator;
