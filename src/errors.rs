// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner
//!
//! Errors are split by the component that raises them. Per-frame and
//! per-tick errors ([`DecodeError`], [`SnapshotError`], sweep failures) are
//! contained by the component that hits them; only session setup errors
//! travel up to the caller.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Frame decoding errors
    Decode(DecodeError),
    /// Focus actuator errors
    Focus(FocusError),
    /// Snapshot capture errors
    Snapshot(SnapshotError),
    /// Configuration errors
    Config(String),
    /// Frame source errors (file loading, unsupported input)
    Source(String),
    /// Generic error with message
    Other(String),
}

/// Errors raised by the frame decoder
///
/// "No barcode in this frame" is not an error; these only describe frames
/// that violate the decoder's input contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer is shorter than `height * stride`
    BufferTooSmall { required: usize, actual: usize },
    /// Width or height is zero
    InvalidDimensions { width: u32, height: u32 },
    /// Stride is shorter than one row of pixels
    InvalidStride { stride: u32, min_stride: u32 },
    /// The decoding library panicked on this frame
    DecoderPanicked(String),
}

/// Focus actuator errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusError {
    /// Actuator rejected the requested focus settings
    ConfigurationFailed(String),
    /// A focus command did not converge (e.g. low-texture scene)
    FocusFailed(String),
    /// Actuator has no usable focus capability
    NotSupported,
    /// Operation not valid in the controller's current state
    InvalidState(String),
    /// Focus command abandoned because the controller was disposed
    Cancelled,
    /// Device-level I/O failure
    Device(String),
}

/// Snapshot capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Encoding failed
    EncodingFailed(String),
    /// Save failed
    SaveFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Decode(e) => write!(f, "Decode error: {}", e),
            AppError::Focus(e) => write!(f, "Focus error: {}", e),
            AppError::Snapshot(e) => write!(f, "Snapshot error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Source(msg) => write!(f, "Frame source error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::BufferTooSmall { required, actual } => write!(
                f,
                "Buffer too small: {} bytes required, {} provided",
                required, actual
            ),
            DecodeError::InvalidDimensions { width, height } => {
                write!(f, "Invalid frame dimensions: {}x{}", width, height)
            }
            DecodeError::InvalidStride { stride, min_stride } => write!(
                f,
                "Invalid stride: {} bytes, at least {} required",
                stride, min_stride
            ),
            DecodeError::DecoderPanicked(msg) => write!(f, "Decoder panicked: {}", msg),
        }
    }
}

impl fmt::Display for FocusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusError::ConfigurationFailed(msg) => {
                write!(f, "Focus configuration failed: {}", msg)
            }
            FocusError::FocusFailed(msg) => write!(f, "Focus failed: {}", msg),
            FocusError::NotSupported => write!(f, "Focus control not supported"),
            FocusError::InvalidState(msg) => write!(f, "Invalid autofocus state: {}", msg),
            FocusError::Cancelled => write!(f, "Focus command cancelled"),
            FocusError::Device(msg) => write!(f, "Focus device error: {}", msg),
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            SnapshotError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for FocusError {}
impl std::error::Error for SnapshotError {}

// Conversions from sub-errors to AppError
impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err)
    }
}

impl From<FocusError> for AppError {
    fn from(err: FocusError) -> Self {
        AppError::Focus(err)
    }
}

impl From<SnapshotError> for AppError {
    fn from(err: SnapshotError) -> Self {
        AppError::Snapshot(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Source(err.to_string())
    }
}
