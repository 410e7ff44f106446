// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// JPEG quality presets for snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapshotQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression, default)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl SnapshotQuality {
    /// Get all preset variants, lowest quality first
    pub const ALL: [SnapshotQuality; 4] = [
        SnapshotQuality::Low,
        SnapshotQuality::Medium,
        SnapshotQuality::High,
        SnapshotQuality::Maximum,
    ];

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            SnapshotQuality::Low => "Low",
            SnapshotQuality::Medium => "Medium",
            SnapshotQuality::High => "High",
            SnapshotQuality::Maximum => "Maximum",
        }
    }

    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            SnapshotQuality::Low => 60,
            SnapshotQuality::Medium => 80,
            SnapshotQuality::High => 92,
            SnapshotQuality::Maximum => 98,
        }
    }
}

/// Decoder constants
pub mod decoder {
    /// Longest frame edge analyzed without downscaling.
    /// QR codes held up to a preview camera are large enough to survive this.
    pub const DEFAULT_MAX_DIMENSION: u32 = 640;

    /// Rec.601 luma weights in 8.8 fixed point (R, G, B)
    pub const LUMA_WEIGHTS: (u32, u32, u32) = (77, 150, 29);
}

/// Autofocus timing constants
pub mod focus {
    use super::Duration;

    /// Interval between driver loop ticks in simulated continuous mode
    pub const SWEEP_TICK: Duration = Duration::from_millis(1000);

    /// Sweeps are suppressed for this long after a detection
    pub const DETECTION_WINDOW: Duration = Duration::from_millis(1000);

    /// How long `stop()` waits for the driver thread before detaching it
    pub const STOP_TIMEOUT: Duration = Duration::from_millis(250);

    /// Upper bound on a single V4L2 focus sweep
    pub const V4L2_SWEEP_TIMEOUT: Duration = Duration::from_secs(3);

    /// Poll interval while waiting on V4L2 focus status
    pub const V4L2_STATUS_POLL_INTERVAL: Duration = Duration::from_millis(30);
}

/// Presentation constants
pub mod presentation {
    /// Status line shown when the analyzed frame had no barcode
    pub const NO_BARCODE_TEXT: &str = "No barcode";

    /// Prefix for the status line shown when autofocus could not start
    pub const FOCUS_START_FAILED_PREFIX: &str = "Failed to start autofocus";
}

/// Snapshot naming constants
pub mod snapshot {
    /// Default file stem for snapshots
    pub const DEFAULT_FILE_STEM: &str = "QrCodeSnap";

    /// Timestamp format appended to the file stem
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Give up looking for a free file name after this many suffixes
    pub const MAX_NAME_ATTEMPTS: u32 = 1000;
}

/// Supported file formats for the virtual camera file source
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Virtual camera timing constants
pub mod virtual_camera {
    use super::Duration;

    /// Frame interval for image streaming (~5fps, a typical analysis rate)
    pub const IMAGE_STREAM_FRAME_DURATION: Duration = Duration::from_millis(200);

    /// Default latency of a simulated focus sweep
    pub const SIMULATED_SWEEP_DURATION: Duration = Duration::from_millis(150);
}
