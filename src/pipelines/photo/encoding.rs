// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot encoding and saving
//!
//! Snapshots are JPEG files named `{stem}_{YYYYmmdd_HHMMSS}.jpg`. When that
//! name is taken (several snapshots within one second) a numeric suffix is
//! appended: `{stem}_{timestamp}_1.jpg`, `_2`, ...

use crate::constants::SnapshotQuality;
use crate::constants::snapshot::{MAX_NAME_ATTEMPTS, TIMESTAMP_FORMAT};
use crate::errors::SnapshotError;
use image::RgbImage;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Encode an RGB image as JPEG
pub fn encode_jpeg(image: &RgbImage, quality: SnapshotQuality) -> Result<Vec<u8>, SnapshotError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.jpeg_quality());

    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| SnapshotError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

    debug!(size = buffer.len(), quality = quality.jpeg_quality(), "JPEG encoding complete");
    Ok(buffer)
}

/// Candidate file name for the `attempt`-th try (0 = no suffix)
pub fn snapshot_file_name(stem: &str, timestamp: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}_{}.jpg", stem, timestamp)
    } else {
        format!("{}_{}_{}.jpg", stem, timestamp, attempt)
    }
}

/// Write `data` to a new file in `dir` under a unique timestamped name
///
/// Existing files are never overwritten.
pub fn save_unique(dir: &Path, stem: &str, data: &[u8]) -> Result<PathBuf, SnapshotError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        SnapshotError::SaveFailed(format!("cannot create '{}': {}", dir.display(), e))
    })?;

    let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(snapshot_file_name(stem, &timestamp, attempt));
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(SnapshotError::SaveFailed(format!(
                    "cannot create '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        file.write_all(data).map_err(|e| {
            SnapshotError::SaveFailed(format!("cannot write '{}': {}", path.display(), e))
        })?;

        info!(path = %path.display(), bytes = data.len(), "Snapshot saved");
        return Ok(path);
    }

    Err(SnapshotError::SaveFailed(format!(
        "no free file name for '{}_{}' in '{}'",
        stem,
        timestamp,
        dir.display()
    )))
}
