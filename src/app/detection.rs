// SPDX-License-Identifier: GPL-3.0-only

//! Shared barcode detection state
//!
//! Written by the frame analysis thread once per frame and read by the
//! autofocus driver every tick. Both fields live behind one mutex so a
//! reader never sees a found flag paired with a stale timestamp.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    barcode_found: bool,
    last_detection: Option<Instant>,
}

/// Consistent copy of the detection state at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionSnapshot {
    pub barcode_found: bool,
    pub last_detection: Option<Instant>,
}

/// Whether the last analyzed frame held a barcode, and when one was last seen
#[derive(Debug, Default)]
pub struct DetectionState {
    inner: Mutex<Inner>,
}

impl DetectionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the outcome of one analyzed frame
    ///
    /// Every positive result restarts the detection window. The timestamp
    /// never moves backwards, even if frames are recorded out of order.
    pub fn record_result(&self, found: bool, now: Instant) {
        let mut inner = self.lock();
        inner.barcode_found = found;
        if found {
            inner.last_detection = Some(match inner.last_detection {
                Some(previous) => previous.max(now),
                None => now,
            });
        }
    }

    /// Time since the last detection, `Duration::MAX` if there never was one
    pub fn elapsed_since_detection(&self, now: Instant) -> Duration {
        match self.lock().last_detection {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::MAX,
        }
    }

    /// Whether a focus sweep is due: nothing detected for longer than `threshold`
    pub fn should_sweep(&self, now: Instant, threshold: Duration) -> bool {
        self.elapsed_since_detection(now) > threshold
    }

    pub fn is_barcode_found(&self) -> bool {
        self.lock().barcode_found
    }

    pub fn last_detection(&self) -> Option<Instant> {
        self.lock().last_detection
    }

    pub fn snapshot(&self) -> DetectionSnapshot {
        let inner = self.lock();
        DetectionSnapshot {
            barcode_found: inner.barcode_found,
            last_detection: inner.last_detection,
        }
    }
}
