// SPDX-License-Identifier: GPL-3.0-only

//! Presentation and observability collaborators
//!
//! The analysis pipeline runs on the capture thread and never touches the UI
//! directly. It hands results to a [`Presenter`], which is fire-and-forget
//! and marshals to the UI context itself, and reports decode markers to a
//! [`DecodeObserver`].

use crate::constants::presentation::NO_BARCODE_TEXT;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

/// Receiver of per-frame results, callable from any thread
pub trait Presenter: Send + Sync {
    /// A barcode was decoded; `outline` is in display space
    fn show_result(&self, text: String, outline: Vec<(f64, f64)>);

    /// Status without a barcode (no detection, or a setup failure message)
    fn show_no_result(&self, text: String);
}

/// Receiver of decode start/stop markers
pub trait DecodeObserver: Send + Sync {
    fn decode_start(&self);
    fn decode_stop(&self, found: bool);
}

/// One update dispatched to the UI context
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationUpdate {
    Result { text: String, outline: Vec<(f64, f64)> },
    NoResult { text: String },
}

impl PresentationUpdate {
    pub fn text(&self) -> &str {
        match self {
            Self::Result { text, .. } | Self::NoResult { text } => text,
        }
    }
}

/// Status line for a decoded frame: `[  42ms] payload`
pub fn result_line(elapsed: Duration, text: &str) -> String {
    format!("[{:>4}ms] {}", elapsed.as_millis(), text)
}

/// Status line for a frame without a barcode
pub fn no_result_line(elapsed: Duration) -> String {
    result_line(elapsed, NO_BARCODE_TEXT)
}

/// Presenter that forwards updates over a tokio channel
///
/// The receiving end is drained by whatever task owns the UI.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    sender: mpsc::UnboundedSender<PresentationUpdate>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PresentationUpdate>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, update: PresentationUpdate) {
        if self.sender.send(update).is_err() {
            debug!("Presentation receiver dropped, update discarded");
        }
    }
}

impl Presenter for ChannelPresenter {
    fn show_result(&self, text: String, outline: Vec<(f64, f64)>) {
        self.send(PresentationUpdate::Result { text, outline });
    }

    fn show_no_result(&self, text: String) {
        self.send(PresentationUpdate::NoResult { text });
    }
}

/// Presenter that writes updates to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn show_result(&self, text: String, outline: Vec<(f64, f64)>) {
        info!(points = ?outline, "{}", text);
    }

    fn show_no_result(&self, text: String) {
        debug!("{}", text);
    }
}

/// Emits decode markers as trace events
#[derive(Debug, Default)]
pub struct TracingDecodeObserver {
    decodes: AtomicU64,
    found: AtomicU64,
    started: Mutex<Option<Instant>>,
}

impl TracingDecodeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed decodes so far
    pub fn decodes(&self) -> u64 {
        self.decodes.load(Ordering::Relaxed)
    }

    /// Decodes that found a barcode
    pub fn found(&self) -> u64 {
        self.found.load(Ordering::Relaxed)
    }
}

impl DecodeObserver for TracingDecodeObserver {
    fn decode_start(&self) {
        *self.started.lock().unwrap_or_else(|p| p.into_inner()) = Some(Instant::now());
        trace!(decode = self.decodes() + 1, "decode start");
    }

    fn decode_stop(&self, found: bool) {
        let started = self.started.lock().unwrap_or_else(|p| p.into_inner()).take();
        let decode = self.decodes.fetch_add(1, Ordering::Relaxed) + 1;
        if found {
            self.found.fetch_add(1, Ordering::Relaxed);
        }
        trace!(
            decode,
            found,
            duration_us = started.map(|s| s.elapsed().as_micros() as u64),
            "decode stop"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_format() {
        assert_eq!(result_line(Duration::from_millis(42), "HELLO"), "[  42ms] HELLO");
        assert_eq!(no_result_line(Duration::from_millis(1234)), "[1234ms] No barcode");
    }

    #[test]
    fn test_channel_presenter_delivers_in_order() {
        let (presenter, mut rx) = ChannelPresenter::new();
        presenter.show_no_result("first".into());
        presenter.show_result("second".into(), vec![(1.0, 2.0)]);

        assert_eq!(
            rx.try_recv().unwrap(),
            PresentationUpdate::NoResult {
                text: "first".into()
            }
        );
        assert_eq!(rx.try_recv().unwrap().text(), "second");
    }

    #[test]
    fn test_channel_presenter_survives_dropped_receiver() {
        let (presenter, rx) = ChannelPresenter::new();
        drop(rx);
        presenter.show_no_result("ignored".into());
    }

    #[test]
    fn test_tracing_observer_counts() {
        let observer = TracingDecodeObserver::new();
        observer.decode_start();
        observer.decode_stop(false);
        observer.decode_start();
        observer.decode_stop(true);
        assert_eq!(observer.decodes(), 2);
        assert_eq!(observer.found(), 1);
    }
}
