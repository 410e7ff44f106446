// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Decoding a QR code from an image file
//! - Running a full scanning session against an image file
//! - Probing the focus capabilities of a V4L2 device
//! - Showing the effective configuration

use qr_scanner::app::autofocus::FocusPlan;
use qr_scanner::app::{
    ChannelPresenter, DecodeOptions, DisplayScale, FrameDecoder, PresentationUpdate,
    ScannerSession,
};
use qr_scanner::backends::camera::{FocusActuator, PixelFormat, V4l2FocusActuator};
use qr_scanner::backends::virtual_camera::{
    FileFrameSource, SimulatedFocusActuator, load_image_as_frame,
};
use qr_scanner::config::Config;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn load_config() -> Config {
    Config::load_default().unwrap_or_else(|e| {
        eprintln!("Warning: {}, using defaults", e);
        Config::default()
    })
}

fn parse_format(name: &str) -> Result<PixelFormat, Box<dyn std::error::Error>> {
    PixelFormat::from_name(name).ok_or_else(|| format!("Unknown pixel format: {}", name).into())
}

/// Decode one image file
pub fn decode_image(path: &Path, format: &str, padding: u32) -> CliResult {
    let config = load_config();
    let format = parse_format(format)?;
    let frame = load_image_as_frame(path, format, padding)?;
    println!(
        "Frame: {}x{} {} (stride {})",
        frame.width, frame.height, frame.format, frame.stride
    );

    let decoder = FrameDecoder::new(DecodeOptions::from(&config.decoder));
    match decoder.decode_frame(&frame.view())? {
        Some(result) => {
            println!("{}: {}", result.format, result.text);
            for (x, y) in &result.points {
                println!("  ({:.1}, {:.1})", x, y);
            }
        }
        None => println!("No barcode"),
    }
    Ok(())
}

/// Which simulated lens to use for `simulate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SimulatedFocus {
    /// Native continuous autofocus
    Continuous,
    /// Single-shot sweeps driven by the scanner
    Single,
    /// Fixed-focus lens
    #[value(name = "none")]
    Fixed,
}

/// Options for `simulate`
pub struct SimulateOptions {
    pub frames: usize,
    pub interval: Duration,
    pub format: String,
    pub padding: u32,
    pub focus: SimulatedFocus,
    pub fail_focus: bool,
    pub snapshot: bool,
}

/// Run a scanning session against an image replayed as a camera stream
pub fn simulate(path: &Path, options: SimulateOptions) -> CliResult {
    let config = load_config();
    let format = parse_format(&options.format)?;

    let mut actuator = match options.focus {
        SimulatedFocus::Continuous => SimulatedFocusActuator::continuous(),
        SimulatedFocus::Single => SimulatedFocusActuator::single_shot(),
        SimulatedFocus::Fixed => SimulatedFocusActuator::fixed(),
    };
    if options.fail_focus {
        actuator = actuator.with_rejected_configuration();
    }
    let stats = actuator.stats();

    let (presenter, mut updates) = ChannelPresenter::new();
    let mut session = ScannerSession::start(&config, Some(Box::new(actuator)), Arc::new(presenter));
    println!("Autofocus: {}", session.autofocus_state());

    if options.snapshot {
        session.snapshot_trigger().request();
    }

    let source = FileFrameSource::new(path, format)
        .with_row_padding(options.padding)
        .with_interval(options.interval)
        .with_frame_limit(options.frames);
    session.attach_source(source, DisplayScale::IDENTITY)?;

    let (stop_tx, mut stop_rx) = tokio::sync::mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    println!("Scanning... (press Ctrl+C to stop early)");
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Some(PresentationUpdate::Result { text, outline }) => {
                        println!("{}", text);
                        let corners: Vec<String> = outline
                            .iter()
                            .map(|(x, y)| format!("({:.0}, {:.0})", x, y))
                            .collect();
                        println!("         outline: {}", corners.join(" "));
                    }
                    Some(PresentationUpdate::NoResult { text }) => println!("{}", text),
                    None => break,
                },
                _ = stop_rx.recv() => {
                    println!();
                    println!("Stopping early...");
                    break;
                }
            }
        }
    });

    let detection = session.detection().snapshot();
    session.stop();

    println!();
    println!("Barcode in last frame: {}", detection.barcode_found);
    println!(
        "Focus: {} configure call(s), {} focus command(s)",
        stats.configure_calls(),
        stats.focus_commands()
    );
    Ok(())
}

/// Print the focus capabilities of a V4L2 device
pub fn focus_probe(device: &str) -> CliResult {
    if !Path::new(device).exists() {
        return Err(format!("Device not found: {}", device).into());
    }

    let actuator = V4l2FocusActuator::new(device);
    let modes = actuator.supported_focus_modes();
    let ranges = actuator.supported_focus_ranges();

    println!("Device: {}", actuator.device_path());
    println!("  Focus modes:  {:?}", modes);
    println!("  Focus ranges: {:?}", ranges);
    let strategy = match FocusPlan::negotiate(&modes, &ranges) {
        FocusPlan::Native(settings) => format!("native continuous ({:?})", settings.range),
        FocusPlan::Simulated(settings) => {
            format!("simulated continuous, {:?} sweeps ({:?})", settings.mode, settings.range)
        }
        FocusPlan::Disabled => "disabled (fixed focus)".to_string(),
    };
    println!("  Autofocus:    {}", strategy);
    Ok(())
}

/// Print the effective configuration
pub fn show_config() -> CliResult {
    match Config::default_path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no configuration directory"),
    }
    let config = Config::load_default()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
