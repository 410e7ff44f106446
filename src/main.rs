// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

mod cli;

#[derive(Parser)]
#[command(name = "qr-scanner")]
#[command(about = "Live QR code scanning with autofocus control")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. "debug" or "qr_scanner=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a QR code from an image file
    Decode {
        /// Image file
        image: PathBuf,

        /// Pixel format the image is converted to before decoding
        #[arg(short, long, default_value = "bgra")]
        format: String,

        /// Extra bytes appended to every row
        #[arg(short, long, default_value = "0")]
        padding: u32,
    },

    /// Replay an image as a camera stream through a full scanning session
    Simulate {
        /// Image file
        image: PathBuf,

        /// Number of frames to deliver
        #[arg(short = 'n', long, default_value = "10")]
        frames: usize,

        /// Milliseconds between frames
        #[arg(short, long, default_value = "200")]
        interval_ms: u64,

        /// Pixel format of the simulated stream
        #[arg(long, default_value = "nv12")]
        format: String,

        /// Extra bytes appended to every row
        #[arg(short, long, default_value = "0")]
        padding: u32,

        /// Simulated lens capabilities
        #[arg(long, value_enum, default_value = "single")]
        focus: cli::SimulatedFocus,

        /// Make the lens reject its focus configuration
        #[arg(long)]
        fail_focus: bool,

        /// Save a snapshot of the first frame
        #[arg(long)]
        snapshot: bool,
    },

    /// Show the focus capabilities of a V4L2 device
    FocusProbe {
        /// Device node, e.g. /dev/video0
        device: String,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    // --log-level wins over RUST_LOG; default is warnings only
    let filter = match cli.log_level.as_deref() {
        Some(level) => tracing_subscriber::EnvFilter::try_new(level)?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();

    match cli.command {
        Commands::Decode {
            image,
            format,
            padding,
        } => cli::decode_image(&image, &format, padding),
        Commands::Simulate {
            image,
            frames,
            interval_ms,
            format,
            padding,
            focus,
            fail_focus,
            snapshot,
        } => cli::simulate(
            &image,
            cli::SimulateOptions {
                frames,
                interval: Duration::from_millis(interval_ms),
                format,
                padding,
                focus,
                fail_focus,
                snapshot,
            },
        ),
        Commands::FocusProbe { device } => cli::focus_probe(&device),
        Commands::Config => cli::show_config(),
    }
}
