//! gesture_pad — interactive entry point.

use std::io;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gesture_pad::app::{run_headless, run_window, PadConfig};
use gesture_session::{CaptureConstraints, SessionConfig};
use hand_signal::Calibration;

/// Hand-gesture debug pad
#[derive(Parser, Debug)]
#[command(name = "gesture_pad")]
#[command(version, about = "Drive the hand-gesture pipeline from the mouse and watch its state")]
struct Args {
    /// Neutral hand x, normalized 0–1
    #[arg(long, default_value_t = Calibration::DEFAULT_CENTER_X)]
    center: f32,

    /// Half-width of the neutral band, normalized
    #[arg(long, default_value_t = Calibration::DEFAULT_DEAD_ZONE)]
    dead_zone: f32,

    /// Requested frame width in pixels
    #[arg(long, default_value_t = 640, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Requested frame height in pixels
    #[arg(long, default_value_t = 480, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// How long to wait for the camera stream to become ready
    #[arg(long, default_value_t = 10_000)]
    ready_timeout_ms: u64,

    /// Show the camera view unmirrored
    #[arg(long)]
    no_mirror: bool,

    /// Run this many frames of a scripted sweep without a window, printing
    /// one JSON state per line
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u64>,
}

impl Args {
    fn pad_config(&self) -> PadConfig {
        let constraints = CaptureConstraints {
            ideal_width:  self.width,
            ideal_height: self.height,
            ..CaptureConstraints::default()
        };
        let session = SessionConfig::default()
            .with_constraints(constraints)
            .with_calibration(Calibration::new(self.center, self.dead_zone))
            .with_ready_timeout(Duration::from_millis(self.ready_timeout_ms));
        PadConfig { session, mirrored: !self.no_mirror }
    }
}

fn main() {
    // stdout carries the headless JSON trace, so logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let config = args.pad_config();

    let result = match args.headless {
        Some(frames) => run_headless(config, frames, &mut io::stdout().lock()),
        None => {
            println!();
            println!("╔══════════════════════════════════════════════════════════════╗");
            println!("║          Gesture Pad — hand gesture debug overlay            ║");
            println!("╚══════════════════════════════════════════════════════════════╝");
            println!();
            #[cfg(feature = "leap")]
            println!("  Mode: LeapMotion hardware");
            #[cfg(not(feature = "leap"))]
            println!("  Mode: Mouse simulation  (use --features leap for hardware)");
            println!("  Keys: 0-5 fingers  H hide hand  C calibrate  M mirror  Q quit");
            println!();
            run_window(config)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
