//! Application entry point for the differential growth viewer.
//!
//! This binary parses command line options, loads growth settings and
//! delegates all interactive logic and rendering to [`Viewer`].

mod viewer;

use std::{error::Error, fs, path::PathBuf};

use clap::Parser;
use growth_core::config::Config;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use viewer::Viewer;

#[derive(Parser, Debug)]
#[command(name = "growth-view", about = "Interactive differential growth viewer")]
struct Args {
    /// JSON file with growth settings (`MinDistance`, `MaxDistance`, ...).
    /// Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the random source. Drawn from the OS when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Nodes in each seeded ring.
    #[arg(long, default_value_t = 12)]
    nodes: usize,

    /// Radius of each seeded ring.
    #[arg(long, default_value_t = 20.0)]
    radius: f32,

    /// Log per-tick details. `RUST_LOG` takes precedence when set.
    #[arg(short, long)]
    verbose: bool,
}

/// Parses and validates a JSON config document.
fn parse_config(text: &str) -> Result<Config, Box<dyn Error>> {
    let cfg: Config = serde_json::from_str(text)?;
    cfg.validate()?;
    Ok(cfg)
}

fn load_config(args: &Args) -> Result<Config, Box<dyn Error>> {
    match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            parse_config(&fs::read_to_string(path)?)
        }
        None => Ok(Config::default()),
    }
}

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if the config cannot be loaded or eframe fails to create the
///   native window or event loop.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // Set up logging
    let default_level = if args.verbose { "debug" } else { "info" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let cfg = load_config(&args)?;
    let viewer = Viewer::new(cfg, args.seed, args.nodes, args.radius)?;

    eframe::run_native(
        "Differential Growth",
        eframe::NativeOptions::default(),
        Box::new(|_cc| Ok(Box::new(viewer))),
    )?;
    Ok(())
}
