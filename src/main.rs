//! pinchfield - gesture-driven particle visualizer.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pinchfield::config::{Config, SceneKind};
use pinchfield::error::ConfigError;

/// Particle scenes that form and scatter as you pinch in front of a webcam.
#[derive(Parser, Debug)]
#[command(name = "pinchfield", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene to run (overrides config)
    #[arg(long, value_enum)]
    scene: Option<SceneKind>,

    /// Source image for the image scene (overrides config)
    #[arg(long)]
    image: Option<PathBuf>,

    /// Particle count for the orbital scene (overrides config)
    #[arg(long)]
    count: Option<u32>,

    /// Don't listen for hand landmarks
    #[arg(long)]
    no_tracking: bool,

    /// Start the hand tracker sidecar
    #[arg(long)]
    launch_tracker: bool,

    /// Landmark UDP port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Seed for reproducible particle generation
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(scene) = self.scene {
            config.scene.kind = scene;
        }
        if let Some(image) = &self.image {
            config.image.path = image.clone();
        }
        if let Some(count) = self.count {
            config.orbital.count = count;
        }
        if self.no_tracking {
            config.tracker.enabled = false;
        }
        if self.launch_tracker {
            config.tracker.auto_launch = true;
        }
        if let Some(port) = self.port {
            config.tracker.port = port;
        }
        if let Some(seed) = self.seed {
            config.image.seed = Some(seed);
            config.orbital.seed = Some(seed);
        }
    }
}

fn load_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from: {}", path.display());
            Config::from_file(path)?
        }
        None => Config::load()?,
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting pinchfield v{}", pinchfield::VERSION);

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Scene: {:?}", config.scene.kind);

    match pinchfield::run(config) {
        Ok(()) => {
            info!("pinchfield stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
