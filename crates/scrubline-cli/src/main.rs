use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrubline_core::EngineConfig;

mod commands;

use commands::simulate::{SimulateArgs, WheelInput};

#[derive(Parser)]
#[command(name = "scrubline")]
#[command(author, version, about = "Scroll-driven timeline animation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.config/scrubline/config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose every timeline of a scene and report authoring errors
    Check {
        /// Scene file (.toml or .json)
        scene: PathBuf,
    },
    /// Print every animated property of a timeline at a given progress
    Scrub {
        /// Scene file (.toml or .json)
        scene: PathBuf,
        /// Name of the timeline to evaluate
        #[arg(short = 't', long)]
        timeline: String,
        /// Progress in [0, 1]
        #[arg(short = 'p', long)]
        progress: f64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Drive a scene headlessly with scripted wheel input
    Simulate {
        /// Scene file (.toml or .json)
        scene: PathBuf,
        /// Number of frames to run
        #[arg(short = 'f', long, default_value_t = 120)]
        frames: u64,
        /// Wheel delta injected at a frame, e.g. `120@0`; repeatable
        #[arg(short = 'w', long = "wheel", value_name = "DELTA@FRAME", allow_hyphen_values = true)]
        wheel: Vec<WheelInput>,
        /// Pace frames in real time at the configured frame rate
        #[arg(long)]
        realtime: bool,
        /// Print one JSON object per frame
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write the default configuration if no file exists yet
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Check { scene } => commands::check::run(&scene),
        Commands::Scrub {
            scene,
            timeline,
            progress,
            json,
        } => commands::scrub::run(&scene, &timeline, progress, json),
        Commands::Simulate {
            scene,
            frames,
            wheel,
            realtime,
            json,
        } => {
            let args = SimulateArgs {
                scene,
                frames,
                wheel,
                realtime,
                json,
            };
            commands::simulate::run(&config, args).await
        }
        Commands::Config { init } => commands::config::run(&config, cli.config.as_deref(), init),
    }
}
