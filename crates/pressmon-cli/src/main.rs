//! pressmon - PressMon live monitor CLI
//!
//! Headless host for the PressMon core: streams readings from the sensor
//! backend, drives the press scene and camera at a fixed frame rate, and sends
//! start/stop/port commands to the collection service.

#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use pressmon_core::telemetry::DataSource;
use pressmon_core::visual::CameraPreset;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pressmon")]
#[command(about = "PressMon - live telemetry monitor for the heated pneumatic press")]
#[command(version)]
struct Cli {
    /// Output in JSON format for machine parsing
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory holding monitor_config.json
    #[arg(long, global = true, env = "PRESSMON_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Streaming endpoint, overriding the saved config
    #[arg(long, global = true, env = "PRESSMON_WS_URL")]
    ws_url: Option<String>,

    /// Collection service base URL, overriding the saved config
    #[arg(long, global = true, env = "PRESSMON_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream readings and animate the press until interrupted
    #[command(visible_alias = "watch")]
    Monitor(MonitorArgs),

    /// Run the monitor against the built-in simulated press
    Demo {
        /// Milliseconds between simulated readings
        #[arg(long, default_value_t = 200)]
        period_ms: u64,

        #[command(flatten)]
        monitor: MonitorArgs,
    },

    /// Start a collection on the service
    #[command(subcommand)]
    Start(StartCommands),

    /// Stop a collection on the service
    Stop {
        #[arg(value_enum)]
        source: SourceArg,
    },

    /// List serial ports seen by the service
    Ports,

    /// Show or change the saved configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(clap::Args, Clone)]
struct MonitorArgs {
    /// Initial camera preset (front, diagonal, side, top)
    #[arg(long, default_value = "front")]
    camera: CameraPreset,

    /// Frames per second for the scene driver
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Seconds between status lines
    #[arg(long, default_value_t = 1.0)]
    hud_interval: f64,

    /// Exit after this many seconds
    #[arg(long)]
    duration: Option<f64>,
}

#[derive(Subcommand)]
enum StartCommands {
    /// Backend-side generated data
    Fake,
    /// Hardware rig on a serial port; unset options come from the config
    Serial {
        #[arg(long)]
        port: Option<String>,
        #[arg(long)]
        baud: Option<u32>,
        #[arg(long)]
        device_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Set one field and save
    Set { key: String, value: String },
    /// Restore defaults and save
    Reset,
    /// Print the configuration file path
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Fake,
    Serial,
}

impl From<SourceArg> for DataSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Fake => DataSource::Fake,
            SourceArg::Serial => DataSource::Serial,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("pressmon={log_level},pressmon_core={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let ctx = commands::Context::load(
        cli.config_dir,
        cli.ws_url,
        cli.api_url,
        cli.json,
    )?;

    match cli.command {
        Commands::Monitor(args) => commands::monitor(&ctx, args.into(), None).await,
        Commands::Demo { period_ms, monitor } => {
            commands::monitor(&ctx, monitor.into(), Some(period_ms)).await
        }
        Commands::Start(StartCommands::Fake) => commands::start_fake(&ctx).await,
        Commands::Start(StartCommands::Serial {
            port,
            baud,
            device_id,
        }) => commands::start_serial(&ctx, port, baud, device_id).await,
        Commands::Stop { source } => commands::stop(&ctx, source.into()).await,
        Commands::Ports => commands::ports(&ctx).await,
        Commands::Config(ConfigCommands::Show) => commands::config_show(&ctx),
        Commands::Config(ConfigCommands::Set { key, value }) => {
            commands::config_set(&ctx, &key, &value)
        }
        Commands::Config(ConfigCommands::Reset) => commands::config_reset(&ctx),
        Commands::Config(ConfigCommands::Path) => commands::config_path(&ctx),
    }
}

impl From<MonitorArgs> for commands::MonitorOptions {
    fn from(args: MonitorArgs) -> Self {
        commands::MonitorOptions {
            camera: args.camera,
            fps: args.fps.clamp(1, 240),
            hud_interval: args.hud_interval.max(0.1),
            duration: args.duration,
        }
    }
}
