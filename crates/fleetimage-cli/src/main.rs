use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use fleetimage_core::FleetImageConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "fleetimage",
    about = "Propagate a new machine image to staged deployment fleets",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to fleetimage.toml (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a parameter-change notification against a fleet
    Run {
        /// Notification JSON (bare payload or event envelope)
        #[arg(short, long)]
        event: PathBuf,
        /// Fleet fixture JSON
        #[arg(short, long)]
        fleet: PathBuf,
        /// Validate version writes without creating versions
        #[arg(long)]
        dry_run: bool,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List the scaling groups an image rollout would target
    Resolve {
        /// Fleet fixture JSON
        #[arg(short, long)]
        fleet: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Write a default fleetimage.toml
    Init {
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FleetImageConfig::from_file(path)?,
        None => FleetImageConfig::default(),
    };
    init_tracing(&config)?;

    match cli.command {
        Commands::Run {
            event,
            fleet,
            dry_run,
            format,
        } => {
            let mut config = config;
            config.update.dry_run |= dry_run;
            commands::run::run(&config, &event, &fleet, format).await
        }
        Commands::Resolve { fleet, format } => {
            commands::resolve::resolve(&config, &fleet, format).await
        }
        Commands::Init { path } => commands::init::init(&path),
    }
}

fn init_tracing(config: &FleetImageConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.logging.filter))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
