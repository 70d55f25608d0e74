use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use handworks_kernel::{GrabConfig, World};
use handworks_tools::GrabInspector;
use tracing_subscriber::EnvFilter;

mod scenario;

#[derive(Parser)]
#[command(name = "handworks-cli", about = "Scripted grab scenarios and config checks")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Grab config (JSON); missing fields take their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective grab config
    Info,
    /// Validate a grab config file
    Check {
        path: PathBuf,
    },
    /// Two hands reach for one magazine; the left lets go and the right takes over
    Contest {
        /// Ticks to run after the handoff
        #[arg(short, long, default_value = "3")]
        ticks: u64,
    },
    /// Drop a magazine next to the pouch and watch it get pulled in
    Pouch {
        /// Ticks to run after the drop
        #[arg(short, long, default_value = "30")]
        ticks: u64,
    },
    /// Rack a pistol slide and release it with the button
    Slide {
        /// Rounds in the magazine
        #[arg(short, long, default_value = "3")]
        rounds: u32,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GrabConfig> {
    let Some(path) = path else {
        return Ok(GrabConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    GrabConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("handworks-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("{}", GrabInspector::summary(&World::with_config(config.clone())));
            println!("{}", config.to_json()?);
        }
        Commands::Check { path } => {
            load_config(Some(&path))?;
            println!("{}: OK", path.display());
        }
        Commands::Contest { ticks } => scenario::contest(config, ticks)?,
        Commands::Pouch { ticks } => scenario::pouch(config, ticks)?,
        Commands::Slide { rounds } => scenario::slide(config, rounds)?,
    }

    Ok(())
}
