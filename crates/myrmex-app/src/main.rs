//! Myrmex interactive app
//!
//! Window, surface and parameter-tuning shell around the core simulation.

mod renderer;
mod viewer;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use myrmex_params::SimulationConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed for the particle placement
    #[arg(short, long)]
    seed: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            log::info!("loading configuration from {}", path.display());
            serde_yaml::from_str(&std::fs::read_to_string(path)?)?
        }
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    log::info!(
        "starting viewer: {}x{}, {} ants, seed {}",
        config.size[0],
        config.size[1],
        config.ants.count,
        config.seed
    );
    myrmex_params::ranges::log_variables(&config.ants, &config.trail);

    pollster::block_on(viewer::run_viewer(config))?;

    Ok(())
}
