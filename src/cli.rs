//! Command-line interface for EffectSim
//!
//! The binary runs scripted scenarios in headless mode.

use clap::Parser;
use std::path::PathBuf;

/// Gameplay effect lifecycle simulator
#[derive(Parser, Debug)]
#[command(name = "effectsim")]
#[command(about = "Gameplay effect lifecycle simulator")]
#[command(version)]
pub struct Args {
    /// Scenario JSON file to run
    #[arg(value_name = "SCENARIO_FILE")]
    pub scenario: PathBuf,

    /// Output path for the scenario log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Override the scenario's maximum duration in seconds
    #[arg(long)]
    pub max_duration: Option<f32>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
