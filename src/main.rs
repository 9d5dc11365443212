//! EffectSim - Gameplay Effect Lifecycle Simulator
//!
//! Replays a scripted scenario against a single effect host and prints the
//! outcome.

use effectsim::cli;
use effectsim::headless::{run_headless_scenario, ScenarioConfig};

fn main() {
    let args = cli::parse_args();

    let mut config = match ScenarioConfig::load_from_file(&args.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(output) = args.output {
        config.output_path = Some(output.display().to_string());
    }
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }

    match run_headless_scenario(config) {
        Ok(result) => {
            println!("Scenario finished after {:.2}s", result.elapsed);

            let mut stats: Vec<_> = result.final_stats.iter().collect();
            stats.sort_by(|a, b| a.0.cmp(b.0));
            for (stat, value) in stats {
                println!("  {}: {:.1}", stat, value);
            }
            if !result.final_tags.is_empty() {
                println!("  tags: {}", result.final_tags.join(", "));
            }
            if !result.active_effects.is_empty() {
                println!("  still active: {}", result.active_effects.join(", "));
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
