//! JSON scenario configuration
//!
//! Parses scripted scenario files for headless runs: which effect definition
//! file to load, the owner's initial tags and stats, and a timeline of
//! actions replayed against the effect system at a fixed tick rate.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A scripted scenario loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Path to the RON effect definition file.
    pub effects_file: String,
    /// Fixed simulation rate (default: 60)
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: f32,
    /// Scenario length in simulated seconds (default: 30)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Condition tags held before the timeline starts
    #[serde(default)]
    pub initial_tags: Vec<String>,
    /// Stat values set before the timeline starts
    #[serde(default)]
    pub initial_stats: HashMap<String, f32>,
    /// Custom output path for the scenario log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Timestamped actions, replayed in time order
    #[serde(default)]
    pub timeline: Vec<ScenarioAction>,
}

fn default_ticks_per_second() -> f32 {
    60.0
}

fn default_max_duration() -> f32 {
    30.0
}

/// One scripted action with the simulated time it fires at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAction {
    /// Simulated time in seconds
    pub time: f32,
    #[serde(flatten)]
    pub kind: ScenarioActionKind,
}

/// What the action does. Effects are referenced by definition name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioActionKind {
    ApplyEffect {
        effect: String,
        #[serde(default)]
        level: u32,
    },
    RemoveEffect {
        effect: String,
    },
    AddTag {
        tag: String,
    },
    RemoveTag {
        tag: String,
    },
    ChangeLevel {
        effect: String,
        level: u32,
    },
    SetPlaySpeed {
        speed: f32,
    },
}

impl ScenarioConfig {
    /// Load a scenario from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scenario file '{}': {}", path.display(), e))?;
        Self::load_from_str(&contents)
    }

    /// Parse a scenario from JSON text.
    pub fn load_from_str(contents: &str) -> Result<Self, String> {
        let config: ScenarioConfig = serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse scenario JSON: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.effects_file.is_empty() {
            return Err("effects_file must be set".to_string());
        }
        if self.ticks_per_second <= 0.0 {
            return Err("ticks_per_second must be > 0".to_string());
        }
        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be > 0".to_string());
        }
        if self.timeline.iter().any(|action| action.time < 0.0) {
            return Err("timeline actions must have time >= 0".to_string());
        }
        Ok(())
    }
}
