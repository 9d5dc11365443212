//! Headless scenario execution
//!
//! Replays a scripted scenario against a single effect host without any
//! graphical output, suitable for automated testing and balance analysis.
//! The Bevy app is stepped manually with a fixed time delta
//! (`TimeUpdateStrategy::ManualDuration`) so runs are deterministic.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use crate::effect::{EffectEventKind, EffectLibrary};
use crate::plugin::{update_effect_hosts, EffectHost, EffectHostEvent, EffectSystemPlugin};
use crate::tags::Tag;

use super::config::{ScenarioActionKind, ScenarioConfig};

/// One timestamped line of the scenario log.
#[derive(Debug, Clone)]
pub struct ScenarioLogEntry {
    /// Simulated time in seconds
    pub timestamp: f32,
    pub message: String,
}

/// Result of a completed scenario run, for programmatic inspection.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Simulated seconds elapsed when the scenario completed
    pub elapsed: f32,
    /// Final stat block values
    pub final_stats: HashMap<String, f32>,
    /// Condition tags held at the end, sorted
    pub final_tags: Vec<String>,
    /// Names of effects still active at the end
    pub active_effects: Vec<String>,
    /// Full scenario log
    pub log: Vec<ScenarioLogEntry>,
}

/// Resource tracking scenario playback state.
#[derive(Resource)]
struct ScenarioState {
    config: ScenarioConfig,
    next_action: usize,
    elapsed: f32,
    complete: bool,
    log: Vec<ScenarioLogEntry>,
    result: Option<ScenarioResult>,
}

impl ScenarioState {
    fn log(&mut self, message: String) {
        self.log.push(ScenarioLogEntry {
            timestamp: self.elapsed,
            message,
        });
    }
}

/// Run a scenario to completion and return its result.
pub fn run_headless_scenario(mut config: ScenarioConfig) -> Result<ScenarioResult, String> {
    config.validate()?;
    config
        .timeline
        .sort_by(|a, b| a.time.total_cmp(&b.time));

    let library = EffectLibrary::load_from_file(Path::new(&config.effects_file))?;
    let step = 1.0 / config.ticks_per_second;
    let output_path = config.output_path.clone();

    // Generous upper bound on frames; completion is detected by elapsed time.
    let max_frames = (config.max_duration_secs * config.ticks_per_second) as usize + 8;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(EffectSystemPlugin)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            step,
        )))
        .insert_resource(library)
        .insert_resource(ScenarioState {
            config,
            next_action: 0,
            elapsed: 0.0,
            complete: false,
            log: Vec::new(),
            result: None,
        })
        .add_systems(Startup, scenario_setup)
        .add_systems(Update, scenario_drive.before(update_effect_hosts))
        .add_systems(
            Update,
            (scenario_collect_events, scenario_check_end)
                .chain()
                .after(update_effect_hosts),
        );

    for _ in 0..max_frames {
        app.update();
        if app.world().resource::<ScenarioState>().complete {
            break;
        }
    }

    let result = app
        .world_mut()
        .resource_mut::<ScenarioState>()
        .result
        .take()
        .ok_or_else(|| "Scenario did not complete".to_string())?;

    if let Some(path) = output_path {
        let filename = save_scenario_log(&result, &path)?;
        println!("Scenario complete. Log saved to: {}", filename);
    }

    Ok(result)
}

/// Spawn the effect host with the scenario's initial tags and stats.
fn scenario_setup(mut commands: Commands, mut state: ResMut<ScenarioState>) {
    let mut host = EffectHost::new();
    for tag in &state.config.initial_tags {
        host.system.add_condition(Tag::new(tag.clone()));
    }
    for (stat, value) in &state.config.initial_stats {
        host.system.stats_mut().set(stat, *value);
    }
    // Initial setup is not observable scenario output.
    host.system.take_events();
    commands.spawn(host);

    let tick_rate = state.config.ticks_per_second;
    state.log(format!("Scenario started ({} ticks/s)", tick_rate));
}

/// Advance scenario time and fire every timeline action that has come due.
fn scenario_drive(
    time: Res<Time>,
    mut state: ResMut<ScenarioState>,
    library: Res<EffectLibrary>,
    mut hosts: Query<&mut EffectHost>,
) {
    if state.complete {
        return;
    }
    let Ok(mut host) = hosts.get_single_mut() else {
        return;
    };
    state.elapsed += time.delta_secs();

    while state.next_action < state.config.timeline.len()
        && state.config.timeline[state.next_action].time <= state.elapsed
    {
        let action = state.config.timeline[state.next_action].kind.clone();
        state.next_action += 1;

        match action {
            ScenarioActionKind::ApplyEffect { effect, level } => {
                let Some(definition) = library.get(&effect) else {
                    state.log(format!("Unknown effect '{}'; skipped", effect));
                    continue;
                };
                let outcome = host.system.try_apply_effect(definition.clone(), level, None);
                state.log(format!(
                    "Requested effect '{}' (level {}): {:?}",
                    effect, level, outcome
                ));
            }
            ScenarioActionKind::RemoveEffect { effect } => {
                match host.system.find_by_name(&effect) {
                    Some(handle) => {
                        host.system.force_remove_effect(handle);
                        state.log(format!("Removed effect '{}'", effect));
                    }
                    None => state.log(format!("Effect '{}' not active; remove skipped", effect)),
                }
            }
            ScenarioActionKind::AddTag { tag } => {
                host.system.add_condition(Tag::new(tag.clone()));
                state.log(format!("Added tag '{}'", tag));
            }
            ScenarioActionKind::RemoveTag { tag } => {
                host.system.remove_condition(&Tag::new(tag.clone()));
                state.log(format!("Removed tag '{}'", tag));
            }
            ScenarioActionKind::ChangeLevel { effect, level } => {
                match host.system.find_by_name(&effect) {
                    Some(handle) => {
                        host.system.change_level(handle, level);
                        state.log(format!("Changed level of '{}' to {}", effect, level));
                    }
                    None => state.log(format!(
                        "Effect '{}' not active; level change skipped",
                        effect
                    )),
                }
            }
            ScenarioActionKind::SetPlaySpeed { speed } => {
                host.system.set_play_speed(speed);
                state.log(format!("Set play speed to {}", speed));
            }
        }
    }
}

/// Append lifecycle notifications emitted this frame to the scenario log.
fn scenario_collect_events(
    mut state: ResMut<ScenarioState>,
    mut events: EventReader<EffectHostEvent>,
) {
    for host_event in events.read() {
        let event = &host_event.event;
        let message = match event.kind {
            EffectEventKind::Activated => format!("Effect '{}' activated", event.effect),
            EffectEventKind::Applied => format!("Effect '{}' applied", event.effect),
            EffectEventKind::Ignored => format!("Effect '{}' suppressed", event.effect),
            EffectEventKind::Overlapped => format!("Effect '{}' overlapped", event.effect),
            EffectEventKind::LevelChanged {
                new_level,
                prev_level,
            } => format!(
                "Effect '{}' level changed {} -> {}",
                event.effect, prev_level, new_level
            ),
            EffectEventKind::Finished => format!("Effect '{}' finished", event.effect),
            EffectEventKind::Canceled => format!("Effect '{}' canceled", event.effect),
            EffectEventKind::Ended => format!("Effect '{}' ended", event.effect),
        };
        state.log(message);
    }
}

/// Detect scenario completion and capture the result.
fn scenario_check_end(mut state: ResMut<ScenarioState>, hosts: Query<&EffectHost>) {
    if state.complete {
        return;
    }
    let Ok(host) = hosts.get_single() else {
        return;
    };

    let timeline_done = state.next_action >= state.config.timeline.len();
    let timed_out = state.elapsed >= state.config.max_duration_secs;
    if !timed_out && !(timeline_done && host.system.is_empty()) {
        return;
    }

    if timed_out {
        state.log("Scenario reached max duration".to_string());
    } else {
        state.log("All effects resolved".to_string());
    }

    let mut final_tags: Vec<String> = host
        .system
        .conditions()
        .iter()
        .map(|tag| tag.to_string())
        .collect();
    final_tags.sort();

    let result = ScenarioResult {
        elapsed: state.elapsed,
        final_stats: host
            .system
            .stats()
            .iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
        final_tags,
        active_effects: host
            .system
            .iter()
            .map(|spec| spec.definition().name.clone())
            .collect(),
        log: std::mem::take(&mut state.log),
    };
    state.result = Some(result);
    state.complete = true;
}

/// Save the scenario log to a text file.
fn save_scenario_log(result: &ScenarioResult, path: &str) -> Result<String, String> {
    let mut contents = String::new();
    for entry in &result.log {
        contents.push_str(&format!("[{:8.3}s] {}\n", entry.timestamp, entry.message));
    }
    std::fs::write(path, contents)
        .map_err(|e| format!("Failed to save scenario log '{}': {}", path, e))?;
    Ok(path.to_string())
}
