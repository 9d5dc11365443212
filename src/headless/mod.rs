//! Headless scenario execution
//!
//! Runs scripted effect scenarios without any graphical output, suitable for
//! automated testing and balance analysis.

pub mod config;
pub mod runner;

pub use config::{ScenarioAction, ScenarioActionKind, ScenarioConfig};
pub use runner::{run_headless_scenario, ScenarioLogEntry, ScenarioResult};
