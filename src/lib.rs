//! EffectSim - Timed, Conditionally-Active Gameplay Effects
//!
//! Models discrete units of game state (buffs, debuffs, damage-over-time,
//! stat modifiers) applied to a target. Each effect instance progresses
//! through activation, conditional application, periodic update and
//! termination, with its consequences continuously gated by a shared,
//! mutable set of condition tags.
//!
//! This library exposes the lifecycle core, a Bevy plugin for frame-driven
//! embedding, and a headless scenario runner for scripted playback.

pub mod cli;
pub mod effect;
pub mod headless;
pub mod plugin;
pub mod tags;

// Re-export commonly used types
pub use effect::{
    ApplyOutcome, BehaviorConfig, DurationPolicy, EffectBehavior, EffectCtx, EffectDefinition,
    EffectEvent, EffectEventKind, EffectHandle, EffectLibrary, EffectSpec, EffectSystem,
    EffectTagSets, OverlapRequest, Payload, StatBlock,
};
pub use plugin::{EffectHost, EffectHostEvent, EffectSystemPlugin};
pub use tags::{Tag, TagList, TagSet};
