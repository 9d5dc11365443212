//! Static effect definitions
//!
//! An [`EffectDefinition`] is the immutable data an effect is instantiated
//! from: its duration policy, its tag gates, the tags it grants, and a
//! data-driven behavior. Definitions are shared across live instances via
//! `Arc` and typically loaded from RON config files (see
//! [`crate::effect::library`]).

use serde::{Deserialize, Serialize};

use crate::effect::behaviors::BehaviorConfig;
use crate::tags::{Tag, TagList};

/// How an effect's lifetime is bounded.
///
/// Fixed per definition, never per instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationPolicy {
    /// Enter, apply and end within a single activation call. Never ticks.
    Instant,
    /// Runs until its duration is consumed, then ends on its own.
    Duration,
    /// Runs until explicitly removed. The timer is never consulted.
    Infinite,
}

/// The seven tag lists attached to a definition.
///
/// Required/blocked pairs form the two gates; granted lists are added to the
/// owner's condition set while the matching state holds; `remove_effects_with`
/// clears conflicting effects at activation time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EffectTagSets {
    /// Activation fails unless ALL of these are held.
    #[serde(default)]
    pub activation_required: TagList,
    /// Activation fails if ANY of these are held.
    #[serde(default)]
    pub activation_blocked: TagList,
    /// Application is suppressed unless ALL of these are held.
    #[serde(default)]
    pub application_required: TagList,
    /// Application is suppressed if ANY of these are held.
    #[serde(default)]
    pub application_blocked: TagList,
    /// Granted while the effect is active; also declares the effect's
    /// presence for removal matching.
    #[serde(default)]
    pub activation_granted: TagList,
    /// Granted only while the effect is applied.
    #[serde(default)]
    pub application_granted: TagList,
    /// Active effects declaring any of these tags are removed when this
    /// effect activates.
    #[serde(default)]
    pub remove_effects_with: TagList,
}

impl EffectTagSets {
    /// True when the application gate depends on the condition set at all,
    /// i.e. when the effect must listen for tag changes while active.
    pub fn reacts_to_conditions(&self) -> bool {
        !self.application_required.is_empty() || !self.application_blocked.is_empty()
    }

    /// True when a changed tag can flip the application gate's verdict.
    pub fn gates_application(&self, tag: &Tag) -> bool {
        self.application_required.contains(tag) || self.application_blocked.contains(tag)
    }
}

/// Immutable description of one effect type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// Unique name; live instances of the same name reconcile via overlap.
    pub name: String,
    pub duration_policy: DurationPolicy,
    /// Lifetime in seconds; only meaningful for `Duration` policy.
    #[serde(default)]
    pub duration: f32,
    /// When set, tick deltas bypass the owner's play-speed multiplier.
    #[serde(default)]
    pub unscaled_time: bool,
    /// When set, a `Duration` effect keeps consuming its timer while its
    /// application gate suppresses it. Default: suppressed effects do not
    /// consume duration.
    #[serde(default)]
    pub timer_while_suppressed: bool,
    /// When set, any removal source may cancel the effect without a behavior
    /// veto check.
    #[serde(default)]
    pub dispellable: bool,
    #[serde(default)]
    pub tags: EffectTagSets,
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

impl EffectDefinition {
    pub fn new(name: impl Into<String>, duration_policy: DurationPolicy) -> Self {
        Self {
            name: name.into(),
            duration_policy,
            duration: 0.0,
            unscaled_time: false,
            timer_while_suppressed: false,
            dispellable: false,
            tags: EffectTagSets::default(),
            behavior: BehaviorConfig::default(),
        }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_tags(mut self, tags: EffectTagSets) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_behavior(mut self, behavior: BehaviorConfig) -> Self {
        self.behavior = behavior;
        self
    }

    /// Validate a definition after loading it from config.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("effect definition has an empty name".to_string());
        }
        if self.duration < 0.0 {
            return Err(format!(
                "effect '{}': duration must be >= 0 (got {})",
                self.name, self.duration
            ));
        }
        if self.duration_policy == DurationPolicy::Duration && self.duration <= 0.0 {
            return Err(format!(
                "effect '{}': Duration policy requires a positive duration",
                self.name
            ));
        }
        self.behavior
            .validate()
            .map_err(|e| format!("effect '{}': {}", self.name, e))?;
        Ok(())
    }
}
