//! Shared test helpers
//!
//! Provides a hook-recording behavior and small constructors for effect
//! definitions and tag lists.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use effectsim::effect::behavior::{EffectBehavior, EffectCtx, OverlapRequest};
use effectsim::{DurationPolicy, EffectDefinition, Tag, TagList};

/// One behavior hook invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Enter,
    Exit,
    Apply,
    Ignore,
    Tick,
    Finish,
    Cancel,
    LevelChanged,
    Overlap,
}

/// Recorded hook invocations, shared with the test via `Arc<Mutex<_>>`.
#[derive(Debug, Default)]
pub struct HookRecord {
    pub calls: Vec<Hook>,
}

impl HookRecord {
    pub fn count(&self, hook: Hook) -> usize {
        self.calls.iter().filter(|h| **h == hook).count()
    }
}

/// Behavior that records every hook call. Overlap and removal permissions
/// are configurable per test.
pub struct Recording {
    record: Arc<Mutex<HookRecord>>,
    pub allow_overlap: bool,
    pub removable_sources: Vec<String>,
}

impl Recording {
    pub fn new() -> (Box<Self>, Arc<Mutex<HookRecord>>) {
        let record = Arc::new(Mutex::new(HookRecord::default()));
        let behavior = Box::new(Self {
            record: record.clone(),
            allow_overlap: false,
            removable_sources: Vec::new(),
        });
        (behavior, record)
    }

    fn push(&self, hook: Hook) {
        self.record.lock().unwrap().calls.push(hook);
    }
}

impl EffectBehavior for Recording {
    fn on_enter(&mut self, _ctx: &mut EffectCtx) {
        self.push(Hook::Enter);
    }

    fn on_exit(&mut self, _ctx: &mut EffectCtx) {
        self.push(Hook::Exit);
    }

    fn on_apply(&mut self, _ctx: &mut EffectCtx) {
        self.push(Hook::Apply);
    }

    fn on_ignore(&mut self, _ctx: &mut EffectCtx) {
        self.push(Hook::Ignore);
    }

    fn on_tick(&mut self, _dt: f32, _ctx: &mut EffectCtx) {
        self.push(Hook::Tick);
    }

    fn on_finish(&mut self, _ctx: &mut EffectCtx) {
        self.push(Hook::Finish);
    }

    fn on_cancel(&mut self, _ctx: &mut EffectCtx) {
        self.push(Hook::Cancel);
    }

    fn on_level_changed(&mut self, _new_level: u32, _prev_level: u32, _ctx: &mut EffectCtx) {
        self.push(Hook::LevelChanged);
    }

    fn on_overlap(&mut self, _incoming: &OverlapRequest, _ctx: &mut EffectCtx) {
        self.push(Hook::Overlap);
    }

    fn can_overlap(&self, _incoming: &OverlapRequest) -> bool {
        self.allow_overlap
    }

    fn can_remove_from_source(&self, source: &str) -> bool {
        self.removable_sources.iter().any(|s| s == source)
    }
}

/// Build a tag list from string names.
pub fn tag_list(names: &[&str]) -> TagList {
    names.iter().map(|name| Tag::new(*name)).collect()
}

/// Shared definition constructor for tests.
pub fn definition(name: &str, policy: DurationPolicy) -> EffectDefinition {
    EffectDefinition::new(name, policy)
}

/// Arc-wrapped definition, as the effect system consumes them.
pub fn shared(definition: EffectDefinition) -> Arc<EffectDefinition> {
    Arc::new(definition)
}
