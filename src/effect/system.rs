//! Effect owner
//!
//! An [`EffectSystem`] is the per-target registry of live effect specs. It
//! owns the shared condition set and stat block, drives per-frame updates in
//! insertion order, reconciles overlapping activation requests, and converges
//! condition-dependent application state after every mutation.
//!
//! All mutation of the condition set goes through the system so that change
//! notifications are drained to quiescence before control returns to the
//! caller: an applied/ignored toggle is never left stale until the next tick.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::log::warn;

use crate::effect::behavior::{EffectBehavior, OverlapRequest, Payload};
use crate::effect::definition::EffectDefinition;
use crate::effect::events::EffectEvent;
use crate::effect::spec::{EffectHandle, EffectSpec};
use crate::tags::{Tag, TagSet};

/// Passes of the notification drain loop before assuming a grant cycle.
const MAX_REACT_PASSES: usize = 64;

/// Retired specs kept for recyclers; older instances are dropped beyond this.
const RETIRED_CAP: usize = 32;

/// Named numeric stats shared by every effect on one owner. Missing stats
/// read as zero.
#[derive(Clone, Debug, Default)]
pub struct StatBlock {
    values: HashMap<String, f32>,
}

impl StatBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stat: &str) -> f32 {
        self.values.get(stat).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, stat: &str, value: f32) {
        self.values.insert(stat.to_string(), value);
    }

    pub fn add(&mut self, stat: &str, amount: f32) {
        *self.values.entry(stat.to_string()).or_insert(0.0) += amount;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

/// Result of an activation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new spec was activated.
    Activated(EffectHandle),
    /// An existing spec of the same effect absorbed the request.
    Overlapped(EffectHandle),
    /// An existing spec is running and refused to overlap.
    AlreadyActive(EffectHandle),
    /// The activation tag gate rejected the request.
    BlockedByGate,
}

impl ApplyOutcome {
    /// True when the request had any effect (activation or overlap).
    pub fn succeeded(&self) -> bool {
        matches!(self, ApplyOutcome::Activated(_) | ApplyOutcome::Overlapped(_))
    }
}

/// Per-target registry and driver of live effect specs.
pub struct EffectSystem {
    conditions: TagSet,
    stats: StatBlock,
    specs: Vec<EffectSpec>,
    retired: Vec<EffectSpec>,
    events: Vec<EffectEvent>,
    play_speed: f32,
    next_handle: u64,
}

impl Default for EffectSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectSystem {
    pub fn new() -> Self {
        Self {
            conditions: TagSet::new(),
            stats: StatBlock::new(),
            specs: Vec::new(),
            retired: Vec::new(),
            events: Vec::new(),
            play_speed: 1.0,
            next_handle: 0,
        }
    }

    // ------------------------------------------------------------------
    // Shared state
    // ------------------------------------------------------------------

    /// Read access to the condition set. Mutation goes through
    /// [`add_condition`](Self::add_condition) / [`remove_condition`](Self::remove_condition)
    /// so that dependent effects converge immediately.
    pub fn conditions(&self) -> &TagSet {
        &self.conditions
    }

    pub fn stats(&self) -> &StatBlock {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StatBlock {
        &mut self.stats
    }

    pub fn play_speed(&self) -> f32 {
        self.play_speed
    }

    /// Multiplier for scaled-time tick deltas. Definitions with
    /// `unscaled_time` ignore it.
    pub fn set_play_speed(&mut self, play_speed: f32) {
        self.play_speed = play_speed;
    }

    /// Add a condition tag and immediately re-evaluate every dependent
    /// application gate. Returns true if membership changed.
    pub fn add_condition(&mut self, tag: Tag) -> bool {
        let changed = self.conditions.add(tag);
        if changed {
            self.react();
        }
        changed
    }

    /// Remove a condition tag and immediately re-evaluate every dependent
    /// application gate. Returns true if membership changed.
    pub fn remove_condition(&mut self, tag: &Tag) -> bool {
        let changed = self.conditions.remove(tag);
        if changed {
            self.react();
        }
        changed
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn get(&self, handle: EffectHandle) -> Option<&EffectSpec> {
        self.specs.iter().find(|spec| spec.handle() == handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectSpec> {
        self.specs.iter()
    }

    /// First active spec instantiated from the named definition.
    pub fn find_by_name(&self, name: &str) -> Option<EffectHandle> {
        self.specs
            .iter()
            .find(|spec| spec.is_active() && spec.definition().name == name)
            .map(|spec| spec.handle())
    }

    pub fn has_effect(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    /// Drain the queued lifecycle notifications.
    pub fn take_events(&mut self) -> Vec<EffectEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain terminated spec instances for reuse. A recycler reinitializes
    /// them with [`EffectSpec::setup`] and resubmits via
    /// [`try_apply_spec`](Self::try_apply_spec), keeping definition and
    /// behavior allocations alive across activation cycles.
    pub fn take_retired(&mut self) -> Vec<EffectSpec> {
        std::mem::take(&mut self.retired)
    }

    // ------------------------------------------------------------------
    // Activation
    // ------------------------------------------------------------------

    /// Request an effect using the behavior declared in its definition.
    pub fn try_apply_effect(
        &mut self,
        definition: Arc<EffectDefinition>,
        level: u32,
        payload: Payload,
    ) -> ApplyOutcome {
        let behavior = definition.behavior.instantiate();
        self.try_apply_effect_with(definition, behavior, level, payload)
    }

    /// Request an effect with a caller-supplied behavior.
    pub fn try_apply_effect_with(
        &mut self,
        definition: Arc<EffectDefinition>,
        behavior: Box<dyn EffectBehavior>,
        level: u32,
        payload: Payload,
    ) -> ApplyOutcome {
        let spec = EffectSpec::new(
            definition,
            EffectHandle::new(0),
            level,
            payload,
            behavior,
        );
        self.try_apply_spec(spec)
    }

    /// Request an effect from a prepared (possibly recycled) spec instance.
    ///
    /// A fresh handle is assigned on activation; the instance's previous
    /// handle, if any, is meaningless here.
    pub fn try_apply_spec(&mut self, mut spec: EffectSpec) -> ApplyOutcome {
        // A recycled instance must have been reinitialized with `setup`.
        if !spec.can_take_effect() {
            return ApplyOutcome::AlreadyActive(spec.handle());
        }

        // Reconcile with an already-running instance of the same effect.
        if let Some(index) = self.position_by_name(&spec.definition().name) {
            let (level, payload) = spec.into_overlap_parts();
            let request = OverlapRequest { level, payload };
            let existing = &mut self.specs[index];
            let handle = existing.handle();
            if existing.try_overlap(&request, &mut self.stats, &mut self.events) {
                self.react();
                return ApplyOutcome::Overlapped(handle);
            }
            return ApplyOutcome::AlreadyActive(handle);
        }

        if !spec.can_activate(&self.conditions) {
            return ApplyOutcome::BlockedByGate;
        }

        // Clear conflicting effects before the new spec registers itself.
        let removal_tags = spec.definition().tags.remove_effects_with.clone();
        if !removal_tags.is_empty() {
            self.remove_matching(&removal_tags);
        }

        let handle = self.allocate_handle();
        spec.assign_handle(handle);
        self.specs.push(spec);
        let index = self.specs.len() - 1;
        self.specs[index].activate(&mut self.conditions, &mut self.stats, &mut self.events);
        self.react();
        self.cull();
        ApplyOutcome::Activated(handle)
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Advance every active spec by one frame, in insertion order. Specs may
    /// terminate mid-traversal; a handle snapshot keeps iteration safe.
    pub fn update(&mut self, dt: f32) {
        let handles: Vec<EffectHandle> = self.specs.iter().map(|spec| spec.handle()).collect();
        for handle in handles {
            let Some(index) = self.position_by_handle(handle) else {
                continue;
            };
            self.specs[index].update(
                dt,
                self.play_speed,
                &mut self.conditions,
                &mut self.stats,
                &mut self.events,
            );
            self.react();
        }
        self.cull();
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Trusted forced removal. Returns true if the spec existed and ended.
    pub fn force_remove_effect(&mut self, handle: EffectHandle) -> bool {
        let Some(index) = self.position_by_handle(handle) else {
            return false;
        };
        let was_active = self.specs[index].is_active();
        self.specs[index].force_remove(&mut self.conditions, &mut self.stats, &mut self.events);
        self.react();
        self.cull();
        was_active
    }

    /// Sourced removal, subject to the spec's veto. Refusal is silent and
    /// leaves all state untouched.
    pub fn remove_effect_from_source(&mut self, handle: EffectHandle, source: &str) -> bool {
        let Some(index) = self.position_by_handle(handle) else {
            return false;
        };
        if !self.specs[index].can_remove_from_source(source) {
            return false;
        }
        self.specs[index].force_remove(&mut self.conditions, &mut self.stats, &mut self.events);
        self.react();
        self.cull();
        true
    }

    /// Remove every active spec declaring any of the given presence tags.
    /// Returns how many were removed.
    pub fn remove_effects_with_tags(&mut self, tags: &[Tag]) -> usize {
        let removed = self.remove_matching(tags);
        self.react();
        self.cull();
        removed
    }

    /// Owner teardown: force-terminate everything, e.g. the target died.
    pub fn force_remove_all(&mut self) {
        for index in 0..self.specs.len() {
            self.specs[index].force_remove(&mut self.conditions, &mut self.stats, &mut self.events);
        }
        self.react();
        self.cull();
    }

    // ------------------------------------------------------------------
    // Level
    // ------------------------------------------------------------------

    /// Change a spec's level. Equal-level requests are ignored by the spec;
    /// returns true if the spec exists.
    pub fn change_level(&mut self, handle: EffectHandle, level: u32) -> bool {
        let Some(index) = self.position_by_handle(handle) else {
            return false;
        };
        self.specs[index].change_level(level, &mut self.stats, &mut self.events);
        true
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn allocate_handle(&mut self) -> EffectHandle {
        let handle = EffectHandle::new(self.next_handle);
        self.next_handle += 1;
        handle
    }

    fn position_by_handle(&self, handle: EffectHandle) -> Option<usize> {
        self.specs.iter().position(|spec| spec.handle() == handle)
    }

    fn position_by_name(&self, name: &str) -> Option<usize> {
        self.specs
            .iter()
            .position(|spec| spec.is_active() && spec.definition().name == name)
    }

    fn remove_matching(&mut self, tags: &[Tag]) -> usize {
        let mut removed = 0;
        for index in 0..self.specs.len() {
            if !self.specs[index].is_active() {
                continue;
            }
            let matches = self.specs[index]
                .definition()
                .tags
                .activation_granted
                .iter()
                .any(|tag| tags.contains(tag));
            if matches {
                self.specs[index].force_remove(
                    &mut self.conditions,
                    &mut self.stats,
                    &mut self.events,
                );
                removed += 1;
            }
        }
        removed
    }

    /// Drain condition-change notifications until no listener has pending
    /// changes, toggling application state wherever a changed tag gates it.
    /// Toggles may grant or revoke further tags; the loop runs those passes
    /// to quiescence within the same call.
    fn react(&mut self) {
        let mut passes = 0;
        while self.conditions.has_pending_changes() {
            passes += 1;
            if passes > MAX_REACT_PASSES {
                warn!(
                    "condition changes did not settle after {} passes; dropping pending notifications",
                    MAX_REACT_PASSES
                );
                self.conditions.clear_pending();
                break;
            }
            for index in 0..self.specs.len() {
                let changed = match self.specs[index].subscription() {
                    Some(subscription) => self.conditions.take_changes(subscription),
                    None => continue,
                };
                if changed.is_empty() {
                    continue;
                }
                let relevant = changed
                    .iter()
                    .any(|tag| self.specs[index].definition().tags.gates_application(tag));
                if relevant {
                    self.specs[index].reapply(
                        &mut self.conditions,
                        &mut self.stats,
                        &mut self.events,
                    );
                }
            }
        }
    }

    /// Move terminated specs out of the live list, keeping the most recent
    /// ones available to [`take_retired`](Self::take_retired).
    fn cull(&mut self) {
        if self.specs.iter().all(|spec| spec.is_active()) {
            return;
        }
        let specs = std::mem::take(&mut self.specs);
        for spec in specs {
            if spec.is_active() {
                self.specs.push(spec);
            } else {
                self.retired.push(spec);
            }
        }
        let overflow = self.retired.len().saturating_sub(RETIRED_CAP);
        self.retired.drain(..overflow);
    }
}
