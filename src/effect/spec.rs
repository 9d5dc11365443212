//! Effect spec lifecycle state machine
//!
//! An [`EffectSpec`] is one live instance of an effect applied to a target.
//! It owns the activation and application state, the timing counters and the
//! condition subscription, and dispatches the behavior hooks. All mutation
//! happens through the owning [`crate::effect::EffectSystem`], which supplies
//! the shared condition set, stat block and event queue.
//!
//! State invariants:
//! - `applied` implies `active`; application never outlives activation.
//! - A subscription exists iff the spec is active and its application gate
//!   depends on any tags. It is consumed on every exit path.
//! - Enter/exit hooks fire exactly once per activation cycle regardless of
//!   which path terminates the spec.

use std::sync::Arc;

use bevy::log::debug;

use crate::effect::behavior::{EffectBehavior, EffectCtx, OverlapRequest, Payload};
use crate::effect::definition::{DurationPolicy, EffectDefinition};
use crate::effect::events::{EffectEvent, EffectEventKind};
use crate::effect::system::StatBlock;
use crate::tags::{Subscription, TagSet};

/// Opaque identity of one live effect instance.
///
/// Handles are allocated by the owning system; constructing one manually is
/// only useful for tests and tooling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectHandle(u64);

impl EffectHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Why a spec is being torn down; selects the finished/canceled hook pair.
#[derive(Clone, Copy, PartialEq, Eq)]
enum EndReason {
    Finished,
    Canceled,
}

/// One live effect instance. See the module docs for the state invariants.
pub struct EffectSpec {
    definition: Arc<EffectDefinition>,
    handle: EffectHandle,
    level: u32,
    payload: Payload,
    behavior: Box<dyn EffectBehavior>,
    active: bool,
    applied: bool,
    elapsed_time: f32,
    remaining_time: f32,
    subscription: Option<Subscription>,
}

impl EffectSpec {
    pub fn new(
        definition: Arc<EffectDefinition>,
        handle: EffectHandle,
        level: u32,
        payload: Payload,
        behavior: Box<dyn EffectBehavior>,
    ) -> Self {
        Self {
            definition,
            handle,
            level,
            payload,
            behavior,
            active: false,
            applied: false,
            elapsed_time: 0.0,
            remaining_time: 0.0,
            subscription: None,
        }
    }

    /// Reinitialize a retired instance for reuse by an external recycler.
    ///
    /// The spec must be inactive; its definition and behavior are kept.
    pub fn setup(&mut self, level: u32, payload: Payload) {
        debug_assert!(!self.active, "setup() on an active spec");
        debug_assert!(self.subscription.is_none());
        self.level = level;
        self.payload = payload;
        self.applied = false;
        self.elapsed_time = 0.0;
        self.remaining_time = 0.0;
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn definition(&self) -> &EffectDefinition {
        &self.definition
    }

    pub fn definition_arc(&self) -> &Arc<EffectDefinition> {
        &self.definition
    }

    pub fn handle(&self) -> EffectHandle {
        self.handle
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    pub fn remaining_time(&self) -> f32 {
        self.remaining_time
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub(crate) fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    pub(crate) fn assign_handle(&mut self, handle: EffectHandle) {
        self.handle = handle;
    }

    /// Decompose a never-activated spec into the parts an overlap request
    /// carries to the already-running instance.
    pub(crate) fn into_overlap_parts(self) -> (u32, Payload) {
        (self.level, self.payload)
    }

    // ------------------------------------------------------------------
    // Gates
    // ------------------------------------------------------------------

    /// The already-running check, distinct from the tag gate. Lets callers
    /// tell "blocked by conditions" apart from "already active".
    pub fn can_take_effect(&self) -> bool {
        !self.active
    }

    /// Activation gate: all required tags held, no blocked tag held.
    pub fn can_activate(&self, conditions: &TagSet) -> bool {
        let tags = &self.definition.tags;
        if !tags.activation_required.is_empty() && !conditions.contains_all(&tags.activation_required)
        {
            return false;
        }
        if !tags.activation_blocked.is_empty() && conditions.contains_any(&tags.activation_blocked) {
            return false;
        }
        true
    }

    /// Application gate: same two-list law over the application lists.
    pub fn can_apply(&self, conditions: &TagSet) -> bool {
        let tags = &self.definition.tags;
        if !tags.application_required.is_empty()
            && !conditions.contains_all(&tags.application_required)
        {
            return false;
        }
        if !tags.application_blocked.is_empty() && conditions.contains_any(&tags.application_blocked)
        {
            return false;
        }
        true
    }

    /// Removal veto for a sourced removal request. Refusal is silent.
    pub fn can_remove_from_source(&self, source: &str) -> bool {
        self.definition.dispellable || self.behavior.can_remove_from_source(source)
    }

    pub fn can_overlap(&self, incoming: &OverlapRequest) -> bool {
        self.behavior.can_overlap(incoming)
    }

    // ------------------------------------------------------------------
    // Transitions (driven by the owning system)
    // ------------------------------------------------------------------

    /// Turn the spec on. The caller has already checked both the
    /// already-running and the activation gate.
    pub(crate) fn activate(
        &mut self,
        conditions: &mut TagSet,
        stats: &mut StatBlock,
        events: &mut Vec<EffectEvent>,
    ) {
        debug_assert!(!self.active);
        self.active = true;
        self.applied = false;
        self.elapsed_time = 0.0;
        self.remaining_time = self.definition.duration;

        // Grant presence tags before subscribing so the spec does not get
        // notified about its own activation grant.
        conditions.add_all(&self.definition.tags.activation_granted);
        if self.definition.tags.reacts_to_conditions() {
            self.subscription = Some(conditions.subscribe());
        }

        debug!("effect '{}' activated", self.definition.name);
        self.with_behavior(stats, |behavior, ctx| behavior.on_enter(ctx));
        self.push_event(events, EffectEventKind::Activated);

        if self.can_apply(conditions) {
            self.set_applied(true, conditions, stats, events);
        }

        if self.definition.duration_policy == DurationPolicy::Instant {
            self.end(conditions, stats, events);
        }
    }

    /// Re-evaluate the application gate and converge `applied` onto it.
    /// Level-triggered: called whenever a gating tag changes.
    pub(crate) fn reapply(
        &mut self,
        conditions: &mut TagSet,
        stats: &mut StatBlock,
        events: &mut Vec<EffectEvent>,
    ) {
        if !self.active {
            return;
        }
        let can_apply = self.can_apply(conditions);
        if can_apply != self.applied {
            self.set_applied(can_apply, conditions, stats, events);
        }
    }

    /// Advance time and run the per-tick hook. `dt` is the raw frame delta;
    /// play-speed scaling happens here unless the definition opts out.
    pub(crate) fn update(
        &mut self,
        dt: f32,
        play_speed: f32,
        conditions: &mut TagSet,
        stats: &mut StatBlock,
        events: &mut Vec<EffectEvent>,
    ) {
        if !self.active {
            return;
        }
        let dt = if self.definition.unscaled_time {
            dt
        } else {
            dt * play_speed
        };

        let timer_runs = self.applied || self.definition.timer_while_suppressed;
        match self.definition.duration_policy {
            // Instants never reach the update list; defensive.
            DurationPolicy::Instant => return,
            DurationPolicy::Duration if timer_runs => {
                self.elapsed_time += dt;
                self.remaining_time -= dt;
                // Expiry takes priority over this frame's tick hook.
                if self.remaining_time <= 0.0 {
                    self.end(conditions, stats, events);
                    return;
                }
            }
            DurationPolicy::Infinite if timer_runs => {
                self.elapsed_time += dt;
            }
            _ => {}
        }

        if self.applied {
            self.with_behavior(stats, |behavior, ctx| behavior.on_tick(dt, ctx));
        }
    }

    /// Natural end. No-op if already inactive.
    pub(crate) fn end(
        &mut self,
        conditions: &mut TagSet,
        stats: &mut StatBlock,
        events: &mut Vec<EffectEvent>,
    ) {
        if !self.active {
            return;
        }
        debug!("effect '{}' finished", self.definition.name);
        self.teardown(EndReason::Finished, conditions, stats, events);
    }

    /// Forced removal. No-op if already inactive.
    pub(crate) fn force_remove(
        &mut self,
        conditions: &mut TagSet,
        stats: &mut StatBlock,
        events: &mut Vec<EffectEvent>,
    ) {
        if !self.active {
            return;
        }
        debug!("effect '{}' force-removed", self.definition.name);
        self.teardown(EndReason::Canceled, conditions, stats, events);
    }

    /// Unconditional overlap consequence, without the gate check.
    pub(crate) fn force_overlap(
        &mut self,
        incoming: &OverlapRequest,
        stats: &mut StatBlock,
        events: &mut Vec<EffectEvent>,
    ) {
        self.with_behavior(stats, |behavior, ctx| behavior.on_overlap(incoming, ctx));
        self.push_event(events, EffectEventKind::Overlapped);
    }

    /// Gate plus consequence; reports whether the overlap happened.
    pub(crate) fn try_overlap(
        &mut self,
        incoming: &OverlapRequest,
        stats: &mut StatBlock,
        events: &mut Vec<EffectEvent>,
    ) -> bool {
        if !self.can_overlap(incoming) {
            return false;
        }
        self.force_overlap(incoming, stats, events);
        true
    }

    /// Level mutation. Equal-level requests are ignored; gates are never
    /// re-run on a level change.
    pub(crate) fn change_level(
        &mut self,
        level: u32,
        stats: &mut StatBlock,
        events: &mut Vec<EffectEvent>,
    ) {
        if self.level == level {
            return;
        }
        let prev_level = self.level;
        self.level = level;
        self.with_behavior(stats, |behavior, ctx| {
            behavior.on_level_changed(level, prev_level, ctx)
        });
        self.push_event(
            events,
            EffectEventKind::LevelChanged {
                new_level: level,
                prev_level,
            },
        );
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn set_applied(
        &mut self,
        applied: bool,
        conditions: &mut TagSet,
        stats: &mut StatBlock,
        events: &mut Vec<EffectEvent>,
    ) {
        if self.applied == applied {
            return;
        }
        self.applied = applied;
        if applied {
            debug_assert!(self.active, "applied without active");
            conditions.add_all(&self.definition.tags.application_granted);
            self.with_behavior(stats, |behavior, ctx| behavior.on_apply(ctx));
            self.push_event(events, EffectEventKind::Applied);
        } else {
            conditions.remove_all(&self.definition.tags.application_granted);
            self.with_behavior(stats, |behavior, ctx| behavior.on_ignore(ctx));
            self.push_event(events, EffectEventKind::Ignored);
        }
    }

    /// The single exit routine all termination paths converge on. Leaves the
    /// spec fully detached: tags revoked, subscription consumed, hooks fired.
    fn teardown(
        &mut self,
        reason: EndReason,
        conditions: &mut TagSet,
        stats: &mut StatBlock,
        events: &mut Vec<EffectEvent>,
    ) {
        self.active = false;

        conditions.remove_all(&self.definition.tags.activation_granted);
        if self.applied {
            self.applied = false;
            conditions.remove_all(&self.definition.tags.application_granted);
            self.with_behavior(stats, |behavior, ctx| behavior.on_ignore(ctx));
        }
        if let Some(subscription) = self.subscription.take() {
            conditions.unsubscribe(subscription);
        }

        match reason {
            EndReason::Finished => {
                self.with_behavior(stats, |behavior, ctx| behavior.on_finish(ctx));
            }
            EndReason::Canceled => {
                self.with_behavior(stats, |behavior, ctx| behavior.on_cancel(ctx));
            }
        }
        self.with_behavior(stats, |behavior, ctx| behavior.on_exit(ctx));

        self.push_event(
            events,
            match reason {
                EndReason::Finished => EffectEventKind::Finished,
                EndReason::Canceled => EffectEventKind::Canceled,
            },
        );
        self.push_event(events, EffectEventKind::Ended);
    }

    /// Split-borrow helper: hands the behavior a context over the rest of the
    /// spec's fields without aliasing the behavior box itself.
    fn with_behavior<F>(&mut self, stats: &mut StatBlock, f: F)
    where
        F: FnOnce(&mut dyn EffectBehavior, &mut EffectCtx),
    {
        let Self {
            definition,
            handle,
            level,
            payload,
            behavior,
            applied,
            elapsed_time,
            remaining_time,
            ..
        } = self;
        let mut ctx = EffectCtx {
            definition: &**definition,
            handle: *handle,
            level: *level,
            is_applied: *applied,
            elapsed_time,
            remaining_time,
            stats,
            payload,
        };
        f(behavior.as_mut(), &mut ctx);
    }

    fn push_event(&self, events: &mut Vec<EffectEvent>, kind: EffectEventKind) {
        events.push(EffectEvent {
            handle: self.handle,
            effect: self.definition.name.clone(),
            kind,
        });
    }
}
