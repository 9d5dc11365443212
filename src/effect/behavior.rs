//! Effect behavior trait
//!
//! The lifecycle state machine is behavior-agnostic: what an effect actually
//! does when it enters, applies, ticks or ends is supplied by an
//! [`EffectBehavior`] implementation held by the spec and dispatched
//! polymorphically. Every hook has a no-op default so a behavior implements
//! only what it cares about.

use std::any::Any;

use crate::effect::definition::EffectDefinition;
use crate::effect::spec::EffectHandle;
use crate::effect::system::StatBlock;

/// Caller-supplied opaque context carried by a live effect (e.g. source,
/// magnitude). Behaviors downcast it as needed.
pub type Payload = Option<Box<dyn Any + Send + Sync>>;

/// Mutable view of a live effect handed to behavior hooks.
///
/// Exposes the spec's timing counters mutably so overlap consequences can
/// refresh them, plus the owner's stat block for concrete gameplay math.
pub struct EffectCtx<'a> {
    pub definition: &'a EffectDefinition,
    pub handle: EffectHandle,
    pub level: u32,
    /// Snapshot of the application state at hook time.
    pub is_applied: bool,
    pub elapsed_time: &'a mut f32,
    pub remaining_time: &'a mut f32,
    pub stats: &'a mut StatBlock,
    pub payload: &'a mut Payload,
}

/// A second application attempt for an effect that is already present on the
/// owner, offered to the live instance for reconciliation.
pub struct OverlapRequest {
    pub level: u32,
    pub payload: Payload,
}

/// Effect-type-specific hooks, dispatched by the lifecycle state machine.
///
/// Hook guarantees (enforced by the state machine, not the behavior):
/// - `on_enter` fires exactly once per successful activation and `on_exit`
///   exactly once per termination, whichever path ends the effect.
/// - `on_apply`/`on_ignore` bracket every applied interval; an effect that
///   ends while applied receives `on_ignore` before `on_exit`.
/// - `on_tick` runs only while applied, after time has advanced, and never on
///   the frame the effect expires.
/// - `on_finish` precedes `on_exit` on natural expiry; `on_cancel` precedes
///   it on forced removal.
pub trait EffectBehavior: Send + Sync {
    fn on_enter(&mut self, _ctx: &mut EffectCtx) {}
    fn on_exit(&mut self, _ctx: &mut EffectCtx) {}
    fn on_apply(&mut self, _ctx: &mut EffectCtx) {}
    fn on_ignore(&mut self, _ctx: &mut EffectCtx) {}
    fn on_tick(&mut self, _dt: f32, _ctx: &mut EffectCtx) {}
    fn on_finish(&mut self, _ctx: &mut EffectCtx) {}
    fn on_cancel(&mut self, _ctx: &mut EffectCtx) {}
    fn on_level_changed(&mut self, _new_level: u32, _prev_level: u32, _ctx: &mut EffectCtx) {}

    /// Overlap consequence, e.g. add a stack or refresh the timer. Only
    /// called via the force/try overlap paths.
    fn on_overlap(&mut self, _incoming: &OverlapRequest, _ctx: &mut EffectCtx) {}

    /// Overlap gate. Default: a second instance is rejected outright.
    fn can_overlap(&self, _incoming: &OverlapRequest) -> bool {
        false
    }

    /// Removal veto for sourced removal requests. Default: not removable.
    fn can_remove_from_source(&self, _source: &str) -> bool {
        false
    }
}

/// Behavior with no consequences of its own; the effect is pure tag state.
pub struct Inert;

impl EffectBehavior for Inert {}
