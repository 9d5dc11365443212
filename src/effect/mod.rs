//! Effect lifecycle core
//!
//! Everything needed to model timed, conditionally-active gameplay effects:
//! static definitions, the per-instance lifecycle state machine, the
//! per-target owner, behavior dispatch and lifecycle notifications.

pub mod behavior;
pub mod behaviors;
pub mod definition;
pub mod events;
pub mod library;
pub mod spec;
pub mod system;

pub use behavior::{EffectBehavior, EffectCtx, Inert, OverlapRequest, Payload};
pub use behaviors::BehaviorConfig;
pub use definition::{DurationPolicy, EffectDefinition, EffectTagSets};
pub use events::{EffectEvent, EffectEventKind};
pub use library::EffectLibrary;
pub use spec::{EffectHandle, EffectSpec};
pub use system::{ApplyOutcome, EffectSystem, StatBlock};
