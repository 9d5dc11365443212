//! Public lifecycle notifications
//!
//! Observable side effects for UI/VFX/analytics consumers. Events are queued
//! on the owning [`crate::effect::EffectSystem`] and drained with
//! `take_events`; the Bevy plugin forwards them as `EffectHostEvent`s.

use crate::effect::spec::EffectHandle;

/// One lifecycle notification emitted by an effect spec.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectEvent {
    pub handle: EffectHandle,
    /// Definition name of the effect that emitted the event.
    pub effect: String,
    pub kind: EffectEventKind,
}

/// What happened. `Ended` is always the last event an effect emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectEventKind {
    Activated,
    /// The application gate passed; consequences are now in force.
    Applied,
    /// The application gate failed; consequences are suppressed.
    Ignored,
    Overlapped,
    LevelChanged { new_level: u32, prev_level: u32 },
    /// Natural end: duration exhausted or instant effect completed.
    Finished,
    /// Forced removal.
    Canceled,
    /// Generic termination, emitted after `Finished` or `Canceled`.
    Ended,
}

impl EffectEvent {
    /// True for the terminal `Ended` notification.
    pub fn is_ended(&self) -> bool {
        self.kind == EffectEventKind::Ended
    }
}
