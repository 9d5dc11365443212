//! Bevy integration
//!
//! Attaches an [`EffectSystem`] to an entity via the [`EffectHost`]
//! component. The plugin ticks every host from `Res<Time>` each frame and
//! forwards drained lifecycle notifications as [`EffectHostEvent`] Bevy
//! events.

use bevy::prelude::*;

use crate::effect::{EffectEvent, EffectSystem};

/// Component carrying one per-target effect system.
#[derive(Component, Default)]
pub struct EffectHost {
    pub system: EffectSystem,
}

impl EffectHost {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A lifecycle notification from one host entity.
#[derive(Event, Debug, Clone)]
pub struct EffectHostEvent {
    pub host: Entity,
    pub event: EffectEvent,
}

/// Adds per-frame effect updates and host event forwarding.
pub struct EffectSystemPlugin;

impl Plugin for EffectSystemPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<EffectHostEvent>()
            .add_systems(Update, update_effect_hosts);
    }
}

/// Tick every effect host by this frame's delta and forward its events.
pub fn update_effect_hosts(
    time: Res<Time>,
    mut hosts: Query<(Entity, &mut EffectHost)>,
    mut events: EventWriter<EffectHostEvent>,
) {
    let dt = time.delta_secs();
    for (entity, mut host) in hosts.iter_mut() {
        host.system.update(dt);
        for event in host.system.take_events() {
            events.send(EffectHostEvent {
                host: entity,
                event,
            });
        }
    }
}
