//! Overlap, level-change and removal reconciliation tests

mod common;

use common::{definition, shared, tag_list, Hook, Recording};
use effectsim::{
    ApplyOutcome, BehaviorConfig, DurationPolicy, EffectEventKind, EffectSystem, Tag,
};

#[test]
fn overlap_allowed_behavior_absorbs_second_request() {
    let mut system = EffectSystem::new();
    let (mut behavior, record) = Recording::new();
    behavior.allow_overlap = true;
    let def = shared(definition("fury", DurationPolicy::Infinite));

    let ApplyOutcome::Activated(handle) =
        system.try_apply_effect_with(def.clone(), behavior, 0, None)
    else {
        panic!("expected activation");
    };

    assert_eq!(
        system.try_apply_effect(def, 2, None),
        ApplyOutcome::Overlapped(handle)
    );
    assert_eq!(system.len(), 1);
    assert_eq!(record.lock().unwrap().count(Hook::Overlap), 1);

    let kinds: Vec<EffectEventKind> = system.take_events().iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&EffectEventKind::Overlapped));
}

#[test]
fn stacking_behavior_refreshes_and_caps() {
    let mut system = EffectSystem::new();
    let def = shared(
        definition("battle_fury", DurationPolicy::Duration)
            .with_duration(10.0)
            .with_behavior(BehaviorConfig::Stacking {
                stat: "attack_power".to_string(),
                bonus_per_stack: 15.0,
                max_stacks: 2,
            }),
    );

    let ApplyOutcome::Activated(handle) = system.try_apply_effect(def.clone(), 0, None) else {
        panic!("expected activation");
    };
    assert_eq!(system.stats().get("attack_power"), 15.0);

    system.update(4.0);
    assert!(system.get(handle).unwrap().remaining_time() < 10.0);

    // Second stack: deeper bonus, duration refreshed.
    assert_eq!(
        system.try_apply_effect(def.clone(), 0, None),
        ApplyOutcome::Overlapped(handle)
    );
    assert_eq!(system.stats().get("attack_power"), 30.0);
    assert_eq!(system.get(handle).unwrap().remaining_time(), 10.0);

    // Stack cap reached: further requests are rejected.
    assert_eq!(
        system.try_apply_effect(def, 0, None),
        ApplyOutcome::AlreadyActive(handle)
    );

    // Expiry reverts the whole stacked contribution.
    system.update(10.0);
    assert!(system.get(handle).is_none());
    assert_eq!(system.stats().get("attack_power"), 0.0);
}

#[test]
fn stat_modifier_follows_level_changes() {
    let mut system = EffectSystem::new();
    let def = shared(
        definition("might", DurationPolicy::Infinite).with_behavior(BehaviorConfig::StatModifier {
            stat: "power".to_string(),
            amount: 10.0,
        }),
    );

    let ApplyOutcome::Activated(handle) = system.try_apply_effect(def, 0, None) else {
        panic!("expected activation");
    };
    assert_eq!(system.stats().get("power"), 10.0);

    assert!(system.change_level(handle, 2));
    assert_eq!(system.get(handle).unwrap().level(), 2);
    assert_eq!(system.stats().get("power"), 30.0);

    let events = system.take_events();
    assert!(events.iter().any(|e| matches!(
        e.kind,
        EffectEventKind::LevelChanged {
            new_level: 2,
            prev_level: 0
        }
    )));

    // Equal-level request is ignored: no event, no hook.
    system.change_level(handle, 2);
    assert!(system.take_events().is_empty());

    system.force_remove_effect(handle);
    assert_eq!(system.stats().get("power"), 0.0);
}

#[test]
fn level_change_does_not_rerun_gates() {
    let mut system = EffectSystem::new();
    let mut def = definition("gated", DurationPolicy::Infinite);
    def.tags.application_required = tag_list(&["status.focus"]);

    let ApplyOutcome::Activated(handle) = system.try_apply_effect(shared(def), 0, None) else {
        panic!("expected activation");
    };
    assert!(!system.get(handle).unwrap().is_applied());

    system.change_level(handle, 5);
    assert!(!system.get(handle).unwrap().is_applied());
    assert!(system.get(handle).unwrap().is_active());
}

#[test]
fn sourced_removal_respects_veto() {
    let mut system = EffectSystem::new();
    let (mut behavior, record) = Recording::new();
    behavior.removable_sources = vec!["dispel".to_string()];
    let def = shared(definition("hex", DurationPolicy::Infinite));

    let ApplyOutcome::Activated(handle) = system.try_apply_effect_with(def, behavior, 0, None)
    else {
        panic!("expected activation");
    };

    // Refusal is silent: no state change, no events.
    system.take_events();
    assert!(!system.remove_effect_from_source(handle, "steal"));
    assert!(system.get(handle).is_some());
    assert!(system.take_events().is_empty());

    assert!(system.remove_effect_from_source(handle, "dispel"));
    assert!(system.get(handle).is_none());
    assert_eq!(record.lock().unwrap().count(Hook::Cancel), 1);
}

#[test]
fn dispellable_definition_skips_behavior_veto() {
    let mut system = EffectSystem::new();
    let mut def = definition("weak_curse", DurationPolicy::Infinite);
    def.dispellable = true;

    let ApplyOutcome::Activated(handle) = system.try_apply_effect(shared(def), 0, None) else {
        panic!("expected activation");
    };
    assert!(system.remove_effect_from_source(handle, "anything"));
}

#[test]
fn activation_clears_conflicting_effects_first() {
    let mut system = EffectSystem::new();

    let mut poison = definition("poison", DurationPolicy::Infinite);
    poison.tags.activation_granted = tag_list(&["effect.poison"]);
    let ApplyOutcome::Activated(poison_handle) = system.try_apply_effect(shared(poison), 0, None)
    else {
        panic!("expected activation");
    };
    system.take_events();

    let mut antidote = definition("antidote", DurationPolicy::Instant);
    antidote.tags.remove_effects_with = tag_list(&["effect.poison"]);
    system.try_apply_effect(shared(antidote), 0, None);

    assert!(system.get(poison_handle).is_none());
    assert!(!system.conditions().contains(&Tag::new("effect.poison")));

    // The conflicting effect ends before the new one activates.
    let events = system.take_events();
    let canceled = events
        .iter()
        .position(|e| e.effect == "poison" && e.kind == EffectEventKind::Canceled)
        .unwrap();
    let activated = events
        .iter()
        .position(|e| e.effect == "antidote" && e.kind == EffectEventKind::Activated)
        .unwrap();
    assert!(canceled < activated);
}

#[test]
fn remove_effects_with_tags_matches_presence_tags() {
    let mut system = EffectSystem::new();

    let mut burn = definition("burn", DurationPolicy::Infinite);
    burn.tags.activation_granted = tag_list(&["effect.fire"]);
    let mut scorch = definition("scorch", DurationPolicy::Infinite);
    scorch.tags.activation_granted = tag_list(&["effect.fire"]);
    let chill = definition("chill", DurationPolicy::Infinite);

    system.try_apply_effect(shared(burn), 0, None);
    system.try_apply_effect(shared(scorch), 0, None);
    system.try_apply_effect(shared(chill), 0, None);
    assert_eq!(system.len(), 3);

    let removed = system.remove_effects_with_tags(&[Tag::new("effect.fire")]);
    assert_eq!(removed, 2);
    assert_eq!(system.len(), 1);
    assert!(system.has_effect("chill"));
}

#[test]
fn force_remove_all_tears_everything_down() {
    let mut system = EffectSystem::new();
    let mut def_a = definition("a", DurationPolicy::Infinite);
    def_a.tags.activation_granted = tag_list(&["effect.a"]);
    let mut def_b = definition("b", DurationPolicy::Duration);
    def_b.duration = 5.0;
    def_b.tags.application_granted = tag_list(&["status.b"]);

    system.try_apply_effect(shared(def_a), 0, None);
    system.try_apply_effect(shared(def_b), 0, None);
    assert_eq!(system.len(), 2);

    system.force_remove_all();
    assert!(system.is_empty());
    assert!(system.conditions().is_empty());

    let ended = system
        .take_events()
        .iter()
        .filter(|e| e.is_ended())
        .count();
    assert_eq!(ended, 2);
}
