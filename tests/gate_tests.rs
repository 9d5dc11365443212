//! Gate correctness tests
//!
//! Verifies the required/blocked tag laws for both the activation gate and
//! the application gate, and that `is_applied` implies `is_active` after
//! every public operation.

mod common;

use common::{definition, shared, tag_list};
use effectsim::{ApplyOutcome, DurationPolicy, EffectEventKind, EffectSystem, Tag};

#[test]
fn activation_requires_all_required_tags() {
    let mut system = EffectSystem::new();
    let mut def = definition("war_cry", DurationPolicy::Infinite);
    def.tags.activation_required = tag_list(&["stance.battle", "weapon.drawn"]);
    let def = shared(def);

    assert_eq!(
        system.try_apply_effect(def.clone(), 0, None),
        ApplyOutcome::BlockedByGate
    );

    system.add_condition(Tag::new("stance.battle"));
    assert_eq!(
        system.try_apply_effect(def.clone(), 0, None),
        ApplyOutcome::BlockedByGate
    );

    system.add_condition(Tag::new("weapon.drawn"));
    assert!(system.try_apply_effect(def, 0, None).succeeded());
}

#[test]
fn activation_blocked_by_any_blocked_tag() {
    let mut system = EffectSystem::new();
    let mut def = definition("sprint", DurationPolicy::Infinite);
    def.tags.activation_blocked = tag_list(&["status.rooted", "status.stunned"]);
    let def = shared(def);

    system.add_condition(Tag::new("status.stunned"));
    assert_eq!(
        system.try_apply_effect(def.clone(), 0, None),
        ApplyOutcome::BlockedByGate
    );

    system.remove_condition(&Tag::new("status.stunned"));
    assert!(system.try_apply_effect(def, 0, None).succeeded());
}

#[test]
fn empty_gate_lists_always_pass() {
    let mut system = EffectSystem::new();
    let def = shared(definition("blessing", DurationPolicy::Infinite));

    let outcome = system.try_apply_effect(def, 0, None);
    let ApplyOutcome::Activated(handle) = outcome else {
        panic!("expected activation, got {:?}", outcome);
    };

    let spec = system.get(handle).unwrap();
    assert!(spec.is_active());
    // No application gate lists: applied immediately, no subscription needed.
    assert!(spec.is_applied());
    assert!(!spec.is_subscribed());
}

#[test]
fn application_gate_suppresses_until_required_tag_held() {
    let mut system = EffectSystem::new();
    let mut def = definition("stone_skin", DurationPolicy::Infinite);
    def.tags.application_required = tag_list(&["status.grounded"]);
    let def = shared(def);

    let ApplyOutcome::Activated(handle) = system.try_apply_effect(def, 0, None) else {
        panic!("expected activation");
    };

    let spec = system.get(handle).unwrap();
    assert!(spec.is_active());
    assert!(!spec.is_applied());
    assert!(spec.is_subscribed());

    system.add_condition(Tag::new("status.grounded"));
    assert!(system.get(handle).unwrap().is_applied());

    system.remove_condition(&Tag::new("status.grounded"));
    assert!(!system.get(handle).unwrap().is_applied());
}

#[test]
fn application_gate_blocked_tag_suppresses() {
    let mut system = EffectSystem::new();
    let mut def = definition("regeneration", DurationPolicy::Infinite);
    def.tags.application_blocked = tag_list(&["status.burning"]);
    let def = shared(def);

    let ApplyOutcome::Activated(handle) = system.try_apply_effect(def, 0, None) else {
        panic!("expected activation");
    };
    assert!(system.get(handle).unwrap().is_applied());

    system.add_condition(Tag::new("status.burning"));
    assert!(!system.get(handle).unwrap().is_applied());

    system.remove_condition(&Tag::new("status.burning"));
    assert!(system.get(handle).unwrap().is_applied());
}

#[test]
fn applied_implies_active_after_every_operation() {
    let mut system = EffectSystem::new();
    let mut def = definition("ward", DurationPolicy::Duration).with_duration(2.0);
    def.tags.application_required = tag_list(&["status.channeling"]);
    let def = shared(def);

    let check = |system: &EffectSystem| {
        for spec in system.iter() {
            assert!(!spec.is_applied() || spec.is_active());
        }
    };

    let ApplyOutcome::Activated(handle) = system.try_apply_effect(def, 1, None) else {
        panic!("expected activation");
    };
    check(&system);

    system.add_condition(Tag::new("status.channeling"));
    check(&system);

    system.update(0.5);
    check(&system);

    system.change_level(handle, 3);
    check(&system);

    system.remove_condition(&Tag::new("status.channeling"));
    check(&system);

    system.force_remove_effect(handle);
    check(&system);
}

#[test]
fn second_activation_rejected_by_default() {
    let mut system = EffectSystem::new();
    let def = shared(definition("haste", DurationPolicy::Infinite));

    let first = system.try_apply_effect(def.clone(), 0, None);
    let ApplyOutcome::Activated(handle) = first else {
        panic!("expected activation");
    };

    assert_eq!(
        system.try_apply_effect(def, 0, None),
        ApplyOutcome::AlreadyActive(handle)
    );
    assert_eq!(system.len(), 1);
}

#[test]
fn gate_rejection_emits_no_events() {
    let mut system = EffectSystem::new();
    let mut def = definition("war_cry", DurationPolicy::Infinite);
    def.tags.activation_required = tag_list(&["stance.battle"]);

    assert_eq!(
        system.try_apply_effect(shared(def), 0, None),
        ApplyOutcome::BlockedByGate
    );
    assert!(system.take_events().is_empty());
}

#[test]
fn activation_event_precedes_applied_event() {
    let mut system = EffectSystem::new();
    let def = shared(definition("blessing", DurationPolicy::Infinite));
    system.try_apply_effect(def, 0, None);

    let kinds: Vec<EffectEventKind> = system.take_events().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EffectEventKind::Activated, EffectEventKind::Applied]
    );
}
