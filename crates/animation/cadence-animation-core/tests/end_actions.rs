use cadence_animation_core::{
    AnimationEvent, AnimationId, AnimatorCfg, Config, EndAction, Engine, OwnerId, PropertyKey,
    PropertyTable, Value,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn float_of(v: Option<&Value>) -> f32 {
    v.and_then(Value::as_float).expect("float property")
}

struct Scene {
    engine: Engine,
    table: PropertyTable,
    owner: OwnerId,
    key: PropertyKey,
    id: AnimationId,
}

/// A 1s animation driving a float from 0 to 10.
fn scene(cfg: Config) -> Scene {
    let mut table = PropertyTable::new();
    let owner = table.add_owner();
    let key = table.register(owner, Value::f(0.0)).unwrap();
    let mut engine = Engine::new(cfg);
    let id = engine.create_animation(1.0);
    engine
        .animation_mut(id)
        .unwrap()
        .animate_to(key.into(), Value::f(10.0), AnimatorCfg::default(), &table)
        .unwrap();
    Scene {
        engine,
        table,
        owner,
        key,
        id,
    }
}

/// Play to half way, stop, and run the tick that applies the end action.
fn stop_halfway(action: EndAction) -> (Scene, Vec<AnimationEvent>) {
    let mut s = scene(Config::default());
    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.set_end_action(action);
    anim.play();
    s.engine.update(500.0, &mut s.table);
    approx(float_of(s.table.current(s.key)), 5.0, 1e-4);

    s.engine.animation_mut(s.id).unwrap().stop();
    let events = s.engine.update(16.0, &mut s.table).events.clone();
    (s, events)
}

/// it should keep the half-way value when baking on stop
#[test]
fn stop_with_bake_keeps_current_value() {
    let (s, events) = stop_halfway(EndAction::Bake);
    assert_eq!(events, vec![AnimationEvent::Finished { animation: s.id }]);
    approx(float_of(s.table.base(s.key)), 5.0, 1e-4);
    approx(float_of(s.table.current(s.key)), 5.0, 1e-4);
    assert_eq!(s.engine.animation(s.id).unwrap().played_count(), 1);
}

/// it should jump to the target when baking the final value on stop
#[test]
fn stop_with_bake_final_jumps_to_target() {
    let (s, events) = stop_halfway(EndAction::BakeFinal);
    assert_eq!(events.len(), 1);
    assert_eq!(s.table.base(s.key), Some(&Value::f(10.0)));
    assert_eq!(s.table.current(s.key), Some(&Value::f(10.0)));
}

/// it should restore the original value when discarding on stop
#[test]
fn stop_with_discard_restores_original() {
    let (mut s, events) = stop_halfway(EndAction::Discard);
    assert_eq!(events.len(), 1);
    assert_eq!(s.table.base(s.key), Some(&Value::f(0.0)));
    assert_eq!(s.table.current(s.key), Some(&Value::f(0.0)));

    // Held for a second frame, then idle.
    let out = s.engine.update(16.0, &mut s.table);
    assert!(!out.needs_update);
    assert_eq!(s.table.current(s.key), Some(&Value::f(0.0)));
}

/// it should discard at natural completion too
#[test]
fn natural_end_with_discard() {
    let mut s = scene(Config::default());
    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.set_end_action(EndAction::Discard);
    anim.play();
    s.engine.update(1000.0, &mut s.table);
    assert_eq!(s.table.current(s.key), Some(&Value::f(10.0)));

    let out = s.engine.update(16.0, &mut s.table);
    assert!(out.finished(s.id));
    assert!(out.needs_update);
    assert_eq!(s.table.current(s.key), Some(&Value::f(0.0)));
}

/// it should not deliver Finished for a cleared animation, but still bake
#[test]
fn clear_bakes_without_finishing() {
    let mut s = scene(Config::default());
    s.engine.animation_mut(s.id).unwrap().play();
    s.engine.update(250.0, &mut s.table);

    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.clear();
    assert_eq!(anim.animator_count(), 0);
    assert!(anim.target_value(s.key).is_none());

    let out = s.engine.update(16.0, &mut s.table);
    assert!(out.events.is_empty());
    approx(float_of(s.table.base(s.key)), 2.5, 1e-4);
}

/// it should let later animations start from a baked value
#[test]
fn baked_value_becomes_the_next_start() {
    let mut s = scene(Config::default());
    s.engine.animation_mut(s.id).unwrap().play();
    s.engine.update(1000.0, &mut s.table);
    s.engine.update(16.0, &mut s.table);
    assert_eq!(s.table.base(s.key), Some(&Value::f(10.0)));

    let next = s.engine.create_animation(1.0);
    let anim = s.engine.animation_mut(next).unwrap();
    anim.animate_by(s.key.into(), Value::f(5.0), AnimatorCfg::default(), &s.table)
        .unwrap();
    assert_eq!(anim.target_value(s.key), Some(&Value::f(15.0)));
    anim.play();
    s.engine.update(500.0, &mut s.table);
    approx(float_of(s.table.current(s.key)), 12.5, 1e-4);
}

/// it should apply the disconnect action when the owner leaves the scene
#[test]
fn disconnect_bakes_current_value_then_freezes() {
    let mut s = scene(Config::default());
    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.set_disconnect_action(EndAction::Bake);
    anim.play();
    s.engine.update(250.0, &mut s.table);

    s.engine.notify_owner_disconnected(s.owner);
    let out = s.engine.update(250.0, &mut s.table);
    assert_eq!(out.animators_applied, 0);
    approx(float_of(s.table.base(s.key)), 2.5, 1e-4);
    assert!(s.engine.animation(s.id).unwrap().animators()[0].is_detached());

    s.engine.update(250.0, &mut s.table);
    approx(float_of(s.table.current(s.key)), 2.5, 1e-4);
}

/// it should jump to the final value on disconnect by default
#[test]
fn disconnect_default_is_bake_final() {
    let mut s = scene(Config::default());
    s.engine.animation_mut(s.id).unwrap().play();
    s.engine.update(250.0, &mut s.table);

    s.table.set_connected(s.owner, false);
    s.engine.update(16.0, &mut s.table);
    assert_eq!(s.table.base(s.key), Some(&Value::f(10.0)));
}

/// it should resume a reconnected owner from where it froze
#[test]
fn reconnect_resumes_from_frozen_progress() {
    let mut s = scene(Config::default());
    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.set_disconnect_action(EndAction::Discard);
    anim.play();
    s.engine.update(250.0, &mut s.table);

    s.engine.notify_owner_disconnected(s.owner);
    s.engine.update(250.0, &mut s.table);
    assert_eq!(s.table.current(s.key), Some(&Value::f(0.0)));

    s.engine.notify_owner_connected(s.owner);
    s.engine.update(0.0, &mut s.table);
    approx(float_of(s.table.current(s.key)), 2.5, 1e-4);
    s.engine.update(100.0, &mut s.table);
    approx(float_of(s.table.current(s.key)), 3.5, 1e-4);
}

/// it should drop animators whose owner no longer exists
#[test]
fn removed_owner_orphans_animators() {
    let mut s = scene(Config::default());
    s.engine.animation_mut(s.id).unwrap().play();
    s.engine.update(100.0, &mut s.table);

    s.table.remove_owner(s.owner);
    let out = s.engine.update(100.0, &mut s.table);
    assert_eq!(out.animators_applied, 0);
    assert_eq!(s.engine.animation(s.id).unwrap().animator_count(), 0);
}

/// it should use configured defaults for new animations
#[test]
fn config_defaults_apply() {
    let cfg = Config::from_json_str(r#"{ "default_end_action": "Discard" }"#).unwrap();
    let s = scene(cfg);
    let anim = s.engine.animation(s.id).unwrap();
    assert_eq!(anim.end_action(), EndAction::Discard);
    assert_eq!(anim.disconnect_action(), EndAction::BakeFinal);
}

/// it should let a baking animation's value stand over a discard finishing
/// in the same tick, and keep it steady while the discard settles
#[test]
fn discard_and_bake_on_one_property_settle_on_the_bake() {
    for discard_first in [true, false] {
        let mut table = PropertyTable::new();
        let owner = table.add_owner();
        let key = table.register(owner, Value::f(0.0)).unwrap();
        let mut engine = Engine::default();

        let author = |engine: &mut Engine, target: f32, action: EndAction| {
            let id = engine.create_animation(1.0);
            let anim = engine.animation_mut(id).unwrap();
            anim.animate_to(key.into(), Value::f(target), AnimatorCfg::default(), &table)
                .unwrap();
            anim.set_end_action(action);
            anim.play();
            id
        };
        let (discard, bake) = if discard_first {
            let d = author(&mut engine, 10.0, EndAction::Discard);
            (d, author(&mut engine, 20.0, EndAction::Bake))
        } else {
            let b = author(&mut engine, 20.0, EndAction::Bake);
            (author(&mut engine, 10.0, EndAction::Discard), b)
        };

        engine.update(500.0, &mut table);
        let out = engine.update(600.0, &mut table);
        assert!(out.finished(discard) && out.finished(bake));
        assert!(out.needs_update);
        assert_eq!(table.base(key), Some(&Value::f(20.0)));
        assert_eq!(table.current(key), Some(&Value::f(20.0)));

        for _ in 0..2 {
            engine.update(16.0, &mut table);
            assert_eq!(table.current(key), Some(&Value::f(20.0)));
        }
        assert!(!engine.needs_update());
    }
}
