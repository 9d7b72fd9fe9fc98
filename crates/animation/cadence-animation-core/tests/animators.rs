use std::f32::consts::{FRAC_PI_2, PI};

use cadence_animation_core::{
    AlphaFunction, AnimationError, AnimationId, AnimatorCfg, BuiltinAlpha, Engine, Interpolation,
    KeyFrames, OwnerId, Path, PropertyKey, PropertyRef, PropertyTable, TimePeriod, Value,
};
use cadence_api_core::values_approx_eq;

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn float_of(table: &PropertyTable, key: PropertyKey) -> f32 {
    table
        .current(key)
        .and_then(Value::as_float)
        .expect("float property")
}

struct Scene {
    engine: Engine,
    table: PropertyTable,
    owner: OwnerId,
    id: AnimationId,
}

fn scene(duration: f32) -> Scene {
    let mut table = PropertyTable::new();
    let owner = table.add_owner();
    let mut engine = Engine::default();
    let id = engine.create_animation(duration);
    Scene {
        engine,
        table,
        owner,
        id,
    }
}

impl Scene {
    fn prop(&mut self, initial: Value) -> PropertyKey {
        self.table.register(self.owner, initial).unwrap()
    }

    fn play(&mut self) {
        self.engine.animation_mut(self.id).unwrap().play();
    }

    fn tick(&mut self, ms: f32) {
        self.engine.update(ms, &mut self.table);
    }
}

/// it should chain animators on the same property through the running value
#[test]
fn animators_chain_in_order() {
    let mut s = scene(1.0);
    let key = s.prop(Value::f(0.0));
    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.animate_to(key.into(), Value::f(10.0), AnimatorCfg::default(), &s.table)
        .unwrap();
    anim.animate_by(key.into(), Value::f(5.0), AnimatorCfg::default(), &s.table)
        .unwrap();
    assert_eq!(anim.target_value(key), Some(&Value::f(15.0)));

    s.play();
    s.tick(500.0);
    approx(float_of(&s.table, key), 7.5, 1e-4);
}

/// it should leave a property alone until its animator's delay has passed
#[test]
fn delayed_animator_waits() {
    let mut s = scene(1.0);
    let key = s.prop(Value::f(1.0));
    s.engine
        .animation_mut(s.id)
        .unwrap()
        .animate_to(
            key.into(),
            Value::f(11.0),
            AnimatorCfg::default().with_delay(0.5, 0.5),
            &s.table,
        )
        .unwrap();
    s.play();

    s.tick(250.0);
    assert_eq!(float_of(&s.table, key), 1.0);
    s.tick(500.0);
    approx(float_of(&s.table, key), 6.0, 1e-4);
}

/// it should grow the animation to cover a late animator
#[test]
fn late_animator_extends_duration() {
    let mut s = scene(1.0);
    let key = s.prop(Value::f(0.0));
    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.animate_to(
        key.into(),
        Value::f(1.0),
        AnimatorCfg::default().with_period(TimePeriod::with_delay(1.0, 1.5)),
        &s.table,
    )
    .unwrap();
    assert_eq!(anim.duration(), 2.5);
}

/// it should shape progress with the animator's alpha function
#[test]
fn alpha_function_shapes_progress() {
    let mut s = scene(1.0);
    let eased = s.prop(Value::f(0.0));
    let custom = s.prop(Value::f(0.0));
    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.animate_to(
        eased.into(),
        Value::f(10.0),
        AnimatorCfg::default().with_alpha(BuiltinAlpha::EaseIn),
        &s.table,
    )
    .unwrap();
    fn step(t: f32) -> f32 {
        if t < 0.5 {
            0.0
        } else {
            1.0
        }
    }
    anim.animate_to(
        custom.into(),
        Value::f(10.0),
        AnimatorCfg::default().with_alpha(AlphaFunction::Custom(step)),
        &s.table,
    )
    .unwrap();
    s.play();

    s.tick(500.0);
    approx(float_of(&s.table, eased), 1.25, 1e-4);
    assert_eq!(float_of(&s.table, custom), 10.0);
}

/// it should use the animation's default alpha for animators without one
#[test]
fn default_alpha_applies_to_new_animators() {
    let mut s = scene(1.0);
    let key = s.prop(Value::f(0.0));
    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.set_default_alpha(BuiltinAlpha::Reverse);
    anim.animate_to(key.into(), Value::f(10.0), AnimatorCfg::default(), &s.table)
        .unwrap();
    s.play();
    s.tick(250.0);
    approx(float_of(&s.table, key), 7.5, 1e-4);
}

/// it should sample key frames in order, ignoring the running value
#[test]
fn key_frames_drive_the_property() {
    let mut s = scene(1.0);
    let key = s.prop(Value::f(100.0));
    let mut frames = KeyFrames::new();
    frames.add(1.0, Value::f(0.0)).unwrap();
    frames.add(0.0, Value::f(0.0)).unwrap();
    frames.add(0.5, Value::f(10.0)).unwrap();

    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.animate_between(key.into(), frames, AnimatorCfg::default(), &s.table)
        .unwrap();
    assert_eq!(anim.target_value(key), Some(&Value::f(0.0)));
    s.play();

    s.tick(250.0);
    approx(float_of(&s.table, key), 5.0, 1e-4);
    s.tick(250.0);
    approx(float_of(&s.table, key), 10.0, 1e-4);
}

/// it should pass through every key with cubic interpolation
#[test]
fn cubic_key_frames_hit_their_keys() {
    let mut s = scene(1.0);
    let key = s.prop(Value::f(0.0));
    let mut frames = KeyFrames::new();
    for (p, v) in [(0.0, 0.0), (0.25, 4.0), (0.5, 2.0), (1.0, 8.0)] {
        frames.add(p, Value::f(v)).unwrap();
    }
    s.engine
        .animation_mut(s.id)
        .unwrap()
        .animate_between(
            key.into(),
            frames,
            AnimatorCfg::default().with_interpolation(Interpolation::Cubic),
            &s.table,
        )
        .unwrap();
    s.play();

    s.tick(250.0);
    approx(float_of(&s.table, key), 4.0, 1e-4);
    s.tick(250.0);
    approx(float_of(&s.table, key), 2.0, 1e-4);
}

/// it should animate one component and keep the others
#[test]
fn component_animator_keeps_other_lanes() {
    let mut s = scene(1.0);
    let key = s.prop(Value::vec3(1.0, 2.0, 3.0));
    s.engine
        .animation_mut(s.id)
        .unwrap()
        .animate_to(
            PropertyRef::component(key.owner, key.index, 0),
            Value::f(11.0),
            AnimatorCfg::default(),
            &s.table,
        )
        .unwrap();
    s.play();
    s.tick(500.0);
    assert_eq!(s.table.current(key), Some(&Value::vec3(6.0, 2.0, 3.0)));
}

/// it should flip visibility at the delay and not before
#[test]
fn show_and_hide_switch_at_their_delay() {
    let mut s = scene(1.0);
    let shown = s.prop(Value::Bool(false));
    let hidden = s.prop(Value::Bool(true));
    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.show(shown.into(), 0.5, &s.table).unwrap();
    anim.hide(hidden.into(), 0.5, &s.table).unwrap();
    s.play();

    s.tick(400.0);
    assert_eq!(s.table.current(shown), Some(&Value::Bool(false)));
    assert_eq!(s.table.current(hidden), Some(&Value::Bool(true)));
    s.tick(200.0);
    assert_eq!(s.table.current(shown), Some(&Value::Bool(true)));
    assert_eq!(s.table.current(hidden), Some(&Value::Bool(false)));
}

/// it should turn past half a revolution with an angle-axis rotation
#[test]
fn rotation_by_angle_axis() {
    let mut s = scene(1.0);
    let key = s.prop(Value::rotation_identity());
    s.engine
        .animation_mut(s.id)
        .unwrap()
        .animate_rotation_by(key.into(), PI * 1.5, [0.0, 0.0, 1.0], AnimatorCfg::default(), &s.table)
        .unwrap();
    s.play();

    s.tick(1000.0 / 3.0);
    let quarter = Value::rotation_from_angle_axis(FRAC_PI_2, [0.0, 0.0, 1.0]);
    assert!(values_approx_eq(s.table.current(key).unwrap(), &quarter, 1e-4));

    s.tick(1000.0 * 2.0 / 3.0);
    let three_quarters = Value::rotation_from_angle_axis(PI * 1.5, [0.0, 0.0, 1.0]);
    assert!(values_approx_eq(s.table.current(key).unwrap(), &three_quarters, 1e-4));
}

/// it should move along a path and face along its tangent
#[test]
fn path_animation_moves_and_orients() {
    let mut s = scene(1.0);
    let position = s.prop(Value::vec3(0.0, 0.0, 0.0));
    let orientation = s.prop(Value::rotation_identity());
    let mut path = Path::new();
    path.add_point([0.0, 0.0, 0.0]);
    path.add_point([0.0, 10.0, 0.0]);
    path.generate_control_points(0.25);

    let anim = s.engine.animation_mut(s.id).unwrap();
    anim.animate_path(
        position.into(),
        Some((orientation.into(), [1.0, 0.0, 0.0])),
        path,
        AnimatorCfg::default(),
        &s.table,
    )
    .unwrap();
    assert_eq!(anim.animator_count(), 2);
    s.play();

    s.tick(500.0);
    let pos = s.table.current(position).and_then(Value::as_vec3).unwrap();
    approx(pos[0], 0.0, 1e-4);
    approx(pos[1], 5.0, 1e-4);
    let facing_y = Value::rotation_from_angle_axis(FRAC_PI_2, [0.0, 0.0, 1.0]);
    assert!(values_approx_eq(s.table.current(orientation).unwrap(), &facing_y, 1e-4));
}

/// it should refuse an incomplete path and add nothing
#[test]
fn incomplete_path_is_rejected() {
    let mut s = scene(1.0);
    let position = s.prop(Value::vec3(0.0, 0.0, 0.0));
    let mut path = Path::new();
    path.add_point([0.0, 0.0, 0.0]);
    path.add_point([1.0, 0.0, 0.0]);

    let anim = s.engine.animation_mut(s.id).unwrap();
    let err = anim
        .animate_path(position.into(), None, path, AnimatorCfg::default(), &s.table)
        .unwrap_err();
    assert_eq!(err, AnimationError::IncompletePath);
    assert_eq!(anim.animator_count(), 0);
}

/// it should reject authoring mistakes without touching the animation
#[test]
fn authoring_errors() {
    let mut s = scene(1.0);
    let position = s.prop(Value::vec3(0.0, 0.0, 0.0));
    let label = s.prop(Value::Text("title".into()));
    let table = &s.table;
    let anim = s.engine.animation_mut(s.id).unwrap();

    let err = anim
        .animate_to(position.into(), Value::f(1.0), AnimatorCfg::default(), table)
        .unwrap_err();
    assert!(matches!(err, AnimationError::TypeMismatch { .. }));
    assert_eq!(err.category(), "type");

    let err = anim
        .animate_to(label.into(), Value::Text("x".into()), AnimatorCfg::default(), table)
        .unwrap_err();
    assert!(matches!(err, AnimationError::NotAnimatable { .. }));

    let missing = PropertyRef::new(OwnerId(77), 0);
    let err = anim
        .animate_to(missing, Value::f(1.0), AnimatorCfg::default(), table)
        .unwrap_err();
    assert_eq!(
        err,
        AnimationError::UnknownProperty {
            owner: OwnerId(77),
            index: 0
        }
    );

    let err = anim
        .animate_between(position.into(), KeyFrames::new(), AnimatorCfg::default(), table)
        .unwrap_err();
    assert_eq!(err, AnimationError::EmptyKeyFrames);

    let err = anim
        .animate_to(
            position.into(),
            Value::vec3(1.0, 1.0, 1.0),
            AnimatorCfg::default().with_delay(0.0, -1.0),
            table,
        )
        .unwrap_err();
    assert_eq!(err.category(), "time");

    let err = anim
        .animate_to(
            PropertyRef::component(position.owner, position.index, 5),
            Value::f(1.0),
            AnimatorCfg::default(),
            table,
        )
        .unwrap_err();
    assert!(matches!(err, AnimationError::InvalidComponent { .. }));

    assert_eq!(anim.animator_count(), 0);
    assert_eq!(anim.duration(), 1.0);
}
