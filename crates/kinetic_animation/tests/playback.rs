//! Playback scenarios driven through the public engine surface

use std::rc::Rc;

use kinetic_animation::{
    AnimationOutcome, Easing, EngineConfig, MotionEngine, MotionValueOptions, SpringConfig, TimelineState,
    TransitionConfig,
};
use kinetic_core::{ElementId, LayoutHost, MemoryHost, StyleProperty};

/// Set `RUST_LOG=kinetic_animation=trace` to see every frame
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn test_seek_matches_natural_playback() {
    let transitions = [
        (TransitionConfig::tween(1000.0, Easing::EaseInOut), 1000.0),
        (TransitionConfig::tween(1000.0, Easing::EaseOutCubic), 1000.0),
        // Short springs are baked, long ones stepped live
        (TransitionConfig::spring(SpringConfig::stiff()).duration(200.0), 200.0),
        (TransitionConfig::spring(SpringConfig::wobbly()).duration(1000.0), 1000.0),
    ];

    for (transition, duration_ms) in transitions {
        for p in [0.0_f32, 0.1, 0.33, 0.5, 0.8, 1.0] {
            let natural = MotionEngine::default();
            let played = natural.create_motion_value(-50.0, MotionValueOptions::new());
            let _done = played.animate_to(250.0, transition.clone()).unwrap();
            natural.tick(0.0);
            natural.tick(p as f64 * duration_ms);

            let scrubbed = MotionEngine::new(EngineConfig::default());
            let sought = scrubbed.create_motion_value(-50.0, MotionValueOptions::new());
            let _done = sought.animate_to(250.0, transition.clone()).unwrap();
            sought.seek(p);

            assert!(
                close(played.get(), sought.get()),
                "{transition:?} at {p}: natural {} vs seek {}",
                played.get(),
                sought.get()
            );
        }
    }
}

#[test]
fn test_scrub_pause_and_replay_backward() {
    init_tracing();
    let engine = MotionEngine::default();
    let value = engine.create_motion_value(0.0, MotionValueOptions::new());
    let done = value.animate_to(400.0, TransitionConfig::tween(2000.0, Easing::EaseInOut)).unwrap();

    engine.tick(0.0);
    engine.tick(1000.0);
    let natural = value.get();
    assert!(natural > 150.0 && natural < 250.0);

    value.seek(0.5);
    assert!(close(value.get(), natural));

    value.pause();
    engine.tick(1100.0);
    engine.tick(1600.0);
    assert!(close(value.get(), natural));
    assert_eq!(value.timeline().map(|t| t.state), Some(TimelineState::Paused));

    value.reverse();
    value.play();
    let mut now = 1616.0;
    let mut previous = value.get();
    while engine.tick(now) {
        assert!(value.get() <= previous);
        previous = value.get();
        now += 16.0;
    }

    assert_eq!(value.get(), 0.0);
    // Reaching the start while reversed still counts as finishing
    assert_eq!(pollster::block_on(done), AnimationOutcome::Completed);
    // Half the timeline, replayed backward from where it was paused
    assert!((now - 1616.0 - 1000.0).abs() <= 32.0);
}

#[test]
fn test_combined_transform_keeps_every_contribution() {
    let host = Rc::new(MemoryHost::new());
    let engine = MotionEngine::default().with_host(host.clone());
    let el = ElementId(7);

    let x = engine.create_motion_value(0.0, MotionValueOptions::new().bind(el, StyleProperty::TRANSLATE_X));
    let scale = engine.create_motion_value(1.0, MotionValueOptions::new().bind(el, StyleProperty::SCALE));
    engine.flush();
    assert_eq!(host.style(el, "transform").as_deref(), Some("translateX(0px) scale(1)"));

    x.set(40.0);
    engine.flush();
    assert_eq!(host.style(el, "transform").as_deref(), Some("translateX(40px) scale(1)"));

    scale.set(1.5);
    engine.flush();
    assert_eq!(host.style(el, "transform").as_deref(), Some("translateX(40px) scale(1.5)"));

    // Animating one leaves the other's part intact every frame
    let _done = x.animate_to(0.0, TransitionConfig::tween(100.0, Easing::Linear)).unwrap();
    engine.tick(0.0);
    engine.tick(50.0);
    assert_eq!(host.style(el, "transform").as_deref(), Some("translateX(20px) scale(1.5)"));
    engine.tick(100.0);
    assert_eq!(host.style(el, "transform").as_deref(), Some("translateX(0px) scale(1.5)"));

    // Several changes in one frame land as a single write
    host.take_writes();
    x.set(5.0);
    scale.set(2.0);
    engine.flush();
    assert_eq!(host.writes_to(el, "transform"), vec!["translateX(5px) scale(2)".to_string()]);

    drop(scale);
    assert_eq!(host.style(el, "transform").as_deref(), Some("translateX(5px)"));
    drop(x);
    assert_eq!(host.style(el, "transform").as_deref(), Some("none"));
}

#[test]
fn test_interrupted_animation_resolves_cancelled() {
    init_tracing();
    let engine = MotionEngine::default();
    let value = engine.create_motion_value(0.0, MotionValueOptions::new());

    let first = value.animate_to(100.0, TransitionConfig::tween(500.0, Easing::Linear)).unwrap();
    engine.tick(0.0);
    engine.tick(100.0);
    let second = value.animate_to(-100.0, TransitionConfig::tween(500.0, Easing::Linear)).unwrap();
    assert_eq!(pollster::block_on(first), AnimationOutcome::Cancelled);

    value.stop();
    assert_eq!(pollster::block_on(second), AnimationOutcome::Cancelled);
    assert!(!engine.tick(200.0));

    // Controls on an idle value are ignored
    value.play();
    value.seek(0.5);
    assert!(value.timeline().is_none());
}

#[test]
fn test_invalid_transition_leaves_current_animation_running() {
    let engine = MotionEngine::default();
    let value = engine.create_motion_value(0.0, MotionValueOptions::new());
    let _running = value.animate_to(10.0, TransitionConfig::tween(100.0, Easing::Linear)).unwrap();

    assert!(SpringConfig::new(0.0, 10.0, 1.0).is_err());
    let limp = SpringConfig {
        stiffness: 0.0,
        ..SpringConfig::stiff()
    };
    assert!(value.animate_to(5.0, limp).is_err());
    assert!(value.is_animating());
    assert_eq!(value.timeline().map(|t| t.to), Some(10.0));
}
