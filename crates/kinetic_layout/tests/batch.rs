//! Batch layout transitions through a shared in-memory host

use std::rc::Rc;

use kinetic_animation::{Easing, MotionEngine, TransitionConfig};
use kinetic_core::{BoundingBox, ElementId, LayoutHost, MemoryHost};
use kinetic_layout::{LayoutConfig, LayoutTracker, LayoutTransitionEngine, TransformOrigin};

fn row(index: u64) -> BoundingBox {
    BoundingBox::new(0.0, index as f32 * 50.0, 200.0, 40.0)
}

#[test]
fn test_detached_element_drops_out_of_batch() {
    let host = Rc::new(MemoryHost::new());
    let engine = MotionEngine::default().with_host(host.clone());
    let config = LayoutConfig::default()
        .origin(TransformOrigin::TopLeft)
        .transition(TransitionConfig::tween(200.0, Easing::Linear));
    let tracker = LayoutTracker::new(engine.handle(), host.clone(), config);

    let items: Vec<ElementId> = (1..=3).map(ElementId).collect();
    for (i, el) in items.iter().enumerate() {
        host.set_bounds(*el, row(i as u64));
        assert!(tracker.track(*el).unwrap());
    }
    engine.tick(0.0);

    // The first item is removed between frames and the rest move up
    host.detach(items[0]);
    host.set_bounds(items[1], row(0));
    host.set_bounds(items[2], row(1));

    let changes = tracker.layout_changed();
    assert_eq!(changes.len(), 2);
    assert!(!tracker.is_tracked(items[0]));
    assert_eq!(tracker.tracked_elements(), vec![items[1], items[2]]);
    assert!(host.style(items[0], "transform").is_none());

    for el in &items[1..] {
        assert_eq!(
            host.style(*el, "transform").as_deref(),
            Some("translateX(0px) translateY(50px) scaleX(1) scaleY(1)")
        );
    }

    let mut now = 16.0;
    while engine.tick(now) {
        now += 16.0;
    }
    for el in &items[1..] {
        assert_eq!(
            host.style(*el, "transform").as_deref(),
            Some("translateX(0px) translateY(0px) scaleX(1) scaleY(1)")
        );
    }

    // A later change still animates the survivors
    host.set_bounds(items[2], BoundingBox::new(0.0, 50.0, 400.0, 80.0));
    let changes = tracker.layout_changed();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].element, items[2]);
    assert_eq!(
        host.style(items[2], "transform").as_deref(),
        Some("translateX(0px) translateY(0px) scaleX(0.5) scaleY(0.5)")
    );
}

#[test]
fn test_detection_is_idempotent() {
    let host = Rc::new(MemoryHost::new());
    let flip = LayoutTransitionEngine::new(host.clone());
    let items: Vec<ElementId> = (1..=4).map(ElementId).collect();
    for (i, el) in items.iter().enumerate() {
        host.set_bounds(*el, row(i as u64));
    }
    let mut snapshot = flip.measure_batch(&items);

    host.set_bounds(items[0], BoundingBox::new(30.0, 0.0, 200.0, 40.0));
    host.set_bounds(items[3], BoundingBox::new(0.0, 150.0, 100.0, 40.0));

    let first = flip.detect_layout_changes(&items, &mut snapshot);
    assert_eq!(first.iter().map(|c| c.element).collect::<Vec<_>>(), vec![items[0], items[3]]);
    assert!(flip.detect_layout_changes(&items, &mut snapshot).is_empty());
}

#[test]
fn test_opposite_deltas_cancel_out() {
    let a = BoundingBox::new(12.0, -8.0, 320.0, 90.0);
    let b = BoundingBox::new(-40.0, 64.0, 80.0, 270.0);

    let there = LayoutTransitionEngine::calculate_transform_delta(&a, &b);
    let back = LayoutTransitionEngine::calculate_transform_delta(&b, &a);
    let round_trip = there.then(&back);

    assert!(round_trip.x.abs() < 1e-3);
    assert!(round_trip.y.abs() < 1e-3);
    assert!((round_trip.scale_x - 1.0).abs() < 1e-5);
    assert!((round_trip.scale_y - 1.0).abs() < 1e-5);
    assert!(round_trip.is_identity(1e-3));
}

#[test]
fn test_measuring_detached_element_degrades_to_zero() {
    let host = Rc::new(MemoryHost::new());
    let flip = LayoutTransitionEngine::new(host.clone());
    let el = ElementId(42);
    assert!(flip.measure_element(el).is_zero());
    assert!(flip.measure_batch(&[el]).is_empty());
    assert!(host.bounding_box(el).is_none());
}
