//! Motion values
//!
//! A [`MotionValue`] is one animatable scalar owned by a [`MotionEngine`]. It
//! can be set directly, animated with a [`TransitionConfig`], observed, and
//! optionally bound to a style slot on a host element.
//!
//! ```ignore
//! let x = engine.create_motion_value(0.0, MotionValueOptions::new().bind(el, StyleProperty::TRANSLATE_X));
//! let done = x.animate_to(120.0, SpringConfig::wobbly())?;
//! // ... host ticks the engine every frame ...
//! assert_eq!(done.await, AnimationOutcome::Completed);
//! ```
//!
//! [`MotionEngine`]: crate::engine::MotionEngine

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use kinetic_core::{ElementId, Result, StyleProperty};
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::engine::{Control, ListenerId, ListenerKind, SchedulerHandle, ValueId};
use crate::timeline::TimelineSnapshot;
use crate::transition::TransitionConfig;

/// How an animation ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationOutcome {
    /// Reached its final end
    Completed,
    /// Replaced by `set`, `stop` or a newer `animate_to`, or its value was dropped
    Cancelled,
}

impl AnimationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, AnimationOutcome::Completed)
    }
}

/// Future resolving when an animation completes or is cancelled
///
/// Returned immediately by [`MotionValue::animate_to`]; resolution happens
/// inside a later frame tick. Dropping it does not affect the animation.
pub struct AnimationHandle {
    outcome: oneshot::Receiver<AnimationOutcome>,
    resolved: Option<AnimationOutcome>,
}

impl AnimationHandle {
    pub(crate) fn new(outcome: oneshot::Receiver<AnimationOutcome>) -> Self {
        Self {
            outcome,
            resolved: None,
        }
    }

    /// Outcome if the animation has already ended
    pub fn try_outcome(&mut self) -> Option<AnimationOutcome> {
        if self.resolved.is_none() {
            self.resolved = match self.outcome.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Closed) => Some(AnimationOutcome::Cancelled),
            };
        }
        self.resolved
    }
}

impl Future for AnimationHandle {
    type Output = AnimationOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.resolved {
            return Poll::Ready(outcome);
        }
        // A dropped sender means the value or engine went away
        let outcome = match Pin::new(&mut self.outcome).poll(cx) {
            Poll::Ready(result) => result.unwrap_or(AnimationOutcome::Cancelled),
            Poll::Pending => return Poll::Pending,
        };
        self.resolved = Some(outcome);
        Poll::Ready(outcome)
    }
}

/// Options for [`MotionEngine::create_motion_value`](crate::engine::MotionEngine::create_motion_value)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionValueOptions {
    /// Element the value writes to
    pub element: Option<ElementId>,
    /// Style slot written, also used for classification when unbound
    pub property: Option<StyleProperty>,
}

impl MotionValueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag the value with a property without writing anywhere
    pub fn property(mut self, property: StyleProperty) -> Self {
        self.property = Some(property);
        self
    }

    /// Write every change to `property` on `element`
    pub fn bind(mut self, element: ElementId, property: StyleProperty) -> Self {
        self.element = Some(element);
        self.property = Some(property);
        self
    }
}

/// Returned by listener registration; call [`Unsubscribe::unsubscribe`] to
/// remove the listener. Dropping it keeps the listener registered.
pub struct Unsubscribe {
    engine: SchedulerHandle,
    value: ValueId,
    listener: Option<ListenerId>,
}

impl Unsubscribe {
    pub fn unsubscribe(self) {
        if let Some(listener) = self.listener {
            self.engine.unsubscribe(self.value, listener);
        }
    }
}

/// An animatable scalar
///
/// Dropping it cancels any running animation and removes its contribution
/// from the bound element's transform.
pub struct MotionValue {
    engine: SchedulerHandle,
    id: ValueId,
    /// Last value seen, served once the engine is gone
    last: Cell<f32>,
    element: Option<ElementId>,
    property: Option<StyleProperty>,
}

impl MotionValue {
    pub(crate) fn from_parts(engine: SchedulerHandle, id: ValueId, initial: f32, options: MotionValueOptions) -> Self {
        Self {
            engine,
            id,
            last: Cell::new(initial),
            element: options.element,
            property: options.property,
        }
    }

    pub fn id(&self) -> ValueId {
        self.id
    }

    pub fn handle(&self) -> &SchedulerHandle {
        &self.engine
    }

    /// Current value
    pub fn get(&self) -> f32 {
        if let Some(value) = self.engine.get(self.id) {
            self.last.set(value);
        }
        self.last.get()
    }

    /// Jump to `value`, cancelling any active timeline
    ///
    /// Subscribers hear about it on the next flush; several sets in one frame
    /// coalesce into a single notification with the latest value.
    pub fn set(&self, value: f32) {
        self.last.set(value);
        if let Err(err) = self.engine.set(self.id, value) {
            tracing::debug!(value = ?self.id, %err, "set on detached motion value");
        }
    }

    /// Listen for changes
    pub fn on_change<F>(&self, listener: F) -> Unsubscribe
    where
        F: Fn(f32) + 'static,
    {
        self.listen(ListenerKind::Change, Rc::new(listener))
    }

    /// Listen for natural completion of animations, with the settled value
    pub fn on_complete<F>(&self, listener: F) -> Unsubscribe
    where
        F: Fn(f32) + 'static,
    {
        self.listen(ListenerKind::Complete, Rc::new(listener))
    }

    fn listen(&self, kind: ListenerKind, listener: Rc<dyn Fn(f32)>) -> Unsubscribe {
        Unsubscribe {
            engine: self.engine.clone(),
            value: self.id,
            listener: self.engine.subscribe(self.id, kind, listener).ok(),
        }
    }

    /// Animate to `target`, replacing any active timeline
    ///
    /// Invalid transitions are rejected here and leave the current animation
    /// running. The returned future resolves to [`AnimationOutcome::Cancelled`]
    /// if the animation is replaced or stopped before it finishes.
    pub fn animate_to(&self, target: f32, transition: impl Into<TransitionConfig>) -> Result<AnimationHandle> {
        self.engine.animate(self.id, target, &transition.into())
    }

    /// Drop the active timeline, freezing the current value
    pub fn stop(&self) {
        let _ = self.engine.stop(self.id);
    }

    pub fn play(&self) {
        self.control(Control::Play);
    }

    pub fn pause(&self) {
        self.control(Control::Pause);
    }

    /// Flip the active timeline's direction
    pub fn reverse(&self) {
        self.control(Control::Reverse);
    }

    /// Move the active timeline to `progress` (clamped to [0, 1])
    pub fn seek(&self, progress: f32) {
        self.control(Control::Seek(progress));
    }

    fn control(&self, op: Control) {
        if let Err(err) = self.engine.control(self.id, op) {
            tracing::warn!(value = ?self.id, %err, "playback control on detached motion value");
        }
    }

    /// The active timeline, or `None` when idle
    pub fn timeline(&self) -> Option<TimelineSnapshot> {
        self.engine.timeline(self.id)
    }

    pub fn is_animating(&self) -> bool {
        self.timeline()
            .is_some_and(|tl| tl.state == crate::timeline::TimelineState::Running)
    }

    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    pub fn property(&self) -> Option<&StyleProperty> {
        self.property.as_ref()
    }

    /// Whether the value is still writing to its element
    pub fn is_bound(&self) -> bool {
        self.engine.is_bound(self.id)
    }

    /// Diagnostic: animating this property stays on the compositor
    pub fn is_hardware_accelerated(&self) -> bool {
        self.property
            .as_ref()
            .is_some_and(StyleProperty::is_hardware_accelerated)
    }

    /// Diagnostic: animating this property forces layout
    pub fn triggers_layout(&self) -> bool {
        self.property.as_ref().is_some_and(StyleProperty::triggers_layout)
    }
}

impl std::fmt::Debug for MotionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionValue")
            .field("id", &self.id)
            .field("value", &self.get())
            .field("property", &self.property)
            .finish()
    }
}

impl Drop for MotionValue {
    fn drop(&mut self) {
        self.engine.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::engine::MotionEngine;
    use crate::spring::SpringConfig;
    use crate::timeline::{Direction, TimelineState};
    use kinetic_core::{LayoutHost, MemoryHost, MotionError};
    use std::cell::RefCell;

    fn linear(ms: f32) -> TransitionConfig {
        TransitionConfig::tween(ms, Easing::Linear)
    }

    #[test]
    fn test_set_cancels_and_coalesces() {
        let engine = MotionEngine::default();
        let value = engine.create_motion_value(0.0, MotionValueOptions::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        value.on_change(move |v| sink.borrow_mut().push(v));

        let mut handle = value.animate_to(100.0, linear(1000.0)).unwrap();
        value.set(5.0);
        value.set(6.0);
        value.set(7.0);

        assert_eq!(handle.try_outcome(), Some(AnimationOutcome::Cancelled));
        assert!(value.timeline().is_none());
        assert_eq!(value.get(), 7.0);

        engine.tick(0.0);
        assert_eq!(*seen.borrow(), vec![7.0]);
    }

    #[test]
    fn test_animate_to_completes() {
        let engine = MotionEngine::default();
        let value = engine.create_motion_value(0.0, MotionValueOptions::new());
        let completed = Rc::new(RefCell::new(None));
        let sink = completed.clone();
        value.on_complete(move |v| *sink.borrow_mut() = Some(v));

        let handle = value.animate_to(50.0, linear(100.0)).unwrap();
        engine.tick(0.0);
        engine.tick(50.0);
        assert_eq!(value.get(), 25.0);
        assert_eq!(*completed.borrow(), None);

        engine.tick(120.0);
        assert_eq!(value.get(), 50.0);
        assert_eq!(*completed.borrow(), Some(50.0));
        assert_eq!(pollster::block_on(handle), AnimationOutcome::Completed);
        assert_eq!(value.timeline().map(|t| t.state), Some(TimelineState::Completed));
    }

    #[test]
    fn test_new_animation_cancels_previous() {
        let engine = MotionEngine::default();
        let value = engine.create_motion_value(0.0, MotionValueOptions::new());
        let first = value.animate_to(10.0, linear(100.0)).unwrap();
        let second = value.animate_to(20.0, linear(100.0)).unwrap();

        assert_eq!(pollster::block_on(first), AnimationOutcome::Cancelled);
        engine.tick(0.0);
        engine.tick(100.0);
        assert_eq!(pollster::block_on(second), AnimationOutcome::Completed);
    }

    #[test]
    fn test_stop_freezes_value() {
        let engine = MotionEngine::default();
        let value = engine.create_motion_value(0.0, MotionValueOptions::new());
        let handle = value.animate_to(100.0, linear(100.0)).unwrap();
        engine.tick(0.0);
        engine.tick(25.0);
        value.stop();
        engine.tick(80.0);

        assert_eq!(value.get(), 25.0);
        assert!(value.timeline().is_none());
        assert_eq!(pollster::block_on(handle), AnimationOutcome::Cancelled);
    }

    #[test]
    fn test_invalid_spring_rejected_without_touching_current() {
        let engine = MotionEngine::default();
        let value = engine.create_motion_value(0.0, MotionValueOptions::new());
        let mut running = value.animate_to(10.0, linear(100.0)).unwrap();

        let bad = SpringConfig {
            mass: 0.0,
            ..SpringConfig::stiff()
        };
        assert!(matches!(value.animate_to(5.0, bad), Err(MotionError::InvalidSpring { .. })));
        assert_eq!(running.try_outcome(), None);
        assert!(value.is_animating());
    }

    #[test]
    fn test_controls_without_timeline_are_noops() {
        let engine = MotionEngine::default();
        let value = engine.create_motion_value(3.0, MotionValueOptions::new());
        value.play();
        value.pause();
        value.reverse();
        value.seek(0.5);
        assert_eq!(value.get(), 3.0);
        assert!(value.timeline().is_none());
    }

    #[test]
    fn test_reverse_flips_direction_only() {
        let engine = MotionEngine::default();
        let value = engine.create_motion_value(0.0, MotionValueOptions::new());
        value.animate_to(1.0, linear(100.0)).unwrap();
        value.pause();
        value.reverse();

        let timeline = value.timeline().unwrap();
        assert_eq!(timeline.direction, Direction::Reverse);
        assert_eq!(timeline.state, TimelineState::Paused);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let engine = MotionEngine::default();
        let value = engine.create_motion_value(0.0, MotionValueOptions::new());
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let subscription = value.on_change(move |_| counter.set(counter.get() + 1));

        value.set(1.0);
        engine.flush();
        subscription.unsubscribe();
        value.set(2.0);
        engine.flush();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_spring_inherits_velocity_when_interrupted() {
        let engine = MotionEngine::default();
        let value = engine.create_motion_value(0.0, MotionValueOptions::new());
        value.animate_to(100.0, linear(500.0)).unwrap();
        engine.tick(0.0);
        engine.tick(100.0);
        engine.tick(200.0);

        // Moving at 200 units/s when the spring takes over; from rest it
        // would only reach about 40.4 after 10ms
        value
            .animate_to(100.0, TransitionConfig::spring(SpringConfig::gentle()).duration(1000.0))
            .unwrap();
        engine.tick(210.0);
        engine.tick(220.0);
        assert!(value.get() > 41.5);
    }

    #[test]
    fn test_classification() {
        let engine = MotionEngine::default();
        let scale = engine.create_motion_value(1.0, MotionValueOptions::new().property(StyleProperty::SCALE));
        let width = engine.create_motion_value(10.0, MotionValueOptions::new().property(StyleProperty::Width));
        let plain = engine.create_motion_value(0.0, MotionValueOptions::new());

        assert!(scale.is_hardware_accelerated());
        assert!(!width.is_hardware_accelerated());
        assert!(width.triggers_layout());
        assert!(!plain.is_hardware_accelerated());
    }

    #[test]
    fn test_drop_cancels_and_recomposes() {
        let host = Rc::new(MemoryHost::new());
        let engine = MotionEngine::default().with_host(host.clone());
        let el = ElementId(5);
        let x = engine.create_motion_value(10.0, MotionValueOptions::new().bind(el, StyleProperty::TRANSLATE_X));
        let rotate = engine.create_motion_value(45.0, MotionValueOptions::new().bind(el, StyleProperty::ROTATE));
        engine.flush();

        let handle = rotate.animate_to(90.0, linear(100.0)).unwrap();
        drop(rotate);
        assert_eq!(pollster::block_on(handle), AnimationOutcome::Cancelled);
        assert_eq!(host.style(el, "transform").as_deref(), Some("translateX(10px)"));

        drop(x);
        assert_eq!(host.style(el, "transform").as_deref(), Some("none"));
        assert_eq!(engine.value_count(), 0);
    }
}
