//! Motion engine
//!
//! Owns every motion value and drives them from the host's frame callback.
//! There is no background thread: the host calls [`MotionEngine::tick`] once
//! per display refresh, and each tick runs in a fixed order:
//!
//! 1. Due timers fire (staggered starts, deferred work)
//! 2. Every running timeline steps to the frame time
//! 3. Batched notifications flush: style writes first, then change listeners
//! 4. Completion listeners run and completion futures resolve
//!
//! Because all stepping happens before any listener runs, listeners observe
//! a consistent snapshot of every value updated in the same frame.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::{IndexMap, IndexSet};
use kinetic_core::{ElementId, LayoutHost, MotionError, Result, StyleProperty};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use tokio::sync::oneshot;

use crate::composition::{ContributorId, TransformRegistry};
use crate::timeline::{Step, Timeline, TimelineSnapshot};
use crate::transition::{Transition, TransitionConfig};
use crate::value::{AnimationHandle, AnimationOutcome, MotionValue, MotionValueOptions};

new_key_type! {
    /// Handle to a motion value owned by an engine
    pub struct ValueId;
}

/// Callback asking the host for another frame
pub type WakeCallback = Rc<dyn Fn()>;

pub(crate) type Listener = Rc<dyn Fn(f32)>;

/// Identifies one registered listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ListenerKind {
    Change,
    Complete,
}

/// Playback operations forwarded to a value's timeline
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Control {
    Play,
    Pause,
    Reverse,
    Seek(f32),
}

impl Control {
    fn name(&self) -> &'static str {
        match self {
            Control::Play => "play",
            Control::Pause => "pause",
            Control::Reverse => "reverse",
            Control::Seek(_) => "seek",
        }
    }
}

/// Engine-wide tuning
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Springs shorter than this are baked into a table instead of stepped live
    pub precompute_threshold_ms: f32,
    /// Samples per second for baked spring tables
    pub sample_rate_hz: f32,
    /// Integration grid for live springs
    pub live_substep_ms: f32,
    /// Cap on the settle-time estimate for springs without a duration
    pub max_spring_duration_ms: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            precompute_threshold_ms: 300.0,
            sample_rate_hz: 120.0,
            live_substep_ms: 1000.0 / 240.0,
            max_spring_duration_ms: 10_000.0,
        }
    }
}

/// Where a value's frames are written
struct Binding {
    element: ElementId,
    property: StyleProperty,
    /// Set when the property is a transform component
    contributor: Option<ContributorId>,
}

struct ActiveTimeline {
    timeline: Timeline,
    done: Option<oneshot::Sender<AnimationOutcome>>,
}

struct ValueSlot {
    value: f32,
    binding: Option<Binding>,
    active: Option<ActiveTimeline>,
    on_change: SmallVec<[(ListenerId, Listener); 2]>,
    on_complete: SmallVec<[(ListenerId, Listener); 1]>,
}

impl ValueSlot {
    /// Detach the active timeline and tell its awaiter it was cancelled
    fn cancel(&mut self, id: ValueId) {
        if let Some(mut active) = self.active.take() {
            if let Some(done) = active.done.take() {
                let _ = done.send(AnimationOutcome::Cancelled);
            }
            tracing::debug!(value = ?id, at = self.value, "timeline cancelled");
        }
    }

    fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.timeline.is_running())
    }
}

struct Timer {
    delay_ms: f32,
    /// Frame time the timer fires at, fixed on the first tick after scheduling
    due: Option<f64>,
    callback: Box<dyn FnOnce()>,
}

pub(crate) struct EngineInner {
    values: SlotMap<ValueId, ValueSlot>,
    registry: Rc<RefCell<TransformRegistry>>,
    host: Option<Rc<dyn LayoutHost>>,
    config: EngineConfig,
    /// Values with an undelivered change, in first-change order
    pending: IndexSet<ValueId>,
    timers: Vec<Timer>,
    wake: Option<WakeCallback>,
    clock: Option<f64>,
    frame: u64,
    next_listener: u64,
}

impl EngineInner {
    fn has_work(&self) -> bool {
        !self.pending.is_empty()
            || !self.timers.is_empty()
            || self.values.values().any(ValueSlot::is_running)
    }
}

/// The frame-driven owner of all motion values
///
/// Hold it wherever the host's frame loop lives; hand out [`SchedulerHandle`]s
/// to everything else.
pub struct MotionEngine {
    inner: Rc<RefCell<EngineInner>>,
}

impl Default for MotionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl MotionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EngineInner {
                values: SlotMap::with_key(),
                registry: Rc::new(RefCell::new(TransformRegistry::new())),
                host: None,
                config,
                pending: IndexSet::new(),
                timers: Vec::new(),
                wake: None,
                clock: None,
                frame: 0,
                next_listener: 0,
            })),
        }
    }

    /// Write bound values to `host`
    pub fn with_host(self, host: Rc<dyn LayoutHost>) -> Self {
        self.inner.borrow_mut().host = Some(host);
        self
    }

    /// Compose transforms through a shared registry instead of a private one
    pub fn with_registry(self, registry: Rc<RefCell<TransformRegistry>>) -> Self {
        self.inner.borrow_mut().registry = registry;
        self
    }

    /// Set a callback invoked whenever new work needs a frame
    ///
    /// Use it to wake the host's frame loop after it has gone idle.
    pub fn set_wake_callback<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.inner.borrow_mut().wake = Some(Rc::new(callback));
    }

    /// Get a handle to this engine for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.inner.borrow().config.clone()
    }

    pub fn registry(&self) -> Rc<RefCell<TransformRegistry>> {
        Rc::clone(&self.inner.borrow().registry)
    }

    pub fn host(&self) -> Option<Rc<dyn LayoutHost>> {
        self.inner.borrow().host.clone()
    }

    /// Frame time of the last tick
    pub fn now(&self) -> Option<f64> {
        self.inner.borrow().clock
    }

    /// Number of ticks so far
    pub fn frame(&self) -> u64 {
        self.inner.borrow().frame
    }

    /// Create a motion value owned by this engine
    pub fn create_motion_value(&self, initial: f32, options: MotionValueOptions) -> MotionValue {
        let id = insert_value(&self.inner, initial, &options);
        MotionValue::from_parts(self.handle(), id, initial, options)
    }

    /// Run `callback` on the first frame at least `delay_ms` after the next one
    pub fn schedule_after<F>(&self, delay_ms: f32, callback: F)
    where
        F: FnOnce() + 'static,
    {
        push_timer(&self.inner, delay_ms, Box::new(callback));
    }

    /// Advance everything to frame time `now` (milliseconds)
    ///
    /// Returns true if another frame is needed.
    pub fn tick(&self, now: f64) -> bool {
        tick(&self.inner, now)
    }

    /// Deliver queued notifications now instead of on the next tick
    ///
    /// Layout code uses this to get style writes in before the host paints.
    pub fn flush(&self) {
        flush(&self.inner);
    }

    /// Tear down composition for an element that left the host
    ///
    /// Values bound to it keep their state but stop writing styles.
    pub fn detach_element(&self, element: ElementId) {
        detach_element(&mut self.inner.borrow_mut(), element);
    }

    /// Check if any work needs another frame
    pub fn has_active_animations(&self) -> bool {
        self.inner.borrow().has_work()
    }

    /// Get the number of live motion values
    pub fn value_count(&self) -> usize {
        self.inner.borrow().values.len()
    }
}

// ============================================================================
// Frame loop
// ============================================================================

fn tick(rc: &Rc<RefCell<EngineInner>>, now: f64) -> bool {
    // Timers first so the animations they start step this frame
    let ready = {
        let mut inner = rc.borrow_mut();
        inner.clock = Some(now);
        inner.frame += 1;
        take_due_timers(&mut inner.timers, now)
    };
    for timer in ready {
        (timer.callback)();
    }

    let finished = {
        let mut guard = rc.borrow_mut();
        let inner = &mut *guard;
        let mut finished = Vec::new();
        for (id, slot) in inner.values.iter_mut() {
            let Some(active) = slot.active.as_mut() else {
                continue;
            };
            match active.timeline.tick(now) {
                Step::Unchanged => {}
                Step::Moved(value) => {
                    slot.value = value;
                    inner.pending.insert(id);
                }
                Step::Finished(value) => {
                    slot.value = value;
                    inner.pending.insert(id);
                    tracing::debug!(value = ?id, settled = value, "timeline completed");
                    finished.push((id, active.done.take()));
                }
            }
        }
        finished
    };

    flush(rc);

    for (id, done) in finished {
        let (listeners, value) = {
            let inner = rc.borrow();
            match inner.values.get(id) {
                Some(slot) => (
                    slot.on_complete
                        .iter()
                        .map(|(_, l)| Rc::clone(l))
                        .collect::<SmallVec<[Listener; 2]>>(),
                    slot.value,
                ),
                None => continue,
            }
        };
        for listener in listeners {
            listener(value);
        }
        if let Some(done) = done {
            let _ = done.send(AnimationOutcome::Completed);
        }
    }

    let inner = rc.borrow();
    tracing::trace!(now, frame = inner.frame, "engine tick");
    inner.has_work()
}

/// Pull out the timers due at `now`, earliest first
fn take_due_timers(timers: &mut Vec<Timer>, now: f64) -> Vec<Timer> {
    for timer in timers.iter_mut() {
        timer.due.get_or_insert(now + timer.delay_ms as f64);
    }
    let (mut ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(timers)
        .into_iter()
        .partition(|timer| timer.due.is_some_and(|due| now >= due));
    *timers = waiting;
    ready.sort_by(|a, b| a.due.partial_cmp(&b.due).unwrap_or(std::cmp::Ordering::Equal));
    ready
}

/// Deliver every queued change: style writes, then listeners
fn flush(rc: &Rc<RefCell<EngineInner>>) {
    let (host, writes, calls) = {
        let mut guard = rc.borrow_mut();
        let inner = &mut *guard;
        if inner.pending.is_empty() {
            return;
        }
        let pending: Vec<ValueId> = inner.pending.drain(..).collect();

        // Keyed by slot so several contributors to one transform write once
        let mut writes: IndexMap<(ElementId, String), String> = IndexMap::new();
        let mut calls: Vec<(Listener, f32)> = Vec::new();
        let mut registry = inner.registry.borrow_mut();

        for id in pending {
            let Some(slot) = inner.values.get(id) else {
                continue;
            };
            if let Some(binding) = &slot.binding {
                match binding.contributor {
                    Some(contributor) => {
                        if let Some((element, text)) = registry.update(contributor, slot.value) {
                            writes.insert((element, "transform".to_string()), text);
                        }
                    }
                    None => {
                        writes.insert(
                            (binding.element, binding.property.slot_name().to_string()),
                            binding.property.format_value(slot.value),
                        );
                    }
                }
            }
            calls.extend(slot.on_change.iter().map(|(_, l)| (Rc::clone(l), slot.value)));
        }
        drop(registry);

        (inner.host.clone(), writes, calls)
    };

    if let Some(host) = host {
        for ((element, property), value) in &writes {
            host.set_style(*element, property, value);
        }
    }
    for (listener, value) in calls {
        listener(value);
    }
}

fn detach_element(inner: &mut EngineInner, element: ElementId) {
    inner.registry.borrow_mut().unregister_element(element);
    for slot in inner.values.values_mut() {
        if slot.binding.as_ref().is_some_and(|b| b.element == element) {
            slot.binding = None;
        }
    }
    tracing::debug!(element = %element, "element detached from engine");
}

fn wake(rc: &Rc<RefCell<EngineInner>>) {
    let callback = rc.borrow().wake.clone();
    if let Some(callback) = callback {
        callback();
    }
}

fn push_timer(rc: &Rc<RefCell<EngineInner>>, delay_ms: f32, callback: Box<dyn FnOnce()>) {
    rc.borrow_mut().timers.push(Timer {
        delay_ms: delay_ms.max(0.0),
        due: None,
        callback,
    });
    wake(rc);
}

fn insert_value(rc: &Rc<RefCell<EngineInner>>, initial: f32, options: &MotionValueOptions) -> ValueId {
    let id = {
        let mut guard = rc.borrow_mut();
        let inner = &mut *guard;

        let binding = match (options.element, &options.property) {
            (Some(element), Some(property)) => {
                let contributor = property
                    .transform_component()
                    .map(|component| inner.registry.borrow_mut().register(element, component, initial));
                Some(Binding {
                    element,
                    property: property.clone(),
                    contributor,
                })
            }
            _ => None,
        };
        let bound = binding.is_some();

        let id = inner.values.insert(ValueSlot {
            value: initial,
            binding,
            active: None,
            on_change: SmallVec::new(),
            on_complete: SmallVec::new(),
        });
        // First write of the initial value goes out with the next flush
        if bound {
            inner.pending.insert(id);
        }
        id
    };
    tracing::trace!(value = ?id, initial, "motion value created");
    id
}

/// Seed a spring's starting velocity from the timeline it replaces
fn inherit_velocity(config: &TransitionConfig, previous: Option<&ActiveTimeline>) -> TransitionConfig {
    let mut config = config.clone();
    if let (Transition::Spring { config: spring, .. }, Some(previous)) = (&mut config.transition, previous) {
        if spring.velocity == 0.0 && previous.timeline.is_running() {
            spring.velocity = previous.timeline.velocity();
        }
    }
    config
}

// ============================================================================
// Scheduler Handle
// ============================================================================

/// A weak handle to the motion engine
///
/// This is passed to components that need to create or drive values.
/// It won't keep the engine alive.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<EngineInner>>,
}

impl SchedulerHandle {
    fn upgrade(&self) -> Result<Rc<RefCell<EngineInner>>> {
        self.inner.upgrade().ok_or(MotionError::ValueDropped)
    }

    /// Check if the engine is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Frame time of the engine's last tick
    pub fn now(&self) -> Option<f64> {
        self.inner.upgrade().and_then(|rc| rc.borrow().clock)
    }

    pub fn host(&self) -> Option<Rc<dyn LayoutHost>> {
        self.inner.upgrade().and_then(|rc| rc.borrow().host.clone())
    }

    pub fn create_motion_value(&self, initial: f32, options: MotionValueOptions) -> Result<MotionValue> {
        let rc = self.upgrade()?;
        let id = insert_value(&rc, initial, &options);
        Ok(MotionValue::from_parts(self.clone(), id, initial, options))
    }

    /// See [`MotionEngine::schedule_after`]
    pub fn schedule_after<F>(&self, delay_ms: f32, callback: F) -> Result<()>
    where
        F: FnOnce() + 'static,
    {
        let rc = self.upgrade()?;
        push_timer(&rc, delay_ms, Box::new(callback));
        Ok(())
    }

    /// See [`MotionEngine::flush`]
    pub fn flush(&self) {
        if let Some(rc) = self.inner.upgrade() {
            flush(&rc);
        }
    }

    /// See [`MotionEngine::detach_element`]
    pub fn detach_element(&self, element: ElementId) {
        if let Some(rc) = self.inner.upgrade() {
            detach_element(&mut rc.borrow_mut(), element);
        }
    }

    // =========================================================================
    // Value Operations
    // =========================================================================

    pub(crate) fn get(&self, id: ValueId) -> Option<f32> {
        let rc = self.inner.upgrade()?;
        let value = rc.borrow().values.get(id).map(|slot| slot.value);
        value
    }

    pub(crate) fn set(&self, id: ValueId, value: f32) -> Result<()> {
        let rc = self.upgrade()?;
        {
            let mut guard = rc.borrow_mut();
            let inner = &mut *guard;
            let slot = inner.values.get_mut(id).ok_or(MotionError::ValueDropped)?;
            slot.cancel(id);
            slot.value = value;
            inner.pending.insert(id);
        }
        wake(&rc);
        Ok(())
    }

    pub(crate) fn subscribe(&self, id: ValueId, kind: ListenerKind, listener: Listener) -> Result<ListenerId> {
        let rc = self.upgrade()?;
        let mut guard = rc.borrow_mut();
        let inner = &mut *guard;
        let slot = inner.values.get_mut(id).ok_or(MotionError::ValueDropped)?;
        inner.next_listener += 1;
        let listener_id = ListenerId(inner.next_listener);
        match kind {
            ListenerKind::Change => slot.on_change.push((listener_id, listener)),
            ListenerKind::Complete => slot.on_complete.push((listener_id, listener)),
        }
        Ok(listener_id)
    }

    pub(crate) fn unsubscribe(&self, id: ValueId, listener: ListenerId) {
        let Some(rc) = self.inner.upgrade() else {
            return;
        };
        let mut inner = rc.borrow_mut();
        if let Some(slot) = inner.values.get_mut(id) {
            slot.on_change.retain(|(l, _)| *l != listener);
            slot.on_complete.retain(|(l, _)| *l != listener);
        }
    }

    /// Replace the value's timeline with one heading to `target`
    ///
    /// An invalid transition is rejected before the current timeline is
    /// touched.
    pub(crate) fn animate(&self, id: ValueId, target: f32, config: &TransitionConfig) -> Result<AnimationHandle> {
        let rc = self.upgrade()?;
        let (done, outcome) = oneshot::channel();
        {
            let mut guard = rc.borrow_mut();
            let inner = &mut *guard;
            let slot = inner.values.get_mut(id).ok_or(MotionError::ValueDropped)?;

            let config = inherit_velocity(config, slot.active.as_ref());
            let timeline = Timeline::new(slot.value, target, &config, &inner.config)?;

            slot.cancel(id);
            tracing::debug!(
                value = ?id,
                from = slot.value,
                to = target,
                duration_ms = timeline.duration_ms(),
                "timeline started"
            );
            slot.active = Some(ActiveTimeline {
                timeline,
                done: Some(done),
            });
        }
        wake(&rc);
        Ok(AnimationHandle::new(outcome))
    }

    pub(crate) fn stop(&self, id: ValueId) -> Result<()> {
        let rc = self.upgrade()?;
        let mut inner = rc.borrow_mut();
        let slot = inner.values.get_mut(id).ok_or(MotionError::ValueDropped)?;
        slot.cancel(id);
        Ok(())
    }

    /// Forward a playback operation; without a timeline it is a logged no-op
    pub(crate) fn control(&self, id: ValueId, op: Control) -> Result<()> {
        let rc = self.upgrade()?;
        let applied = {
            let mut guard = rc.borrow_mut();
            let inner = &mut *guard;
            let slot = inner.values.get_mut(id).ok_or(MotionError::ValueDropped)?;
            let Some(active) = slot.active.as_mut() else {
                tracing::warn!(value = ?id, op = op.name(), "no active timeline, ignoring");
                return Ok(());
            };

            let applied = match op {
                Control::Play => active.timeline.play(),
                Control::Pause => active.timeline.pause(),
                Control::Reverse => active.timeline.reverse(),
                Control::Seek(progress) => match active.timeline.seek(progress) {
                    Some(value) => {
                        slot.value = value;
                        inner.pending.insert(id);
                        true
                    }
                    None => false,
                },
            };
            if !applied {
                tracing::debug!(
                    value = ?id,
                    op = op.name(),
                    state = ?active.timeline.state(),
                    "control had no effect"
                );
            }
            applied
        };
        if applied {
            wake(&rc);
        }
        Ok(())
    }

    pub(crate) fn timeline(&self, id: ValueId) -> Option<TimelineSnapshot> {
        let rc = self.inner.upgrade()?;
        let inner = rc.borrow();
        inner
            .values
            .get(id)
            .and_then(|slot| slot.active.as_ref())
            .map(|active| active.timeline.snapshot())
    }

    pub(crate) fn is_bound(&self, id: ValueId) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|rc| rc.borrow().values.get(id).is_some_and(|slot| slot.binding.is_some()))
    }

    /// Drop a value: cancel its timeline and leave its element's transform
    /// composed from whatever contributors remain
    pub(crate) fn remove(&self, id: ValueId) {
        let Some(rc) = self.inner.upgrade() else {
            return;
        };
        let write = {
            let Ok(mut guard) = rc.try_borrow_mut() else {
                tracing::warn!(value = ?id, "engine busy, motion value not released");
                return;
            };
            let inner = &mut *guard;
            inner.pending.shift_remove(&id);
            let Some(mut slot) = inner.values.remove(id) else {
                return;
            };
            slot.cancel(id);
            slot.binding
                .and_then(|binding| binding.contributor)
                .and_then(|contributor| inner.registry.borrow_mut().unregister(contributor))
                .and_then(|write| inner.host.clone().map(|host| (host, write)))
        };
        if let Some((host, (element, text))) = write {
            host.set_style(element, "transform", &text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use kinetic_core::MemoryHost;
    use std::cell::Cell;

    fn engine_with_host() -> (MotionEngine, Rc<MemoryHost>) {
        let host = Rc::new(MemoryHost::new());
        let engine = MotionEngine::default().with_host(host.clone());
        (engine, host)
    }

    #[test]
    fn test_tick_reports_pending_work() {
        let (engine, _host) = engine_with_host();
        assert!(!engine.tick(0.0));

        let value = engine.create_motion_value(0.0, MotionValueOptions::new());
        value
            .animate_to(10.0, TransitionConfig::tween(100.0, Easing::Linear))
            .unwrap();
        assert!(engine.has_active_animations());
        assert!(engine.tick(16.0));
        assert!(!engine.tick(200.0));
        assert_eq!(value.get(), 10.0);
    }

    #[test]
    fn test_timers_fire_in_due_order() {
        let engine = MotionEngine::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (delay, tag) in [(30.0, "late"), (10.0, "early"), (0.0, "now")] {
            let log = log.clone();
            engine.schedule_after(delay, move || log.borrow_mut().push(tag));
        }

        engine.tick(100.0);
        assert_eq!(*log.borrow(), vec!["now"]);
        engine.tick(130.0);
        assert_eq!(*log.borrow(), vec!["now", "early", "late"]);
        assert!(!engine.has_active_animations());
    }

    #[test]
    fn test_wake_callback_on_new_work() {
        let engine = MotionEngine::default();
        let wakes = Rc::new(Cell::new(0));
        let counter = wakes.clone();
        engine.set_wake_callback(move || counter.set(counter.get() + 1));

        let value = engine.create_motion_value(1.0, MotionValueOptions::new());
        value.set(2.0);
        engine.schedule_after(5.0, || {});
        assert_eq!(wakes.get(), 2);
    }

    #[test]
    fn test_flush_writes_bound_styles() {
        let (engine, host) = engine_with_host();
        let el = ElementId(9);
        let opacity = engine.create_motion_value(1.0, MotionValueOptions::new().bind(el, StyleProperty::Opacity));

        engine.flush();
        assert_eq!(host.writes_to(el, "opacity"), vec!["1"]);

        opacity.set(0.25);
        opacity.set(0.5);
        engine.flush();
        assert_eq!(host.writes_to(el, "opacity"), vec!["1", "0.5"]);
    }

    #[test]
    fn test_dropping_engine_invalidates_handles() {
        let engine = MotionEngine::default();
        let handle = engine.handle();
        assert!(handle.is_alive());
        drop(engine);
        assert!(!handle.is_alive());
        assert!(handle.create_motion_value(0.0, MotionValueOptions::new()).is_err());
        assert_eq!(handle.schedule_after(1.0, || {}), Err(MotionError::ValueDropped));
    }

    #[test]
    fn test_detach_element_stops_writes() {
        let (engine, host) = engine_with_host();
        let el = ElementId(2);
        let x = engine.create_motion_value(0.0, MotionValueOptions::new().bind(el, StyleProperty::TRANSLATE_X));
        engine.flush();
        host.take_writes();

        engine.detach_element(el);
        assert!(!engine.registry().borrow().is_registered(el));
        x.set(50.0);
        engine.flush();
        assert!(host.writes().is_empty());
        assert_eq!(x.get(), 50.0);
    }
}
