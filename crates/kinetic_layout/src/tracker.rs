//! Automatic FLIP for tracked elements
//!
//! Each tracked element gets four motion values bound to its transform
//! (`translateX`, `translateY`, `scaleX`, `scaleY`). On a layout change the
//! tracker:
//!
//! 1. Measures every tracked element in one pass, before writing anything
//! 2. Sets each changed element's values to the inverted delta and flushes,
//!    so the old geometry is what gets painted
//! 3. On the next frame, animates the values back to identity
//!
//! Inverting after the paint instead would show the new layout for a frame.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use kinetic_animation::{MotionValue, MotionValueOptions, SchedulerHandle, SpringConfig, TransitionConfig};
use kinetic_core::{BoundingBox, ElementId, LayoutHost, Result, StyleProperty, TransformDelta};

use crate::flip::{LayoutChange, LayoutSnapshot, LayoutTransitionEngine, TransformOrigin};

// ============================================================================
// Configuration
// ============================================================================

/// How tracked elements animate their layout changes
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutConfig {
    /// Minimum movement, in host units
    pub position_threshold: f32,
    /// Minimum size change, as a fraction (0.01 = 1%)
    pub scale_threshold: f32,
    /// Frames to let layout commit before [`LayoutTracker::schedule_layout_change`] measures
    pub settle_frames: u32,
    pub origin: TransformOrigin,
    pub transition: TransitionConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            position_threshold: 1.0,
            scale_threshold: 0.01,
            settle_frames: 2,
            origin: TransformOrigin::Center,
            transition: TransitionConfig::spring(SpringConfig::snappy()),
        }
    }
}

impl LayoutConfig {
    pub fn thresholds(mut self, position: f32, scale: f32) -> Self {
        self.position_threshold = position;
        self.scale_threshold = scale;
        self
    }

    pub fn settle_frames(mut self, frames: u32) -> Self {
        self.settle_frames = frames;
        self
    }

    pub fn origin(mut self, origin: TransformOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn transition(mut self, transition: impl Into<TransitionConfig>) -> Self {
        self.transition = transition.into();
        self
    }

    /// Use a gentle spring (slow, smooth)
    pub fn gentle(self) -> Self {
        self.transition(SpringConfig::gentle())
    }

    /// Use a wobbly spring (with overshoot)
    pub fn wobbly(self) -> Self {
        self.transition(SpringConfig::wobbly())
    }
}

// ============================================================================
// Tracked Elements
// ============================================================================

struct Tracked {
    /// Layout bounds as of the last measurement
    layout: BoundingBox,
    x: MotionValue,
    y: MotionValue,
    scale_x: MotionValue,
    scale_y: MotionValue,
}

impl Tracked {
    fn bind(engine: &SchedulerHandle, element: ElementId, layout: BoundingBox) -> Result<Self> {
        let value = |property: StyleProperty, initial: f32| {
            engine.create_motion_value(initial, MotionValueOptions::new().bind(element, property))
        };
        Ok(Self {
            layout,
            x: value(StyleProperty::TRANSLATE_X, 0.0)?,
            y: value(StyleProperty::TRANSLATE_Y, 0.0)?,
            scale_x: value(StyleProperty::SCALE_X, 1.0)?,
            scale_y: value(StyleProperty::SCALE_Y, 1.0)?,
        })
    }

    /// Transform currently applied on top of the layout box
    fn offset(&self) -> TransformDelta {
        TransformDelta {
            x: self.x.get(),
            y: self.y.get(),
            scale_x: self.scale_x.get(),
            scale_y: self.scale_y.get(),
        }
    }

    fn channels(&self) -> [(&MotionValue, f32); 4] {
        [
            (&self.x, 0.0),
            (&self.y, 0.0),
            (&self.scale_x, 1.0),
            (&self.scale_y, 1.0),
        ]
    }

    fn is_animating(&self) -> bool {
        self.channels().iter().any(|(value, _)| value.is_animating())
    }

    /// Jump to `delta`, cancelling any animation in flight
    fn invert(&self, delta: &TransformDelta) {
        self.x.set(delta.x);
        self.y.set(delta.y);
        self.scale_x.set(delta.scale_x);
        self.scale_y.set(delta.scale_y);
    }

    fn play(&self, element: ElementId, transition: &TransitionConfig) {
        for (value, identity) in self.channels() {
            if let Err(err) = value.animate_to(identity, transition.clone()) {
                tracing::warn!(element = %element, %err, "layout transition rejected");
            }
        }
    }
}

struct TrackerState {
    engine: SchedulerHandle,
    flip: LayoutTransitionEngine,
    config: LayoutConfig,
    tracked: IndexMap<ElementId, Tracked>,
}

// ============================================================================
// Tracker
// ============================================================================

/// Animates layout changes of a batch of elements
pub struct LayoutTracker {
    state: Rc<RefCell<TrackerState>>,
}

impl LayoutTracker {
    /// `engine` should write to the same `host` that reports geometry
    pub fn new(engine: SchedulerHandle, host: Rc<dyn LayoutHost>, config: LayoutConfig) -> Self {
        let flip = LayoutTransitionEngine::new(host).with_thresholds(config.position_threshold, config.scale_threshold);
        Self {
            state: Rc::new(RefCell::new(TrackerState {
                engine,
                flip,
                config,
                tracked: IndexMap::new(),
            })),
        }
    }

    pub fn config(&self) -> LayoutConfig {
        self.state.borrow().config.clone()
    }

    /// Start tracking `element` from its current bounds
    ///
    /// Returns false (with a warning) for a detached element. Tracking an
    /// element twice re-records its bounds.
    pub fn track(&self, element: ElementId) -> Result<bool> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;

        let Some(bounds) = state.flip.host().bounding_box(element) else {
            tracing::warn!(element = %element, "cannot track detached element");
            return Ok(false);
        };
        if let Some(tracked) = state.tracked.get_mut(&element) {
            tracked.layout = bounds;
            return Ok(true);
        }

        let tracked = Tracked::bind(&state.engine, element, bounds)?;
        state
            .flip
            .host()
            .set_style(element, "transform-origin", state.config.origin.to_css());
        state.tracked.insert(element, tracked);
        tracing::debug!(element = %element, ?bounds, "element tracked");
        Ok(true)
    }

    /// Stop tracking; the element's transform is reset
    pub fn untrack(&self, element: ElementId) -> bool {
        let removed = self.state.borrow_mut().tracked.shift_remove(&element);
        // Dropped outside the borrow: releasing the values writes to the host
        removed.is_some()
    }

    pub fn is_tracked(&self, element: ElementId) -> bool {
        self.state.borrow().tracked.contains_key(&element)
    }

    pub fn tracked_count(&self) -> usize {
        self.state.borrow().tracked.len()
    }

    pub fn tracked_elements(&self) -> Vec<ElementId> {
        self.state.borrow().tracked.keys().copied().collect()
    }

    /// Layout bounds recorded at the last measurement
    pub fn last_bounds(&self, element: ElementId) -> Option<BoundingBox> {
        self.state.borrow().tracked.get(&element).map(|t| t.layout)
    }

    /// Where the element is drawn right now, transform included
    pub fn visual_bounds(&self, element: ElementId) -> Option<BoundingBox> {
        let state = self.state.borrow();
        let origin = state.config.origin;
        state
            .tracked
            .get(&element)
            .map(|t| origin.visual_bounds(&t.layout, &t.offset()))
    }

    pub fn is_animating(&self, element: ElementId) -> bool {
        self.state
            .borrow()
            .tracked
            .get(&element)
            .is_some_and(Tracked::is_animating)
    }

    /// Recorded layout bounds of every tracked element
    pub fn snapshot(&self) -> LayoutSnapshot {
        let state = self.state.borrow();
        let mut snapshot = LayoutSnapshot::new();
        for (element, tracked) in &state.tracked {
            snapshot.insert(*element, tracked.layout);
        }
        snapshot
    }

    /// Re-record bounds without animating, e.g. after the first render
    pub fn sync_bounds(&self) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let elements: Vec<ElementId> = state.tracked.keys().copied().collect();
        let measured = state.flip.measure_batch(&elements);
        for (element, tracked) in state.tracked.iter_mut() {
            if let Some(bounds) = measured.get(*element) {
                tracked.layout = bounds;
            }
        }
    }

    /// Run FLIP now: the host has applied a new layout but not painted it
    ///
    /// Returns the elements that moved. Elements that left the host are
    /// untracked.
    pub fn layout_changed(&self) -> Vec<LayoutChange> {
        apply_layout_change(&self.state)
    }

    /// Run FLIP once layout has had `settle_frames` frames to commit
    pub fn schedule_layout_change(&self) -> Result<()> {
        let (engine, frames) = {
            let state = self.state.borrow();
            (state.engine.clone(), state.config.settle_frames)
        };
        if frames == 0 {
            apply_layout_change(&self.state);
            return Ok(());
        }
        wait_frames(&engine, Rc::downgrade(&self.state), frames)
    }
}

/// Re-check every frame until `remaining` frames have passed
fn wait_frames(engine: &SchedulerHandle, state: Weak<RefCell<TrackerState>>, remaining: u32) -> Result<()> {
    let handle = engine.clone();
    engine.schedule_after(0.0, move || {
        let Some(rc) = state.upgrade() else {
            return;
        };
        if remaining <= 1 {
            apply_layout_change(&rc);
        } else if let Err(err) = wait_frames(&handle, state, remaining - 1) {
            tracing::warn!(%err, "layout change abandoned");
        }
    })
}

fn apply_layout_change(rc: &Rc<RefCell<TrackerState>>) -> Vec<LayoutChange> {
    let (engine, changes, detached) = {
        let mut guard = rc.borrow_mut();
        let state = &mut *guard;

        // Read every box before writing any style
        let elements: Vec<ElementId> = state.tracked.keys().copied().collect();
        let measured = state.flip.measure_batch(&elements);

        let mut detached = Vec::new();
        for element in &elements {
            if measured.get(*element).is_none() {
                state.engine.detach_element(*element);
                if let Some(tracked) = state.tracked.shift_remove(element) {
                    detached.push(tracked);
                }
                tracing::debug!(element = %element, "tracked element left the host");
            }
        }

        let origin = state.config.origin;
        let mut changes = Vec::new();
        for (element, tracked) in state.tracked.iter_mut() {
            let Some(current) = measured.get(*element) else {
                continue;
            };
            let previous = std::mem::replace(&mut tracked.layout, current);
            let moved = LayoutTransitionEngine::calculate_transform_delta(&previous, &current);
            if !state.flip.is_significant(&moved) {
                continue;
            }

            // Mid-flight, invert from where the element is drawn
            let from = origin.visual_bounds(&previous, &tracked.offset());
            let raw = LayoutTransitionEngine::calculate_transform_delta(&from, &current);
            let delta = origin.adjust(&raw, &current);
            tracked.invert(&delta);
            tracing::debug!(element = %element, ?delta, "layout change detected");
            changes.push(LayoutChange {
                element: *element,
                delta,
                previous,
                current,
            });
        }
        (state.engine.clone(), changes, detached)
    };
    drop(detached);

    // Inverted transforms must reach the host before it paints
    engine.flush();

    if !changes.is_empty() {
        let state = Rc::downgrade(rc);
        let moved: Vec<ElementId> = changes.iter().map(|change| change.element).collect();
        let scheduled = engine.schedule_after(0.0, move || {
            let Some(rc) = state.upgrade() else {
                return;
            };
            let state = rc.borrow();
            for element in &moved {
                if let Some(tracked) = state.tracked.get(element) {
                    tracked.play(*element, &state.config.transition);
                }
            }
        });
        if let Err(err) = scheduled {
            tracing::warn!(%err, "layout transition not scheduled");
        }
    }
    changes
}
