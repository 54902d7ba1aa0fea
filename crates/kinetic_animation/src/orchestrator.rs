//! Variant orchestration
//!
//! A parent fans one named state change out to its registered children,
//! optionally staggering their start times:
//!
//! ```text
//! delay(child i) = delay_children + stagger_children * i
//! ```
//!
//! Children are anything implementing [`AnimationControls`]; the usual one is
//! [`VariantControls`], a set of motion values driven by named [`Variants`].
//! Aggregate futures settle every member before resolving and report each
//! member's outcome, so one failure never hides the rest.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::future::{self, FutureExt, LocalBoxFuture};
use indexmap::IndexMap;
use kinetic_core::{ElementId, MotionError, Result, StyleProperty};
use tokio::sync::oneshot;

use crate::engine::SchedulerHandle;
use crate::transition::TransitionConfig;
use crate::value::{AnimationOutcome, MotionValue, MotionValueOptions};

/// Future returned by [`AnimationControls::animate_to`]
pub type ControlsFuture = LocalBoxFuture<'static, Result<AnimationOutcome>>;

/// What an orchestrator needs from a child
pub trait AnimationControls {
    /// Jump to `state` without animating
    fn set(&self, state: &str) -> Result<()>;

    /// Animate to `state`, using `transition` or the state's own transition
    fn animate_to(&self, state: &str, transition: Option<&TransitionConfig>) -> ControlsFuture;
}

// ============================================================================
// Configuration
// ============================================================================

/// Order in which children receive their stagger slot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StaggerDirection {
    /// First registered starts first
    #[default]
    Forward,
    /// Last registered starts first
    Reverse,
    /// Middle child starts first, spreading outward
    FromCenter,
}

/// Timing for a parent's children
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrchestrationConfig {
    /// Gap between consecutive children's starts
    pub stagger_children_ms: f32,
    /// Wait before the first child starts
    pub delay_children_ms: f32,
    pub stagger_direction: StaggerDirection,
    /// Cap on the stagger index, so long lists don't wait forever
    pub limit: Option<usize>,
}

impl OrchestrationConfig {
    pub fn new(stagger_children_ms: f32, delay_children_ms: f32) -> Self {
        Self {
            stagger_children_ms,
            delay_children_ms,
            ..Self::default()
        }
    }

    pub fn stagger(mut self, ms: f32) -> Self {
        self.stagger_children_ms = ms;
        self
    }

    pub fn delay(mut self, ms: f32) -> Self {
        self.delay_children_ms = ms;
        self
    }

    /// Stagger from last to first
    pub fn reverse(mut self) -> Self {
        self.stagger_direction = StaggerDirection::Reverse;
        self
    }

    /// Stagger from center outward
    pub fn from_center(mut self) -> Self {
        self.stagger_direction = StaggerDirection::FromCenter;
        self
    }

    /// Limit stagger to first N items
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Whether this config delays anyone at all
    pub fn is_staggered(&self) -> bool {
        self.stagger_children_ms > 0.0 || self.delay_children_ms > 0.0
    }

    /// Start delay for the child at `index` of `total`
    pub fn delay_for_index(&self, index: usize, total: usize) -> f32 {
        let effective_index = match self.stagger_direction {
            StaggerDirection::Forward => index,
            StaggerDirection::Reverse => total.saturating_sub(1).saturating_sub(index),
            StaggerDirection::FromCenter => {
                let center = total / 2;
                center.abs_diff(index)
            }
        };
        let capped = self.limit.map_or(effective_index, |limit| effective_index.min(limit));
        (self.delay_children_ms + self.stagger_children_ms * capped as f32).max(0.0)
    }
}

// ============================================================================
// Variants
// ============================================================================

/// Target values for one named state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Variant {
    /// Property name (`"x"`, `"opacity"`, ...) to target value
    pub targets: IndexMap<String, f32>,
    pub transition: Option<TransitionConfig>,
    /// When set, entering this state also orchestrates children
    pub orchestration: Option<OrchestrationConfig>,
}

impl Variant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, property: impl Into<String>, value: f32) -> Self {
        self.targets.insert(property.into(), value);
        self
    }

    pub fn transition(mut self, transition: impl Into<TransitionConfig>) -> Self {
        self.transition = Some(transition.into());
        self
    }

    pub fn orchestrate(mut self, config: OrchestrationConfig) -> Self {
        self.orchestration = Some(config);
        self
    }
}

/// Named states, in declaration order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Variants {
    states: IndexMap<String, Variant>,
}

impl Variants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variant(mut self, name: impl Into<String>, variant: Variant) -> Self {
        self.states.insert(name.into(), variant);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Variant> {
        self.states.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    fn lookup(&self, name: &str) -> Result<&Variant> {
        self.get(name).ok_or_else(|| {
            tracing::warn!(state = name, "unknown variant");
            MotionError::UnknownVariant(name.to_string())
        })
    }
}

/// Per-value outcomes of one variant animation
pub type ValueOutcomes = Vec<(String, Result<AnimationOutcome>)>;

/// Motion values driven by named variants
///
/// One value is created per property any variant names, bound to `element`
/// when one is given.
pub struct VariantControls {
    values: IndexMap<String, MotionValue>,
    variants: Variants,
    current: RefCell<Option<String>>,
}

impl VariantControls {
    pub fn new(
        engine: &SchedulerHandle,
        element: Option<ElementId>,
        variants: Variants,
        initial: Option<&str>,
    ) -> Result<Self> {
        let start = initial.map(|name| variants.lookup(name)).transpose()?;

        let mut values = IndexMap::new();
        for variant in variants.states.values() {
            for name in variant.targets.keys() {
                if values.contains_key(name) {
                    continue;
                }
                let property = match name.parse::<StyleProperty>() {
                    Ok(property) => property,
                    Err(never) => match never {},
                };
                let initial_value = start
                    .and_then(|v| v.targets.get(name).copied())
                    .unwrap_or_else(|| resting_value(&property));
                let options = match element {
                    Some(element) => MotionValueOptions::new().bind(element, property),
                    None => MotionValueOptions::new().property(property),
                };
                values.insert(name.clone(), engine.create_motion_value(initial_value, options)?);
            }
        }

        Ok(Self {
            values,
            variants,
            current: RefCell::new(initial.map(str::to_string)),
        })
    }

    pub fn value(&self, property: &str) -> Option<&MotionValue> {
        self.values.get(property)
    }

    pub fn variants(&self) -> &Variants {
        &self.variants
    }

    /// Name of the state last entered
    pub fn current(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    /// The variant last entered
    pub fn current_variant(&self) -> Option<&Variant> {
        let name = self.current.borrow().clone()?;
        self.variants.get(&name)
    }

    /// Animate every value `state` names and report each one's outcome
    ///
    /// Values that reject the transition report the error; the rest still run.
    pub fn animate_values_to(
        &self,
        state: &str,
        transition: Option<&TransitionConfig>,
    ) -> Result<LocalBoxFuture<'static, ValueOutcomes>> {
        let variant = self.variants.lookup(state)?;
        let transition = transition
            .or(variant.transition.as_ref())
            .cloned()
            .unwrap_or_default();
        *self.current.borrow_mut() = Some(state.to_string());

        let members: Vec<LocalBoxFuture<'static, (String, Result<AnimationOutcome>)>> = variant
            .targets
            .iter()
            .filter_map(|(name, target)| {
                let value = self.values.get(name)?;
                let name = name.clone();
                Some(match value.animate_to(*target, transition.clone()) {
                    Ok(handle) => handle.map(move |outcome| (name, Ok(outcome))).boxed_local(),
                    Err(err) => future::ready((name, Err(err))).boxed_local(),
                })
            })
            .collect();

        Ok(future::join_all(members).boxed_local())
    }
}

impl AnimationControls for VariantControls {
    fn set(&self, state: &str) -> Result<()> {
        let variant = self.variants.lookup(state)?;
        for (name, target) in &variant.targets {
            if let Some(value) = self.values.get(name) {
                value.set(*target);
            }
        }
        *self.current.borrow_mut() = Some(state.to_string());
        Ok(())
    }

    fn animate_to(&self, state: &str, transition: Option<&TransitionConfig>) -> ControlsFuture {
        match self.animate_values_to(state, transition) {
            Ok(members) => members.map(summarize).boxed_local(),
            Err(err) => future::ready(Err(err)).boxed_local(),
        }
    }
}

/// Collapse per-value outcomes: the first failure if any, else `Completed`
/// only when every value completed
fn summarize(outcomes: ValueOutcomes) -> Result<AnimationOutcome> {
    let mut first_error = None;
    let mut all_completed = true;
    for (name, outcome) in outcomes {
        match outcome {
            Ok(outcome) => all_completed &= outcome.is_completed(),
            Err(err) => {
                tracing::warn!(property = %name, %err, "value failed to animate");
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None if all_completed => Ok(AnimationOutcome::Completed),
        None => Ok(AnimationOutcome::Cancelled),
    }
}

fn resting_value(property: &StyleProperty) -> f32 {
    match property {
        StyleProperty::Transform(component) => component.identity(),
        StyleProperty::Opacity => 1.0,
        _ => 0.0,
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Identifies a child within its parent's registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildId(pub u64);

impl From<u64> for ChildId {
    fn from(raw: u64) -> Self {
        ChildId(raw)
    }
}

type ChildRegistry = IndexMap<ChildId, Rc<dyn AnimationControls>>;

/// Every child's outcome, in registry order
#[derive(Clone, Debug, PartialEq)]
pub struct OrchestrationReport {
    pub outcomes: Vec<(ChildId, Result<AnimationOutcome>)>,
}

impl OrchestrationReport {
    pub fn all_completed(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, outcome)| matches!(outcome, Ok(AnimationOutcome::Completed)))
    }

    /// Children whose animation failed
    pub fn failures(&self) -> Vec<(ChildId, &MotionError)> {
        self.outcomes
            .iter()
            .filter_map(|(id, outcome)| outcome.as_ref().err().map(|err| (*id, err)))
            .collect()
    }
}

/// Future resolving once every child has settled
pub struct OrchestrationHandle {
    inner: LocalBoxFuture<'static, OrchestrationReport>,
}

impl Future for OrchestrationHandle {
    type Output = OrchestrationReport;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

/// Outcome of [`Orchestrator::transition_to`]
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionReport {
    pub parent: Result<AnimationOutcome>,
    /// Present when the state declared orchestration
    pub children: Option<OrchestrationReport>,
}

impl TransitionReport {
    /// Collapse into one outcome: the parent's error first, then the first
    /// child error, then `Cancelled` if anything was interrupted
    pub fn outcome(&self) -> Result<AnimationOutcome> {
        let parent = self.parent.clone()?;
        let Some(children) = &self.children else {
            return Ok(parent);
        };
        if let Some((_, err)) = children.failures().first() {
            return Err((*err).clone());
        }
        if parent == AnimationOutcome::Completed && children.all_completed() {
            Ok(AnimationOutcome::Completed)
        } else {
            Ok(AnimationOutcome::Cancelled)
        }
    }
}

/// A parent and its ordered registry of children
pub struct Orchestrator {
    engine: SchedulerHandle,
    parent: Option<VariantControls>,
    children: Rc<RefCell<ChildRegistry>>,
}

impl Orchestrator {
    pub fn new(engine: SchedulerHandle) -> Self {
        Self {
            engine,
            parent: None,
            children: Rc::new(RefCell::new(IndexMap::new())),
        }
    }

    /// An orchestrator whose parent animates its own variants
    pub fn with_parent(engine: SchedulerHandle, parent: VariantControls) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new(engine)
        }
    }

    /// The parent's current state
    ///
    /// The parent's own controls stay private so every state change passes
    /// through [`Orchestrator::transition_to`].
    pub fn current_state(&self) -> Option<String> {
        self.parent.as_ref().and_then(VariantControls::current)
    }

    /// One of the parent's animated values
    pub fn parent_value(&self, property: &str) -> Option<&MotionValue> {
        self.parent.as_ref().and_then(|parent| parent.value(property))
    }

    /// Add a child; re-registering an id replaces it in place
    pub fn register_child(&self, id: impl Into<ChildId>, controls: Rc<dyn AnimationControls>) {
        let id = id.into();
        let mut children = self.children.borrow_mut();
        children.insert(id, controls);
        tracing::debug!(child = ?id, index = children.get_index_of(&id), "child registered");
    }

    /// Remove a child, keeping the others' order
    pub fn unregister_child(&self, id: impl Into<ChildId>) -> Option<Rc<dyn AnimationControls>> {
        let id = id.into();
        let removed = self.children.borrow_mut().shift_remove(&id);
        if removed.is_some() {
            tracing::debug!(child = ?id, "child unregistered");
        }
        removed
    }

    pub fn child_ids(&self) -> Vec<ChildId> {
        self.children.borrow().keys().copied().collect()
    }

    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    /// Jump every child to `state`
    pub fn set_children(&self, state: &str) -> Vec<(ChildId, Result<()>)> {
        self.snapshot()
            .into_iter()
            .map(|(id, controls)| (id, controls.set(state)))
            .collect()
    }

    /// The parent's resolved orchestration, or no stagger at all
    fn resolved_config(&self) -> OrchestrationConfig {
        self.parent
            .as_ref()
            .and_then(|parent| parent.current_variant())
            .and_then(|variant| variant.orchestration)
            .unwrap_or_default()
    }

    fn snapshot(&self) -> Vec<(ChildId, Rc<dyn AnimationControls>)> {
        self.children
            .borrow()
            .iter()
            .map(|(id, controls)| (*id, Rc::clone(controls)))
            .collect()
    }

    /// Animate every child to `state` with staggered starts
    ///
    /// Without `config` the parent's current variant supplies the timing.
    /// Children with no delay start before this returns; the rest start from
    /// engine timers. The handle resolves once all of them settle.
    pub fn animate_children_to(&self, state: &str, config: Option<OrchestrationConfig>) -> OrchestrationHandle {
        let config = config.unwrap_or_else(|| self.resolved_config());
        let children = self.snapshot();
        let total = children.len();

        let members: Vec<LocalBoxFuture<'static, (ChildId, Result<AnimationOutcome>)>> = children
            .into_iter()
            .enumerate()
            .map(|(index, (id, controls))| {
                let delay_ms = config.delay_for_index(index, total);
                tracing::debug!(child = ?id, index, delay_ms, state, "child scheduled");
                let started = if delay_ms <= 0.0 {
                    controls.animate_to(state, None)
                } else {
                    self.start_later(id, controls, state.to_string(), delay_ms)
                };
                started.map(move |outcome| (id, outcome)).boxed_local()
            })
            .collect();

        OrchestrationHandle {
            inner: future::join_all(members)
                .map(|outcomes| OrchestrationReport { outcomes })
                .boxed_local(),
        }
    }

    /// Start a child's animation from an engine timer
    ///
    /// A child unregistered before its timer fires is reported cancelled.
    fn start_later(
        &self,
        id: ChildId,
        controls: Rc<dyn AnimationControls>,
        state: String,
        delay_ms: f32,
    ) -> ControlsFuture {
        let (started_tx, started_rx) = oneshot::channel::<ControlsFuture>();
        let registry = Rc::downgrade(&self.children);

        let scheduled = self.engine.schedule_after(delay_ms, move || {
            let registered = registry
                .upgrade()
                .is_some_and(|children| children.borrow().contains_key(&id));
            if registered {
                let _ = started_tx.send(controls.animate_to(&state, None));
            } else {
                tracing::debug!(child = ?id, "child left before its delayed start");
            }
        });

        match scheduled {
            Ok(()) => async move {
                match started_rx.await {
                    Ok(animation) => animation.await,
                    Err(_) => Ok(AnimationOutcome::Cancelled),
                }
            }
            .boxed_local(),
            Err(err) => future::ready(Err(err)).boxed_local(),
        }
    }

    /// Move the parent into `state`, orchestrating children when the state
    /// declares stagger or delay
    ///
    /// Fails when there is no parent or it has no such state.
    pub fn transition_to(&self, state: &str) -> Result<LocalBoxFuture<'static, TransitionReport>> {
        self.start_transition(state, None)
    }

    fn start_transition(
        &self,
        state: &str,
        transition: Option<&TransitionConfig>,
    ) -> Result<LocalBoxFuture<'static, TransitionReport>> {
        let parent = self
            .parent
            .as_ref()
            .ok_or_else(|| MotionError::UnknownVariant(state.to_string()))?;
        let orchestration = parent.variants().lookup(state)?.orchestration;

        let parent_done = parent.animate_to(state, transition);
        let children = orchestration.map(|config| self.animate_children_to(state, Some(config)));

        Ok(async move {
            match children {
                Some(children) => {
                    let (parent, children) = future::join(parent_done, children).await;
                    TransitionReport {
                        parent,
                        children: Some(children),
                    }
                }
                None => TransitionReport {
                    parent: parent_done.await,
                    children: None,
                },
            }
        }
        .boxed_local())
    }
}

/// Orchestrators nest: a parent orchestrator drives a child one through its
/// own state changes
impl AnimationControls for Orchestrator {
    fn set(&self, state: &str) -> Result<()> {
        if let Some(parent) = &self.parent {
            parent.set(state)?;
        }
        self.set_children(state).into_iter().map(|(_, result)| result).collect()
    }

    fn animate_to(&self, state: &str, transition: Option<&TransitionConfig>) -> ControlsFuture {
        match self.start_transition(state, transition) {
            Ok(report) => report.map(|report| report.outcome()).boxed_local(),
            Err(err) => future::ready(Err(err)).boxed_local(),
        }
    }
}
