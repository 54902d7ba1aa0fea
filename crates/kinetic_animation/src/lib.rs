//! Kinetic Animation
//!
//! Frame-driven motion for elements a [`LayoutHost`](kinetic_core::LayoutHost)
//! owns.
//!
//! # Features
//!
//! - **Springs**: RK4-integrated physics, baked for short motions and
//!   stepped live for long ones
//! - **Timelines**: Pause, play, reverse, and seek with exact interpolation
//! - **Motion Values**: Observable numbers bound to a style slot, with
//!   velocity carried across interruptions
//! - **Transform Composition**: Many values driving one element's transform
//! - **Orchestration**: Named variants and staggered children
//!
//! The host owns the clock. Call [`MotionEngine::tick`] once per frame while
//! it returns true (or whenever the wake callback fires).

pub mod composition;
pub mod easing;
pub mod engine;
pub mod keyframes;
pub mod orchestrator;
pub mod spring;
pub mod timeline;
pub mod transition;
pub mod value;

pub use composition::{CompositionId, ContributorId, TransformRegistry};
pub use easing::Easing;
pub use engine::{EngineConfig, ListenerId, MotionEngine, SchedulerHandle, ValueId, WakeCallback};
pub use keyframes::{Keyframe, KeyframeTrack};
pub use orchestrator::{
    AnimationControls, ChildId, ControlsFuture, OrchestrationConfig, OrchestrationHandle,
    OrchestrationReport, Orchestrator, StaggerDirection, TransitionReport, ValueOutcomes, Variant,
    VariantControls, Variants,
};
pub use spring::{SpringConfig, SpringState, SpringTrajectory};
pub use timeline::{Direction, Step, Timeline, TimelineSnapshot, TimelineState};
pub use transition::{LoopMode, Transition, TransitionConfig};
pub use value::{AnimationHandle, AnimationOutcome, MotionValue, MotionValueOptions, Unsubscribe};

pub use kinetic_core::{MotionError, Result};
