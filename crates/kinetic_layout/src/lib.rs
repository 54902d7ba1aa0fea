//! Kinetic Layout
//!
//! Layout-change animation with the FLIP technique.
//!
//! - [`LayoutTransitionEngine`]: measurement, transform deltas, keyframe
//!   generation, and change detection over a batch of elements
//! - [`LayoutTracker`]: automatic FLIP for tracked elements, driven by a
//!   [`MotionEngine`](kinetic_animation::MotionEngine)

pub mod flip;
pub mod tracker;

pub use flip::{
    transform_css, FlipKeyframeSet, FlipOptions, LayoutChange, LayoutSnapshot, LayoutTransitionEngine,
    TransformOrigin,
};
pub use tracker::{LayoutConfig, LayoutTracker};
