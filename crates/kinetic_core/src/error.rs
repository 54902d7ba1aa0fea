//! Error types for the Kinetic motion engine

use thiserror::Error;

/// Errors returned at call time by engine operations
///
/// Conditions the engine tolerates (controlling an idle value, measuring a
/// detached element) are logged instead of returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Spring parameters cannot describe a damped oscillator
    #[error("invalid spring configuration: stiffness={stiffness}, damping={damping}, mass={mass}")]
    InvalidSpring {
        stiffness: f32,
        damping: f32,
        mass: f32,
    },

    /// Duration is negative or not finite
    #[error("invalid duration: {0}ms")]
    InvalidDuration(f32),

    /// Easing name or `cubic-bezier(...)` text could not be parsed
    #[error("invalid easing: {0}")]
    InvalidEasing(String),

    /// Keyframe track is empty or its times are malformed
    #[error("invalid keyframes: {0}")]
    InvalidKeyframes(String),

    /// Transform origin name not recognized
    #[error("invalid transform origin: {0}")]
    InvalidOrigin(String),

    /// Orchestration state name was never declared
    #[error("unknown variant: {0}")]
    UnknownVariant(String),

    /// The motion value (or the engine owning it) no longer exists
    #[error("motion value has been dropped")]
    ValueDropped,
}

/// Result type for Kinetic operations
pub type Result<T> = std::result::Result<T, MotionError>;
