//! Transition configuration
//!
//! The animation strategy is picked explicitly when the transition is built,
//! never inferred from the values being animated.

use kinetic_core::{MotionError, Result};

use crate::easing::Easing;
use crate::keyframes::{Keyframe, KeyframeTrack};
use crate::spring::SpringConfig;

/// How a value travels to its target
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Transition {
    /// Physics-driven. Without a duration the spring's settle time is used.
    Spring {
        config: SpringConfig,
        duration_ms: Option<f32>,
    },
    /// Fixed duration along an easing curve
    Tween { duration_ms: f32, easing: Easing },
    /// Fixed duration through intermediate stops
    ///
    /// Missing ends are filled in with the current value (at 0.0) and the
    /// animation target (at 1.0).
    Keyframes {
        keyframes: Vec<Keyframe>,
        duration_ms: f32,
    },
}

/// What happens when a timeline reaches its end
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoopMode {
    /// Complete
    #[default]
    None,
    /// Jump back to the start and play again
    Repeat,
    /// Turn around and play toward the other end
    Reverse,
}

/// A [`Transition`] plus scheduling options
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionConfig {
    pub transition: Transition,
    /// Wait before the first frame of motion
    pub delay_ms: f32,
    pub loop_mode: LoopMode,
    /// Total plays when looping; `None` loops forever
    pub iterations: Option<u32>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self::spring(SpringConfig::default())
    }
}

impl From<Transition> for TransitionConfig {
    fn from(transition: Transition) -> Self {
        Self {
            transition,
            delay_ms: 0.0,
            loop_mode: LoopMode::None,
            iterations: None,
        }
    }
}

impl From<SpringConfig> for TransitionConfig {
    fn from(config: SpringConfig) -> Self {
        Self::spring(config)
    }
}

impl TransitionConfig {
    pub fn spring(config: SpringConfig) -> Self {
        Transition::Spring {
            config,
            duration_ms: None,
        }
        .into()
    }

    pub fn tween(duration_ms: f32, easing: Easing) -> Self {
        Transition::Tween {
            duration_ms,
            easing,
        }
        .into()
    }

    pub fn keyframes(keyframes: Vec<Keyframe>, duration_ms: f32) -> Self {
        Transition::Keyframes {
            keyframes,
            duration_ms,
        }
        .into()
    }

    /// Set the duration (for springs, overrides the settle estimate)
    pub fn duration(mut self, ms: f32) -> Self {
        match &mut self.transition {
            Transition::Spring { duration_ms, .. } => *duration_ms = Some(ms),
            Transition::Tween { duration_ms, .. } | Transition::Keyframes { duration_ms, .. } => {
                *duration_ms = ms
            }
        }
        self
    }

    pub fn delay(mut self, ms: f32) -> Self {
        self.delay_ms = ms;
        self
    }

    pub fn looping(mut self, mode: LoopMode) -> Self {
        self.loop_mode = mode;
        self
    }

    pub fn iterations(mut self, count: u32) -> Self {
        self.iterations = Some(count);
        self
    }

    /// Reject configurations that cannot produce a timeline
    pub fn validate(&self) -> Result<()> {
        check_duration(self.delay_ms)?;
        match &self.transition {
            Transition::Spring {
                config,
                duration_ms,
            } => {
                config.validate()?;
                if let Some(ms) = duration_ms {
                    check_duration(*ms)?;
                }
            }
            Transition::Tween { duration_ms, .. } => check_duration(*duration_ms)?,
            Transition::Keyframes {
                keyframes,
                duration_ms,
            } => {
                check_duration(*duration_ms)?;
                KeyframeTrack::new(keyframes.clone())?;
            }
        }
        Ok(())
    }

    pub fn is_spring(&self) -> bool {
        matches!(self.transition, Transition::Spring { .. })
    }
}

fn check_duration(ms: f32) -> Result<()> {
    if ms.is_finite() && ms >= 0.0 {
        Ok(())
    } else {
        Err(MotionError::InvalidDuration(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_set_fields() {
        let config = TransitionConfig::tween(500.0, Easing::EaseOut)
            .delay(100.0)
            .looping(LoopMode::Reverse)
            .iterations(3);
        assert_eq!(config.delay_ms, 100.0);
        assert_eq!(config.loop_mode, LoopMode::Reverse);
        assert_eq!(config.iterations, Some(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duration_overrides_spring_estimate() {
        let config = TransitionConfig::spring(SpringConfig::gentle()).duration(250.0);
        assert_eq!(
            config.transition,
            Transition::Spring {
                config: SpringConfig::gentle(),
                duration_ms: Some(250.0)
            }
        );
    }

    #[test]
    fn test_validation_errors() {
        let bad_spring = TransitionConfig::spring(SpringConfig {
            stiffness: 0.0,
            ..SpringConfig::stiff()
        });
        assert!(matches!(bad_spring.validate(), Err(MotionError::InvalidSpring { .. })));

        let bad_tween = TransitionConfig::tween(-5.0, Easing::Linear);
        assert_eq!(bad_tween.validate(), Err(MotionError::InvalidDuration(-5.0)));

        let empty = TransitionConfig::keyframes(vec![], 300.0);
        assert!(matches!(empty.validate(), Err(MotionError::InvalidKeyframes(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_transition_config_is_serializable() {
        fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}
        assert_serde::<Transition>();
        assert_serde::<TransitionConfig>();
    }
}
