//! Keyframe value tracks
//!
//! A track is a list of `(time, value, easing)` stops with times normalized to
//! [0, 1]. The easing on a stop shapes the segment that ends at that stop.

use kinetic_core::{MotionError, Result};

use crate::easing::Easing;

/// A single stop in a keyframe track
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Keyframe {
    /// Position in the track, 0.0 to 1.0
    pub time: f32,
    pub value: f32,
    /// Easing for the segment arriving at this stop
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            easing: Easing::Linear,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Validated, time-ordered keyframe stops
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeTrack {
    keyframes: Vec<Keyframe>,
}

impl KeyframeTrack {
    /// Build a track, rejecting empty input and out-of-order or out-of-range times
    pub fn new(keyframes: Vec<Keyframe>) -> Result<Self> {
        if keyframes.is_empty() {
            return Err(MotionError::InvalidKeyframes("track is empty".into()));
        }
        for pair in keyframes.windows(2) {
            if pair[1].time < pair[0].time {
                return Err(MotionError::InvalidKeyframes(format!(
                    "time {} comes after {}",
                    pair[1].time, pair[0].time
                )));
            }
        }
        if let Some(bad) = keyframes
            .iter()
            .find(|kf| !(0.0..=1.0).contains(&kf.time) || !kf.value.is_finite())
        {
            return Err(MotionError::InvalidKeyframes(format!(
                "stop at time {} is outside [0, 1] or not finite",
                bad.time
            )));
        }
        Ok(Self { keyframes })
    }

    /// Evenly spaced stops over `values`
    pub fn evenly_spaced(values: &[f32], easing: Easing) -> Result<Self> {
        let last = values.len().saturating_sub(1).max(1) as f32;
        Self::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &value)| Keyframe::new(i as f32 / last, value).with_easing(easing))
                .collect(),
        )
    }

    /// Pin the track's ends: `from` at 0.0 and `to` at 1.0 when not already present
    pub(crate) fn anchored(mut self, from: f32, to: f32) -> Self {
        if self.keyframes[0].time > 0.0 {
            self.keyframes.insert(0, Keyframe::new(0.0, from));
        }
        let last = self.keyframes[self.keyframes.len() - 1];
        if last.time < 1.0 {
            self.keyframes.push(Keyframe::new(1.0, to).with_easing(last.easing));
        }
        self
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn first_value(&self) -> f32 {
        self.keyframes[0].value
    }

    pub fn last_value(&self) -> f32 {
        self.keyframes[self.keyframes.len() - 1].value
    }

    /// Interpolated value at `progress`
    pub fn sample(&self, progress: f32) -> f32 {
        let progress = progress.clamp(0.0, 1.0);

        // Index of the first stop at or after `progress`
        let next = self
            .keyframes
            .iter()
            .position(|kf| kf.time >= progress)
            .unwrap_or(self.keyframes.len() - 1);
        let prev = next.saturating_sub(1);

        let (a, b) = (&self.keyframes[prev], &self.keyframes[next]);
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }

        let local = (progress - a.time) / span;
        a.value + (b.value - a.value) * b.easing.apply(local)
    }
}
