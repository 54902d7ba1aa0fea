//! Timeline state machine
//!
//! A timeline drives one value from `from` to `to`. Its value is a pure
//! function of `progress`, so seeking to a progress and playing up to it land
//! on the same value.
//!
//! ```text
//!   Running ⇄ Paused
//!      │
//!      ▼
//!  Completed   (terminal)
//! ```
//!
//! Timing is anchored lazily: the first tick after creation, `play`, `reverse`
//! or `seek` pins the start timestamp so that the current progress lines up
//! with that frame. Control calls therefore never need a clock.

use kinetic_core::Result;

use crate::engine::EngineConfig;
use crate::easing::Easing;
use crate::keyframes::KeyframeTrack;
use crate::spring::{self, SpringTrajectory};
use crate::transition::{LoopMode, Transition, TransitionConfig};

/// Playback state of a timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelineState {
    Running,
    Paused,
    Completed,
}

/// Which end progress is travelling toward
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Toward progress 1.0
    #[default]
    Forward,
    /// Toward progress 0.0
    Reverse,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// Read-only view of a timeline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineSnapshot {
    pub duration_ms: f32,
    pub progress: f32,
    pub direction: Direction,
    pub state: TimelineState,
    /// Frame time progress 0 (forward) or 1 (reverse) is anchored to
    pub start_timestamp: Option<f64>,
    /// Total frame time spent paused
    pub accumulated_pause_offset: f64,
    pub from: f32,
    pub to: f32,
    pub value: f32,
}

/// Result of advancing a timeline by one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    Unchanged,
    Moved(f32),
    /// Reached its final end; carries the settled value
    Finished(f32),
}

/// How a timeline turns progress into a value
#[derive(Clone, Debug)]
enum Curve {
    Tween(Easing),
    Keyframes(KeyframeTrack),
    /// Short spring played back from a precomputed table
    Baked(Vec<f32>),
    /// Long spring integrated on demand
    Live(SpringTrajectory),
}

#[derive(Clone, Debug)]
pub struct Timeline {
    curve: Curve,
    from: f32,
    to: f32,
    duration_ms: f32,
    progress: f32,
    direction: Direction,
    state: TimelineState,
    start_timestamp: Option<f64>,
    accumulated_pause_offset: f64,
    delay_ms: f32,
    loop_mode: LoopMode,
    /// Plays left including the current one; `None` loops forever
    plays_remaining: Option<u32>,
    value: f32,
    velocity: f32,
    last_tick: Option<f64>,
}

impl Timeline {
    /// Build a running timeline from `from` toward `to`
    pub fn new(from: f32, to: f32, transition: &TransitionConfig, engine: &EngineConfig) -> Result<Self> {
        transition.validate()?;

        let (curve, from, to, duration_ms) = match &transition.transition {
            Transition::Tween {
                duration_ms,
                easing,
            } => (Curve::Tween(*easing), from, to, *duration_ms),
            Transition::Keyframes {
                keyframes,
                duration_ms,
            } => {
                let track = KeyframeTrack::new(keyframes.clone())?.anchored(from, to);
                let (first, last) = (track.first_value(), track.last_value());
                (Curve::Keyframes(track), first, last, *duration_ms)
            }
            Transition::Spring {
                config,
                duration_ms,
            } => {
                // Explicit durations are capped too; live trajectories grow with elapsed time
                let duration = match duration_ms {
                    Some(ms) => ms.min(engine.max_spring_duration_ms),
                    None => spring::settle_duration_ms(config, from, to, engine.max_spring_duration_ms),
                };
                let curve = if duration < engine.precompute_threshold_ms {
                    let steps = (duration * engine.sample_rate_hz / 1000.0).ceil().max(1.0) as usize;
                    Curve::Baked(spring::solve(config, from, to, duration, steps)?)
                } else {
                    Curve::Live(SpringTrajectory::new(*config, from, to, engine.live_substep_ms))
                };
                (curve, from, to, duration)
            }
        };

        let plays_remaining = match transition.loop_mode {
            LoopMode::None => Some(1),
            _ => transition.iterations.map(|n| n.max(1)),
        };

        Ok(Self {
            curve,
            from,
            to,
            duration_ms,
            progress: 0.0,
            direction: Direction::Forward,
            state: TimelineState::Running,
            start_timestamp: None,
            accumulated_pause_offset: 0.0,
            delay_ms: transition.delay_ms,
            loop_mode: transition.loop_mode,
            plays_remaining,
            value: from,
            velocity: 0.0,
            last_tick: None,
        })
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    /// Rate of change over the last frame, in units per second
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn is_running(&self) -> bool {
        self.state == TimelineState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.state == TimelineState::Completed
    }

    pub fn is_spring(&self) -> bool {
        matches!(self.curve, Curve::Baked(_) | Curve::Live(_))
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            duration_ms: self.duration_ms,
            progress: self.progress,
            direction: self.direction,
            state: self.state,
            start_timestamp: self.start_timestamp,
            accumulated_pause_offset: self.accumulated_pause_offset,
            from: self.from,
            to: self.to,
            value: self.value,
        }
    }

    /// Value the timeline shows at `progress`
    ///
    /// Pure in `progress`: the table and trajectory are deterministic, and the
    /// ends are exact.
    pub fn value_at(&mut self, progress: f32) -> f32 {
        let p = progress.clamp(0.0, 1.0);
        match &mut self.curve {
            Curve::Tween(easing) => self.from + (self.to - self.from) * easing.apply(p),
            Curve::Keyframes(track) => track.sample(p),
            Curve::Baked(table) => {
                if p >= 1.0 {
                    return self.to;
                }
                let steps = table.len() - 1;
                let index = ((p * steps as f32).round() as usize).min(steps);
                table[index]
            }
            Curve::Live(trajectory) => {
                if p >= 1.0 {
                    return self.to;
                }
                trajectory.sample(p * self.duration_ms).position
            }
        }
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Freeze at the current progress. Returns whether the state changed.
    pub fn pause(&mut self) -> bool {
        if self.state != TimelineState::Running {
            return false;
        }
        self.state = TimelineState::Paused;
        true
    }

    /// Resume from the current progress. Returns whether the state changed.
    pub fn play(&mut self) -> bool {
        if self.state != TimelineState::Paused {
            return false;
        }
        self.state = TimelineState::Running;
        self.start_timestamp = None;
        true
    }

    /// Flip direction, keeping progress and state
    ///
    /// Mid-flight this continues smoothly back toward the other end.
    pub fn reverse(&mut self) -> bool {
        if self.state == TimelineState::Completed {
            return false;
        }
        self.direction = self.direction.flipped();
        self.start_timestamp = None;
        true
    }

    /// Jump to `progress` (clamped to [0, 1]) and return the value there
    ///
    /// Any remaining start delay is skipped. Completed timelines are left
    /// alone and return `None`.
    pub fn seek(&mut self, progress: f32) -> Option<f32> {
        if self.state == TimelineState::Completed {
            return None;
        }
        let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        self.progress = p;
        self.value = self.value_at(p);
        self.delay_ms = 0.0;
        self.start_timestamp = None;
        Some(self.value)
    }

    // ========================================================================
    // Frame stepping
    // ========================================================================

    /// Advance to frame time `now` (milliseconds)
    pub fn tick(&mut self, now: f64) -> Step {
        let previous_tick = self.last_tick.replace(now);

        match self.state {
            TimelineState::Completed => return Step::Unchanged,
            TimelineState::Paused => {
                if let Some(prev) = previous_tick {
                    self.accumulated_pause_offset += (now - prev).max(0.0);
                }
                return Step::Unchanged;
            }
            TimelineState::Running => {}
        }

        let start = match self.start_timestamp {
            Some(start) => start,
            None => {
                let at = now + self.delay_ms as f64;
                self.delay_ms = 0.0;
                self.anchor(at, self.progress)
            }
        };

        let elapsed = now - start;
        if elapsed < 0.0 {
            // Still waiting out the delay
            return Step::Unchanged;
        }

        let d = self.duration_ms as f64;
        let travelled = if d > 0.0 { elapsed / d } else { f64::INFINITY };
        let raw = match self.direction {
            Direction::Forward => travelled,
            Direction::Reverse => 1.0 - travelled,
        };

        let overshoot = match self.direction {
            Direction::Forward if raw >= 1.0 => Some(raw - 1.0),
            Direction::Reverse if raw <= 0.0 => Some(-raw),
            _ => None,
        };

        let step = match overshoot {
            None => {
                self.progress = raw as f32;
                let value = self.value_at(self.progress);
                self.moved(value, previous_tick, now)
            }
            Some(over) if self.take_loop() => {
                let over = if over.is_finite() { over.fract() as f32 } else { 0.0 };
                let forward = self.direction == Direction::Forward;
                let progress = match self.loop_mode {
                    LoopMode::Reverse => {
                        self.direction = self.direction.flipped();
                        if forward {
                            1.0 - over
                        } else {
                            over
                        }
                    }
                    _ if forward => over,
                    _ => 1.0 - over,
                };
                self.progress = progress;
                self.anchor(now, progress);
                let value = self.value_at(progress);
                tracing::trace!(progress, direction = ?self.direction, "timeline looped");
                self.moved(value, previous_tick, now)
            }
            Some(_) => {
                let (progress, value) = match self.direction {
                    Direction::Forward => (1.0, self.to),
                    Direction::Reverse => (0.0, self.from),
                };
                self.progress = progress;
                self.value = value;
                self.state = TimelineState::Completed;
                Step::Finished(value)
            }
        };

        tracing::trace!(now, progress = self.progress, value = self.value, "timeline tick");
        step
    }

    /// Pin the start timestamp so `progress` corresponds to frame time `at`
    fn anchor(&mut self, at: f64, progress: f32) -> f64 {
        let d = self.duration_ms as f64;
        let done = match self.direction {
            Direction::Forward => progress as f64,
            Direction::Reverse => 1.0 - progress as f64,
        };
        let start = at - done * d;
        self.start_timestamp = Some(start);
        start
    }

    fn take_loop(&mut self) -> bool {
        if self.loop_mode == LoopMode::None {
            return false;
        }
        match &mut self.plays_remaining {
            None => true,
            Some(n) if *n > 1 => {
                *n -= 1;
                true
            }
            Some(_) => false,
        }
    }

    fn moved(&mut self, value: f32, previous_tick: Option<f64>, now: f64) -> Step {
        if let Some(prev) = previous_tick {
            let dt = ((now - prev) / 1000.0) as f32;
            if dt > 0.0 {
                self.velocity = (value - self.value) / dt;
            }
        }
        if value == self.value {
            return Step::Unchanged;
        }
        self.value = value;
        Step::Moved(value)
    }
}
