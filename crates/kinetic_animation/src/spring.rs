//! Spring physics
//!
//! RK4 integration of a damped harmonic oscillator:
//! `m·x'' + c·x' + k·(x - target) = 0`.
//!
//! Two ways to consume it:
//! - [`solve`] bakes a fixed number of samples over a duration. Short springs
//!   use this so they can be played back from a table.
//! - [`SpringTrajectory`] integrates lazily on a fixed sub-step grid. Live
//!   timelines use this so the value at any elapsed time is reproducible,
//!   which is what makes seeking and reversing exact.

use kinetic_core::{MotionError, Result};

/// Largest integration step. Bigger steps are subdivided.
const MAX_SUBSTEP_SECS: f32 = 1.0 / 240.0;

/// Normalized distance/speed under which a spring counts as settled
const REST_DELTA: f32 = 0.001;
const REST_SPEED: f32 = 0.01;

/// Parameters of a spring
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
    /// Velocity at the start of the animation, in units per second
    pub velocity: f32,
}

impl SpringConfig {
    /// Create a validated spring configuration
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Result<Self> {
        let config = Self {
            stiffness,
            damping,
            mass,
            velocity: 0.0,
        };
        config.validate()?;
        Ok(config)
    }

    /// A gentle, slow spring (good for page transitions)
    pub const fn gentle() -> Self {
        Self::preset(120.0, 14.0)
    }

    /// A wobbly spring with overshoot (good for playful UI)
    pub const fn wobbly() -> Self {
        Self::preset(180.0, 12.0)
    }

    /// A stiff, snappy spring (good for buttons)
    pub const fn stiff() -> Self {
        Self::preset(400.0, 30.0)
    }

    /// A very stiff spring with minimal oscillation
    pub const fn snappy() -> Self {
        Self::preset(600.0, 40.0)
    }

    /// A slow spring with no overshoot
    pub const fn molasses() -> Self {
        Self::preset(100.0, 20.0)
    }

    const fn preset(stiffness: f32, damping: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass: 1.0,
            velocity: 0.0,
        }
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = velocity;
        self
    }

    /// Reject parameters that don't describe a damped oscillator
    ///
    /// Never clamps: `stiffness <= 0`, `mass <= 0`, negative damping or any
    /// non-finite field is an error.
    pub fn validate(&self) -> Result<()> {
        let finite = self.stiffness.is_finite()
            && self.damping.is_finite()
            && self.mass.is_finite()
            && self.velocity.is_finite();
        if !finite || self.stiffness <= 0.0 || self.mass <= 0.0 || self.damping < 0.0 {
            return Err(MotionError::InvalidSpring {
                stiffness: self.stiffness,
                damping: self.damping,
                mass: self.mass,
            });
        }
        Ok(())
    }

    pub fn critical_damping(&self) -> f32 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    /// `damping / critical_damping`; below 1 oscillates, above 1 creeps
    pub fn damping_ratio(&self) -> f32 {
        self.damping / self.critical_damping()
    }

    pub fn is_underdamped(&self) -> bool {
        self.damping < self.critical_damping()
    }

    pub fn is_critically_damped(&self) -> bool {
        (self.damping - self.critical_damping()).abs() < 0.01
    }

    pub fn is_overdamped(&self) -> bool {
        self.damping > self.critical_damping()
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::stiff()
    }
}

/// Position and velocity of a spring at one instant
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpringState {
    pub position: f32,
    pub velocity: f32,
}

/// Advance a spring by `dt` seconds with one RK4 step
pub fn rk4_step(config: &SpringConfig, state: SpringState, target: f32, dt: f32) -> SpringState {
    let accel = |x: f32, v: f32| {
        let spring_force = -config.stiffness * (x - target);
        let damping_force = -config.damping * v;
        (spring_force + damping_force) / config.mass
    };

    let (x, v) = (state.position, state.velocity);

    let k1_v = accel(x, v);
    let k1_x = v;

    let k2_v = accel(x + k1_x * dt * 0.5, v + k1_v * dt * 0.5);
    let k2_x = v + k1_v * dt * 0.5;

    let k3_v = accel(x + k2_x * dt * 0.5, v + k2_v * dt * 0.5);
    let k3_x = v + k2_v * dt * 0.5;

    let k4_v = accel(x + k3_x * dt, v + k3_v * dt);
    let k4_x = v + k3_v * dt;

    SpringState {
        position: x + (k1_x + 2.0 * k2_x + 2.0 * k3_x + k4_x) * dt / 6.0,
        velocity: v + (k1_v + 2.0 * k2_v + 2.0 * k3_v + k4_v) * dt / 6.0,
    }
}

/// Advance by `dt` seconds, subdividing so no step exceeds the stability limit
fn advance(config: &SpringConfig, mut state: SpringState, target: f32, dt: f32) -> SpringState {
    if dt <= 0.0 {
        return state;
    }
    let substeps = (dt / MAX_SUBSTEP_SECS).ceil().max(1.0) as u32;
    let h = dt / substeps as f32;
    for _ in 0..substeps {
        state = rk4_step(config, state, target, h);
    }
    state
}

/// Bake `steps + 1` evenly spaced samples of a spring moving `from` -> `to`
///
/// The first sample is exactly `from`. Deterministic: identical inputs always
/// produce identical tables.
pub fn solve(config: &SpringConfig, from: f32, to: f32, duration_ms: f32, steps: usize) -> Result<Vec<f32>> {
    config.validate()?;
    if !duration_ms.is_finite() || duration_ms < 0.0 {
        return Err(MotionError::InvalidDuration(duration_ms));
    }

    let mut samples = Vec::with_capacity(steps + 1);
    let mut state = SpringState {
        position: from,
        velocity: config.velocity,
    };
    samples.push(from);

    if steps == 0 {
        return Ok(samples);
    }

    let dt = duration_ms / 1000.0 / steps as f32;
    for _ in 0..steps {
        state = advance(config, state, to, dt);
        samples.push(state.position);
    }
    Ok(samples)
}

/// Time for a spring moving `from` -> `to` to come to rest, capped at `max_ms`
///
/// Settling is judged on the normalized displacement so opacity-sized and
/// pixel-sized moves settle at the same perceptual point.
pub fn settle_duration_ms(config: &SpringConfig, from: f32, to: f32, max_ms: f32) -> f32 {
    let distance = to - from;
    let scale = if distance.abs() > f32::EPSILON {
        distance.abs()
    } else if config.velocity.abs() > f32::EPSILON {
        config.velocity.abs()
    } else {
        return 0.0;
    };

    let mut state = SpringState {
        position: from,
        velocity: config.velocity,
    };
    let mut elapsed = 0.0_f32;
    let max_secs = max_ms / 1000.0;

    while elapsed < max_secs {
        state = rk4_step(config, state, to, MAX_SUBSTEP_SECS);
        elapsed += MAX_SUBSTEP_SECS;
        let offset = (state.position - to).abs() / scale;
        let speed = state.velocity.abs() / scale;
        if offset < REST_DELTA && speed < REST_SPEED {
            break;
        }
    }
    (elapsed * 1000.0).min(max_ms)
}

/// Lazily integrated spring path on a fixed time grid
///
/// `sample(t)` depends only on `t`, never on the sequence of earlier calls,
/// so playing forward, scrubbing and reversing all land on the same values.
#[derive(Clone, Debug)]
pub struct SpringTrajectory {
    config: SpringConfig,
    target: f32,
    substep_secs: f32,
    /// `states[i]` is the state at `i * substep_secs`
    states: Vec<SpringState>,
}

impl SpringTrajectory {
    pub fn new(config: SpringConfig, from: f32, to: f32, substep_ms: f32) -> Self {
        let substep_secs = (substep_ms / 1000.0).clamp(1e-4, MAX_SUBSTEP_SECS);
        Self {
            config,
            target: to,
            substep_secs,
            states: vec![SpringState {
                position: from,
                velocity: config.velocity,
            }],
        }
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// State at `elapsed_ms` after the start
    pub fn sample(&mut self, elapsed_ms: f32) -> SpringState {
        let t = (elapsed_ms / 1000.0).max(0.0);
        let index = (t / self.substep_secs).floor() as usize;

        while self.states.len() <= index {
            let last = self.states[self.states.len() - 1];
            let next = rk4_step(&self.config, last, self.target, self.substep_secs);
            self.states.push(next);
        }

        let remainder = t - index as f32 * self.substep_secs;
        let base = self.states[index];
        if remainder <= 1e-7 {
            base
        } else {
            rk4_step(&self.config, base, self.target, remainder)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_shape_and_endpoints() {
        let config = SpringConfig::stiff();
        let samples = solve(&config, 0.0, 100.0, 2000.0, 60).unwrap();

        assert_eq!(samples.len(), 61);
        assert_eq!(samples[0], 0.0);
        assert!((samples[60] - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_solve_is_deterministic() {
        let config = SpringConfig::wobbly().with_velocity(40.0);
        let a = solve(&config, 10.0, -30.0, 250.0, 30).unwrap();
        let b = solve(&config, 10.0, -30.0, 250.0, 30).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_solve_tolerance_tracks_damping_ratio() {
        // Over the same window, a heavily damped spring ends closer to target
        // than a barely damped one.
        let loose = SpringConfig::new(170.0, 2.0, 1.0).unwrap();
        let tight = SpringConfig::new(170.0, 26.0, 1.0).unwrap();
        let loose_end = *solve(&loose, 0.0, 1.0, 1000.0, 20).unwrap().last().unwrap();
        let tight_end = *solve(&tight, 0.0, 1.0, 1000.0, 20).unwrap().last().unwrap();

        assert!(tight.damping_ratio() > loose.damping_ratio());
        assert!((tight_end - 1.0).abs() < (loose_end - 1.0).abs());
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        assert!(SpringConfig::new(0.0, 10.0, 1.0).is_err());
        assert!(SpringConfig::new(100.0, 10.0, 0.0).is_err());
        assert!(SpringConfig::new(100.0, -1.0, 1.0).is_err());
        assert!(SpringConfig::new(f32::NAN, 10.0, 1.0).is_err());

        let bad = SpringConfig {
            mass: -2.0,
            ..SpringConfig::gentle()
        };
        assert!(matches!(
            solve(&bad, 0.0, 1.0, 100.0, 10),
            Err(MotionError::InvalidSpring { .. })
        ));
    }

    #[test]
    fn test_spring_presets() {
        assert!(SpringConfig::wobbly().is_underdamped());
        assert!(SpringConfig::gentle().is_underdamped());
        assert!(SpringConfig::stiff().is_underdamped());
        assert!(SpringConfig::molasses().is_critically_damped());
    }

    #[test]
    fn test_rk4_stability_with_large_steps() {
        let config = SpringConfig::stiff();
        let mut state = SpringState::default();

        for _ in 0..100 {
            state = rk4_step(&config, state, 1000.0, 0.1);
            assert!(state.position < 2000.0);
            assert!(state.position > -500.0);
        }
    }

    #[test]
    fn test_heavier_mass_still_settles() {
        let config = SpringConfig::new(400.0, 25.0, 2.0).unwrap();
        let samples = solve(&config, 0.0, 100.0, 4000.0, 240).unwrap();
        let last = *samples.last().unwrap();
        assert!(last.is_finite());
        assert!((last - 100.0).abs() < 0.05);
    }

    #[test]
    fn test_settle_duration_is_scale_invariant() {
        let config = SpringConfig::gentle();
        let small = settle_duration_ms(&config, 0.0, 1.0, 10_000.0);
        let large = settle_duration_ms(&config, 0.0, 500.0, 10_000.0);
        assert!((small - large).abs() < 10.0);
        assert!(small > 300.0 && small < 10_000.0);
        assert_eq!(settle_duration_ms(&config, 5.0, 5.0, 10_000.0), 0.0);
    }

    #[test]
    fn test_trajectory_is_path_independent() {
        let config = SpringConfig::wobbly();
        let mut forward = SpringTrajectory::new(config, 0.0, 100.0, 1000.0 / 240.0);
        let mut jumpy = SpringTrajectory::new(config, 0.0, 100.0, 1000.0 / 240.0);

        let mut last = SpringState::default();
        for frame in 0..=60 {
            last = forward.sample(frame as f32 * 16.0);
        }
        // Scrub far ahead and back before sampling the same instant
        jumpy.sample(2000.0);
        jumpy.sample(10.0);
        assert_eq!(jumpy.sample(960.0), last);
    }

    #[test]
    fn test_trajectory_matches_solve_at_grid_points() {
        let config = SpringConfig::snappy();
        let table = solve(&config, 0.0, 1.0, 400.0, 4).unwrap();
        let mut live = SpringTrajectory::new(config, 0.0, 1.0, 1000.0 / 240.0);
        let sampled = live.sample(400.0).position;
        assert!((table[4] - sampled).abs() < 1e-3);
    }
}
