//! Easing curves for tween and keyframe transitions
//!
//! The named CSS curves (`ease`, `ease-in`, ...) are real cubic beziers so
//! that a curve sampled here and the same curve emitted into a stylesheet by
//! the FLIP keyframe generator produce identical motion.

use std::str::FromStr;

use kinetic_core::MotionError;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Easing {
    #[default]
    Linear,
    /// CSS `ease`
    Ease,
    /// CSS `ease-in`
    EaseIn,
    /// CSS `ease-out`
    EaseOut,
    /// CSS `ease-in-out`
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Map linear progress `t` in [0, 1] to eased progress
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t).powi(2),
            Easing::EaseInOutQuad => in_out(t, 2),
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => in_out(t, 3),
            Easing::EaseInQuart => t.powi(4),
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOutQuart => in_out(t, 4),
            _ => {
                let (x1, y1, x2, y2) = self.control_points();
                cubic_bezier(t, x1, y1, x2, y2)
            }
        }
    }

    /// Bezier control points for this curve
    ///
    /// Polynomial curves return their closest standard bezier fit, which is
    /// what gets emitted into stylesheets.
    pub fn control_points(&self) -> (f32, f32, f32, f32) {
        match *self {
            Easing::Linear => (0.0, 0.0, 1.0, 1.0),
            Easing::Ease => (0.25, 0.1, 0.25, 1.0),
            Easing::EaseIn => (0.42, 0.0, 1.0, 1.0),
            Easing::EaseOut => (0.0, 0.0, 0.58, 1.0),
            Easing::EaseInOut => (0.42, 0.0, 0.58, 1.0),
            Easing::EaseInQuad => (0.11, 0.0, 0.5, 0.0),
            Easing::EaseOutQuad => (0.5, 1.0, 0.89, 1.0),
            Easing::EaseInOutQuad => (0.45, 0.0, 0.55, 1.0),
            Easing::EaseInCubic => (0.32, 0.0, 0.67, 0.0),
            Easing::EaseOutCubic => (0.33, 1.0, 0.68, 1.0),
            Easing::EaseInOutCubic => (0.65, 0.0, 0.35, 1.0),
            Easing::EaseInQuart => (0.5, 0.0, 0.75, 0.0),
            Easing::EaseOutQuart => (0.25, 1.0, 0.5, 1.0),
            Easing::EaseInOutQuart => (0.76, 0.0, 0.24, 1.0),
            Easing::CubicBezier(x1, y1, x2, y2) => (x1, y1, x2, y2),
        }
    }

    /// CSS timing-function text
    pub fn to_css(&self) -> String {
        match self {
            Easing::Linear => "linear".to_string(),
            Easing::Ease => "ease".to_string(),
            Easing::EaseIn => "ease-in".to_string(),
            Easing::EaseOut => "ease-out".to_string(),
            Easing::EaseInOut => "ease-in-out".to_string(),
            other => {
                let (x1, y1, x2, y2) = other.control_points();
                format!("cubic-bezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
        }
    }
}

impl FromStr for Easing {
    type Err = MotionError;

    /// Accepts CSS names, camelCase names and `cubic-bezier(x1, y1, x2, y2)`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let easing = match name {
            "linear" => Easing::Linear,
            "ease" => Easing::Ease,
            "ease-in" | "easeIn" => Easing::EaseIn,
            "ease-out" | "easeOut" => Easing::EaseOut,
            "ease-in-out" | "easeInOut" => Easing::EaseInOut,
            "easeInQuad" => Easing::EaseInQuad,
            "easeOutQuad" => Easing::EaseOutQuad,
            "easeInOutQuad" => Easing::EaseInOutQuad,
            "easeInCubic" => Easing::EaseInCubic,
            "easeOutCubic" => Easing::EaseOutCubic,
            "easeInOutCubic" => Easing::EaseInOutCubic,
            "easeInQuart" => Easing::EaseInQuart,
            "easeOutQuart" => Easing::EaseOutQuart,
            "easeInOutQuart" => Easing::EaseInOutQuart,
            _ => return parse_cubic_bezier(name),
        };
        Ok(easing)
    }
}

fn parse_cubic_bezier(text: &str) -> Result<Easing, MotionError> {
    let invalid = || MotionError::InvalidEasing(text.to_string());

    let args = text
        .strip_prefix("cubic-bezier(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(invalid)?;

    let points = args
        .split(',')
        .map(|part| part.trim().parse::<f32>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;

    match points.as_slice() {
        // x coordinates must stay in [0, 1] for the curve to be a function of time
        [x1, y1, x2, y2] if (0.0..=1.0).contains(x1) && (0.0..=1.0).contains(x2) => {
            Ok(Easing::CubicBezier(*x1, *y1, *x2, *y2))
        }
        _ => Err(invalid()),
    }
}

/// Symmetric in-out polynomial of the given power
fn in_out(t: f32, power: i32) -> f32 {
    if t < 0.5 {
        2f32.powi(power - 1) * t.powi(power)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(power) / 2.0
    }
}

/// Solve a CSS cubic bezier for `t`
///
/// Newton-Raphson first, bisection when the slope flattens out. Runs in f64
/// so high refresh rates don't expose f32 jitter.
fn cubic_bezier(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let x = t as f64;
    let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);

    let mut p = x;
    for _ in 0..8 {
        let err = sample(p, x1, x2) - x;
        if err.abs() < 1e-7 {
            return sample(p, y1, y2) as f32;
        }
        let slope = slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    p = x;
    for _ in 0..24 {
        let val = sample(p, x1, x2);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    sample(p, y1, y2) as f32
}

#[inline]
fn sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[inline]
fn slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[Easing] = &[
        Easing::Linear,
        Easing::Ease,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
    ];

    #[test]
    fn test_endpoints_are_exact() {
        for easing in ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?}");
        }
    }

    #[test]
    fn test_ease_in_out_is_symmetric() {
        let e = Easing::EaseInOut;
        assert!((e.apply(0.5) - 0.5).abs() < 1e-4);
        assert!((e.apply(0.25) + e.apply(0.75) - 1.0).abs() < 1e-4);
        assert!(e.apply(0.1) < 0.1);
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::EaseOutQuad.apply(2.0), 1.0);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("ease-in-out".parse::<Easing>().unwrap(), Easing::EaseInOut);
        assert_eq!("easeOut".parse::<Easing>().unwrap(), Easing::EaseOut);
        assert_eq!(
            "cubic-bezier(0.2, 0, 0.4, 1)".parse::<Easing>().unwrap(),
            Easing::CubicBezier(0.2, 0.0, 0.4, 1.0)
        );
        assert!("bounce".parse::<Easing>().is_err());
        assert!("cubic-bezier(1.5, 0, 0.4, 1)".parse::<Easing>().is_err());
    }

    #[test]
    fn test_css_round_trip() {
        for easing in [Easing::Ease, Easing::EaseInOut, Easing::CubicBezier(0.1, 0.7, 0.1, 1.0)] {
            let parsed: Easing = easing.to_css().parse().unwrap();
            assert_eq!(parsed, easing);
        }
        assert_eq!(Easing::EaseOutCubic.to_css(), "cubic-bezier(0.33, 1, 0.68, 1)");
    }
}
