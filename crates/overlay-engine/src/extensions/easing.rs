// extensions/easing.rs
//
// Pure easing curves plus the set of value types a tween can interpolate.
// No state, no dependencies on the registry.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::api::types::Color;

/// Easing curve applied to normalized progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    SineIn,
    SineOut,
    SineInOut,
    ExpoOut,
    /// Hermite smoothstep, `3t² - 2t³`.
    SmoothStep,
    /// Overshoots slightly past 1 before settling.
    BackOut,
    BounceOut,
    ElasticOut,
}

impl Easing {
    /// Map progress to eased progress. `t` is clamped to [0, 1] first, so
    /// every curve is total; Back and Elastic may leave [0, 1] in between.
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - 2.0 * (1.0 - t) * (1.0 - t)
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 1.0 - t;
                    1.0 - 4.0 * u * u * u
                }
            }
            Easing::SineIn => 1.0 - (t * PI * 0.5).cos(),
            Easing::SineOut => (t * PI * 0.5).sin(),
            Easing::SineInOut => 0.5 - 0.5 * (PI * t).cos(),
            Easing::ExpoOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2.0_f32.powf(-10.0 * t)
                }
            }
            Easing::SmoothStep => t * t * (3.0 - 2.0 * t),
            Easing::BackOut => {
                const OVERSHOOT: f32 = 1.70158;
                let u = t - 1.0;
                1.0 + (OVERSHOOT + 1.0) * u * u * u + OVERSHOOT * u * u
            }
            Easing::BounceOut => bounce_out(t),
            Easing::ElasticOut => {
                if t <= 0.0 || t >= 1.0 {
                    t
                } else {
                    let period = (2.0 * PI) / 3.0;
                    2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * period).sin() + 1.0
                }
            }
        }
    }
}

#[inline]
fn bounce_out(t: f32) -> f32 {
    const STRENGTH: f32 = 7.5625;
    const SPAN: f32 = 2.75;

    if t < 1.0 / SPAN {
        STRENGTH * t * t
    } else if t < 2.0 / SPAN {
        let t = t - 1.5 / SPAN;
        STRENGTH * t * t + 0.75
    } else if t < 2.5 / SPAN {
        let t = t - 2.25 / SPAN;
        STRENGTH * t * t + 0.9375
    } else {
        let t = t - 2.625 / SPAN;
        STRENGTH * t * t + 0.984375
    }
}

// ── Interpolation ────────────────────────────────────────────────────────

/// A value a tween can drive. Interpolation is unclamped: eased progress
/// outside [0, 1] (Back, Elastic) extrapolates.
///
/// Only types implementing this trait can be tweened, so an unsupported
/// property type is rejected when the tween is built, not while it runs.
pub trait Lerp: Copy + 'static {
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Vec2 {
    #[inline]
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Vec3 {
    #[inline]
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Color {
    #[inline]
    fn lerp(self, to: Self, t: f32) -> Self {
        Color::rgba(
            Lerp::lerp(self.r, to.r, t),
            Lerp::lerp(self.g, to.g, t),
            Lerp::lerp(self.b, to.b, t),
            Lerp::lerp(self.a, to.a, t),
        )
    }
}

/// Interpolate with easing.
#[inline]
pub fn ease<V: Lerp>(from: V, to: V, t: f32, easing: Easing) -> V {
    Lerp::lerp(from, to, easing.apply(t))
}
