// extensions/tween.rs
//
// Single-property tweens bound to a getter/setter pair on a graphic object.
// The registry owns scheduling (exclusivity, cleanup, disposal gating);
// this module only knows how one tween moves through its states.
//
// Usage:
//   let tween = Tween::alpha(1.0, 0.2).with_easing(Easing::QuadOut);
//   let id = registry.apply_tween(key, props::ALPHA, tween);

use log::warn;

use super::easing::{Easing, Lerp};
use crate::api::types::Color;
use crate::registry::object::{GraphicObject, ScalarChannel};

/// Smallest duration a tween runs with; guards the progress division.
pub const MIN_DURATION: f32 = 1e-6;

pub type Getter<V> = Box<dyn Fn(&dyn GraphicObject) -> Option<V>>;
pub type Setter<V> = Box<dyn FnMut(&mut dyn GraphicObject, V)>;
pub type OnComplete = Box<dyn FnOnce(TweenOutcome)>;

/// Where a tween is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenPhase {
    /// Scheduled; start value not captured yet.
    Created,
    Running,
    Finished,
}

/// How a tween ended. Passed to the completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenOutcome {
    /// Reached (or was snapped to) its end value.
    Completed,
    /// Cancelled; the property keeps whatever value it last had.
    Killed,
}

/// An interpolation of one property from its current value to `end`.
pub struct Tween<V: Lerp> {
    getter: Getter<V>,
    setter: Setter<V>,
    start: Option<V>,
    end: V,
    duration: f32,
    /// Duration was exactly zero: snap on the first update.
    instant: bool,
    elapsed: f32,
    easing: Easing,
    on_complete: Option<OnComplete>,
    phase: TweenPhase,
}

impl<V: Lerp> Tween<V> {
    /// `duration <= 0` is clamped to [`MIN_DURATION`]; exactly zero snaps on the first update.
    pub fn new(
        getter: impl Fn(&dyn GraphicObject) -> Option<V> + 'static,
        setter: impl FnMut(&mut dyn GraphicObject, V) + 'static,
        end: V,
        duration: f32,
    ) -> Self {
        Self {
            getter: Box::new(getter),
            setter: Box::new(setter),
            start: None,
            end,
            duration: if duration > 0.0 { duration } else { MIN_DURATION },
            instant: duration == 0.0,
            elapsed: 0.0,
            easing: Easing::Linear,
            on_complete: None,
            phase: TweenPhase::Created,
        }
    }

    // -- Builder methods --

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_on_complete(mut self, on_complete: impl FnOnce(TweenOutcome) + 'static) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    pub fn phase(&self) -> TweenPhase {
        self.phase
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn start_value(&self) -> Option<V> {
        self.start
    }

    /// Normalized progress [0, 1].
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    fn finish(&mut self, outcome: TweenOutcome) {
        self.phase = TweenPhase::Finished;
        if let Some(callback) = self.on_complete.take() {
            callback(outcome);
        }
    }
}

impl Tween<f32> {
    /// Tween any scalar capability.
    pub fn scalar(channel: ScalarChannel, end: f32, duration: f32) -> Self {
        Tween::new(
            move |o| channel.read(o),
            move |o, v| {
                channel.write(o, v);
            },
            end,
            duration,
        )
    }

    pub fn alpha(end: f32, duration: f32) -> Self {
        Self::scalar(ScalarChannel::Alpha, end, duration)
    }

    pub fn radius(end: f32, duration: f32) -> Self {
        Self::scalar(ScalarChannel::Radius, end, duration)
    }

    pub fn padding(end: f32, duration: f32) -> Self {
        Self::scalar(ScalarChannel::Padding, end, duration)
    }
}

impl Tween<Color> {
    pub fn color(end: Color, duration: f32) -> Self {
        Tween::new(
            |o| o.as_color().map(|c| c.color()),
            |o, v| {
                if let Some(c) = o.as_color_mut() {
                    c.set_color(v);
                }
            },
            end,
            duration,
        )
    }
}

/// Type-erased tween as stored by the registry.
pub(crate) trait AnyTween {
    /// Whether the getter can read the property on this object.
    fn probe(&self, target: &dyn GraphicObject) -> bool;
    fn advance(&mut self, dt: f32, target: &mut dyn GraphicObject);
    fn complete(&mut self, target: Option<&mut dyn GraphicObject>);
    fn kill(&mut self);
    fn phase(&self) -> TweenPhase;

    fn is_finished(&self) -> bool {
        self.phase() == TweenPhase::Finished
    }
}

impl<V: Lerp> AnyTween for Tween<V> {
    fn probe(&self, target: &dyn GraphicObject) -> bool {
        (self.getter)(target).is_some()
    }

    fn advance(&mut self, dt: f32, target: &mut dyn GraphicObject) {
        if self.phase == TweenPhase::Finished {
            return;
        }

        let start = match self.start {
            Some(start) => start,
            None => match (self.getter)(&*target) {
                Some(value) => {
                    self.start = Some(value);
                    self.phase = TweenPhase::Running;
                    value
                }
                None => {
                    warn!("tween target {} lost the tweened property", target.key());
                    self.finish(TweenOutcome::Killed);
                    return;
                }
            },
        };

        if self.instant {
            (self.setter)(target, self.end);
            self.finish(TweenOutcome::Completed);
            return;
        }

        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.duration {
            // Snap exactly; eased lerp at t = 1 may be off by an ulp.
            (self.setter)(target, self.end);
            self.finish(TweenOutcome::Completed);
        } else {
            let eased = self.easing.apply(self.progress());
            (self.setter)(target, start.lerp(self.end, eased));
        }
    }

    fn complete(&mut self, target: Option<&mut dyn GraphicObject>) {
        if self.phase == TweenPhase::Finished {
            return;
        }
        if let Some(target) = target {
            (self.setter)(target, self.end);
        }
        self.elapsed = self.duration;
        self.finish(TweenOutcome::Completed);
    }

    fn kill(&mut self) {
        if self.phase != TweenPhase::Finished {
            self.finish(TweenOutcome::Killed);
        }
    }

    fn phase(&self) -> TweenPhase {
        self.phase
    }
}
