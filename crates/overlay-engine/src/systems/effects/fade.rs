use std::collections::HashMap;

use super::Effect;
use crate::api::types::ObjectKey;
use crate::extensions::easing::{ease, Easing};
use crate::registry::object::GraphicObject;

struct Track {
    from: f32,
    elapsed: f32,
}

/// Moves every target's alpha to `goal` over `duration` seconds, each
/// target timed from its own attach.
pub struct FadeEffect {
    goal: f32,
    duration: f32,
    easing: Easing,
    tracks: HashMap<ObjectKey, Track>,
}

impl FadeEffect {
    pub fn new(goal: f32, duration: f32) -> Self {
        Self {
            goal,
            duration: duration.max(crate::extensions::tween::MIN_DURATION),
            easing: Easing::Linear,
            tracks: HashMap::new(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

impl Effect for FadeEffect {
    fn name(&self) -> &'static str {
        "fade"
    }

    fn accepts(&self, object: &dyn GraphicObject) -> bool {
        object.as_alpha().is_some()
    }

    fn on_attach(&mut self, key: ObjectKey, object: &dyn GraphicObject) {
        let from = object.as_alpha().map_or(self.goal, |a| a.alpha());
        self.tracks.insert(key, Track { from, elapsed: 0.0 });
    }

    fn on_detach(&mut self, key: ObjectKey) {
        self.tracks.remove(&key);
    }

    fn apply(&mut self, dt: f32, key: ObjectKey, object: &mut dyn GraphicObject) {
        let (Some(track), Some(target)) = (self.tracks.get_mut(&key), object.as_alpha_mut()) else {
            return;
        };
        track.elapsed += dt.max(0.0);
        let t = track.elapsed / self.duration;
        let value = if t >= 1.0 {
            self.goal
        } else {
            ease(track.from, self.goal, t, self.easing)
        };
        target.set_alpha(value);
    }

    fn is_converged(&self, _key: ObjectKey, object: &dyn GraphicObject, epsilon: f32) -> bool {
        object
            .as_alpha()
            .map_or(true, |a| (a.alpha() - self.goal).abs() <= epsilon)
    }

    fn finish(&mut self, _key: ObjectKey, object: &mut dyn GraphicObject) {
        if let Some(target) = object.as_alpha_mut() {
            target.set_alpha(self.goal);
        }
    }
}
