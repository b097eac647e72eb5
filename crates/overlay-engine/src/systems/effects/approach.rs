use super::Effect;
use crate::api::types::{Color, ObjectKey};
use crate::extensions::easing::Lerp;
use crate::registry::object::{GraphicObject, ScalarChannel};

/// What an [`ApproachEffect`] pulls its targets toward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApproachGoal {
    Scalar(ScalarChannel, f32),
    Color(Color),
}

/// Exponential smoothing toward a goal: each frame closes `1 - e^(-rate * dt)`
/// of the remaining distance. Frame-rate independent, never overshoots.
pub struct ApproachEffect {
    goal: ApproachGoal,
    rate: f32,
}

impl ApproachEffect {
    pub fn new(goal: ApproachGoal, rate: f32) -> Self {
        Self {
            goal,
            rate: rate.max(0.0),
        }
    }

    pub fn alpha(goal: f32, rate: f32) -> Self {
        Self::new(ApproachGoal::Scalar(ScalarChannel::Alpha, goal), rate)
    }

    pub fn color(goal: Color, rate: f32) -> Self {
        Self::new(ApproachGoal::Color(goal), rate)
    }

    fn factor(&self, dt: f32) -> f32 {
        1.0 - (-self.rate * dt.max(0.0)).exp()
    }
}

impl Effect for ApproachEffect {
    fn name(&self) -> &'static str {
        "approach"
    }

    fn accepts(&self, object: &dyn GraphicObject) -> bool {
        match self.goal {
            ApproachGoal::Scalar(channel, _) => channel.read(object).is_some(),
            ApproachGoal::Color(_) => object.as_color().is_some(),
        }
    }

    fn apply(&mut self, dt: f32, _key: ObjectKey, object: &mut dyn GraphicObject) {
        let k = self.factor(dt);
        match self.goal {
            ApproachGoal::Scalar(channel, goal) => {
                if let Some(current) = channel.read(object) {
                    channel.write(object, Lerp::lerp(current, goal, k));
                }
            }
            ApproachGoal::Color(goal) => {
                if let Some(target) = object.as_color_mut() {
                    let current = target.color();
                    target.set_color(Lerp::lerp(current, goal, k));
                }
            }
        }
    }

    fn is_converged(&self, _key: ObjectKey, object: &dyn GraphicObject, epsilon: f32) -> bool {
        match self.goal {
            ApproachGoal::Scalar(channel, goal) => {
                channel.read(object).map_or(true, |v| (v - goal).abs() <= epsilon)
            }
            ApproachGoal::Color(goal) => object
                .as_color()
                .map_or(true, |c| c.color().distance(goal) <= epsilon),
        }
    }

    fn finish(&mut self, _key: ObjectKey, object: &mut dyn GraphicObject) {
        match self.goal {
            ApproachGoal::Scalar(channel, goal) => {
                channel.write(object, goal);
            }
            ApproachGoal::Color(goal) => {
                if let Some(target) = object.as_color_mut() {
                    target.set_color(goal);
                }
            }
        }
    }
}
