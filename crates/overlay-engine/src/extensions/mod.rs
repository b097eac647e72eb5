// extensions/mod.rs
//
// Time-based animation building blocks. The registry schedules tweens;
// effects reuse the same easing curves.

pub mod easing;
pub mod tween;

pub use easing::{ease, Easing, Lerp};
pub use tween::{Tween, TweenOutcome, TweenPhase, MIN_DURATION};
