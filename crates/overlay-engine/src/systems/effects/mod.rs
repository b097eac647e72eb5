//! Effect engine: multi-target animations with dynamic membership.
//!
//! Unlike a tween, an effect owns a changing set of targets and decides for
//! itself when it is done (every target converged, or no targets left).
//! `EffectSystem` is the facade that owns all running effects.

mod approach;
mod fade;

pub use approach::{ApproachEffect, ApproachGoal};
pub use fade::FadeEffect;

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::api::types::{EffectId, ObjectKey};
use crate::core::config::EffectConfig;
use crate::registry::object::{GraphicObject, ObjectState};
use crate::registry::GraphicRegistry;

/// One multi-target animation.
pub trait Effect {
    fn name(&self) -> &'static str;

    /// Whether `object` exposes the capability this effect drives.
    fn accepts(&self, object: &dyn GraphicObject) -> bool;

    /// Capture whatever per-target baseline the effect needs.
    fn on_attach(&mut self, _key: ObjectKey, _object: &dyn GraphicObject) {}

    /// Drop the target's baseline.
    fn on_detach(&mut self, _key: ObjectKey) {}

    /// Advance the effect on one target.
    fn apply(&mut self, dt: f32, key: ObjectKey, object: &mut dyn GraphicObject);

    /// Whether the target is within `epsilon` of the goal.
    fn is_converged(&self, key: ObjectKey, object: &dyn GraphicObject, epsilon: f32) -> bool;

    /// Set the target exactly to the goal. Called on every target once all converged.
    fn finish(&mut self, key: ObjectKey, object: &mut dyn GraphicObject);
}

struct RunningEffect {
    effect: Box<dyn Effect>,
    state: ObjectState,
    targets: Vec<ObjectKey>,
}

impl RunningEffect {
    fn detach_all(&mut self) {
        for key in self.targets.drain(..) {
            self.effect.on_detach(key);
        }
    }
}

/// Owns every running effect.
pub struct EffectSystem {
    config: EffectConfig,
    effects: BTreeMap<EffectId, RunningEffect>,
    next_id: u64,
}

impl EffectSystem {
    pub fn new(config: EffectConfig) -> Self {
        Self {
            config,
            effects: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    /// Start an effect with no targets. It is swept on the next update
    /// unless something attaches first.
    pub fn add(&mut self, effect: impl Effect + 'static) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id += 1;
        self.effects.insert(
            id,
            RunningEffect {
                effect: Box::new(effect),
                state: ObjectState::Active,
                targets: Vec::new(),
            },
        );
        id
    }

    /// Start an effect and attach every key in `targets` it accepts.
    pub fn spawn(
        &mut self,
        effect: impl Effect + 'static,
        targets: impl IntoIterator<Item = ObjectKey>,
        registry: &GraphicRegistry,
    ) -> EffectId {
        let id = self.add(effect);
        for key in targets {
            self.attach(id, key, registry);
        }
        id
    }

    /// Attach the object under `key`. Objects without the effect's capability
    /// are ignored; returns false for them, for unknown keys, for targets
    /// already attached and for effects that are finishing.
    pub fn attach(&mut self, id: EffectId, key: ObjectKey, registry: &GraphicRegistry) -> bool {
        let Some(running) = self.effects.get_mut(&id) else {
            return false;
        };
        if running.state != ObjectState::Active || running.targets.contains(&key) {
            return false;
        }
        let Some(object) = registry.get(&key) else {
            return false;
        };
        if !running.effect.accepts(object) {
            debug!("{} ignores {key}: missing capability", running.effect.name());
            return false;
        }
        running.effect.on_attach(key, object);
        running.targets.push(key);
        true
    }

    pub fn detach(&mut self, id: EffectId, key: ObjectKey) -> bool {
        let Some(running) = self.effects.get_mut(&id) else {
            return false;
        };
        let Some(pos) = running.targets.iter().position(|k| *k == key) else {
            return false;
        };
        running.targets.remove(pos);
        running.effect.on_detach(key);
        true
    }

    /// Stop an effect; targets keep their current values.
    pub fn remove(&mut self, id: EffectId) -> bool {
        match self.effects.get_mut(&id) {
            Some(running) => {
                running.state = ObjectState::PendingRemoval;
                running.detach_all();
                true
            }
            None => false,
        }
    }

    /// Advance every effect against the registry's surviving objects, then
    /// sweep finished effects.
    pub fn update(&mut self, dt: f32, registry: &mut GraphicRegistry) {
        let epsilon = self.config.convergence_epsilon;

        for running in self.effects.values_mut() {
            if running.state != ObjectState::Active {
                continue;
            }

            let (alive, gone): (Vec<ObjectKey>, Vec<ObjectKey>) = running
                .targets
                .iter()
                .copied()
                .partition(|key| registry.contains(key));
            for key in gone {
                running.effect.on_detach(key);
            }
            running.targets = alive;

            let mut converged = true;
            for key in &running.targets {
                let Some(object) = registry.get_mut(key) else {
                    continue;
                };
                running.effect.apply(dt, *key, object);
                converged &= running.effect.is_converged(*key, object, epsilon);
            }

            if converged && !running.targets.is_empty() {
                for key in &running.targets {
                    if let Some(object) = registry.get_mut(key) {
                        running.effect.finish(*key, object);
                    }
                }
            }

            if running.targets.is_empty() || converged {
                running.state = ObjectState::PendingRemoval;
                running.detach_all();
            }
        }

        let before = self.effects.len();
        self.effects.retain(|_, r| r.state == ObjectState::Active);
        if before != self.effects.len() {
            trace!("swept {} effects", before - self.effects.len());
        }
    }

    pub fn state(&self, id: EffectId) -> Option<ObjectState> {
        self.effects.get(&id).map(|r| r.state)
    }

    pub fn targets(&self, id: EffectId) -> &[ObjectKey] {
        self.effects.get(&id).map(|r| r.targets.as_slice()).unwrap_or_default()
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.effects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        for running in self.effects.values_mut() {
            running.detach_all();
        }
        debug!("effects cleared: {}", self.effects.len());
        self.effects.clear();
    }
}

impl Default for EffectSystem {
    fn default() -> Self {
        Self::new(EffectConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::EngineResult;
    use crate::api::types::{MapId, MaterialHandle, MeshHandle};
    use crate::extensions::easing::Easing;
    use crate::pipeline::context::RenderData;
    use crate::registry::object::{FrameContext, HasAlpha, ObjectStatus};
    use crate::registry::overlays::CellHighlight;
    use crate::renderer::instance::DrawBuffer;
    use crate::renderer::shader::ShaderRegistry;

    struct Opaque;

    impl GraphicObject for Opaque {
        fn key(&self) -> ObjectKey {
            ObjectKey::global("opaque")
        }
        fn update(&mut self, _ctx: &FrameContext<'_>) -> EngineResult<ObjectStatus> {
            Ok(ObjectStatus::Alive)
        }
        fn render_data(&self) -> Option<&RenderData> {
            None
        }
    }

    fn highlight(x: i32, alpha: f32) -> Box<dyn GraphicObject> {
        let mut h = CellHighlight::new(MapId(0), x, 0, "zone", MeshHandle(1), MaterialHandle(1));
        h.set_alpha(alpha);
        Box::new(h)
    }

    fn cell(x: i32) -> ObjectKey {
        ObjectKey::cell(MapId(0), x, 0, "zone")
    }

    fn alpha(registry: &GraphicRegistry, key: &ObjectKey) -> f32 {
        registry.get(key).and_then(|o| o.as_alpha()).map_or(f32::NAN, |a| a.alpha())
    }

    #[test]
    fn fade_tracks_each_target_from_its_attach_time() {
        let mut registry = GraphicRegistry::new();
        registry.register(highlight(0, 1.0));
        registry.register(highlight(1, 0.5));
        let mut effects = EffectSystem::default();

        let id = effects.spawn(FadeEffect::new(0.0, 0.4), [cell(0)], &registry);
        effects.update(0.2, &mut registry);
        assert!((alpha(&registry, &cell(0)) - 0.5).abs() < 1e-6);

        assert!(effects.attach(id, cell(1), &registry));
        assert!(!effects.attach(id, cell(1), &registry));
        effects.update(0.2, &mut registry);
        assert!(alpha(&registry, &cell(0)).abs() < 1e-6);
        assert!((alpha(&registry, &cell(1)) - 0.25).abs() < 1e-6);
        assert_eq!(effects.state(id), Some(ObjectState::Active));

        effects.update(0.2, &mut registry);
        assert!(alpha(&registry, &cell(1)).abs() < 1e-6);
        assert!(!effects.contains(id));
    }

    #[test]
    fn targets_without_capability_are_ignored() {
        let mut registry = GraphicRegistry::new();
        registry.register(Box::new(Opaque));
        registry.register(highlight(0, 1.0));
        let mut effects = EffectSystem::default();

        let id = effects.spawn(
            FadeEffect::new(0.0, 1.0),
            [ObjectKey::global("opaque"), cell(0), cell(42)],
            &registry,
        );
        assert_eq!(effects.targets(id), &[cell(0)]);
    }

    #[test]
    fn effect_without_targets_is_swept() {
        let mut registry = GraphicRegistry::new();
        let mut effects = EffectSystem::default();
        let id = effects.add(FadeEffect::new(0.0, 1.0));
        assert!(effects.contains(id));
        effects.update(0.1, &mut registry);
        assert!(!effects.contains(id));
        assert!(effects.is_empty());
    }

    #[test]
    fn swept_objects_are_detached() {
        let mut registry = GraphicRegistry::new();
        registry.register(highlight(0, 1.0));
        registry.register(highlight(1, 1.0));
        let mut effects = EffectSystem::default();
        let id = effects.spawn(FadeEffect::new(0.0, 10.0), [cell(0), cell(1)], &registry);

        registry.clear();
        registry.register(highlight(1, 1.0));
        effects.update(0.1, &mut registry);
        assert_eq!(effects.targets(id), &[cell(1)]);
    }

    #[test]
    fn approach_converges_and_finishes() {
        let mut registry = GraphicRegistry::new();
        registry.register(highlight(0, 0.0));
        let mut effects = EffectSystem::default();
        let rate = effects.config().approach_rate;
        let id = effects.spawn(ApproachEffect::alpha(1.0, rate), [cell(0)], &registry);

        effects.update(0.1, &mut registry);
        let first = alpha(&registry, &cell(0));
        assert!(first > 0.0 && first < 1.0);

        for _ in 0..60 {
            effects.update(0.05, &mut registry);
        }
        assert!(!effects.contains(id));
        assert!((alpha(&registry, &cell(0)) - 1.0).abs() <= 0.01);
    }

    #[test]
    fn converged_targets_land_exactly_on_goal() {
        let mut registry = GraphicRegistry::new();
        registry.register(highlight(0, 1.0));
        registry.register(highlight(1, 1.0));
        let mut effects = EffectSystem::default();

        // Within epsilon of the goal but short of it.
        let fade = effects.spawn(FadeEffect::new(0.0, 1.0), [cell(0)], &registry);
        effects.update(0.995, &mut registry);
        assert!(!effects.contains(fade));
        assert_eq!(alpha(&registry, &cell(0)), 0.0);

        let approach = effects.spawn(ApproachEffect::alpha(0.0, 8.0), [cell(1)], &registry);
        for _ in 0..1000 {
            if !effects.contains(approach) {
                break;
            }
            effects.update(0.016, &mut registry);
        }
        assert!(!effects.contains(approach));
        assert_eq!(alpha(&registry, &cell(1)), 0.0);

        let mut buffer = DrawBuffer::new();
        assert_eq!(registry.render(&ShaderRegistry::new(), &mut buffer), 0);
    }

    #[test]
    fn remove_and_clear_stop_effects() {
        let mut registry = GraphicRegistry::new();
        registry.register(highlight(0, 1.0));
        let mut effects = EffectSystem::default();
        let a = effects.spawn(FadeEffect::new(0.0, 1.0).with_easing(Easing::QuadIn), [cell(0)], &registry);
        assert!(effects.remove(a));
        assert!(effects.targets(a).is_empty());
        assert!(!effects.attach(a, cell(0), &registry));
        effects.update(0.5, &mut registry);
        assert_eq!(alpha(&registry, &cell(0)), 1.0);
        assert!(!effects.contains(a));

        effects.spawn(FadeEffect::new(0.0, 1.0), [cell(0)], &registry);
        effects.clear();
        assert!(effects.is_empty());
    }
}
