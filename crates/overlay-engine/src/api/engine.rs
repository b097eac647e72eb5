//! `OverlayEngine`: the one object a host drives per frame.
//!
//! Host wiring:
//!   tick callback    -> `engine.update(dt, &world)`
//!   draw callback    -> `engine.render(&mut sink)`
//!   world (re)loaded -> `engine.on_context_changed()`
//!   after drawing    -> `engine.drain_released()` to free material instances

use log::debug;

use super::error::EngineResult;
use crate::api::types::{MaterialHandle, ObjectKey, ShaderId, TweenId};
use crate::core::config::{EngineConfig, FadeController};
use crate::core::world::HostWorld;
use crate::extensions::easing::Easing;
use crate::extensions::tween::Tween;
use crate::pipeline::RenderPipeline;
use crate::registry::object::{props, FrameContext};
use crate::registry::{FrameStats, GraphicRegistry};
use crate::renderer::shader::{ShaderConfigurator, ShaderRegistry};
use crate::renderer::traits::DrawSink;
use crate::systems::effects::EffectSystem;

pub struct OverlayEngine {
    config: EngineConfig,
    registry: GraphicRegistry,
    effects: EffectSystem,
    pipeline: RenderPipeline,
    shaders: ShaderRegistry,
}

impl OverlayEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: GraphicRegistry::new(),
            effects: EffectSystem::new(config.effects),
            pipeline: RenderPipeline::from_config(&config),
            shaders: ShaderRegistry::new(),
            config,
        }
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(Self::new(EngineConfig::from_json(json)?))
    }

    pub fn with_shader(mut self, id: ShaderId, configurator: impl ShaderConfigurator + 'static) -> Self {
        self.shaders.register(id, configurator);
        self
    }

    // -- Frame --

    /// Advance one frame: registry first (tweens, object updates, sweep),
    /// then effects against whatever survived.
    pub fn update(&mut self, dt: f32, world: &dyn HostWorld) -> FrameStats {
        let dt = self.config.clamp_delta(dt);
        let ctx = FrameContext {
            dt,
            world,
            pipeline: &self.pipeline,
        };
        let stats = self.registry.update_frame(&ctx);
        self.effects.update(dt, &mut self.registry);
        stats
    }

    pub fn render(&mut self, sink: &mut dyn DrawSink) -> usize {
        self.registry.render(&self.shaders, sink)
    }

    /// Drop everything tied to the previous world.
    pub fn on_context_changed(&mut self) {
        debug!(
            "context changed: clearing {} objects, {} effects",
            self.registry.len(),
            self.effects.len()
        );
        self.effects.clear();
        self.registry.clear();
    }

    pub fn drain_released(&mut self) -> impl Iterator<Item = MaterialHandle> + '_ {
        self.registry.drain_released()
    }

    // -- Convenience --

    /// Fade the object's alpha up to 1.
    pub fn fade_in(&mut self, key: &ObjectKey, duration: f32) -> Option<TweenId> {
        self.registry.apply_tween(
            key,
            props::ALPHA,
            Tween::alpha(1.0, duration).with_easing(Easing::QuadOut),
        )
    }

    /// Fade the object out and unregister it; it is disposed once the fade ends.
    /// Returns false if nothing is registered under `key`.
    pub fn fade_out_and_remove(&mut self, key: &ObjectKey, duration: f32) -> bool {
        self.registry.apply_tween(
            key,
            props::ALPHA,
            Tween::alpha(0.0, duration).with_easing(Easing::QuadIn),
        );
        self.registry.unregister(key)
    }

    /// A fade controller using this engine's fade timings.
    pub fn fade_controller(&self) -> FadeController {
        FadeController::new(self.config.fade)
    }

    // -- Accessors --

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &GraphicRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut GraphicRegistry {
        &mut self.registry
    }

    pub fn effects(&self) -> &EffectSystem {
        &self.effects
    }

    /// Effects plus read access to the registry, for attaching targets.
    pub fn effects_mut(&mut self) -> (&mut EffectSystem, &GraphicRegistry) {
        (&mut self.effects, &self.registry)
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut RenderPipeline {
        &mut self.pipeline
    }

    pub fn shaders(&self) -> &ShaderRegistry {
        &self.shaders
    }

    pub fn shaders_mut(&mut self) -> &mut ShaderRegistry {
        &mut self.shaders
    }
}

impl Default for OverlayEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
