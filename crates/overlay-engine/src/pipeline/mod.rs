//! Render-transform pipeline.
//!
//! For one host entity: pick a strategy for its visual category, take the
//! strategy's base mesh/material/transform, then run every enabled decorator
//! that applies, lowest priority first. The result is a [`RenderData`] or
//! nothing; a failure never leaks a partially decorated transform.

pub mod context;
pub mod decorator;
pub mod stable;
pub mod strategy;

use log::{debug, error};

use crate::api::error::{EngineError, EngineResult};
use crate::components::entity::EntitySnapshot;
use crate::core::config::EngineConfig;
use context::{RenderContext, RenderData};
use decorator::DecoratorSet;
use strategy::StrategySet;

pub struct RenderPipeline {
    strategies: StrategySet,
    decorators: DecoratorSet,
}

impl RenderPipeline {
    pub fn new(strategies: StrategySet, decorators: DecoratorSet) -> Self {
        Self {
            strategies,
            decorators,
        }
    }

    /// Built-in strategies and decorators with the config's decorator overrides applied.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut decorators = DecoratorSet::builtin();
        decorators.apply_config(config);
        Self::new(StrategySet::builtin(), decorators)
    }

    pub fn strategies(&self) -> &StrategySet {
        &self.strategies
    }

    pub fn decorators(&self) -> &DecoratorSet {
        &self.decorators
    }

    pub fn decorators_mut(&mut self) -> &mut DecoratorSet {
        &mut self.decorators
    }

    /// Render data for `entity`, or `None` when it cannot be drawn this frame.
    pub fn compute(&self, entity: &EntitySnapshot) -> Option<RenderData> {
        match self.try_compute(entity) {
            Ok(data) => Some(data),
            Err(
                err @ (EngineError::InvalidEntity(_)
                | EngineError::MissingMesh { .. }
                | EngineError::MissingMaterial { .. }),
            ) => {
                debug!("no render data: {err}");
                None
            }
            Err(err) => {
                error!("render pipeline skipped {}: {err}", entity.id);
                None
            }
        }
    }

    pub fn try_compute(&self, entity: &EntitySnapshot) -> EngineResult<RenderData> {
        let graphic = match &entity.graphic {
            Some(graphic) if entity.is_renderable() => graphic,
            _ => return Err(EngineError::InvalidEntity(entity.id)),
        };

        let strategy = self.strategies.select(entity, graphic);
        let base = strategy.base(entity, graphic);
        let mesh = base.mesh.ok_or(EngineError::MissingMesh {
            strategy: strategy.name(),
            entity: entity.id,
        })?;
        let material = base.material.ok_or(EngineError::MissingMaterial {
            strategy: strategy.name(),
            entity: entity.id,
        })?;

        let mut ctx = RenderContext::new(entity, graphic, &base, mesh, material);
        for (decorator, _) in self.decorators.ordered() {
            if !decorator.applies(&ctx) {
                continue;
            }
            let adjustment = decorator.adjust(&ctx)?;
            if adjustment.aspect() != decorator.aspect() {
                return Err(EngineError::AspectViolation {
                    decorator: decorator.name(),
                    declared: decorator.aspect(),
                    produced: adjustment.aspect(),
                });
            }
            ctx.apply(adjustment);
        }
        Ok(ctx.finish())
    }

    /// Name of the strategy that would handle `entity`.
    pub fn strategy_for(&self, entity: &EntitySnapshot) -> Option<&'static str> {
        let graphic = entity.graphic.as_ref()?;
        Some(self.strategies.select(entity, graphic).name())
    }
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new(StrategySet::builtin(), DecoratorSet::builtin())
    }
}
