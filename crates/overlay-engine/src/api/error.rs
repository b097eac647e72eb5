use thiserror::Error;

use crate::api::types::{EntityId, ObjectKey};
use crate::pipeline::context::Aspect;

/// Errors raised inside the engine.
///
/// None of these cross the per-frame entry points: the registry and the
/// pipeline catch them per object / per entity and log them.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("draw failed for {key}: {reason}")]
    Draw { key: ObjectKey, reason: String },

    #[error("dispose failed for {key}: {reason}")]
    Dispose { key: ObjectKey, reason: String },

    #[error("update failed for {key}: {reason}")]
    Update { key: ObjectKey, reason: String },

    #[error("decorator `{name}` failed: {reason}")]
    Decorator { name: &'static str, reason: String },

    #[error("decorator `{decorator}` declared {declared:?} but produced a {produced:?} adjustment")]
    AspectViolation {
        decorator: &'static str,
        declared: Aspect,
        produced: Aspect,
    },

    #[error("strategy `{strategy}` produced no mesh for {entity}")]
    MissingMesh { strategy: &'static str, entity: EntityId },

    #[error("strategy `{strategy}` produced no material for {entity}")]
    MissingMaterial { strategy: &'static str, entity: EntityId },

    #[error("{0} is not renderable")]
    InvalidEntity(EntityId),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
