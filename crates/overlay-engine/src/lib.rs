pub mod api;
pub mod core;
pub mod components;
pub mod extensions;
pub mod registry;
pub mod pipeline;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::engine::OverlayEngine;
pub use api::error::{EngineError, EngineResult};
pub use api::types::{
    Color, EffectId, EntityId, MapId, MaterialHandle, MeshHandle, ObjectId, ObjectKey, ShaderId,
    Subject, TweenId,
};
pub use components::entity::{EntityKind, EntitySnapshot, Holder, Rot4, StorageSlot};
pub use components::graphic::{GraphicDescriptor, GraphicKind, GraphicVariant, VariantSelector};
pub use core::config::{DecoratorSetting, EffectConfig, EngineConfig, FadeConfig, FadeController};
pub use core::world::{HostWorld, SnapshotWorld};
pub use pipeline::context::{Adjustment, Aspect, BaseTransform, RenderContext, RenderData, RotationOp};
pub use pipeline::decorator::{Decorator, DecoratorSet};
pub use pipeline::strategy::{RenderStrategy, StrategySet};
pub use pipeline::RenderPipeline;
pub use registry::object::{
    Capabilities, FrameContext, GraphicObject, HasAlpha, HasColor, HasPadding, HasRadius, ObjectState,
    ObjectStatus, ReleasedResources, ScalarChannel,
};
pub use registry::overlays::{CellHighlight, EntityOverlay};
pub use registry::{FrameStats, GraphicRegistry, RegisterOutcome, Registration};
pub use renderer::{DrawBuffer, DrawCall, DrawInstance, DrawSink, ShaderRegistry};
pub use systems::effects::{ApproachEffect, ApproachGoal, Effect, EffectSystem, FadeEffect};

// Animation building blocks
pub use extensions::{ease, Easing, Lerp, Tween, TweenOutcome, TweenPhase};
