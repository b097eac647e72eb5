//! Draw-sink contract.
//!
//! The engine never talks to a GPU. `render` hands one [`DrawCall`] per
//! visible object to whatever the host plugs in here (its own draw queue,
//! or a [`DrawBuffer`](super::instance::DrawBuffer) for raw instance upload).

use glam::Mat4;

use super::shader::ParameterBlock;
use crate::api::error::EngineResult;
use crate::api::types::{MaterialHandle, MeshHandle, ObjectKey};
use crate::pipeline::context::RenderData;

/// One mesh draw with its per-draw parameter overrides.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub key: ObjectKey,
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub transform: Mat4,
    pub params: &'a ParameterBlock,
}

impl<'a> DrawCall<'a> {
    pub fn new(key: ObjectKey, data: &RenderData, params: &'a ParameterBlock) -> Self {
        Self {
            key,
            mesh: data.mesh,
            material: data.material,
            transform: data.transform,
            params,
        }
    }
}

/// Receives the frame's draw calls.
///
/// An error rejects only the one call; the registry logs it and moves on.
pub trait DrawSink {
    fn draw(&mut self, call: &DrawCall<'_>) -> EngineResult<()>;
}

impl<F> DrawSink for F
where
    F: FnMut(&DrawCall<'_>) -> EngineResult<()>,
{
    fn draw(&mut self, call: &DrawCall<'_>) -> EngineResult<()> {
        self(call)
    }
}
