use bytemuck::{Pod, Zeroable};

use super::shader::params;
use super::traits::{DrawCall, DrawSink};
use crate::api::error::EngineResult;
use crate::api::types::{Color, ObjectKey};

/// Per-draw record for hosts that upload raw instance data.
/// Layout: 24 floats = 96 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct DrawInstance {
    /// Column-major world transform.
    pub transform: [f32; 16],
    /// `_Color` override, white when the draw has none.
    pub color: [f32; 4],
    /// `_Alpha` override, 1.0 when the draw has none.
    pub alpha: f32,
    /// Mesh handle, stored as float for the flat stride.
    pub mesh: f32,
    /// Material handle, stored as float for the flat stride.
    pub material: f32,
    pub _pad: f32,
}

impl DrawInstance {
    pub const FLOATS: usize = 24;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    pub fn from_call(call: &DrawCall<'_>) -> Self {
        let color = call.params.color(params::COLOR).unwrap_or(Color::WHITE);
        Self {
            transform: call.transform.to_cols_array(),
            color: color.to_array(),
            alpha: call.params.float(params::ALPHA).unwrap_or(1.0),
            mesh: call.mesh.0 as f32,
            material: call.material.0 as f32,
            _pad: 0.0,
        }
    }
}

/// Collects a frame's draws as flat instance records.
///
/// `keys[i]` names the object behind `instances[i]`.
pub struct DrawBuffer {
    pub instances: Vec<DrawInstance>,
    pub keys: Vec<ObjectKey>,
}

impl DrawBuffer {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(256),
            keys: Vec::with_capacity(256),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.keys.clear();
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Instance data as one contiguous float slice.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Default for DrawBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawSink for DrawBuffer {
    fn draw(&mut self, call: &DrawCall<'_>) -> EngineResult<()> {
        self.instances.push(DrawInstance::from_call(call));
        self.keys.push(call.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{MaterialHandle, MeshHandle};
    use crate::pipeline::context::RenderData;
    use crate::renderer::shader::ParameterBlock;
    use glam::Vec3;

    #[test]
    fn draw_instance_is_24_floats() {
        assert_eq!(std::mem::size_of::<DrawInstance>(), DrawInstance::STRIDE_BYTES);
        assert_eq!(DrawInstance::FLOATS, 24);
    }

    #[test]
    fn buffer_flattens_calls_with_overrides() {
        let data = RenderData::flat(MeshHandle(2), MaterialHandle(5), Vec3::new(3.0, 0.0, 4.0), Vec3::ONE);
        let mut block = ParameterBlock::new();
        block.set_float(params::ALPHA, 0.25);

        let mut buf = DrawBuffer::new();
        buf.draw(&DrawCall::new(ObjectKey::global("a"), &data, &block)).unwrap();
        buf.draw(&DrawCall::new(ObjectKey::global("b"), &data, &ParameterBlock::new())).unwrap();

        assert_eq!(buf.instance_count(), 2);
        assert_eq!(buf.as_floats().len(), 48);
        assert_eq!(buf.instances[0].alpha, 0.25);
        assert_eq!(buf.instances[1].alpha, 1.0);
        assert_eq!(buf.instances[0].color, [1.0; 4]);
        // Translation sits in the fourth column.
        assert_eq!(&buf.as_floats()[12..15], &[3.0, 0.0, 4.0]);
        assert_eq!(buf.instances[0].mesh, 2.0);
        assert_eq!(buf.keys[1], ObjectKey::global("b"));
    }
}
