use glam::{Mat4, Quat, Vec3};

use crate::api::types::{MaterialHandle, MeshHandle};
use crate::components::entity::{EntitySnapshot, Rot4};
use crate::components::graphic::GraphicDescriptor;

/// The part of a transform a decorator is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aspect {
    Offset,
    Rotation,
    Scale,
    Mesh,
    Material,
}

/// Reserved priority bands. Lower runs first.
pub mod bands {
    pub const BASE_OFFSET: i32 = 0;
    pub const CONTEXT_OFFSET: i32 = 100;
    pub const BASE_ROTATION: i32 = 200;
    pub const CONTEXT_ROTATION: i32 = 300;
    pub const BASE_SCALE: i32 = 400;
    pub const CONTEXT_SCALE: i32 = 500;
    pub const MESH_OVERRIDE: i32 = 600;
    pub const MATERIAL_OVERRIDE: i32 = 700;
}

/// Base values supplied by the selected strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseTransform {
    pub mesh: Option<MeshHandle>,
    pub material: Option<MaterialHandle>,
    pub position: Vec3,
    /// Degrees clockwise about +Y.
    pub rotation: f32,
    pub scale: Vec3,
}

/// How a rotation adjustment combines with the running rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationOp {
    Set(f32),
    Add(f32),
}

/// One decorator's contribution. Composition is fixed per kind:
/// offsets sum, scales multiply, rotations set or add, mesh and material replace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    Offset(Vec3),
    Rotation(RotationOp),
    Scale(Vec3),
    Mesh(MeshHandle),
    Material(MaterialHandle),
}

impl Adjustment {
    pub fn aspect(&self) -> Aspect {
        match self {
            Adjustment::Offset(_) => Aspect::Offset,
            Adjustment::Rotation(_) => Aspect::Rotation,
            Adjustment::Scale(_) => Aspect::Scale,
            Adjustment::Mesh(_) => Aspect::Mesh,
            Adjustment::Material(_) => Aspect::Material,
        }
    }
}

/// Working state threaded through the decorator chain for one entity.
///
/// Built fresh for every pipeline call; nothing survives between entities.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub entity: &'a EntitySnapshot,
    pub graphic: &'a GraphicDescriptor,
    pub facing: Rot4,
    pub position: Vec3,
    /// Accumulated decorator offsets, applied on top of `position`.
    pub offset: Vec3,
    pub rotation: f32,
    pub scale: Vec3,
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        entity: &'a EntitySnapshot,
        graphic: &'a GraphicDescriptor,
        base: &BaseTransform,
        mesh: MeshHandle,
        material: MaterialHandle,
    ) -> Self {
        Self {
            entity,
            graphic,
            facing: entity.facing,
            position: base.position,
            offset: Vec3::ZERO,
            rotation: base.rotation,
            scale: base.scale,
            mesh,
            material,
        }
    }

    pub fn apply(&mut self, adjustment: Adjustment) {
        match adjustment {
            Adjustment::Offset(delta) => self.offset += delta,
            Adjustment::Rotation(RotationOp::Set(angle)) => self.rotation = angle,
            Adjustment::Rotation(RotationOp::Add(angle)) => self.rotation += angle,
            Adjustment::Scale(factor) => self.scale *= factor,
            Adjustment::Mesh(mesh) => self.mesh = mesh,
            Adjustment::Material(material) => self.material = material,
        }
    }

    pub fn finish(&self) -> RenderData {
        let position = self.position + self.offset;
        let rotation = normalize_angle(self.rotation);
        let transform = Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_rotation_y(rotation.to_radians()),
            position,
        );
        RenderData {
            mesh: self.mesh,
            material: self.material,
            position,
            rotation,
            scale: self.scale,
            transform,
        }
    }
}

/// Final draw data for one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderData {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub position: Vec3,
    /// Degrees in [0, 360).
    pub rotation: f32,
    pub scale: Vec3,
    pub transform: Mat4,
}

impl RenderData {
    /// Flat quad data for objects that do not come out of the pipeline.
    pub fn flat(mesh: MeshHandle, material: MaterialHandle, position: Vec3, scale: Vec3) -> Self {
        Self {
            mesh,
            material,
            position,
            rotation: 0.0,
            scale,
            transform: Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, position),
        }
    }
}

pub fn normalize_angle(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
