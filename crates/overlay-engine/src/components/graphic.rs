use glam::{Vec2, Vec3};

use crate::api::types::{MaterialHandle, MeshHandle};

/// How a collection graphic picks one of its variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantSelector {
    /// By how full the stack is: first variant for a single item, last at the stack limit.
    StackCount,
    /// By a stable hash of the entity id.
    Random,
}

/// One mesh/material pair of a collection graphic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicVariant {
    pub mesh: Option<MeshHandle>,
    pub material: Option<MaterialHandle>,
}

/// The visual category of an entity's graphic. Drives strategy selection.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicKind {
    /// One mesh and material; optionally turned with the entity's facing.
    Single {
        mesh: Option<MeshHandle>,
        material: Option<MaterialHandle>,
        rotates: bool,
    },
    /// One material per facing (N, E, S, W). West reuses East flipped when it has no material.
    Multi {
        mesh: Option<MeshHandle>,
        flipped_mesh: Option<MeshHandle>,
        materials: [Option<MaterialHandle>; 4],
    },
    /// Walls and similar: material picked by the 4-bit neighbour mask.
    Linked {
        mesh: Option<MeshHandle>,
        materials: Vec<MaterialHandle>,
    },
    Collection {
        variants: Vec<GraphicVariant>,
        selector: VariantSelector,
    },
    /// An inner graphic drawn at a per-entity random angle in `[-max_angle, max_angle]`.
    RandomRotated {
        inner: Box<GraphicKind>,
        max_angle: f32,
    },
}

/// Intrinsic graphic data of an entity, as defined by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicDescriptor {
    pub kind: GraphicKind,
    /// Drawn size in world units (X, Z).
    pub draw_size: Vec2,
    /// Draw offsets per facing (N, E, S, W).
    pub draw_offsets: [Vec3; 4],
    /// Texture height / width.
    pub texture_aspect: f32,
    pub open_mesh: Option<MeshHandle>,
    pub open_material: Option<MaterialHandle>,
    pub scale_with_stack: bool,
    /// Extra rotation when the entity sits in an aligning storage (weapons lie sideways).
    pub rotate_in_storage: f32,
    /// Angle when carried by a bearer facing east; mirrored for west.
    pub carried_angle: f32,
}

impl GraphicDescriptor {
    pub fn new(kind: GraphicKind) -> Self {
        Self {
            kind,
            draw_size: Vec2::ONE,
            draw_offsets: [Vec3::ZERO; 4],
            texture_aspect: 1.0,
            open_mesh: None,
            open_material: None,
            scale_with_stack: false,
            rotate_in_storage: 0.0,
            carried_angle: 0.0,
        }
    }

    pub fn single(mesh: Option<MeshHandle>, material: Option<MaterialHandle>) -> Self {
        Self::new(GraphicKind::Single {
            mesh,
            material,
            rotates: false,
        })
    }

    pub fn random_rotated(inner: GraphicKind, max_angle: f32) -> Self {
        Self::new(GraphicKind::RandomRotated {
            inner: Box::new(inner),
            max_angle,
        })
    }

    // -- Builder pattern --

    pub fn with_draw_size(mut self, size: Vec2) -> Self {
        self.draw_size = size;
        self
    }

    /// Same offset for every facing.
    pub fn with_draw_offset(mut self, offset: Vec3) -> Self {
        self.draw_offsets = [offset; 4];
        self
    }

    pub fn with_draw_offsets(mut self, offsets: [Vec3; 4]) -> Self {
        self.draw_offsets = offsets;
        self
    }

    pub fn with_texture_aspect(mut self, aspect: f32) -> Self {
        self.texture_aspect = aspect;
        self
    }

    pub fn with_open_state(mut self, mesh: Option<MeshHandle>, material: Option<MaterialHandle>) -> Self {
        self.open_mesh = mesh;
        self.open_material = material;
        self
    }

    pub fn with_scale_with_stack(mut self, enabled: bool) -> Self {
        self.scale_with_stack = enabled;
        self
    }

    pub fn with_rotate_in_storage(mut self, degrees: f32) -> Self {
        self.rotate_in_storage = degrees;
        self
    }

    pub fn with_carried_angle(mut self, degrees: f32) -> Self {
        self.carried_angle = degrees;
        self
    }

    /// Max random angle if this is a random-rotated graphic.
    pub fn random_rotation(&self) -> Option<f32> {
        match self.kind {
            GraphicKind::RandomRotated { max_angle, .. } => Some(max_angle),
            _ => None,
        }
    }
}
