//! Render strategies: the base mesh/material/transform for each visual category.
//!
//! Selection walks an ordered list and takes the first strategy whose predicate
//! matches; the fallback sits outside the list so selection cannot fail.

use glam::Vec3;

use super::context::BaseTransform;
use super::stable::{salt, StableRng};
use crate::api::types::{MaterialHandle, MeshHandle};
use crate::components::entity::{EntityKind, EntitySnapshot, Rot4};
use crate::components::graphic::{GraphicDescriptor, GraphicKind, GraphicVariant, VariantSelector};

/// Angle corpses are drawn at.
pub const CORPSE_ANGLE: f32 = 90.0;

/// Supplies base render values for one category of entity.
pub trait RenderStrategy {
    fn name(&self) -> &'static str;

    fn applies(&self, entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> bool;

    fn base(&self, entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> BaseTransform;
}

/// Mesh, material and intrinsic rotation picked from a graphic.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Resolved {
    mesh: Option<MeshHandle>,
    material: Option<MaterialHandle>,
    rotation: f32,
}

impl Resolved {
    fn into_base(self, entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> BaseTransform {
        BaseTransform {
            mesh: self.mesh,
            material: self.material,
            position: entity.position,
            rotation: self.rotation,
            scale: Vec3::new(graphic.draw_size.x, 1.0, graphic.draw_size.y),
        }
    }
}

fn resolve(kind: &GraphicKind, entity: &EntitySnapshot, facing: Rot4) -> Resolved {
    match kind {
        GraphicKind::Single {
            mesh,
            material,
            rotates,
        } => Resolved {
            mesh: *mesh,
            material: *material,
            rotation: if *rotates { facing.angle() } else { 0.0 },
        },
        GraphicKind::Multi {
            mesh,
            flipped_mesh,
            materials,
        } => {
            let (mesh, material) = pick_facing(*mesh, *flipped_mesh, materials, facing);
            Resolved {
                mesh,
                material,
                rotation: 0.0,
            }
        }
        GraphicKind::Linked { mesh, materials } => Resolved {
            mesh: *mesh,
            material: materials
                .get(entity.link_mask as usize)
                .or(materials.first())
                .copied(),
            rotation: 0.0,
        },
        GraphicKind::Collection { variants, selector } => {
            let variant = pick_variant(variants, *selector, entity);
            Resolved {
                mesh: variant.and_then(|v| v.mesh),
                material: variant.and_then(|v| v.material),
                rotation: 0.0,
            }
        }
        GraphicKind::RandomRotated { inner, .. } => resolve(inner, entity, facing),
    }
}

/// West without its own material reuses East on the flipped mesh.
fn pick_facing(
    mesh: Option<MeshHandle>,
    flipped_mesh: Option<MeshHandle>,
    materials: &[Option<MaterialHandle>; 4],
    facing: Rot4,
) -> (Option<MeshHandle>, Option<MaterialHandle>) {
    match (facing, materials[facing.index()]) {
        (_, Some(material)) => (mesh, Some(material)),
        (Rot4::West, None) => (
            flipped_mesh.or(mesh),
            materials[Rot4::East.index()],
        ),
        (_, None) => (mesh, None),
    }
}

fn pick_variant<'g>(
    variants: &'g [GraphicVariant],
    selector: VariantSelector,
    entity: &EntitySnapshot,
) -> Option<&'g GraphicVariant> {
    let n = variants.len();
    if n == 0 {
        return None;
    }
    let index = match selector {
        VariantSelector::StackCount => stack_variant_index(n, entity.stack_count, entity.stack_limit),
        VariantSelector::Random => {
            StableRng::for_entity(entity.id, salt::COLLECTION_VARIANT).next_int(n as u32) as usize
        }
    };
    variants.get(index)
}

/// First variant for a single item, last at the stack limit, the middle
/// variants spread proportionally over everything in between.
pub fn stack_variant_index(variants: usize, count: u32, limit: u32) -> usize {
    if variants <= 1 || count <= 1 {
        return 0;
    }
    if count >= limit {
        return variants - 1;
    }
    let middle = variants - 2;
    if middle == 0 {
        return variants - 1;
    }
    let spread = ((count - 1) as usize * middle) / (limit - 1).max(1) as usize;
    1 + spread.min(middle - 1)
}

// ── Built-in strategies ──────────────────────────────────────────────────

/// Pawns and corpses. Corpses lie at a fixed angle.
pub struct PawnStrategy;

impl RenderStrategy for PawnStrategy {
    fn name(&self) -> &'static str {
        "pawn"
    }

    fn applies(&self, entity: &EntitySnapshot, _graphic: &GraphicDescriptor) -> bool {
        matches!(entity.kind, EntityKind::Pawn | EntityKind::Corpse)
    }

    fn base(&self, entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> BaseTransform {
        let mut resolved = resolve(&graphic.kind, entity, entity.facing);
        if entity.kind == EntityKind::Corpse {
            resolved.rotation = CORPSE_ANGLE;
        }
        resolved.into_base(entity, graphic)
    }
}

pub struct LinkedStrategy;

impl RenderStrategy for LinkedStrategy {
    fn name(&self) -> &'static str {
        "linked"
    }

    fn applies(&self, _entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> bool {
        matches!(graphic.kind, GraphicKind::Linked { .. })
    }

    fn base(&self, entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> BaseTransform {
        // Linked graphics never turn with facing.
        resolve(&graphic.kind, entity, Rot4::South).into_base(entity, graphic)
    }
}

pub struct MultiStrategy;

impl RenderStrategy for MultiStrategy {
    fn name(&self) -> &'static str {
        "multi"
    }

    fn applies(&self, _entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> bool {
        matches!(graphic.kind, GraphicKind::Multi { .. })
    }

    fn base(&self, entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> BaseTransform {
        resolve(&graphic.kind, entity, entity.facing).into_base(entity, graphic)
    }
}

pub struct CollectionStrategy;

impl RenderStrategy for CollectionStrategy {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn applies(&self, _entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> bool {
        matches!(graphic.kind, GraphicKind::Collection { .. })
    }

    fn base(&self, entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> BaseTransform {
        resolve(&graphic.kind, entity, entity.facing).into_base(entity, graphic)
    }
}

/// The random angle itself comes from the `random_rotation` decorator.
pub struct RandomRotatedStrategy;

impl RenderStrategy for RandomRotatedStrategy {
    fn name(&self) -> &'static str {
        "random_rotated"
    }

    fn applies(&self, _entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> bool {
        matches!(graphic.kind, GraphicKind::RandomRotated { .. })
    }

    fn base(&self, entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> BaseTransform {
        let mut resolved = resolve(&graphic.kind, entity, entity.facing);
        resolved.rotation = 0.0;
        resolved.into_base(entity, graphic)
    }
}

/// Fallback; claims everything.
pub struct SingleStrategy;

impl RenderStrategy for SingleStrategy {
    fn name(&self) -> &'static str {
        "single"
    }

    fn applies(&self, _entity: &EntitySnapshot, _graphic: &GraphicDescriptor) -> bool {
        true
    }

    fn base(&self, entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> BaseTransform {
        resolve(&graphic.kind, entity, entity.facing).into_base(entity, graphic)
    }
}

/// Ordered strategy list plus a guaranteed fallback.
pub struct StrategySet {
    strategies: Vec<Box<dyn RenderStrategy>>,
    fallback: Box<dyn RenderStrategy>,
}

impl StrategySet {
    /// Empty list; everything falls through to [`SingleStrategy`].
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            fallback: Box::new(SingleStrategy),
        }
    }

    /// The host categories in precedence order.
    pub fn builtin() -> Self {
        Self::new()
            .with(PawnStrategy)
            .with(LinkedStrategy)
            .with(MultiStrategy)
            .with(CollectionStrategy)
            .with(RandomRotatedStrategy)
    }

    /// Append a strategy after the existing ones (still ahead of the fallback).
    pub fn with(mut self, strategy: impl RenderStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn select(&self, entity: &EntitySnapshot, graphic: &GraphicDescriptor) -> &dyn RenderStrategy {
        self.strategies
            .iter()
            .find(|s| s.applies(entity, graphic))
            .map(|s| s.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.fallback.name()))
    }
}

impl Default for StrategySet {
    fn default() -> Self {
        Self::builtin()
    }
}
