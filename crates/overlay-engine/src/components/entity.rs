use glam::{Quat, Vec3};

use crate::api::types::{EntityId, MapId};
use crate::components::graphic::GraphicDescriptor;

/// Cardinal facing on the host grid. Angles are degrees clockwise seen from above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rot4 {
    North,
    East,
    #[default]
    South,
    West,
}

impl Rot4 {
    pub const ALL: [Rot4; 4] = [Rot4::North, Rot4::East, Rot4::South, Rot4::West];

    pub fn index(self) -> usize {
        match self {
            Rot4::North => 0,
            Rot4::East => 1,
            Rot4::South => 2,
            Rot4::West => 3,
        }
    }

    pub fn angle(self) -> f32 {
        self.index() as f32 * 90.0
    }

    pub fn as_quat(self) -> Quat {
        Quat::from_rotation_y(self.angle().to_radians())
    }

    /// Unit vector the facing points at (North = +Z, East = +X).
    pub fn forward(self) -> Vec3 {
        match self {
            Rot4::North => Vec3::Z,
            Rot4::East => Vec3::X,
            Rot4::South => Vec3::NEG_Z,
            Rot4::West => Vec3::NEG_X,
        }
    }

    /// Unit vector to the right of the facing.
    pub fn right(self) -> Vec3 {
        match self {
            Rot4::North => Vec3::X,
            Rot4::East => Vec3::NEG_Z,
            Rot4::South => Vec3::NEG_X,
            Rot4::West => Vec3::Z,
        }
    }
}

/// Broad category of a host entity, as far as rendering cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Pawn,
    Corpse,
    Item,
    Building,
    Plant,
}

/// A storage cell slot (e.g. one shelf cell holding several item stacks).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageSlot {
    pub storage: EntityId,
    pub facing: Rot4,
    /// Position of this stack within the cell, `0..slot_count`.
    pub slot_index: u32,
    pub slot_count: u32,
    /// Whether contents are drawn aligned to the storage facing.
    pub aligns_contents: bool,
    /// Scale applied to contents when the cell holds more than one stack.
    pub content_scale: f32,
    /// Distance between neighbouring stacks along the storage's right axis.
    pub slot_spacing: f32,
}

impl StorageSlot {
    pub fn new(storage: EntityId, facing: Rot4, slot_index: u32, slot_count: u32) -> Self {
        Self {
            storage,
            facing,
            slot_index,
            slot_count: slot_count.max(1),
            aligns_contents: true,
            content_scale: 0.75,
            slot_spacing: 0.3,
        }
    }

    pub fn is_shared(&self) -> bool {
        self.slot_count > 1
    }
}

/// Who or what currently holds an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Holder {
    /// Carried by a bearer (pawn hauling or wielding it).
    CarriedBy { bearer: EntityId, facing: Rot4 },
    /// Lying in a storage building.
    Stored(StorageSlot),
    /// Inside a closed container; not visible.
    Container { container: EntityId },
}

/// Read-only view of one host entity for a single frame.
///
/// Polled every frame; the engine never writes back.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub map: MapId,
    pub kind: EntityKind,
    /// World position of the cell center (Y is altitude).
    pub position: Vec3,
    pub facing: Rot4,
    pub stack_count: u32,
    pub stack_limit: u32,
    /// Neighbour mask for linked graphics (bit 0 = N, 1 = E, 2 = S, 3 = W).
    pub link_mask: u8,
    pub open: bool,
    pub holder: Option<Holder>,
    pub graphic: Option<GraphicDescriptor>,
    pub spawned: bool,
}

impl EntitySnapshot {
    pub fn new(id: EntityId, kind: EntityKind) -> Self {
        Self {
            id,
            map: MapId(0),
            kind,
            position: Vec3::ZERO,
            facing: Rot4::South,
            stack_count: 1,
            stack_limit: 1,
            link_mask: 0,
            open: false,
            holder: None,
            graphic: None,
            spawned: true,
        }
    }

    // -- Builder pattern --

    pub fn with_map(mut self, map: MapId) -> Self {
        self.map = map;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_facing(mut self, facing: Rot4) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_stack(mut self, count: u32, limit: u32) -> Self {
        self.stack_count = count;
        self.stack_limit = limit.max(1);
        self
    }

    pub fn with_link_mask(mut self, mask: u8) -> Self {
        self.link_mask = mask & 0x0F;
        self
    }

    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    pub fn with_holder(mut self, holder: Holder) -> Self {
        self.holder = Some(holder);
        self
    }

    pub fn with_graphic(mut self, graphic: GraphicDescriptor) -> Self {
        self.graphic = Some(graphic);
        self
    }

    pub fn despawned(mut self) -> Self {
        self.spawned = false;
        self
    }

    // -- Queries --

    pub fn carrier_facing(&self) -> Option<Rot4> {
        match self.holder {
            Some(Holder::CarriedBy { facing, .. }) => Some(facing),
            _ => None,
        }
    }

    pub fn storage(&self) -> Option<&StorageSlot> {
        match &self.holder {
            Some(Holder::Stored(slot)) => Some(slot),
            _ => None,
        }
    }

    /// Spawned, has a graphic, and is not hidden inside a container.
    pub fn is_renderable(&self) -> bool {
        self.spawned
            && self.graphic.is_some()
            && !matches!(self.holder, Some(Holder::Container { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rot4_quat_turns_north_into_facing() {
        for rot in Rot4::ALL {
            let turned = rot.as_quat() * Vec3::Z;
            assert!(turned.abs_diff_eq(rot.forward(), 1e-5), "{rot:?}: {turned}");
        }
    }

    #[test]
    fn right_is_forward_turned_clockwise() {
        for rot in Rot4::ALL {
            let turned = Quat::from_rotation_y(90f32.to_radians()) * rot.forward();
            assert!(turned.abs_diff_eq(rot.right(), 1e-5), "{rot:?}");
        }
    }

    #[test]
    fn contained_entities_are_not_renderable() {
        let graphic = GraphicDescriptor::single(None, None);
        let visible = EntitySnapshot::new(EntityId(1), EntityKind::Item).with_graphic(graphic.clone());
        assert!(visible.is_renderable());

        let boxed = visible.clone().with_holder(Holder::Container { container: EntityId(2) });
        assert!(!boxed.is_renderable());

        assert!(!visible.despawned().is_renderable());
    }

    #[test]
    fn link_mask_keeps_four_bits() {
        let e = EntitySnapshot::new(EntityId(1), EntityKind::Building).with_link_mask(0xFF);
        assert_eq!(e.link_mask, 0x0F);
    }
}
