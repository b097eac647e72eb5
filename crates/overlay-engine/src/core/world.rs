use crate::api::types::{EntityId, MapId};
use crate::components::entity::EntitySnapshot;

/// Read-only access to the host simulation, polled once per frame.
pub trait HostWorld {
    /// The map currently shown.
    fn map_id(&self) -> MapId;

    /// Snapshot of an entity, or `None` if it no longer exists.
    fn entity(&self, id: EntityId) -> Option<&EntitySnapshot>;
}

/// Simple snapshot storage using a flat Vec.
///
/// For hosts that push fresh snapshots every frame, and for tests.
/// Designed for the few hundred entities that carry overlays, not a whole map.
pub struct SnapshotWorld {
    map: MapId,
    entities: Vec<EntitySnapshot>,
}

impl SnapshotWorld {
    pub fn new(map: MapId) -> Self {
        Self {
            map,
            entities: Vec::with_capacity(64),
        }
    }

    /// Insert a snapshot, replacing any previous snapshot of the same entity.
    pub fn upsert(&mut self, snapshot: EntitySnapshot) {
        match self.entities.iter_mut().find(|e| e.id == snapshot.id) {
            Some(slot) => *slot = snapshot,
            None => self.entities.push(snapshot),
        }
    }

    /// Remove an entity by ID. Returns the removed snapshot if found.
    pub fn remove(&mut self, id: EntityId) -> Option<EntitySnapshot> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.swap_remove(idx))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntitySnapshot> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn set_map(&mut self, map: MapId) {
        self.map = map;
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

impl Default for SnapshotWorld {
    fn default() -> Self {
        Self::new(MapId(0))
    }
}

impl HostWorld for SnapshotWorld {
    fn map_id(&self) -> MapId {
        self.map
    }

    fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::entity::EntityKind;
    use glam::Vec3;

    #[test]
    fn upsert_replaces_existing_snapshot() {
        let mut world = SnapshotWorld::default();
        let id = EntityId(1);
        world.upsert(EntitySnapshot::new(id, EntityKind::Item));
        world.upsert(EntitySnapshot::new(id, EntityKind::Item).with_position(Vec3::new(3.0, 0.0, 4.0)));

        assert_eq!(world.len(), 1);
        assert_eq!(world.entity(id).unwrap().position, Vec3::new(3.0, 0.0, 4.0));
    }

    #[test]
    fn remove_drops_entity() {
        let mut world = SnapshotWorld::default();
        world.upsert(EntitySnapshot::new(EntityId(1), EntityKind::Item));
        assert!(world.remove(EntityId(1)).is_some());
        assert!(world.entity(EntityId(1)).is_none());
        assert!(world.remove(EntityId(1)).is_none());
    }
}
