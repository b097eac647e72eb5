//! Graphic-object registry.
//!
//! Owns every overlay object and every tween that drives one. An object is
//! physically disposed only when it is pending removal and no unretired tween
//! still references it; each object carries that reference count itself.
//!
//! Per frame, strictly in this order: retire tweens that finished last frame,
//! advance the rest, update active objects, sweep.

pub mod object;
pub mod overlays;

use std::collections::{BTreeMap, HashMap};

use log::{debug, error, trace, warn};

use crate::api::types::{MaterialHandle, ObjectId, ObjectKey, TweenId};
use crate::extensions::easing::Lerp;
use crate::extensions::tween::{AnyTween, Tween};
use crate::renderer::shader::{ParameterBlock, ShaderRegistry};
use crate::renderer::traits::{DrawCall, DrawSink};
use object::{FrameContext, GraphicObject, ObjectState, ObjectStatus, ReleasedResources};

/// What `register` did with the object it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// New key: the object was adopted.
    Adopted,
    /// The key was pending removal; the stored instance is active again and
    /// the new one was discarded.
    Resurrected,
    /// The key was already active; the new instance was discarded.
    AlreadyActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Id of the stored instance (unchanged by resurrection).
    pub id: ObjectId,
    pub outcome: RegisterOutcome,
}

/// Counters from one `update_frame`, for tracing and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub tweens_retired: usize,
    pub tweens_advanced: usize,
    pub objects_updated: usize,
    pub objects_expired: usize,
    pub objects_disposed: usize,
}

struct Entry {
    key: ObjectKey,
    object: Box<dyn GraphicObject>,
    state: ObjectState,
    /// Unretired tweens targeting this object.
    tween_refs: u32,
}

struct ScheduledTween {
    key: ObjectKey,
    property: &'static str,
    tween: Box<dyn AnyTween>,
}

pub struct GraphicRegistry {
    /// Keyed by adoption order, which is also render order.
    objects: BTreeMap<ObjectId, Entry>,
    index: HashMap<ObjectKey, ObjectId>,
    tweens: BTreeMap<TweenId, ScheduledTween>,
    /// The one tween per (key, property) that may still be live.
    by_property: HashMap<(ObjectKey, &'static str), TweenId>,
    released: ReleasedResources,
    /// Reused across draws so render does not allocate per object.
    scratch: ParameterBlock,
    next_object: u64,
    next_tween: u64,
}

impl GraphicRegistry {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            index: HashMap::new(),
            tweens: BTreeMap::new(),
            by_property: HashMap::new(),
            released: ReleasedResources::default(),
            scratch: ParameterBlock::new(),
            next_object: 1,
            next_tween: 1,
        }
    }

    // -- Objects --

    /// Adopt `object`, resurrect the pending instance with its key, or keep the
    /// active one. A discarded instance is disposed immediately.
    ///
    /// Callers must keep using the stored instance (via [`get_mut`](Self::get_mut)),
    /// never the one they passed in.
    pub fn register(&mut self, mut object: Box<dyn GraphicObject>) -> Registration {
        let key = object.key();

        if let Some(&id) = self.index.get(&key) {
            let outcome = match self.objects.get_mut(&id) {
                Some(entry) if entry.state == ObjectState::PendingRemoval => {
                    entry.state = ObjectState::Active;
                    entry.object.on_registered();
                    debug!("resurrected {key}");
                    RegisterOutcome::Resurrected
                }
                _ => RegisterOutcome::AlreadyActive,
            };
            if let Err(err) = object.dispose(&mut self.released) {
                error!("disposing discarded duplicate of {key}: {err}");
            }
            return Registration { id, outcome };
        }

        let id = ObjectId(self.next_object);
        self.next_object += 1;
        object.on_registered();
        self.objects.insert(
            id,
            Entry {
                key,
                object,
                state: ObjectState::Active,
                tween_refs: 0,
            },
        );
        self.index.insert(key, id);
        debug!("registered {key}");
        Registration {
            id,
            outcome: RegisterOutcome::Adopted,
        }
    }

    /// Mark the object for removal. Returns false if nothing is registered under `key`.
    ///
    /// Disposal waits for the sweep and for every tween on the object to retire.
    pub fn unregister(&mut self, key: &ObjectKey) -> bool {
        let Some(entry) = self.entry_mut(key) else {
            return false;
        };
        if entry.state == ObjectState::Active {
            entry.state = ObjectState::PendingRemoval;
            debug!("unregistered {key}");
        }
        true
    }

    pub fn get(&self, key: &ObjectKey) -> Option<&dyn GraphicObject> {
        self.entry(key).map(|e| e.object.as_ref())
    }

    pub fn get_mut(&mut self, key: &ObjectKey) -> Option<&mut dyn GraphicObject> {
        match self.entry_mut(key) {
            Some(entry) => Some(entry.object.as_mut()),
            None => None,
        }
    }

    /// Active objects only.
    pub fn try_get(&self, key: &ObjectKey) -> Option<&dyn GraphicObject> {
        self.entry(key)
            .filter(|e| e.state == ObjectState::Active)
            .map(|e| e.object.as_ref())
    }

    pub fn state(&self, key: &ObjectKey) -> Option<ObjectState> {
        self.entry(key).map(|e| e.state)
    }

    pub fn object_id(&self, key: &ObjectKey) -> Option<ObjectId> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.index.contains_key(key)
    }

    /// All stored objects, pending ones included, in render order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, ObjectState, &dyn GraphicObject)> + '_ {
        self.objects
            .iter()
            .map(|(id, e)| (*id, e.state, e.object.as_ref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = ObjectKey> + '_ {
        self.objects.values().map(|e| e.key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.objects
            .values()
            .filter(|e| e.state == ObjectState::Active)
            .count()
    }

    fn entry(&self, key: &ObjectKey) -> Option<&Entry> {
        self.index.get(key).and_then(|id| self.objects.get(id))
    }

    fn entry_mut(&mut self, key: &ObjectKey) -> Option<&mut Entry> {
        let id = self.index.get(key)?;
        self.objects.get_mut(id)
    }

    // -- Tweens --

    /// Schedule `tween` on the `property` of the active object under `key`.
    ///
    /// Any live tween on the same (key, property) is killed first. Returns
    /// `None` if the key is unknown, not active, or the object cannot read
    /// the property; the tween is then dropped without running its callback.
    pub fn apply_tween<V: Lerp>(
        &mut self,
        key: &ObjectKey,
        property: &'static str,
        tween: Tween<V>,
    ) -> Option<TweenId> {
        let Some(&object_id) = self.index.get(key) else {
            warn!("tween on {property} for unknown object {key}");
            return None;
        };
        let entry = self.objects.get_mut(&object_id)?;
        if entry.state != ObjectState::Active {
            warn!("tween on {property} for {key}, which is pending removal");
            return None;
        }
        if !tween.probe(entry.object.as_ref()) {
            warn!("{key} has no readable {property}");
            return None;
        }

        if let Some(previous) = self.by_property.get(&(*key, property)) {
            if let Some(scheduled) = self.tweens.get_mut(previous) {
                scheduled.tween.kill();
            }
        }

        let id = TweenId(self.next_tween);
        self.next_tween += 1;
        entry.tween_refs += 1;
        self.tweens.insert(
            id,
            ScheduledTween {
                key: *key,
                property,
                tween: Box::new(tween),
            },
        );
        self.by_property.insert((*key, property), id);
        Some(id)
    }

    /// Cancel a tween, leaving the property at its last value. False if it was not live.
    pub fn kill_tween(&mut self, id: TweenId) -> bool {
        match self.tweens.get_mut(&id) {
            Some(scheduled) if !scheduled.tween.is_finished() => {
                scheduled.tween.kill();
                true
            }
            _ => false,
        }
    }

    /// Snap a tween to its end value now. False if it was not live.
    pub fn complete_tween(&mut self, id: TweenId) -> bool {
        let Some(scheduled) = self.tweens.get_mut(&id) else {
            return false;
        };
        if scheduled.tween.is_finished() {
            return false;
        }
        let target: Option<&mut dyn GraphicObject> =
            match self.index.get(&scheduled.key).and_then(|oid| self.objects.get_mut(oid)) {
                Some(entry) => Some(entry.object.as_mut()),
                None => None,
            };
        scheduled.tween.complete(target);
        true
    }

    pub fn is_tween_live(&self, id: TweenId) -> bool {
        self.tweens.get(&id).is_some_and(|s| !s.tween.is_finished())
    }

    /// The live tween driving `property` on `key`, if any.
    pub fn tween_for(&self, key: &ObjectKey, property: &'static str) -> Option<TweenId> {
        self.by_property
            .get(&(*key, property))
            .copied()
            .filter(|id| self.is_tween_live(*id))
    }

    /// Live (unfinished) tweens.
    pub fn tween_count(&self) -> usize {
        self.tweens.values().filter(|s| !s.tween.is_finished()).count()
    }

    /// Unretired tweens referencing the object under `key`.
    pub fn tween_refs(&self, key: &ObjectKey) -> u32 {
        self.entry(key).map_or(0, |e| e.tween_refs)
    }

    // -- Frame --

    pub fn update_frame(&mut self, ctx: &FrameContext<'_>) -> FrameStats {
        let mut stats = FrameStats::default();

        // (i) retire tweens that finished since the last frame
        let finished: Vec<TweenId> = self
            .tweens
            .iter()
            .filter(|(_, s)| s.tween.is_finished())
            .map(|(id, _)| *id)
            .collect();
        for id in finished {
            if let Some(scheduled) = self.tweens.remove(&id) {
                self.unlink(id, &scheduled);
                stats.tweens_retired += 1;
            }
        }

        // (ii) advance; targets pending removal keep animating so fade-outs finish
        for scheduled in self.tweens.values_mut() {
            if scheduled.tween.is_finished() {
                continue;
            }
            let target = self
                .index
                .get(&scheduled.key)
                .and_then(|oid| self.objects.get_mut(oid));
            match target {
                Some(entry) => {
                    scheduled.tween.advance(ctx.dt, entry.object.as_mut());
                    stats.tweens_advanced += 1;
                }
                None => scheduled.tween.kill(),
            }
        }

        // (iii) per-object update, failures contained to the object
        for entry in self.objects.values_mut() {
            if entry.state != ObjectState::Active {
                continue;
            }
            stats.objects_updated += 1;
            match entry.object.update(ctx) {
                Ok(ObjectStatus::Alive) => {}
                Ok(ObjectStatus::Expired) => {
                    entry.state = ObjectState::PendingRemoval;
                    stats.objects_expired += 1;
                    debug!("{} expired", entry.key);
                }
                Err(err) => error!("updating {}: {err}", entry.key),
            }
        }

        // (iv) sweep
        let doomed: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, e)| e.state == ObjectState::PendingRemoval && e.tween_refs == 0)
            .map(|(id, _)| *id)
            .collect();
        for id in doomed {
            if let Some(entry) = self.objects.remove(&id) {
                self.index.remove(&entry.key);
                self.dispose(entry);
                stats.objects_disposed += 1;
            }
        }

        trace!(
            "frame: {} tweens advanced, {} retired, {} objects swept",
            stats.tweens_advanced,
            stats.tweens_retired,
            stats.objects_disposed
        );
        stats
    }

    /// Draw every stored object that has render data. Returns the number of
    /// accepted draws; a rejected draw is logged and skipped.
    pub fn render(&mut self, shaders: &ShaderRegistry, sink: &mut dyn DrawSink) -> usize {
        let mut drawn = 0;
        for entry in self.objects.values() {
            let Some(data) = entry.object.render_data() else {
                continue;
            };
            shaders.configure(entry.object.shader(), &entry.object.shader_payload(), &mut self.scratch);
            match sink.draw(&DrawCall::new(entry.key, data, &self.scratch)) {
                Ok(()) => drawn += 1,
                Err(err) => error!("drawing {}: {err}", entry.key),
            }
        }
        drawn
    }

    /// Kill every tween, then dispose and drop every object. For teardown.
    pub fn clear(&mut self) {
        let tweens = self.tweens.len();
        for scheduled in self.tweens.values_mut() {
            scheduled.tween.kill();
        }
        self.tweens.clear();
        self.by_property.clear();

        let objects = std::mem::take(&mut self.objects);
        self.index.clear();
        let count = objects.len();
        for entry in objects.into_values() {
            self.dispose(entry);
        }
        debug!("registry cleared: {count} objects, {tweens} tweens");
    }

    /// Material instances released by disposed objects since the last drain.
    pub fn drain_released(&mut self) -> impl Iterator<Item = MaterialHandle> + '_ {
        self.released.drain()
    }

    fn unlink(&mut self, id: TweenId, scheduled: &ScheduledTween) {
        let slot = (scheduled.key, scheduled.property);
        if self.by_property.get(&slot) == Some(&id) {
            self.by_property.remove(&slot);
        }
        if let Some(entry) = self.entry_mut(&scheduled.key) {
            entry.tween_refs = entry.tween_refs.saturating_sub(1);
        }
    }

    fn dispose(&mut self, mut entry: Entry) {
        match entry.object.dispose(&mut self.released) {
            Ok(()) => debug!("disposed {}", entry.key),
            Err(err) => error!("disposing {}: {err}", entry.key),
        }
    }
}

impl Default for GraphicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::{EngineError, EngineResult};
    use crate::api::types::{EntityId, MaterialHandle, MeshHandle};
    use crate::core::world::SnapshotWorld;
    use crate::extensions::easing::Easing;
    use crate::extensions::tween::TweenOutcome;
    use crate::pipeline::context::RenderData;
    use crate::pipeline::RenderPipeline;
    use crate::renderer::instance::DrawBuffer;
    use glam::Vec3;
    use object::{props, HasAlpha};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct Probe {
        disposed: Rc<Cell<u32>>,
        registered: Rc<Cell<u32>>,
        expire: Rc<Cell<bool>>,
        fail_update: bool,
        fail_dispose: bool,
    }

    struct Marker {
        key: ObjectKey,
        alpha: f32,
        probe: Probe,
        data: RenderData,
    }

    impl Marker {
        fn new(id: u64) -> Self {
            Self::tagged(id, id as u32)
        }

        /// `tag` becomes the material handle, to tell instances apart.
        fn tagged(id: u64, tag: u32) -> Self {
            Self {
                key: ObjectKey::entity(EntityId(id), "marker"),
                alpha: 0.0,
                probe: Probe::default(),
                data: RenderData::flat(MeshHandle(1), MaterialHandle(tag), Vec3::ZERO, Vec3::ONE),
            }
        }

        fn boxed(self) -> Box<dyn GraphicObject> {
            Box::new(self)
        }
    }

    impl HasAlpha for Marker {
        fn alpha(&self) -> f32 {
            self.alpha
        }
        fn set_alpha(&mut self, alpha: f32) {
            self.alpha = alpha;
        }
    }

    impl GraphicObject for Marker {
        fn key(&self) -> ObjectKey {
            self.key
        }
        fn on_registered(&mut self) {
            self.probe.registered.set(self.probe.registered.get() + 1);
        }
        fn update(&mut self, _ctx: &FrameContext<'_>) -> EngineResult<ObjectStatus> {
            if self.probe.fail_update {
                return Err(EngineError::Update {
                    key: self.key,
                    reason: "probe".into(),
                });
            }
            Ok(if self.probe.expire.get() {
                ObjectStatus::Expired
            } else {
                ObjectStatus::Alive
            })
        }
        fn render_data(&self) -> Option<&RenderData> {
            Some(&self.data)
        }
        fn dispose(&mut self, released: &mut ReleasedResources) -> EngineResult<()> {
            self.probe.disposed.set(self.probe.disposed.get() + 1);
            released.release_material(self.data.material);
            if self.probe.fail_dispose {
                return Err(EngineError::Dispose {
                    key: self.key,
                    reason: "probe".into(),
                });
            }
            Ok(())
        }
        fn as_alpha(&self) -> Option<&dyn HasAlpha> {
            Some(self)
        }
        fn as_alpha_mut(&mut self) -> Option<&mut dyn HasAlpha> {
            Some(self)
        }
    }

    fn frame(registry: &mut GraphicRegistry, dt: f32) -> FrameStats {
        let world = SnapshotWorld::default();
        let pipeline = RenderPipeline::default();
        registry.update_frame(&FrameContext {
            dt,
            world: &world,
            pipeline: &pipeline,
        })
    }

    fn alpha_of(registry: &GraphicRegistry, key: &ObjectKey) -> f32 {
        registry
            .get(key)
            .and_then(|o| o.as_alpha())
            .map(|a| a.alpha())
            .unwrap_or(f32::NAN)
    }

    fn key(id: u64) -> ObjectKey {
        ObjectKey::entity(EntityId(id), "marker")
    }

    #[test]
    fn one_active_object_per_key() {
        let mut registry = GraphicRegistry::new();
        let first = registry.register(Marker::tagged(1, 10).boxed());
        assert_eq!(first.outcome, RegisterOutcome::Adopted);

        let duplicate = Marker::tagged(1, 20);
        let dup_disposed = duplicate.probe.disposed.clone();
        let second = registry.register(duplicate.boxed());

        assert_eq!(second.outcome, RegisterOutcome::AlreadyActive);
        assert_eq!(second.id, first.id);
        assert_eq!(registry.len(), 1);
        // The stored instance is the first one; the duplicate was disposed.
        assert_eq!(registry.get(&key(1)).and_then(|o| o.render_data()).map(|d| d.material), Some(MaterialHandle(10)));
        assert_eq!(dup_disposed.get(), 1);
    }

    #[test]
    fn resurrection_keeps_the_stored_instance() {
        let mut registry = GraphicRegistry::new();
        let marker = Marker::new(1);
        let registered = marker.probe.registered.clone();
        let disposed = marker.probe.disposed.clone();
        let first = registry.register(marker.boxed());
        registry.apply_tween(&key(1), props::ALPHA, Tween::alpha(1.0, 1.0)).unwrap();

        assert!(registry.unregister(&key(1)));
        assert_eq!(registry.state(&key(1)), Some(ObjectState::PendingRemoval));
        assert!(registry.try_get(&key(1)).is_none());

        let again = registry.register(Marker::new(1).boxed());
        assert_eq!(again.outcome, RegisterOutcome::Resurrected);
        assert_eq!(again.id, first.id);
        assert_eq!(registry.state(&key(1)), Some(ObjectState::Active));
        assert_eq!(registered.get(), 2);

        frame(&mut registry, 2.0);
        frame(&mut registry, 0.1);
        assert_eq!(disposed.get(), 0);
        assert!(registry.try_get(&key(1)).is_some());
    }

    #[test]
    fn unregister_unknown_key_is_a_no_op() {
        let mut registry = GraphicRegistry::new();
        assert!(!registry.unregister(&key(9)));
        assert!(registry.apply_tween(&key(9), props::ALPHA, Tween::alpha(1.0, 1.0)).is_none());
    }

    #[test]
    fn second_tween_on_same_property_kills_the_first() {
        let mut registry = GraphicRegistry::new();
        registry.register(Marker::new(1).boxed());

        let outcomes = Rc::new(RefCell::new(Vec::new()));
        let sink = outcomes.clone();
        let first = registry
            .apply_tween(
                &key(1),
                props::ALPHA,
                Tween::alpha(1.0, 1.0).with_on_complete(move |o| sink.borrow_mut().push(o)),
            )
            .unwrap();
        frame(&mut registry, 0.5);
        let mid = alpha_of(&registry, &key(1));
        assert!((mid - 0.5).abs() < 1e-6);

        let second = registry.apply_tween(&key(1), props::ALPHA, Tween::alpha(0.0, 1.0)).unwrap();
        assert!(!registry.is_tween_live(first));
        assert_eq!(*outcomes.borrow(), vec![TweenOutcome::Killed]);
        assert_eq!(registry.tween_for(&key(1), props::ALPHA), Some(second));
        assert_eq!(registry.tween_count(), 1);

        // The new tween starts from the value the killed one left behind.
        frame(&mut registry, 0.5);
        assert!((alpha_of(&registry, &key(1)) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn fade_in_scenario() {
        let mut registry = GraphicRegistry::new();
        registry.register(Marker::new(1).boxed());
        let id = registry.apply_tween(&key(1), props::ALPHA, Tween::alpha(1.0, 0.2)).unwrap();

        frame(&mut registry, 0.1);
        assert!((alpha_of(&registry, &key(1)) - 0.5).abs() < 1e-6);
        assert!(registry.is_tween_live(id));

        frame(&mut registry, 0.1);
        assert_eq!(alpha_of(&registry, &key(1)), 1.0);
        assert!(!registry.is_tween_live(id));
        assert_eq!(registry.tween_count(), 0);

        let stats = frame(&mut registry, 0.1);
        assert_eq!(stats.tweens_retired, 1);
        assert_eq!(registry.tween_refs(&key(1)), 0);
        assert_eq!(alpha_of(&registry, &key(1)), 1.0);
    }

    #[test]
    fn kill_and_complete() {
        let mut registry = GraphicRegistry::new();
        registry.register(Marker::new(1).boxed());
        registry.register(Marker::new(2).boxed());
        let slow = registry.apply_tween(&key(1), props::ALPHA, Tween::alpha(1.0, 1.0)).unwrap();
        let snap = registry
            .apply_tween(&key(2), props::ALPHA, Tween::alpha(0.7, 5.0).with_easing(Easing::CubicIn))
            .unwrap();

        frame(&mut registry, 0.3);
        assert!(registry.kill_tween(slow));
        assert!(!registry.kill_tween(slow));
        frame(&mut registry, 0.3);
        assert!((alpha_of(&registry, &key(1)) - 0.3).abs() < 1e-6);

        assert!(registry.complete_tween(snap));
        assert_eq!(alpha_of(&registry, &key(2)), 0.7);
        assert!(!registry.complete_tween(snap));
    }

    #[test]
    fn disposal_waits_for_tweens() {
        let mut registry = GraphicRegistry::new();
        let marker = Marker::new(1);
        let disposed = marker.probe.disposed.clone();
        registry.register(marker.boxed());
        registry.apply_tween(&key(1), props::ALPHA, Tween::alpha(1.0, 0.25)).unwrap();
        registry.unregister(&key(1));

        // Fade keeps running while pending.
        frame(&mut registry, 0.1);
        frame(&mut registry, 0.1);
        assert!(registry.contains(&key(1)));
        assert!(alpha_of(&registry, &key(1)) > 0.6);

        // Finishes here, still referenced until retired.
        frame(&mut registry, 0.1);
        assert_eq!(disposed.get(), 0);
        assert_eq!(alpha_of(&registry, &key(1)), 1.0);

        // Retired and swept in the same pass.
        let stats = frame(&mut registry, 0.1);
        assert_eq!(stats.objects_disposed, 1);
        assert_eq!(disposed.get(), 1);
        assert!(!registry.contains(&key(1)));
        assert_eq!(registry.drain_released().collect::<Vec<_>>(), vec![MaterialHandle(1)]);
    }

    #[test]
    fn killed_tween_releases_pending_object_next_frame() {
        let mut registry = GraphicRegistry::new();
        let marker = Marker::new(1);
        let disposed = marker.probe.disposed.clone();
        registry.register(marker.boxed());
        let id = registry.apply_tween(&key(1), props::ALPHA, Tween::alpha(1.0, 10.0)).unwrap();
        registry.unregister(&key(1));
        frame(&mut registry, 0.1);
        assert_eq!(disposed.get(), 0);

        registry.kill_tween(id);
        frame(&mut registry, 0.1);
        assert_eq!(disposed.get(), 1);
    }

    #[test]
    fn pending_objects_reject_new_tweens() {
        let mut registry = GraphicRegistry::new();
        registry.register(Marker::new(1).boxed());
        registry.unregister(&key(1));
        assert!(registry.apply_tween(&key(1), props::ALPHA, Tween::alpha(1.0, 1.0)).is_none());
        assert!(registry.apply_tween(&key(1), props::ALPHA, Tween::radius(1.0, 1.0)).is_none());
    }

    #[test]
    fn missing_capability_is_rejected() {
        let mut registry = GraphicRegistry::new();
        registry.register(Marker::new(1).boxed());
        assert!(registry.apply_tween(&key(1), props::RADIUS, Tween::radius(3.0, 1.0)).is_none());
        assert_eq!(registry.tween_refs(&key(1)), 0);
    }

    #[test]
    fn expired_objects_are_swept() {
        let mut registry = GraphicRegistry::new();
        let marker = Marker::new(1);
        let expire = marker.probe.expire.clone();
        let disposed = marker.probe.disposed.clone();
        registry.register(marker.boxed());
        frame(&mut registry, 0.1);
        assert_eq!(registry.len(), 1);

        expire.set(true);
        let stats = frame(&mut registry, 0.1);
        assert_eq!(stats.objects_expired, 1);
        assert_eq!(stats.objects_disposed, 1);
        assert_eq!(disposed.get(), 1);
    }

    #[test]
    fn failing_objects_do_not_stop_the_frame() {
        let mut registry = GraphicRegistry::new();
        let mut broken = Marker::new(1);
        broken.probe.fail_update = true;
        broken.probe.fail_dispose = true;
        let broken_disposed = broken.probe.disposed.clone();
        registry.register(broken.boxed());
        registry.register(Marker::new(2).boxed());

        let stats = frame(&mut registry, 0.1);
        assert_eq!(stats.objects_updated, 2);

        registry.unregister(&key(1));
        frame(&mut registry, 0.1);
        assert_eq!(broken_disposed.get(), 1);
        assert!(!registry.contains(&key(1)));
        assert!(registry.contains(&key(2)));
    }

    #[test]
    fn render_draws_in_registration_order_and_survives_rejects() {
        let mut registry = GraphicRegistry::new();
        for id in [3, 1, 2] {
            registry.register(Marker::new(id).boxed());
        }
        let shaders = ShaderRegistry::new();

        let mut buffer = DrawBuffer::new();
        assert_eq!(registry.render(&shaders, &mut buffer), 3);
        assert_eq!(buffer.keys, vec![key(3), key(1), key(2)]);

        let mut picky = |call: &DrawCall<'_>| -> EngineResult<()> {
            if call.key == key(1) {
                Err(EngineError::Draw {
                    key: call.key,
                    reason: "rejected".into(),
                })
            } else {
                Ok(())
            }
        };
        assert_eq!(registry.render(&shaders, &mut picky), 2);
    }

    #[test]
    fn clear_kills_tweens_and_disposes_everything_once() {
        let mut registry = GraphicRegistry::new();
        let mut counters = Vec::new();
        for id in 1..=5 {
            let marker = Marker::new(id);
            counters.push(marker.probe.disposed.clone());
            registry.register(marker.boxed());
        }
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        for id in 1..=3 {
            let sink = outcomes.clone();
            registry
                .apply_tween(
                    &key(id),
                    props::ALPHA,
                    Tween::alpha(1.0, 1.0).with_on_complete(move |o| sink.borrow_mut().push(o)),
                )
                .unwrap();
        }
        registry.unregister(&key(4));

        registry.clear();

        assert_eq!(registry.len(), 0);
        assert_eq!(registry.tween_count(), 0);
        assert!(counters.iter().all(|c| c.get() == 1));
        assert_eq!(*outcomes.borrow(), vec![TweenOutcome::Killed; 3]);
        assert_eq!(registry.drain_released().count(), 5);

        frame(&mut registry, 0.1);
        assert!(counters.iter().all(|c| c.get() == 1));
    }
}
