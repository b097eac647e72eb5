//! Decorators: priority-ordered, conditionally applied adjustments to one
//! aspect of the transform a strategy produced.

use glam::Vec3;

use super::context::{bands, Adjustment, Aspect, RenderContext, RotationOp};
use super::stable::{salt, StableRng};
use crate::api::error::EngineResult;
use crate::components::entity::Rot4;
use crate::core::config::EngineConfig;

/// Altitude step between stacks sharing a storage cell, against z-fighting.
pub const SLOT_ALTITUDE_STEP: f32 = 0.002;

/// How far in front of its bearer a carried thing is drawn.
pub const CARRY_DISTANCE: f32 = 0.25;
/// Altitude of a carried thing relative to its bearer; behind the bearer when facing north.
pub const CARRY_ALTITUDE: f32 = 0.03;

pub const STACK_SCALE_MIN: f32 = 0.8;

/// A named rule adjusting exactly one aspect of the running render context.
///
/// `adjust` must be a pure function of the context: no interior state, no
/// randomness other than [`StableRng`] seeded from the entity id.
pub trait Decorator {
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32;

    fn aspect(&self) -> Aspect;

    fn applies(&self, ctx: &RenderContext<'_>) -> bool;

    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment>;
}

struct Entry {
    decorator: Box<dyn Decorator>,
    priority: i32,
    enabled: bool,
    /// Registration order; breaks priority ties.
    seq: u32,
}

/// Registered decorators kept sorted by `(priority, registration order)`.
pub struct DecoratorSet {
    entries: Vec<Entry>,
    next_seq: u32,
}

impl DecoratorSet {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// All built-in decorators, enabled, at their declared priorities.
    pub fn builtin() -> Self {
        Self::new()
            .with(GraphicOffset)
            .with(StorageSlotOffset)
            .with(CarriedOffset)
            .with(RandomRotation)
            .with(ShelfAlignment)
            .with(CarriedRotation)
            .with(AspectScale)
            .with(ShelfScale)
            .with(StackScale)
            .with(OpenMesh)
            .with(OpenMaterial)
    }

    pub fn with(mut self, decorator: impl Decorator + 'static) -> Self {
        self.register(Box::new(decorator));
        self
    }

    pub fn register(&mut self, decorator: Box<dyn Decorator>) {
        let priority = decorator.priority();
        self.entries.push(Entry {
            decorator,
            priority,
            enabled: true,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        self.sort();
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|e| (e.priority, e.seq));
    }

    /// Returns false if no decorator has that name.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let mut found = false;
        for entry in self.entries.iter_mut().filter(|e| e.decorator.name() == name) {
            entry.enabled = enabled;
            found = true;
        }
        found
    }

    /// Move a decorator to another priority. Its registration order is kept for ties.
    pub fn set_priority(&mut self, name: &str, priority: i32) -> bool {
        let mut found = false;
        for entry in self.entries.iter_mut().filter(|e| e.decorator.name() == name) {
            entry.priority = priority;
            found = true;
        }
        if found {
            self.sort();
        }
        found
    }

    /// Apply the `decorators` section of the config. Unknown names are logged and skipped.
    pub fn apply_config(&mut self, config: &EngineConfig) {
        // Sorted so the log output and priority updates do not depend on map order.
        let mut names: Vec<_> = config.decorators.keys().collect();
        names.sort();
        for name in names {
            let setting = &config.decorators[name];
            if !self.set_enabled(name, setting.enabled) {
                log::warn!("config names unknown decorator `{name}`");
                continue;
            }
            if let Some(priority) = setting.priority {
                self.set_priority(name, priority);
            }
        }
    }

    /// Enabled decorators in execution order.
    pub fn ordered(&self) -> impl Iterator<Item = (&dyn Decorator, i32)> + '_ {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| (e.decorator.as_ref(), e.priority))
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| e.decorator.name() == name)
            .map(|e| e.enabled)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DecoratorSet {
    fn default() -> Self {
        Self::builtin()
    }
}

// ── Offset ───────────────────────────────────────────────────────────────

/// Per-facing draw offset from the graphic.
pub struct GraphicOffset;

impl Decorator for GraphicOffset {
    fn name(&self) -> &'static str {
        "graphic_offset"
    }
    fn priority(&self) -> i32 {
        bands::BASE_OFFSET + 10
    }
    fn aspect(&self) -> Aspect {
        Aspect::Offset
    }
    fn applies(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.graphic.draw_offsets[ctx.facing.index()] != Vec3::ZERO
    }
    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment> {
        Ok(Adjustment::Offset(ctx.graphic.draw_offsets[ctx.facing.index()]))
    }
}

/// Spreads stacks sharing a storage cell along the storage's right axis.
pub struct StorageSlotOffset;

impl Decorator for StorageSlotOffset {
    fn name(&self) -> &'static str {
        "storage_slot_offset"
    }
    fn priority(&self) -> i32 {
        bands::CONTEXT_OFFSET + 50
    }
    fn aspect(&self) -> Aspect {
        Aspect::Offset
    }
    fn applies(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.entity.storage().is_some_and(|s| s.is_shared())
    }
    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment> {
        let Some(slot) = ctx.entity.storage() else {
            return Ok(Adjustment::Offset(Vec3::ZERO));
        };
        let last = slot.slot_count.saturating_sub(1);
        let index = slot.slot_index.min(last) as f32;
        let centered = index - last as f32 * 0.5;
        let along = slot.facing.right() * (centered * slot.slot_spacing);
        Ok(Adjustment::Offset(along + Vec3::Y * (index * SLOT_ALTITUDE_STEP)))
    }
}

pub struct CarriedOffset;

impl Decorator for CarriedOffset {
    fn name(&self) -> &'static str {
        "carried_offset"
    }
    fn priority(&self) -> i32 {
        bands::CONTEXT_OFFSET + 60
    }
    fn aspect(&self) -> Aspect {
        Aspect::Offset
    }
    fn applies(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.entity.carrier_facing().is_some()
    }
    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment> {
        let facing = ctx.entity.carrier_facing().unwrap_or_default();
        let altitude = if facing == Rot4::North { -CARRY_ALTITUDE } else { CARRY_ALTITUDE };
        Ok(Adjustment::Offset(facing.forward() * CARRY_DISTANCE + Vec3::Y * altitude))
    }
}

// ── Rotation ─────────────────────────────────────────────────────────────

/// Stable per-entity angle for random-rotated graphics.
pub struct RandomRotation;

impl Decorator for RandomRotation {
    fn name(&self) -> &'static str {
        "random_rotation"
    }
    fn priority(&self) -> i32 {
        bands::BASE_ROTATION + 10
    }
    fn aspect(&self) -> Aspect {
        Aspect::Rotation
    }
    fn applies(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.graphic.random_rotation().is_some_and(|max| max > 0.0)
    }
    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment> {
        let max = ctx.graphic.random_rotation().unwrap_or(0.0);
        let angle = StableRng::for_entity(ctx.entity.id, salt::RANDOM_ROTATION).next_symmetric(max);
        Ok(Adjustment::Rotation(RotationOp::Add(angle)))
    }
}

/// Items on an aligning shelf face the shelf, whatever rotation came before.
pub struct ShelfAlignment;

impl Decorator for ShelfAlignment {
    fn name(&self) -> &'static str {
        "shelf_alignment"
    }
    fn priority(&self) -> i32 {
        bands::CONTEXT_ROTATION + 50
    }
    fn aspect(&self) -> Aspect {
        Aspect::Rotation
    }
    fn applies(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.entity.storage().is_some_and(|s| s.aligns_contents)
    }
    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment> {
        let shelf = ctx.entity.storage().map(|s| s.facing.angle()).unwrap_or(0.0);
        Ok(Adjustment::Rotation(RotationOp::Set(shelf + ctx.graphic.rotate_in_storage)))
    }
}

/// Carried things take the carried angle, mirrored when the bearer faces west.
pub struct CarriedRotation;

impl Decorator for CarriedRotation {
    fn name(&self) -> &'static str {
        "carried_rotation"
    }
    fn priority(&self) -> i32 {
        bands::CONTEXT_ROTATION + 70
    }
    fn aspect(&self) -> Aspect {
        Aspect::Rotation
    }
    fn applies(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.entity.carrier_facing().is_some()
    }
    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment> {
        let angle = match ctx.entity.carrier_facing() {
            Some(Rot4::West) => -ctx.graphic.carried_angle,
            _ => ctx.graphic.carried_angle,
        };
        Ok(Adjustment::Rotation(RotationOp::Set(angle)))
    }
}

// ── Scale ────────────────────────────────────────────────────────────────

/// Non-square textures stretch along Z.
pub struct AspectScale;

impl Decorator for AspectScale {
    fn name(&self) -> &'static str {
        "aspect_scale"
    }
    fn priority(&self) -> i32 {
        bands::BASE_SCALE + 10
    }
    fn aspect(&self) -> Aspect {
        Aspect::Scale
    }
    fn applies(&self, ctx: &RenderContext<'_>) -> bool {
        let aspect = ctx.graphic.texture_aspect;
        aspect > 0.0 && aspect != 1.0
    }
    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment> {
        Ok(Adjustment::Scale(Vec3::new(1.0, 1.0, ctx.graphic.texture_aspect)))
    }
}

pub struct ShelfScale;

impl Decorator for ShelfScale {
    fn name(&self) -> &'static str {
        "shelf_scale"
    }
    fn priority(&self) -> i32 {
        bands::CONTEXT_SCALE + 10
    }
    fn aspect(&self) -> Aspect {
        Aspect::Scale
    }
    fn applies(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.entity.storage().is_some_and(|s| s.is_shared())
    }
    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment> {
        let s = ctx.entity.storage().map(|s| s.content_scale).unwrap_or(1.0);
        Ok(Adjustment::Scale(Vec3::new(s, 1.0, s)))
    }
}

/// Partial stacks draw smaller, from [`STACK_SCALE_MIN`] for one item to 1.0 when full.
pub struct StackScale;

impl Decorator for StackScale {
    fn name(&self) -> &'static str {
        "stack_scale"
    }
    fn priority(&self) -> i32 {
        bands::CONTEXT_SCALE + 20
    }
    fn aspect(&self) -> Aspect {
        Aspect::Scale
    }
    fn applies(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.graphic.scale_with_stack && ctx.entity.stack_limit > 1
    }
    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment> {
        let entity = ctx.entity;
        let fill = (entity.stack_count.saturating_sub(1)) as f32 / (entity.stack_limit - 1) as f32;
        let s = STACK_SCALE_MIN + (1.0 - STACK_SCALE_MIN) * fill.clamp(0.0, 1.0);
        Ok(Adjustment::Scale(Vec3::new(s, 1.0, s)))
    }
}

// ── Mesh / material overrides ────────────────────────────────────────────

pub struct OpenMesh;

impl Decorator for OpenMesh {
    fn name(&self) -> &'static str {
        "open_mesh"
    }
    fn priority(&self) -> i32 {
        bands::MESH_OVERRIDE + 10
    }
    fn aspect(&self) -> Aspect {
        Aspect::Mesh
    }
    fn applies(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.entity.open && ctx.graphic.open_mesh.is_some()
    }
    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment> {
        Ok(Adjustment::Mesh(ctx.graphic.open_mesh.unwrap_or(ctx.mesh)))
    }
}

pub struct OpenMaterial;

impl Decorator for OpenMaterial {
    fn name(&self) -> &'static str {
        "open_material"
    }
    fn priority(&self) -> i32 {
        bands::MATERIAL_OVERRIDE + 10
    }
    fn aspect(&self) -> Aspect {
        Aspect::Material
    }
    fn applies(&self, ctx: &RenderContext<'_>) -> bool {
        ctx.entity.open && ctx.graphic.open_material.is_some()
    }
    fn adjust(&self, ctx: &RenderContext<'_>) -> EngineResult<Adjustment> {
        Ok(Adjustment::Material(ctx.graphic.open_material.unwrap_or(ctx.material)))
    }
}
