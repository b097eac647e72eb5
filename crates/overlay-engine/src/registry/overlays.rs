//! Built-in graphic objects.

use glam::{Mat4, Quat, Vec3};

use super::object::{
    FrameContext, GraphicObject, HasAlpha, HasColor, HasPadding, HasRadius, ObjectStatus,
    ReleasedResources,
};
use crate::api::error::EngineResult;
use crate::api::types::{Color, EntityId, MapId, MaterialHandle, MeshHandle, ObjectKey, ShaderId};
use crate::pipeline::context::RenderData;
use crate::renderer::shader::ShaderPayload;

/// Height above the ground plane flat highlights are drawn at.
pub const HIGHLIGHT_ALTITUDE: f32 = 0.01;

/// Re-renders one host entity through the pipeline, tinted.
///
/// Expires as soon as its entity is gone, sits on another map than the one
/// shown, or cannot be rendered.
pub struct EntityOverlay {
    key: ObjectKey,
    entity: EntityId,
    alpha: f32,
    color: Color,
    /// Tint material instance owned by this overlay.
    tint: Option<MaterialHandle>,
    shader: Option<ShaderId>,
    /// Drawn this far above the entity's own graphic.
    lift: f32,
    data: Option<RenderData>,
}

impl EntityOverlay {
    pub fn new(entity: EntityId, kind: &'static str) -> Self {
        Self {
            key: ObjectKey::entity(entity, kind),
            entity,
            alpha: 0.0,
            color: Color::WHITE,
            tint: None,
            shader: None,
            lift: 0.0,
            data: None,
        }
    }

    /// Draw with `material` instead of the entity's own, configured by `shader`.
    /// The overlay owns the material from now on and releases it on dispose.
    pub fn with_tint(mut self, material: MaterialHandle, shader: ShaderId) -> Self {
        self.tint = Some(material);
        self.shader = Some(shader);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_lift(mut self, lift: f32) -> Self {
        self.lift = lift;
        self
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }
}

impl GraphicObject for EntityOverlay {
    fn key(&self) -> ObjectKey {
        self.key
    }

    fn update(&mut self, ctx: &FrameContext<'_>) -> EngineResult<ObjectStatus> {
        let Some(snapshot) = ctx.world.entity(self.entity) else {
            self.data = None;
            return Ok(ObjectStatus::Expired);
        };
        if snapshot.map != ctx.world.map_id() {
            self.data = None;
            return Ok(ObjectStatus::Expired);
        }
        let Some(mut data) = ctx.pipeline.compute(snapshot) else {
            self.data = None;
            return Ok(ObjectStatus::Expired);
        };

        if let Some(tint) = self.tint {
            data.material = tint;
        }
        if self.lift != 0.0 {
            data.position.y += self.lift;
            data.transform.w_axis.y += self.lift;
        }
        self.data = Some(data);
        Ok(ObjectStatus::Alive)
    }

    fn render_data(&self) -> Option<&RenderData> {
        self.data.as_ref()
    }

    fn shader(&self) -> Option<ShaderId> {
        self.shader
    }

    fn shader_payload(&self) -> ShaderPayload {
        ShaderPayload::default()
            .with_target_color(self.color)
            .with_alpha(self.alpha)
    }

    fn dispose(&mut self, released: &mut ReleasedResources) -> EngineResult<()> {
        if let Some(tint) = self.tint.take() {
            released.release_material(tint);
        }
        self.data = None;
        Ok(())
    }

    fn as_alpha(&self) -> Option<&dyn HasAlpha> {
        Some(self)
    }

    fn as_alpha_mut(&mut self) -> Option<&mut dyn HasAlpha> {
        Some(self)
    }

    fn as_color(&self) -> Option<&dyn HasColor> {
        Some(self)
    }

    fn as_color_mut(&mut self) -> Option<&mut dyn HasColor> {
        Some(self)
    }
}

impl HasAlpha for EntityOverlay {
    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }
}

impl HasColor for EntityOverlay {
    fn color(&self) -> Color {
        self.color
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

/// Flat tinted square over one map cell.
///
/// Side length is `2 * (radius + padding)`; a radius of 0.5 with no padding
/// covers exactly one cell.
pub struct CellHighlight {
    key: ObjectKey,
    map: MapId,
    center: Vec3,
    mesh: MeshHandle,
    material: MaterialHandle,
    shader: Option<ShaderId>,
    alpha: f32,
    color: Color,
    radius: f32,
    padding: f32,
    data: RenderData,
}

impl CellHighlight {
    pub fn new(map: MapId, x: i32, z: i32, kind: &'static str, mesh: MeshHandle, material: MaterialHandle) -> Self {
        let center = Vec3::new(x as f32 + 0.5, HIGHLIGHT_ALTITUDE, z as f32 + 0.5);
        let mut highlight = Self {
            key: ObjectKey::cell(map, x, z, kind),
            map,
            center,
            mesh,
            material,
            shader: None,
            alpha: 0.0,
            color: Color::WHITE,
            radius: 0.5,
            padding: 0.0,
            data: RenderData::flat(mesh, material, center, Vec3::ONE),
        };
        highlight.rebuild();
        highlight
    }

    pub fn with_shader(mut self, shader: ShaderId) -> Self {
        self.shader = Some(shader);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self.rebuild();
        self
    }

    pub fn side(&self) -> f32 {
        (2.0 * (self.radius + self.padding)).max(0.0)
    }

    fn rebuild(&mut self) {
        let side = self.side();
        let scale = Vec3::new(side, 1.0, side);
        self.data = RenderData {
            mesh: self.mesh,
            material: self.material,
            position: self.center,
            rotation: 0.0,
            scale,
            transform: Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, self.center),
        };
    }
}

impl GraphicObject for CellHighlight {
    fn key(&self) -> ObjectKey {
        self.key
    }

    fn update(&mut self, ctx: &FrameContext<'_>) -> EngineResult<ObjectStatus> {
        if ctx.world.map_id() != self.map {
            return Ok(ObjectStatus::Expired);
        }
        self.rebuild();
        Ok(ObjectStatus::Alive)
    }

    /// Nothing to draw while fully transparent.
    fn render_data(&self) -> Option<&RenderData> {
        (self.alpha > 0.0).then_some(&self.data)
    }

    fn shader(&self) -> Option<ShaderId> {
        self.shader
    }

    fn shader_payload(&self) -> ShaderPayload {
        ShaderPayload::default()
            .with_target_color(self.color)
            .with_alpha(self.alpha)
    }

    fn as_alpha(&self) -> Option<&dyn HasAlpha> {
        Some(self)
    }

    fn as_alpha_mut(&mut self) -> Option<&mut dyn HasAlpha> {
        Some(self)
    }

    fn as_color(&self) -> Option<&dyn HasColor> {
        Some(self)
    }

    fn as_color_mut(&mut self) -> Option<&mut dyn HasColor> {
        Some(self)
    }

    fn as_radius(&self) -> Option<&dyn HasRadius> {
        Some(self)
    }

    fn as_radius_mut(&mut self) -> Option<&mut dyn HasRadius> {
        Some(self)
    }

    fn as_padding(&self) -> Option<&dyn HasPadding> {
        Some(self)
    }

    fn as_padding_mut(&mut self) -> Option<&mut dyn HasPadding> {
        Some(self)
    }
}

impl HasAlpha for CellHighlight {
    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }
}

impl HasColor for CellHighlight {
    fn color(&self) -> Color {
        self.color
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

impl HasRadius for CellHighlight {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }
}

impl HasPadding for CellHighlight {
    fn padding(&self) -> f32 {
        self.padding
    }

    fn set_padding(&mut self, padding: f32) {
        self.padding = padding;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::entity::{EntityKind, EntitySnapshot, Holder};
    use crate::components::graphic::GraphicDescriptor;
    use crate::core::world::SnapshotWorld;
    use crate::pipeline::RenderPipeline;

    fn item_world() -> SnapshotWorld {
        let mut world = SnapshotWorld::new(MapId(1));
        world.upsert(
            EntitySnapshot::new(EntityId(7), EntityKind::Item)
                .with_map(MapId(1))
                .with_position(Vec3::new(2.5, 0.0, 3.5))
                .with_graphic(GraphicDescriptor::single(Some(MeshHandle(1)), Some(MaterialHandle(2)))),
        );
        world
    }

    fn update(object: &mut dyn GraphicObject, world: &SnapshotWorld) -> ObjectStatus {
        let pipeline = RenderPipeline::default();
        object
            .update(&FrameContext {
                dt: 0.016,
                world,
                pipeline: &pipeline,
            })
            .unwrap()
    }

    #[test]
    fn overlay_follows_its_entity_with_tint() {
        let mut world = item_world();
        let mut overlay = EntityOverlay::new(EntityId(7), "haul")
            .with_tint(MaterialHandle(90), ShaderId(1))
            .with_lift(0.05);

        assert_eq!(update(&mut overlay, &world), ObjectStatus::Alive);
        let data = overlay.render_data().copied().unwrap();
        assert_eq!(data.material, MaterialHandle(90));
        assert_eq!(data.mesh, MeshHandle(1));
        assert!(data.position.abs_diff_eq(Vec3::new(2.5, 0.05, 3.5), 1e-6));
        assert!((data.transform.w_axis.y - 0.05).abs() < 1e-6);

        if let Some(entity) = world.get_mut(EntityId(7)) {
            entity.position.x = 4.5;
        }
        update(&mut overlay, &world);
        assert_eq!(overlay.render_data().map(|d| d.position.x), Some(4.5));
    }

    #[test]
    fn overlay_expires_when_entity_leaves() {
        let mut world = item_world();
        let mut overlay = EntityOverlay::new(EntityId(7), "haul");

        if let Some(entity) = world.get_mut(EntityId(7)) {
            entity.holder = Some(Holder::Container { container: EntityId(50) });
        }
        assert_eq!(update(&mut overlay, &world), ObjectStatus::Expired);
        assert!(overlay.render_data().is_none());

        let mut world = item_world();
        world.set_map(MapId(2));
        assert_eq!(update(&mut overlay, &world), ObjectStatus::Expired);

        world.remove(EntityId(7));
        world.set_map(MapId(1));
        assert_eq!(update(&mut overlay, &world), ObjectStatus::Expired);
    }

    #[test]
    fn overlay_releases_its_tint_once() {
        let mut overlay = EntityOverlay::new(EntityId(7), "haul").with_tint(MaterialHandle(90), ShaderId(1));
        let mut released = ReleasedResources::default();
        overlay.dispose(&mut released).unwrap();
        overlay.dispose(&mut released).unwrap();
        assert_eq!(released.drain().collect::<Vec<_>>(), vec![MaterialHandle(90)]);
    }

    #[test]
    fn overlay_payload_carries_alpha_and_color() {
        let overlay = EntityOverlay::new(EntityId(7), "haul")
            .with_alpha(0.4)
            .with_color(Color::rgb(0.0, 1.0, 0.0));
        let payload = overlay.shader_payload();
        assert_eq!(payload.alpha, Some(0.4));
        assert_eq!(payload.target_color, Some(Color::rgb(0.0, 1.0, 0.0)));
        let caps = overlay.capabilities();
        assert!(caps.alpha && caps.color && !caps.radius);
    }

    #[test]
    fn highlight_size_tracks_radius_and_padding() {
        let world = SnapshotWorld::new(MapId(3));
        let mut highlight = CellHighlight::new(MapId(3), 4, -2, "zone", MeshHandle(1), MaterialHandle(5));
        assert_eq!(highlight.key(), ObjectKey::cell(MapId(3), 4, -2, "zone"));
        assert!(highlight.render_data().is_none());

        highlight.set_alpha(1.0);
        highlight.set_padding(0.25);
        update(&mut highlight, &world);
        let data = highlight.render_data().copied().unwrap();
        assert_eq!(data.scale, Vec3::new(1.5, 1.0, 1.5));
        assert_eq!(data.position, Vec3::new(4.5, HIGHLIGHT_ALTITUDE, -1.5));

        let caps = highlight.capabilities();
        assert!(caps.alpha && caps.color && caps.radius && caps.padding);
    }

    #[test]
    fn highlight_expires_off_map() {
        let world = SnapshotWorld::new(MapId(1));
        let mut highlight = CellHighlight::new(MapId(3), 0, 0, "zone", MeshHandle(1), MaterialHandle(5));
        assert_eq!(update(&mut highlight, &world), ObjectStatus::Expired);
    }
}
