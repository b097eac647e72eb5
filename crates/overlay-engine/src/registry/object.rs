//! Graphic-object model: the trait every overlay implements, its optional
//! capability views, and the per-frame context handed to `update`.

use crate::api::error::EngineResult;
use crate::api::types::{Color, MaterialHandle, ObjectKey, ShaderId};
use crate::core::world::HostWorld;
use crate::pipeline::context::RenderData;
use crate::pipeline::RenderPipeline;
use crate::renderer::shader::ShaderPayload;

/// Lifecycle state of a registered object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectState {
    Active,
    /// Unregistered; disposed by the sweep once no tween targets it.
    PendingRemoval,
}

/// What an object reports back from its per-frame update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectStatus {
    Alive,
    /// The object has nothing left to show (e.g. its entity is gone).
    Expired,
}

/// Everything an object may read during `update`.
pub struct FrameContext<'a> {
    pub dt: f32,
    pub world: &'a dyn HostWorld,
    pub pipeline: &'a RenderPipeline,
}

/// Material instances handed back by disposed objects, drained by the host.
#[derive(Debug, Default)]
pub struct ReleasedResources {
    materials: Vec<MaterialHandle>,
}

impl ReleasedResources {
    pub fn release_material(&mut self, material: MaterialHandle) {
        self.materials.push(material);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = MaterialHandle> + '_ {
        self.materials.drain(..)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

// ── Capability views ─────────────────────────────────────────────────────

pub trait HasAlpha {
    fn alpha(&self) -> f32;
    fn set_alpha(&mut self, alpha: f32);
}

pub trait HasColor {
    fn color(&self) -> Color;
    fn set_color(&mut self, color: Color);
}

pub trait HasRadius {
    fn radius(&self) -> f32;
    fn set_radius(&mut self, radius: f32);
}

pub trait HasPadding {
    fn padding(&self) -> f32;
    fn set_padding(&mut self, padding: f32);
}

/// Which optional properties an object exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub alpha: bool,
    pub color: bool,
    pub radius: bool,
    pub padding: bool,
}

/// Scalar capability selector, for code that animates "some float property".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarChannel {
    Alpha,
    Radius,
    Padding,
}

impl ScalarChannel {
    pub fn property_id(self) -> &'static str {
        match self {
            ScalarChannel::Alpha => props::ALPHA,
            ScalarChannel::Radius => props::RADIUS,
            ScalarChannel::Padding => props::PADDING,
        }
    }

    pub fn read(self, object: &dyn GraphicObject) -> Option<f32> {
        match self {
            ScalarChannel::Alpha => object.as_alpha().map(|c| c.alpha()),
            ScalarChannel::Radius => object.as_radius().map(|c| c.radius()),
            ScalarChannel::Padding => object.as_padding().map(|c| c.padding()),
        }
    }

    /// Returns false when the object lacks the capability.
    pub fn write(self, object: &mut dyn GraphicObject, value: f32) -> bool {
        match self {
            ScalarChannel::Alpha => {
                let Some(c) = object.as_alpha_mut() else { return false };
                c.set_alpha(value);
            }
            ScalarChannel::Radius => {
                let Some(c) = object.as_radius_mut() else { return false };
                c.set_radius(value);
            }
            ScalarChannel::Padding => {
                let Some(c) = object.as_padding_mut() else { return false };
                c.set_padding(value);
            }
        }
        true
    }
}

/// Property ids used by the capability tweens.
pub mod props {
    pub const ALPHA: &str = "Alpha";
    pub const COLOR: &str = "Color";
    pub const RADIUS: &str = "Radius";
    pub const PADDING: &str = "Padding";
}

/// A managed overlay instance.
///
/// Objects are created by features and handed to
/// [`GraphicRegistry::register`](crate::registry::GraphicRegistry::register),
/// which owns them from then on. Capability accessors default to `None`;
/// an object opts into a capability by overriding both the shared and the
/// mutable accessor.
pub trait GraphicObject {
    fn key(&self) -> ObjectKey;

    /// Called on adoption and on resurrection from pending removal.
    fn on_registered(&mut self) {}

    /// Per-frame update. Recompute render data here.
    fn update(&mut self, ctx: &FrameContext<'_>) -> EngineResult<ObjectStatus>;

    /// Mesh, material and transform computed by the last update.
    fn render_data(&self) -> Option<&RenderData>;

    /// Shading program whose configurator fills the per-draw parameter block.
    fn shader(&self) -> Option<ShaderId> {
        None
    }

    fn shader_payload(&self) -> ShaderPayload {
        ShaderPayload::default()
    }

    /// Release owned resources. Called exactly once, right before the registry drops the object.
    fn dispose(&mut self, _released: &mut ReleasedResources) -> EngineResult<()> {
        Ok(())
    }

    fn as_alpha(&self) -> Option<&dyn HasAlpha> {
        None
    }

    fn as_alpha_mut(&mut self) -> Option<&mut dyn HasAlpha> {
        None
    }

    fn as_color(&self) -> Option<&dyn HasColor> {
        None
    }

    fn as_color_mut(&mut self) -> Option<&mut dyn HasColor> {
        None
    }

    fn as_radius(&self) -> Option<&dyn HasRadius> {
        None
    }

    fn as_radius_mut(&mut self) -> Option<&mut dyn HasRadius> {
        None
    }

    fn as_padding(&self) -> Option<&dyn HasPadding> {
        None
    }

    fn as_padding_mut(&mut self) -> Option<&mut dyn HasPadding> {
        None
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            alpha: self.as_alpha().is_some(),
            color: self.as_color().is_some(),
            radius: self.as_radius().is_some(),
            padding: self.as_padding().is_some(),
        }
    }
}
