//! Shading-program registry.
//!
//! A configurator turns a [`ShaderPayload`] (optional named fields) into a
//! per-draw [`ParameterBlock`]. The shared material is never touched; every
//! draw gets its own override block.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use log::error;

use crate::api::types::{Color, ShaderId};

/// Parameter names understood by the built-in programs.
pub mod params {
    pub const COLOR: &str = "_Color";
    pub const COLOR_TWO: &str = "_ColorTwo";
    pub const BLEND_FACTOR: &str = "_BlendFactor";
    pub const CUTOFF: &str = "_Cutoff";
    pub const ALPHA: &str = "_Alpha";
}

pub const DEFAULT_ALPHA: f32 = 1.0;
pub const DEFAULT_CUTOFF: f32 = 0.5;
pub const DEFAULT_BLEND_FACTOR: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Color(Color),
}

/// Per-draw override values, keyed by parameter name. Insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBlock {
    values: Vec<(&'static str, ParamValue)>,
}

impl ParameterBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &'static str, value: ParamValue) {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn set_float(&mut self, name: &'static str, value: f32) {
        self.set(name, ParamValue::Float(value));
    }

    pub fn set_color(&mut self, name: &'static str, value: Color) {
        self.set(name, ParamValue::Color(value));
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            ParamValue::Float(v) => Some(v),
            ParamValue::Color(_) => None,
        }
    }

    pub fn color(&self, name: &str) -> Option<Color> {
        match self.get(name)? {
            ParamValue::Color(c) => Some(c),
            ParamValue::Float(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ParamValue)> + '_ {
        self.values.iter().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Named optional inputs a graphic object hands to its shading program.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShaderPayload {
    pub target_color: Option<Color>,
    pub base_color: Option<Color>,
    pub blend_factor: Option<f32>,
    pub cutoff: Option<f32>,
    pub alpha: Option<f32>,
}

impl ShaderPayload {
    pub fn with_target_color(mut self, color: Color) -> Self {
        self.target_color = Some(color);
        self
    }

    pub fn with_base_color(mut self, color: Color) -> Self {
        self.base_color = Some(color);
        self
    }

    pub fn with_blend_factor(mut self, factor: f32) -> Self {
        self.blend_factor = Some(factor);
        self
    }

    pub fn with_cutoff(mut self, cutoff: f32) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = Some(alpha);
        self
    }
}

/// Writes one program's parameters from a payload.
pub trait ShaderConfigurator {
    fn name(&self) -> &'static str;

    fn configure(&self, payload: &ShaderPayload, block: &mut ParameterBlock);
}

/// Flat tint: `_Color` and `_Alpha`.
pub struct TintConfigurator;

impl ShaderConfigurator for TintConfigurator {
    fn name(&self) -> &'static str {
        "tint"
    }

    fn configure(&self, payload: &ShaderPayload, block: &mut ParameterBlock) {
        block.set_color(params::COLOR, payload.target_color.unwrap_or(Color::WHITE));
        block.set_float(params::ALPHA, payload.alpha.unwrap_or(DEFAULT_ALPHA));
    }
}

/// Two-color blend with alpha cutout.
pub struct CutoutBlendConfigurator;

impl ShaderConfigurator for CutoutBlendConfigurator {
    fn name(&self) -> &'static str {
        "cutout_blend"
    }

    fn configure(&self, payload: &ShaderPayload, block: &mut ParameterBlock) {
        block.set_color(params::COLOR, payload.target_color.unwrap_or(Color::WHITE));
        block.set_color(params::COLOR_TWO, payload.base_color.unwrap_or(Color::WHITE));
        block.set_float(params::BLEND_FACTOR, payload.blend_factor.unwrap_or(DEFAULT_BLEND_FACTOR));
        block.set_float(params::CUTOFF, payload.cutoff.unwrap_or(DEFAULT_CUTOFF));
        block.set_float(params::ALPHA, payload.alpha.unwrap_or(DEFAULT_ALPHA));
    }
}

/// Maps program handles to configurators.
pub struct ShaderRegistry {
    configurators: HashMap<ShaderId, Box<dyn ShaderConfigurator>>,
    /// Programs already reported missing, so the error is logged once each.
    reported: RefCell<HashSet<ShaderId>>,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self {
            configurators: HashMap::new(),
            reported: RefCell::new(HashSet::new()),
        }
    }

    /// Returns the configurator previously registered under `id`, if any.
    pub fn register(
        &mut self,
        id: ShaderId,
        configurator: impl ShaderConfigurator + 'static,
    ) -> Option<Box<dyn ShaderConfigurator>> {
        self.reported.borrow_mut().remove(&id);
        self.configurators.insert(id, Box::new(configurator))
    }

    pub fn with(mut self, id: ShaderId, configurator: impl ShaderConfigurator + 'static) -> Self {
        self.register(id, configurator);
        self
    }

    pub fn contains(&self, id: ShaderId) -> bool {
        self.configurators.contains_key(&id)
    }

    /// `None` for an unregistered program; callers draw with default parameters.
    pub fn get(&self, id: ShaderId) -> Option<&dyn ShaderConfigurator> {
        let found = self.configurators.get(&id).map(|c| c.as_ref());
        if found.is_none() && self.reported.borrow_mut().insert(id) {
            error!("no configurator registered for shader program {}", id.0);
        }
        found
    }

    /// Fill `block` for one draw. Leaves it empty when there is nothing to configure.
    pub fn configure(&self, shader: Option<ShaderId>, payload: &ShaderPayload, block: &mut ParameterBlock) {
        block.clear();
        if let Some(configurator) = shader.and_then(|id| self.get(id)) {
            configurator.configure(payload, block);
        }
    }

    pub fn len(&self) -> usize {
        self.configurators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurators.is_empty()
    }
}

impl Default for ShaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutout_defaults_fill_unset_fields() {
        let mut block = ParameterBlock::new();
        CutoutBlendConfigurator.configure(&ShaderPayload::default(), &mut block);
        assert_eq!(block.float(params::CUTOFF), Some(0.5));
        assert_eq!(block.float(params::ALPHA), Some(1.0));
        assert_eq!(block.float(params::BLEND_FACTOR), Some(0.0));
        assert_eq!(block.color(params::COLOR_TWO), Some(Color::WHITE));
        assert_eq!(block.len(), 5);
    }

    #[test]
    fn payload_fields_override_defaults() {
        let payload = ShaderPayload::default()
            .with_target_color(Color::rgb(1.0, 0.0, 0.0))
            .with_cutoff(0.2)
            .with_alpha(0.4);
        let mut block = ParameterBlock::new();
        CutoutBlendConfigurator.configure(&payload, &mut block);
        assert_eq!(block.color(params::COLOR), Some(Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(block.float(params::CUTOFF), Some(0.2));
        assert_eq!(block.float(params::ALPHA), Some(0.4));
    }

    #[test]
    fn block_set_replaces_in_place() {
        let mut block = ParameterBlock::new();
        block.set_float(params::ALPHA, 0.1);
        block.set_color(params::COLOR, Color::CLEAR);
        block.set_float(params::ALPHA, 0.9);
        let names: Vec<_> = block.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec![params::ALPHA, params::COLOR]);
        assert_eq!(block.float(params::ALPHA), Some(0.9));
        assert_eq!(block.float(params::COLOR), None);
    }

    #[test]
    fn unregistered_program_yields_no_overrides() {
        let registry = ShaderRegistry::new().with(ShaderId(1), TintConfigurator);
        assert!(registry.get(ShaderId(2)).is_none());
        assert!(registry.get(ShaderId(2)).is_none());
        assert_eq!(registry.reported.borrow().len(), 1);

        let mut block = ParameterBlock::new();
        block.set_float(params::ALPHA, 0.3);
        registry.configure(Some(ShaderId(2)), &ShaderPayload::default(), &mut block);
        assert!(block.is_empty());

        registry.configure(Some(ShaderId(1)), &ShaderPayload::default().with_alpha(0.5), &mut block);
        assert_eq!(block.float(params::ALPHA), Some(0.5));
        assert_eq!(registry.get(ShaderId(1)).map(|c| c.name()), Some("tint"));
    }
}
