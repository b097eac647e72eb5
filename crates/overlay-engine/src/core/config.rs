use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::api::error::EngineResult;

/// Engine configuration, usually loaded once from a JSON settings blob.
///
/// Every field has a default, so `{}` is a valid document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-decorator overrides, keyed by decorator name (e.g. "shelf_scale").
    pub decorators: HashMap<String, DecoratorSetting>,
    /// Fade timings handed to fade controllers.
    pub fade: FadeConfig,
    /// Defaults for the effect engine.
    pub effects: EffectConfig,
    /// Upper bound on the frame delta fed to tweens and effects. `None` = no clamp.
    pub max_frame_delta: Option<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decorators: HashMap::new(),
            fade: FadeConfig::default(),
            effects: EffectConfig::default(),
            max_frame_delta: Some(0.25),
        }
    }
}

/// Override for one built-in decorator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecoratorSetting {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Replaces the decorator's declared priority.
    #[serde(default)]
    pub priority: Option<i32>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    pub fade_in_seconds: f32,
    pub fade_out_seconds: f32,
    /// Used instead of `fade_in_seconds` the first time a controller activates.
    pub first_activation_seconds: f32,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            fade_in_seconds: 0.2,
            fade_out_seconds: 0.2,
            first_activation_seconds: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Distance below which an effect target counts as converged.
    pub convergence_epsilon: f32,
    /// Rate constant (1/s) for smooth-approach effects.
    pub approach_rate: f32,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            convergence_epsilon: 0.01,
            approach_rate: 8.0,
        }
    }
}

impl EngineConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn decorator(&self, name: &str) -> Option<&DecoratorSetting> {
        self.decorators.get(name)
    }

    /// Apply the configured clamp to a raw frame delta. Negative or NaN deltas become zero.
    pub fn clamp_delta(&self, dt: f32) -> f32 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        match self.max_frame_delta {
            Some(max) => dt.min(max),
            None => dt,
        }
    }
}

/// Fade timing for one feature controller.
///
/// Tracks whether the controller has activated before, so the first
/// activation can use a longer fade without any process-wide flag.
#[derive(Debug, Clone)]
pub struct FadeController {
    config: FadeConfig,
    activated_once: bool,
}

impl FadeController {
    pub fn new(config: FadeConfig) -> Self {
        Self {
            config,
            activated_once: false,
        }
    }

    /// Duration for the next fade-in. The first call returns the first-activation duration.
    pub fn next_fade_in(&mut self) -> f32 {
        if self.activated_once {
            self.config.fade_in_seconds
        } else {
            self.activated_once = true;
            self.config.first_activation_seconds
        }
    }

    pub fn fade_out(&self) -> f32 {
        self.config.fade_out_seconds
    }

    /// Forget previous activations (e.g. after a new world is loaded).
    pub fn reset(&mut self) {
        self.activated_once = false;
    }
}
