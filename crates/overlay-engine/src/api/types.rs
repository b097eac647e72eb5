use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-assigned identifier of a simulated entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity#{}", self.0)
    }
}

/// Identity of the map/world an entity lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapId(pub u32);

/// What an overlay is about: an entity, a map cell, or nothing in particular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Entity(EntityId),
    Cell { map: MapId, x: i32, z: i32 },
    Global,
}

/// Logical identity of an overlay.
///
/// Two keys are the same overlay iff subject and kind are equal. The registry
/// never compares object instances, only keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub subject: Subject,
    pub kind: &'static str,
}

impl ObjectKey {
    pub const fn new(subject: Subject, kind: &'static str) -> Self {
        Self { subject, kind }
    }

    pub const fn entity(id: EntityId, kind: &'static str) -> Self {
        Self::new(Subject::Entity(id), kind)
    }

    pub const fn cell(map: MapId, x: i32, z: i32, kind: &'static str) -> Self {
        Self::new(Subject::Cell { map, x, z }, kind)
    }

    pub const fn global(kind: &'static str) -> Self {
        Self::new(Subject::Global, kind)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subject {
            Subject::Entity(id) => write!(f, "{}/{}", id, self.kind),
            Subject::Cell { map, x, z } => write!(f, "cell({},{},{})/{}", map.0, x, z, self.kind),
            Subject::Global => write!(f, "global/{}", self.kind),
        }
    }
}

/// Registry-assigned identity of one adopted object instance.
///
/// Stays the same when a pending-removal object is resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Handle to a scheduled tween.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(pub u64);

/// Handle to a running effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub u64);

/// Host-owned mesh resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// Host-owned material resource (a shading program plus textures).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialHandle(pub u32);

/// Host shading program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderId(pub u32);

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const CLEAR: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Largest per-channel distance to `other`.
    pub fn distance(self, other: Color) -> f32 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
            .max((self.a - other.a).abs())
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}
