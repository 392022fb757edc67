//! Particle emitter settings.
//!
//! Shapes and blending modes are authored as names and handed to the
//! renderer as small integer codes.

use serde::{Deserialize, Serialize};
use talkar_core::Vec3;

use crate::de::nullable_vec;
use crate::property::PartialVec3;
use crate::UniqueName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParticleShape {
    #[default]
    Box,
    Sphere,
    Disc,
}

impl ParticleShape {
    pub fn code(&self) -> u8 {
        match self {
            ParticleShape::Box => 1,
            ParticleShape::Sphere => 2,
            ParticleShape::Disc => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlendingMode {
    None,
    #[default]
    Normal,
    Additive,
    Subtractive,
    Multiply,
}

impl BlendingMode {
    pub fn code(&self) -> u8 {
        match self {
            BlendingMode::None => 0,
            BlendingMode::Normal => 1,
            BlendingMode::Additive => 2,
            BlendingMode::Subtractive => 3,
            BlendingMode::Multiply => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParticlePropertyType {
    PositionSpread,
    VelocityValue,
    VelocitySpread,
    AccelerationValue,
    AccelerationSpread,
    RotationAngle,
    RotationSpread,
    DragValue,
    DragSpread,
}

impl ParticlePropertyType {
    /// Sub-properties every emitter is configured with, in emitter order.
    pub const EMITTER: [ParticlePropertyType; 5] = [
        ParticlePropertyType::PositionSpread,
        ParticlePropertyType::VelocityValue,
        ParticlePropertyType::VelocitySpread,
        ParticlePropertyType::AccelerationValue,
        ParticlePropertyType::AccelerationSpread,
    ];

    /// Default for emitter sub-properties; `None` for ones the emitter ignores.
    pub fn default_value(&self) -> Option<Vec3> {
        match self {
            ParticlePropertyType::PositionSpread => Some(Vec3::zero()),
            ParticlePropertyType::VelocityValue => Some(Vec3::new(0.0, 25.0, 0.0)),
            ParticlePropertyType::VelocitySpread => Some(Vec3::new(10.0, 7.5, 10.0)),
            ParticlePropertyType::AccelerationValue => Some(Vec3::new(0.0, -10.0, 0.0)),
            ParticlePropertyType::AccelerationSpread => Some(Vec3::new(10.0, 0.0, 10.0)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleProperty {
    #[serde(rename = "type")]
    pub property_type: ParticlePropertyType,
    #[serde(flatten)]
    pub value: PartialVec3,
}

/// Fields of a `particle-element`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleElement {
    pub particle_image_asset_unique_name: UniqueName,
    /// Seconds after the experience starts.
    #[serde(default)]
    pub delay: Option<f64>,
    /// Seconds; absent means emit forever.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub max_age: Option<f64>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub particle_count: Option<u32>,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default, rename = "type")]
    pub shape: Option<ParticleShape>,
    #[serde(default)]
    pub blending_mode: Option<BlendingMode>,
    #[serde(default)]
    pub rotation_axis: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub particle_properties: Vec<ParticleProperty>,
}

impl ParticleElement {
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            particle_image_asset_unique_name: UniqueName::new(texture),
            delay: None,
            duration: None,
            color: None,
            max_age: None,
            opacity: None,
            particle_count: None,
            size: None,
            shape: None,
            blending_mode: None,
            rotation_axis: None,
            particle_properties: Vec::new(),
        }
    }

    pub fn property(&self, property_type: ParticlePropertyType) -> Option<&ParticleProperty> {
        self.particle_properties
            .iter()
            .find(|p| p.property_type == property_type)
    }
}
