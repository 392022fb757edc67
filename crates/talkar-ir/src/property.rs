use serde::{Deserialize, Serialize};
use talkar_core::Vec3;

/// The transform or material channel a property or animation drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Position,
    Rotation,
    Scale,
    Color,
    Opacity,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::Position,
        PropertyType::Rotation,
        PropertyType::Scale,
        PropertyType::Color,
        PropertyType::Opacity,
    ];

    /// Value used for any axis the document leaves unset.
    pub fn default_value(&self) -> Vec3 {
        match self {
            PropertyType::Position | PropertyType::Rotation => Vec3::zero(),
            PropertyType::Scale | PropertyType::Opacity => Vec3::splat(1.0),
            PropertyType::Color => Vec3::splat(255.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::Position => "position",
            PropertyType::Rotation => "rotation",
            PropertyType::Scale => "scale",
            PropertyType::Color => "color",
            PropertyType::Opacity => "opacity",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A vector whose axes may each be absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialVec3 {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
}

impl PartialVec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// Fill unset axes from `fallback`.
    pub fn or(&self, fallback: Vec3) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(fallback.x),
            self.y.unwrap_or(fallback.y),
            self.z.unwrap_or(fallback.z),
        )
    }

    pub fn is_complete(&self) -> bool {
        self.x.is_some() && self.y.is_some() && self.z.is_some()
    }
}

impl From<Vec3> for PartialVec3 {
    fn from(v: Vec3) -> Self {
        PartialVec3::new(v.x, v.y, v.z)
    }
}

/// A static value for one channel of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(flatten)]
    pub value: PartialVec3,
}

impl Property {
    pub fn new(property_type: PropertyType, x: f64, y: f64, z: f64) -> Self {
        Self {
            property_type,
            value: PartialVec3::new(x, y, z),
        }
    }

    /// The property's value with unset axes taken from the type default.
    pub fn resolved(&self) -> Vec3 {
        self.value.or(self.property_type.default_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_type() {
        assert_eq!(PropertyType::Position.default_value(), Vec3::zero());
        assert_eq!(PropertyType::Rotation.default_value(), Vec3::zero());
        assert_eq!(PropertyType::Scale.default_value(), Vec3::splat(1.0));
        assert_eq!(PropertyType::Color.default_value(), Vec3::splat(255.0));
        assert_eq!(PropertyType::Opacity.default_value().x, 1.0);
    }

    #[test]
    fn test_property_with_null_axes() {
        let p: Property =
            serde_json::from_str(r#"{"type":"scale","x":2,"y":null}"#).unwrap();
        assert_eq!(p.property_type, PropertyType::Scale);
        assert_eq!(p.resolved(), Vec3::new(2.0, 1.0, 1.0));
        assert!(!p.value.is_complete());
    }

    #[test]
    fn test_unknown_property_type_rejected() {
        assert!(serde_json::from_str::<Property>(r#"{"type":"skew","x":1}"#).is_err());
    }
}
