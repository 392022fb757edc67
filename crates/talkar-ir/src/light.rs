use serde::{Deserialize, Serialize};

use crate::property::PartialVec3;
use crate::UniqueName;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HemisphereLight {
    /// Hex without `#`.
    #[serde(default)]
    pub ground_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalLight {
    #[serde(default)]
    pub target_unique_name: Option<UniqueName>,
    #[serde(default)]
    pub position: Option<PartialVec3>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointLight {
    #[serde(default)]
    pub position: Option<PartialVec3>,
    #[serde(default)]
    pub decay: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotLight {
    #[serde(default)]
    pub target_unique_name: Option<UniqueName>,
    #[serde(default)]
    pub position: Option<PartialVec3>,
    /// Degrees.
    #[serde(default)]
    pub rotation: Option<PartialVec3>,
    #[serde(default)]
    pub decay: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
    /// Degrees.
    #[serde(default)]
    pub angle: Option<f64>,
    #[serde(default)]
    pub penumbra: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__component")]
pub enum LightKind {
    #[serde(rename = "lights.ambient-light")]
    Ambient,
    #[serde(rename = "lights.hemisphere-light")]
    Hemisphere(HemisphereLight),
    #[serde(rename = "lights.directional-light")]
    Directional(DirectionalLight),
    #[serde(rename = "lights.point-light")]
    Point(PointLight),
    #[serde(rename = "lights.spot-light")]
    Spot(SpotLight),
}

impl LightKind {
    pub fn name(&self) -> &'static str {
        match self {
            LightKind::Ambient => "ambient",
            LightKind::Hemisphere(_) => "hemisphere",
            LightKind::Directional(_) => "directional",
            LightKind::Point(_) => "point",
            LightKind::Spot(_) => "spot",
        }
    }

    pub fn target(&self) -> Option<&UniqueName> {
        match self {
            LightKind::Directional(l) => l.target_unique_name.as_ref(),
            LightKind::Spot(l) => l.target_unique_name.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightDeclaration {
    pub unique_name: UniqueName,
    /// Absent means the root element.
    #[serde(default)]
    pub parent_unique_name: Option<UniqueName>,
    /// Hex without `#`.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub intensity: Option<f64>,
    #[serde(flatten)]
    pub kind: LightKind,
}

impl LightDeclaration {
    pub fn new(unique_name: impl Into<String>, kind: LightKind) -> Self {
        Self {
            unique_name: UniqueName::new(unique_name),
            parent_unique_name: None,
            color: None,
            intensity: None,
            kind,
        }
    }
}
