//! Light initialization.
//!
//! Declared lights become light nodes. A document that declares none gets
//! the default rig: a soft ambient light plus a directional key light
//! aimed at the root.

use serde::{Deserialize, Serialize};
use talkar_core::{Color, Vec3};
use talkar_ir::{
    DirectionalLight, ExperienceDocument, LightDeclaration, LightKind, PartialVec3, UniqueName,
};

use crate::host::{NodeId, SceneHost};

pub const DEFAULT_AMBIENT_NAME: &str = "ambient-light";
pub const DEFAULT_DIRECTIONAL_NAME: &str = "directional-light";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightType {
    Ambient,
    Hemisphere,
    Directional,
    Point,
    Spot,
}

/// A light with every default applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightSpec {
    pub name: String,
    pub light_type: LightType,
    pub color: Color,
    pub intensity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    /// Radians.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penumbra: Option<f64>,
}

/// The rig used when a document declares no lights.
pub fn default_rig(root: &UniqueName) -> Vec<LightDeclaration> {
    let mut ambient = LightDeclaration::new(DEFAULT_AMBIENT_NAME, LightKind::Ambient);
    ambient.parent_unique_name = Some(root.clone());
    ambient.color = Some("BBB".to_string());
    ambient.intensity = Some(1.0);

    let mut directional = LightDeclaration::new(
        DEFAULT_DIRECTIONAL_NAME,
        LightKind::Directional(DirectionalLight {
            target_unique_name: Some(root.clone()),
            position: Some(PartialVec3::new(-0.5, 1.0, 1.0)),
        }),
    );
    directional.parent_unique_name = Some(root.clone());
    directional.color = Some("FFF".to_string());
    directional.intensity = Some(0.6);

    vec![ambient, directional]
}

/// Create every light of `doc` (or the default rig) under its parent.
/// `lookup` maps element names to the nodes already created for them.
pub fn init_lights(
    doc: &ExperienceDocument,
    root: NodeId,
    lookup: impl Fn(&str) -> Option<NodeId>,
    host: &mut dyn SceneHost,
) -> Vec<NodeId> {
    let declarations = if doc.lights.is_empty() {
        tracing::debug!("No lights declared, using the default rig");
        default_rig(doc.root_name())
    } else {
        doc.lights.clone()
    };

    declarations
        .iter()
        .map(|light| {
            let parent = light
                .parent_unique_name
                .as_ref()
                .and_then(|p| lookup(p.as_str()))
                .unwrap_or(root);
            let target = light.kind.target().and_then(|t| lookup(t.as_str()));
            let spec = light_spec(light, target);
            tracing::debug!("Creating {} light '{}'", light.kind.name(), spec.name);
            host.create_light(&spec, parent)
        })
        .collect()
}

/// Apply the shared and kind-specific defaults to a declaration.
pub fn light_spec(light: &LightDeclaration, target: Option<NodeId>) -> LightSpec {
    let mut spec = LightSpec {
        name: light.unique_name.to_string(),
        light_type: LightType::Ambient,
        color: hex_or_white(light.color.as_deref()),
        intensity: light.intensity.unwrap_or(1.0),
        ground_color: None,
        target: None,
        position: None,
        rotation: None,
        decay: None,
        distance: None,
        angle: None,
        penumbra: None,
    };

    let axes = |v: &Option<PartialVec3>| v.map(|p| p.or(Vec3::zero()));

    match &light.kind {
        LightKind::Ambient => {}
        LightKind::Hemisphere(h) => {
            spec.light_type = LightType::Hemisphere;
            spec.ground_color = Some(hex_or_white(h.ground_color.as_deref()));
        }
        LightKind::Directional(d) => {
            spec.light_type = LightType::Directional;
            spec.target = target;
            spec.position = axes(&d.position);
        }
        LightKind::Point(p) => {
            spec.light_type = LightType::Point;
            spec.position = axes(&p.position);
            spec.decay = Some(p.decay.unwrap_or(1.0));
            spec.distance = Some(p.distance.unwrap_or(0.0));
        }
        LightKind::Spot(s) => {
            spec.light_type = LightType::Spot;
            spec.target = target;
            spec.position = axes(&s.position);
            spec.rotation = axes(&s.rotation).map(Vec3::to_radians);
            spec.decay = Some(s.decay.unwrap_or(1.0));
            spec.distance = Some(s.distance.unwrap_or(0.0));
            spec.angle = Some(s.angle.unwrap_or(60.0));
            spec.penumbra = Some(s.penumbra.unwrap_or(0.0));
        }
    }
    spec
}

fn hex_or_white(hex: Option<&str>) -> Color {
    match hex {
        None => Color::WHITE,
        Some(hex) => Color::from_hex(hex).unwrap_or_else(|_| {
            tracing::warn!("Light color '{}' is not a hex color, using white", hex);
            Color::WHITE
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talkar_ir::{HemisphereLight, PointLight, SpotLight};

    #[test]
    fn test_default_rig() {
        let rig = default_rig(&UniqueName::from("root"));
        let ambient = light_spec(&rig[0], None);
        assert_eq!(ambient.light_type, LightType::Ambient);
        assert_eq!(ambient.color.to_rgba8(), [0xbb, 0xbb, 0xbb, 255]);
        assert_eq!(ambient.intensity, 1.0);

        let directional = light_spec(&rig[1], Some(NodeId(1)));
        assert_eq!(directional.light_type, LightType::Directional);
        assert_eq!(directional.color, Color::WHITE);
        assert_eq!(directional.intensity, 0.6);
        assert_eq!(directional.position, Some(Vec3::new(-0.5, 1.0, 1.0)));
        assert_eq!(directional.target, Some(NodeId(1)));
    }

    #[test]
    fn test_shared_defaults() {
        let spec = light_spec(&LightDeclaration::new("a", LightKind::Ambient), None);
        assert_eq!(spec.color, Color::WHITE);
        assert_eq!(spec.intensity, 1.0);
    }

    #[test]
    fn test_hemisphere_ground_defaults_white() {
        let spec = light_spec(
            &LightDeclaration::new("h", LightKind::Hemisphere(HemisphereLight::default())),
            None,
        );
        assert_eq!(spec.ground_color, Some(Color::WHITE));
    }

    #[test]
    fn test_point_and_spot_defaults() {
        let point = light_spec(
            &LightDeclaration::new("p", LightKind::Point(PointLight::default())),
            None,
        );
        assert_eq!(point.decay, Some(1.0));
        assert_eq!(point.distance, Some(0.0));
        assert_eq!(point.position, None);

        let spot = light_spec(
            &LightDeclaration::new(
                "s",
                LightKind::Spot(SpotLight {
                    rotation: Some(PartialVec3 {
                        x: Some(90.0),
                        y: None,
                        z: None,
                    }),
                    ..SpotLight::default()
                }),
            ),
            None,
        );
        assert_eq!(spot.angle, Some(60.0));
        assert_eq!(spot.penumbra, Some(0.0));
        let rotation = spot.rotation.unwrap();
        assert!((rotation.x - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(rotation.y, 0.0);
    }
}
