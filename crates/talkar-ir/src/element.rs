use serde::{Deserialize, Serialize};

use crate::animation::{Animation, ModelAnimation};
use crate::asset::AssetKind;
use crate::de::nullable_vec;
use crate::particle::ParticleElement;
use crate::property::{Property, PropertyType};
use crate::UniqueName;

/// Where the textured child of an image or video element sits relative to
/// the element's own origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
    #[default]
    Center,
    BottomLeft,
    BottomCenter,
    BottomRight,
    MiddleLeft,
    MiddleRight,
    TopLeft,
    TopCenter,
    TopRight,
}

impl Anchor {
    /// Translation of the child, in units of (half width, half height).
    pub fn offset_factors(&self) -> (f64, f64) {
        match self {
            Anchor::Center => (0.0, 0.0),
            Anchor::BottomLeft => (1.0, 1.0),
            Anchor::BottomCenter => (0.0, 1.0),
            Anchor::BottomRight => (-1.0, 1.0),
            Anchor::MiddleLeft => (1.0, 0.0),
            Anchor::MiddleRight => (-1.0, 0.0),
            Anchor::TopLeft => (1.0, -1.0),
            Anchor::TopCenter => (0.0, -1.0),
            Anchor::TopRight => (-1.0, -1.0),
        }
    }
}

/// When an audio element starts playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioTrigger {
    /// `delay` seconds after the experience starts.
    StartAfterTime,
    /// `delay` seconds after the animation named `animationUniqueName` begins.
    StartWithAnimation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    pub image_asset_unique_name: UniqueName,
    #[serde(default)]
    pub anchor: Option<Anchor>,
    #[serde(default)]
    pub transparent: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoElement {
    pub video_asset_unique_name: UniqueName,
    #[serde(default)]
    pub anchor: Option<Anchor>,
    #[serde(default)]
    pub green_screen: Option<bool>,
    /// Seconds after the experience starts before playback.
    #[serde(default)]
    pub delay: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioElement {
    pub audio_asset_unique_name: UniqueName,
    #[serde(default)]
    pub trigger: Option<AudioTrigger>,
    /// Seconds.
    #[serde(default)]
    pub delay: Option<f64>,
    #[serde(default)]
    pub animation_unique_name: Option<UniqueName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelElement {
    pub model_asset_unique_name: UniqueName,
    /// Environment-map reflectivity.
    #[serde(default)]
    pub reflection: Option<f64>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub model_animations: Vec<ModelAnimation>,
}

/// Closed set of element kinds, keyed by the document's `__component` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__component")]
pub enum ElementKind {
    #[serde(rename = "elements.container-element")]
    Container,
    #[serde(rename = "elements.image-element")]
    Image(ImageElement),
    #[serde(rename = "elements.image-circle-element")]
    ImageCircle(ImageElement),
    #[serde(rename = "elements.video-element")]
    Video(VideoElement),
    #[serde(rename = "elements.video-circle-element")]
    VideoCircle(VideoElement),
    #[serde(rename = "elements.audio-element")]
    Audio(AudioElement),
    #[serde(rename = "elements.model-element")]
    Model(ModelElement),
    #[serde(rename = "elements.model-animatable-element")]
    AnimatableModel(ModelElement),
    #[serde(rename = "elements.particle-element")]
    Particle(ParticleElement),
    #[serde(rename = "elements.plane-element")]
    Plane,
    #[serde(rename = "elements.circle-element")]
    Circle,
    #[serde(rename = "elements.cube-element")]
    Cube,
    #[serde(rename = "elements.sphere-element")]
    Sphere,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Container => "container",
            ElementKind::Image(_) => "image",
            ElementKind::ImageCircle(_) => "image-circle",
            ElementKind::Video(_) => "video",
            ElementKind::VideoCircle(_) => "video-circle",
            ElementKind::Audio(_) => "audio",
            ElementKind::Model(_) => "model",
            ElementKind::AnimatableModel(_) => "animatable-model",
            ElementKind::Particle(_) => "particle",
            ElementKind::Plane => "plane",
            ElementKind::Circle => "circle",
            ElementKind::Cube => "cube",
            ElementKind::Sphere => "sphere",
        }
    }

    /// The asset this element renders, with the kind it must have.
    pub fn asset_ref(&self) -> Option<(&UniqueName, AssetKind)> {
        match self {
            ElementKind::Image(e) | ElementKind::ImageCircle(e) => {
                Some((&e.image_asset_unique_name, AssetKind::Image))
            }
            ElementKind::Video(e) | ElementKind::VideoCircle(e) => {
                Some((&e.video_asset_unique_name, AssetKind::Video))
            }
            ElementKind::Audio(e) => Some((&e.audio_asset_unique_name, AssetKind::Audio)),
            ElementKind::Model(e) | ElementKind::AnimatableModel(e) => {
                Some((&e.model_asset_unique_name, AssetKind::Model))
            }
            ElementKind::Particle(e) => {
                Some((&e.particle_image_asset_unique_name, AssetKind::Image))
            }
            _ => None,
        }
    }

    /// Image and video kinds render through a nested child node.
    pub fn has_child_node(&self) -> bool {
        matches!(
            self,
            ElementKind::Image(_)
                | ElementKind::ImageCircle(_)
                | ElementKind::Video(_)
                | ElementKind::VideoCircle(_)
        )
    }

    pub fn is_model(&self) -> bool {
        matches!(self, ElementKind::Model(_) | ElementKind::AnimatableModel(_))
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, ElementKind::Audio(_))
    }

    pub fn anchor(&self) -> Option<Anchor> {
        match self {
            ElementKind::Image(e) | ElementKind::ImageCircle(e) => e.anchor,
            ElementKind::Video(e) | ElementKind::VideoCircle(e) => e.anchor,
            _ => None,
        }
    }
}

/// One node of the experience's scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDeclaration {
    pub unique_name: UniqueName,
    /// Absent means the root element.
    #[serde(default)]
    pub parent_unique_name: Option<UniqueName>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub properties: Vec<Property>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub start_animations: Vec<Animation>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub end_animations: Vec<Animation>,
    #[serde(default)]
    pub follow_camera: Option<bool>,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl ElementDeclaration {
    pub fn new(unique_name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            unique_name: UniqueName::new(unique_name),
            parent_unique_name: None,
            properties: Vec::new(),
            start_animations: Vec::new(),
            end_animations: Vec::new(),
            follow_camera: None,
            kind,
        }
    }

    pub fn property(&self, property_type: PropertyType) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.property_type == property_type)
    }

    pub fn start_animation(&self, property_type: PropertyType) -> Option<&Animation> {
        self.start_animations
            .iter()
            .find(|a| a.property_type == property_type)
    }

    pub fn follows_camera(&self) -> bool {
        self.follow_camera.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_element_from_json() {
        let json = r#"{
            "uniqueName": "poster",
            "__component": "elements.image-element",
            "parentUniqueName": "root",
            "imageAssetUniqueName": "poster-img",
            "anchor": "topRight",
            "transparent": null,
            "properties": [{"type": "position", "x": 1, "y": 0, "z": null}],
            "startAnimations": null,
            "endAnimations": []
        }"#;
        let e: ElementDeclaration = serde_json::from_str(json).unwrap();
        assert_eq!(e.unique_name.as_str(), "poster");
        assert_eq!(e.parent_unique_name, Some(UniqueName::from("root")));
        assert!(e.start_animations.is_empty());
        assert_eq!(e.kind.anchor(), Some(Anchor::TopRight));
        assert!(e.kind.has_child_node());
        let (asset, kind) = e.kind.asset_ref().unwrap();
        assert_eq!(asset.as_str(), "poster-img");
        assert_eq!(kind, AssetKind::Image);
        assert!(e.property(PropertyType::Position).is_some());
    }

    #[test]
    fn test_primitive_and_audio_elements() {
        let cube: ElementDeclaration = serde_json::from_str(
            r#"{"uniqueName":"box","__component":"elements.cube-element","followCamera":true}"#,
        )
        .unwrap();
        assert_eq!(cube.kind, ElementKind::Cube);
        assert!(cube.follows_camera());

        let audio: ElementDeclaration = serde_json::from_str(
            r#"{
                "uniqueName": "voice",
                "__component": "elements.audio-element",
                "audioAssetUniqueName": "voice-mp3",
                "trigger": "startWithAnimation",
                "animationUniqueName": "fade-in",
                "delay": 0.5
            }"#,
        )
        .unwrap();
        assert!(audio.kind.is_audio());
        match audio.kind {
            ElementKind::Audio(a) => {
                assert_eq!(a.trigger, Some(AudioTrigger::StartWithAnimation));
                assert_eq!(a.delay, Some(0.5));
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_unknown_component_rejected() {
        let json = r#"{"uniqueName":"t","__component":"elements.text-element"}"#;
        assert!(serde_json::from_str::<ElementDeclaration>(json).is_err());
    }

    #[test]
    fn test_anchor_factors() {
        assert_eq!(Anchor::Center.offset_factors(), (0.0, 0.0));
        assert_eq!(Anchor::TopRight.offset_factors(), (-1.0, -1.0));
        assert_eq!(Anchor::BottomLeft.offset_factors(), (1.0, 1.0));
    }
}
