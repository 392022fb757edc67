//! The capability boundary between the interpreter and a scene engine.
//!
//! The interpreter never renders anything itself. It asks a [`SceneHost`] to
//! create nodes and set attributes, and it is told about the outside world
//! through [`HostEvent`]s.

use serde::{Deserialize, Serialize};
use talkar_core::{Color, Duration, Easing, Vec3};
use talkar_ir::{AssetKind, LoopType, UniqueName};

use crate::lights::LightSpec;
use crate::media::AssetHandle;
use crate::particles::ParticleConfig;

/// Opaque handle to a node created by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Geometry a node is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Primitive {
    /// An empty transform node.
    Entity,
    Plane,
    Circle,
    /// A plane whose material plays a video.
    Video,
    Cube,
    Sphere,
    Light,
}

/// A resolved reference to a declared asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    pub name: UniqueName,
    pub kind: AssetKind,
    pub url: String,
}

/// Behaviours attached to nodes beyond plain attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Behaviour {
    /// Keep the node turned toward the camera around its vertical axis.
    FollowCamera,
    /// Reflective cube environment map.
    EnvironmentMap { reflectivity: f64 },
    /// A particle emitter, created disabled.
    ParticleSystem(ParticleConfig),
}

/// The attribute a tween drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Position,
    /// Radians.
    Rotation,
    Scale,
    MaterialColor,
    MaterialOpacity,
    /// Opacity applied to every mesh of a model.
    ModelOpacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TweenValue {
    Vector(Vec3),
    Color(Color),
    Scalar(f64),
}

/// A property tween that starts playing as soon as the host receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    /// e.g. `animation__scale_start`.
    pub name: String,
    pub channel: Channel,
    pub from: TweenValue,
    pub to: TweenValue,
    pub duration: Duration,
    pub easing: Easing,
}

/// Settings for playing one clip of an animated model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipPlayback {
    pub clip: String,
    pub index: usize,
    pub loop_type: LoopType,
    pub clamp_when_finished: bool,
    /// `None` repeats forever.
    pub repetitions: Option<u32>,
    pub time_scale: f64,
    pub cross_fade_duration: Duration,
}

/// Styling for the call-to-action button.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ButtonStyle {
    pub text: Option<String>,
    pub text_color: Option<Color>,
    /// Used for both the background and the border.
    pub button_color: Option<Color>,
    pub url: Option<String>,
}

/// Everything the interpreter asks of a scene engine.
///
/// Rotations are always radians at this boundary.
pub trait SceneHost {
    /// Create a node under `parent`, or at the scene root when `None`.
    fn create_node(&mut self, name: &str, primitive: Primitive, parent: Option<NodeId>) -> NodeId;

    fn set_position(&mut self, node: NodeId, position: Vec3);
    fn set_rotation(&mut self, node: NodeId, radians: Vec3);
    fn set_scale(&mut self, node: NodeId, scale: Vec3);
    fn set_visible(&mut self, node: NodeId, visible: bool);

    fn set_material_color(&mut self, node: NodeId, color: Color);
    fn set_material_opacity(&mut self, node: NodeId, opacity: f64);
    fn set_model_opacity(&mut self, node: NodeId, opacity: f64);
    /// Unlit textured material.
    fn set_texture(&mut self, node: NodeId, asset: &AssetRef);
    fn set_transparent(&mut self, node: NodeId, transparent: bool);
    /// Video material that keys out `key`.
    fn set_chroma_key(&mut self, node: NodeId, asset: &AssetRef, key: Color);

    /// Rendered width and height of a plane-like node.
    fn set_size(&mut self, node: NodeId, width: f64, height: f64);
    /// Move a node along its local axes.
    fn translate(&mut self, node: NodeId, offset: Vec3);

    fn attach_model(&mut self, node: NodeId, asset: &AssetRef);
    fn add_behaviour(&mut self, node: NodeId, behaviour: Behaviour);

    fn play_tween(&mut self, node: NodeId, tween: &Tween);
    fn play_model_clip(&mut self, node: NodeId, clip: &ClipPlayback);
    fn start_particles(&mut self, node: NodeId);

    /// Unlock playback of a media asset from inside a user gesture.
    fn prime_media(&mut self, asset: &AssetRef);
    /// Restart a media asset from the beginning.
    fn play_media(&mut self, asset: &AssetRef);

    fn create_light(&mut self, light: &LightSpec, parent: NodeId) -> NodeId;

    fn create_loading_indicator(&mut self) -> NodeId;
    fn set_loading_text(&mut self, node: NodeId, text: &str);
    fn hide_tap_prompt(&mut self);

    fn style_button(&mut self, style: &ButtonStyle);
    fn show_button(&mut self);

    /// Tell the experience author that the document is wrong.
    fn report_authoring_error(&mut self, message: &str);
}

/// Something that happened outside the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The AR session is tracking.
    RealityReady,
    /// The user tapped the ground at a world-space point.
    Tap { point: Vec3 },
    AssetLoaded { asset: UniqueName, handle: AssetHandle },
    AssetFailed { asset: UniqueName, error: String },
    /// A video or audio asset finished playing.
    MediaEnded { asset: UniqueName },
    /// The clip playing on a model node finished on its own.
    ModelClipFinished { node: NodeId },
}
