//! Element materialization.
//!
//! Turns validated element declarations into host nodes, in dependency
//! order, and collects everything the start sequence needs: animation
//! timelines, videos to play, audio to cue and emitters to switch on.

use std::collections::HashMap;

use talkar_core::{Color, Duration, TalkarError, Vec3};
use talkar_ir::{
    Anchor, Animation, AudioElement, AudioTrigger, ElementDeclaration, ElementKind, EndTrigger,
    ExperienceDocument, MaterializationPlan, ModelAnimation, PropertyType, UniqueName,
};

use crate::host::{AssetRef, Behaviour, ClipPlayback, NodeId, Primitive, SceneHost, Tween};
use crate::loader::AssetTable;
use crate::media::AssetHandle;
use crate::particles::{emission_delay, resolve_particles};
use crate::resolver::{
    end_values, resolve_property, start_values, to_tween_value, MaterialTarget,
};
use crate::sequencer::{
    AudioCue, ClipChain, ClipStep, ScheduledTween, Sequencer, Timeline,
};

/// Key color removed from green-screen videos.
pub const CHROMA_KEY: Color = Color {
    r: 0.1,
    g: 0.9,
    b: 0.2,
    a: 1.0,
};

/// A materialized element.
#[derive(Debug, Clone)]
pub struct RenderNode {
    /// The declaration with every resolved property back-filled.
    pub declaration: ElementDeclaration,
    /// `None` for audio elements, which have no visual node.
    pub node: Option<NodeId>,
    /// Textured child of image and video elements.
    pub child: Option<NodeId>,
    pub asset: Option<AssetRef>,
}

/// A video element waiting for the start sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoCue {
    pub node: NodeId,
    pub asset: AssetRef,
    pub delay: Duration,
}

/// A particle emitter waiting for the start sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterCue {
    pub node: NodeId,
    pub delay: Duration,
}

#[derive(Debug, Default)]
pub struct Materialized {
    pub nodes: HashMap<UniqueName, RenderNode>,
    /// Element names in the order they were materialized.
    pub order: Vec<UniqueName>,
    /// Elements materialized so far, the root included.
    pub count: usize,
    pub sequencer: Sequencer,
    pub videos: Vec<VideoCue>,
    /// Audio played a fixed time after the start.
    pub timed_audio: Vec<AudioCue>,
    pub emitters: Vec<EmitterCue>,
}

impl Materialized {
    pub fn node_of(&self, name: &str) -> Option<NodeId> {
        self.nodes.get(name).and_then(|n| n.node)
    }
}

/// Materialize every element of `doc` in `plan` order under `root`.
///
/// The plan puts audio elements first so animation-linked audio is known
/// before any timeline is built, and orders the rest parents-first.
pub fn materialize(
    doc: &ExperienceDocument,
    plan: &MaterializationPlan,
    assets: &AssetTable,
    root: NodeId,
    host: &mut dyn SceneHost,
) -> Materialized {
    let mut out = Materialized {
        count: 1,
        ..Default::default()
    };

    for index in plan.iter() {
        let Some(declaration) = doc.elements.get(index) else {
            continue;
        };
        let mut element = declaration.clone();
        let asset = element
            .kind
            .asset_ref()
            .and_then(|(name, _)| assets.get(name.as_str()))
            .map(|a| a.asset_ref());

        let render = if let ElementKind::Audio(audio) = &element.kind {
            register_audio(&element, audio, asset.as_ref(), &mut out);
            RenderNode {
                declaration: element,
                node: None,
                child: None,
                asset,
            }
        } else {
            let parent = match &element.parent_unique_name {
                Some(p) if p != doc.root_name() => out.node_of(p.as_str()).unwrap_or_else(|| {
                    tracing::warn!(
                        "Parent '{}' of '{}' has no node, attaching to the root",
                        p,
                        element.unique_name
                    );
                    root
                }),
                _ => root,
            };
            build_visual(&mut element, parent, asset.clone(), assets, host, &mut out)
        };

        tracing::debug!(
            "Materialized {} element '{}'",
            render.declaration.kind.name(),
            render.declaration.unique_name
        );
        out.order.push(render.declaration.unique_name.clone());
        out.nodes
            .insert(render.declaration.unique_name.clone(), render);
        out.count += 1;
    }

    out
}

fn register_audio(
    element: &ElementDeclaration,
    audio: &AudioElement,
    asset: Option<&AssetRef>,
    out: &mut Materialized,
) {
    let Some(asset) = asset else {
        return;
    };
    let cue = AudioCue {
        asset: asset.clone(),
        delay: Duration::from_seconds(audio.delay.unwrap_or(0.0)),
    };
    match audio.trigger {
        None => tracing::debug!(
            "Audio '{}' has no trigger, it will not play",
            element.unique_name
        ),
        Some(AudioTrigger::StartAfterTime) => out.timed_audio.push(cue),
        Some(AudioTrigger::StartWithAnimation) => match &audio.animation_unique_name {
            Some(animation) => out.sequencer.link_audio(animation.clone(), cue),
            None => tracing::warn!(
                "Audio '{}' starts with an animation but names none, it will not play",
                element.unique_name
            ),
        },
    }
}

fn build_visual(
    element: &mut ElementDeclaration,
    parent: NodeId,
    asset: Option<AssetRef>,
    assets: &AssetTable,
    host: &mut dyn SceneHost,
    out: &mut Materialized,
) -> RenderNode {
    let name = element.unique_name.to_string();
    let mut child = None;
    let mut target = MaterialTarget::Node;
    let circle = matches!(
        element.kind,
        ElementKind::ImageCircle(_) | ElementKind::VideoCircle(_)
    );

    let node = match &mut element.kind {
        ElementKind::Container => host.create_node(&name, Primitive::Entity, Some(parent)),
        ElementKind::Plane => host.create_node(&name, Primitive::Plane, Some(parent)),
        ElementKind::Circle => host.create_node(&name, Primitive::Circle, Some(parent)),
        ElementKind::Cube => host.create_node(&name, Primitive::Cube, Some(parent)),
        ElementKind::Sphere => host.create_node(&name, Primitive::Sphere, Some(parent)),
        ElementKind::Image(image) | ElementKind::ImageCircle(image) => {
            let shape = if circle {
                Primitive::Circle
            } else {
                Primitive::Plane
            };
            let node = host.create_node(&name, Primitive::Entity, Some(parent));
            let inner = host.create_node(&format!("{}__child", name), shape, Some(node));
            if let Some(asset) = &asset {
                host.set_texture(inner, asset);
            }
            if image.transparent.unwrap_or(false) {
                host.set_transparent(inner, true);
            }
            let anchor = image.anchor.unwrap_or_default();
            apply_anchor(host, inner, anchor, resolution(assets, asset.as_ref()), &name);
            child = Some(inner);
            target = MaterialTarget::Child;
            node
        }
        ElementKind::Video(video) | ElementKind::VideoCircle(video) => {
            let shape = if circle {
                Primitive::Circle
            } else {
                Primitive::Video
            };
            let node = host.create_node(&name, Primitive::Entity, Some(parent));
            let inner = host.create_node(&format!("{}__child", name), shape, Some(node));
            if let Some(asset) = &asset {
                if video.green_screen.unwrap_or(false) {
                    host.set_chroma_key(inner, asset, CHROMA_KEY);
                } else {
                    host.set_texture(inner, asset);
                }
                out.videos.push(VideoCue {
                    node,
                    asset: asset.clone(),
                    delay: Duration::from_seconds(video.delay.unwrap_or(0.0)),
                });
            }
            if !circle {
                host.set_visible(node, false);
            }
            let anchor = video.anchor.unwrap_or_default();
            apply_anchor(host, inner, anchor, resolution(assets, asset.as_ref()), &name);
            child = Some(inner);
            target = MaterialTarget::Child;
            node
        }
        ElementKind::Model(model) | ElementKind::AnimatableModel(model) => {
            let node = host.create_node(&name, Primitive::Entity, Some(parent));
            if let Some(asset) = &asset {
                host.attach_model(node, asset);
            }
            if let Some(reflectivity) = model.reflection {
                host.add_behaviour(node, Behaviour::EnvironmentMap { reflectivity });
            }
            target = MaterialTarget::Model;
            node
        }
        ElementKind::Particle(particle) => {
            let node = host.create_node(&name, Primitive::Entity, Some(parent));
            let texture = asset.as_ref().map(|a| a.url.as_str()).unwrap_or_default();
            let config = resolve_particles(particle, texture);
            host.add_behaviour(node, Behaviour::ParticleSystem(config));
            out.emitters.push(EmitterCue {
                node,
                delay: emission_delay(particle),
            });
            node
        }
        // Audio elements never reach here.
        ElementKind::Audio(_) => host.create_node(&name, Primitive::Entity, Some(parent)),
    };

    if element.follows_camera() {
        host.add_behaviour(node, Behaviour::FollowCamera);
    }

    apply_properties(element, node, child, target, host);

    let mut timeline = Timeline::new(element.unique_name.clone());
    timeline.start = start_tweens(element, node, child, target);
    timeline.end = end_tweens(element, node, child, target);
    if let ElementKind::AnimatableModel(model) = &element.kind {
        if !model.model_animations.is_empty() {
            timeline.clips = Some(ClipChain::unbound(
                node,
                asset.as_ref().map(|a| a.name.clone()),
                model.model_animations.clone(),
            ));
        }
    }
    out.sequencer.add_timeline(timeline);

    RenderNode {
        declaration: element.clone(),
        node: Some(node),
        child,
        asset,
    }
}

fn resolution(assets: &AssetTable, asset: Option<&AssetRef>) -> Option<(f64, f64)> {
    asset
        .and_then(|a| assets.get(a.name.as_str()))
        .and_then(|a| a.resolution())
}

/// Size `child` to one unit wide at the asset's aspect ratio and shift it
/// so `anchor` sits on the parent's origin.
pub fn apply_anchor(
    host: &mut dyn SceneHost,
    child: NodeId,
    anchor: Anchor,
    resolution: Option<(f64, f64)>,
    element: &str,
) {
    let Some((width, height)) = resolution else {
        tracing::warn!("No resolution known for '{}', leaving its size as is", element);
        return;
    };
    let (width, height, offset) = anchor_geometry(anchor, width, height);
    host.set_size(child, width, height);
    if offset != Vec3::zero() {
        host.translate(child, offset);
    }
}

/// Rendered size and local offset for an anchored child of the given
/// pixel resolution.
pub fn anchor_geometry(anchor: Anchor, pixel_width: f64, pixel_height: f64) -> (f64, f64, Vec3) {
    let height = pixel_height / pixel_width;
    let (fx, fy) = anchor.offset_factors();
    (1.0, height, Vec3::new(fx * 0.5, fy * height / 2.0, 0.0))
}

fn material_node(node: NodeId, child: Option<NodeId>, target: MaterialTarget) -> NodeId {
    match (target, child) {
        (MaterialTarget::Child, Some(child)) => child,
        _ => node,
    }
}

fn tween_node(
    property_type: PropertyType,
    node: NodeId,
    child: Option<NodeId>,
    target: MaterialTarget,
) -> NodeId {
    match property_type {
        PropertyType::Color | PropertyType::Opacity => material_node(node, child, target),
        _ => node,
    }
}

fn apply_properties(
    element: &mut ElementDeclaration,
    node: NodeId,
    child: Option<NodeId>,
    target: MaterialTarget,
    host: &mut dyn SceneHost,
) {
    for property_type in PropertyType::ALL {
        let value = resolve_property(element, property_type);
        match property_type {
            PropertyType::Position => host.set_position(node, value),
            PropertyType::Rotation => host.set_rotation(node, value.to_radians()),
            PropertyType::Scale => host.set_scale(node, value),
            PropertyType::Color => host.set_material_color(
                material_node(node, child, target),
                Color::from_rgb255(value.x, value.y, value.z),
            ),
            PropertyType::Opacity => match target {
                MaterialTarget::Model => host.set_model_opacity(node, value.x),
                _ => host.set_material_opacity(material_node(node, child, target), value.x),
            },
        }
    }
}

fn tween_for(
    animation: &Animation,
    suffix: &str,
    (from, to): (Vec3, Vec3),
    target: MaterialTarget,
    element: &UniqueName,
) -> Tween {
    let property_type = animation.property_type;
    let easing = match animation.easing.as_deref() {
        None | Some("") => Default::default(),
        Some(name) => talkar_core::Easing::from_name(name).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown easing '{}' on '{}', falling back to linear",
                name,
                element
            );
            Default::default()
        }),
    };
    Tween {
        name: format!("animation__{}_{}", property_type.name(), suffix),
        channel: target.channel(property_type),
        from: to_tween_value(property_type, from),
        to: to_tween_value(property_type, to),
        duration: animation.duration(),
        easing,
    }
}

fn start_tweens(
    element: &mut ElementDeclaration,
    node: NodeId,
    child: Option<NodeId>,
    target: MaterialTarget,
) -> Vec<ScheduledTween> {
    let animations = element.start_animations.clone();
    animations
        .iter()
        .map(|animation| {
            let values = start_values(element, animation);
            ScheduledTween {
                node: tween_node(animation.property_type, node, child, target),
                tween: tween_for(animation, "start", values, target, &element.unique_name),
                delay: animation.delay(),
                animation: animation.unique_name.clone(),
                video: None,
                fired: false,
            }
        })
        .collect()
}

fn end_tweens(
    element: &mut ElementDeclaration,
    node: NodeId,
    child: Option<NodeId>,
    target: MaterialTarget,
) -> Vec<ScheduledTween> {
    let animations = element.end_animations.clone();
    animations
        .iter()
        .filter_map(|animation| {
            let (suffix, video) = match animation.trigger {
                Some(EndTrigger::Time) => ("time_end", None),
                Some(EndTrigger::Video) => ("video_end", animation.video_asset_unique_name.clone()),
                None => {
                    tracing::warn!(
                        "End animation on '{}' for {} has no trigger, skipping it",
                        element.unique_name,
                        animation.property_type
                    );
                    return None;
                }
            };
            let values = end_values(element, animation);
            Some(ScheduledTween {
                node: tween_node(animation.property_type, node, child, target),
                tween: tween_for(animation, suffix, values, target, &element.unique_name),
                delay: animation.delay(),
                animation: animation.unique_name.clone(),
                video,
                fired: false,
            })
        })
        .collect()
}

/// Resolve every unbound clip chain against the clips its model actually
/// has. Out-of-range clip numbers are reported to the author and skipped.
pub fn bind_clip_chains(sequencer: &mut Sequencer, assets: &AssetTable, host: &mut dyn SceneHost) {
    for timeline in sequencer.timelines_mut() {
        let element = timeline.element.clone();
        let Some(chain) = timeline.clips.as_mut().filter(|c| !c.is_bound()) else {
            continue;
        };
        let handle = chain
            .model
            .as_ref()
            .and_then(|m| assets.get(m.as_str()))
            .and_then(|a| a.handle.as_ref());
        let pending = std::mem::take(&mut chain.pending);
        chain.steps = clip_steps(&element, &pending, handle, host);
    }
}

fn clip_steps(
    element: &UniqueName,
    animations: &[ModelAnimation],
    handle: Option<&AssetHandle>,
    host: &mut dyn SceneHost,
) -> Vec<ClipStep> {
    animations
        .iter()
        .map(|animation| {
            let index = animation.clip_number();
            let playback = match handle {
                Some(handle) => match handle.clips().get(index) {
                    Some(clip) => Some(ClipPlayback {
                        clip: clip.clone(),
                        index,
                        loop_type: animation.loop_type(),
                        clamp_when_finished: animation.clamp_when_finished(),
                        repetitions: animation.repetitions,
                        time_scale: animation.time_scale(),
                        cross_fade_duration: animation.cross_fade_duration(),
                    }),
                    None => {
                        let err = TalkarError::Authoring(format!(
                            "Animation clip {} does not exist on model element '{}' ({} clips available)",
                            index,
                            element,
                            handle.clips().len()
                        ));
                        tracing::error!("{}", err);
                        host.report_authoring_error(&err.to_string());
                        None
                    }
                },
                None => {
                    tracing::warn!("Model for '{}' did not load, skipping clip {}", element, index);
                    None
                }
            };
            ClipStep {
                playback,
                delay: animation.delay(),
                duration: animation.duration(),
            }
        })
        .collect()
}

/// Re-apply anchors of elements showing `asset` once its pixel size is
/// known. Only elements whose asset declares no resolution are touched;
/// the others were sized when they were materialized.
pub fn refresh_anchors(
    materialized: &Materialized,
    asset: &str,
    assets: &AssetTable,
    host: &mut dyn SceneHost,
) {
    let Some(loaded) = assets.get(asset) else {
        return;
    };
    if loaded.declaration.resolution().is_some() {
        return;
    }
    for name in &materialized.order {
        let Some(render) = materialized.nodes.get(name) else {
            continue;
        };
        let shows_asset = render.asset.as_ref().map(|a| a.name.as_str()) == Some(asset);
        if let (true, Some(child)) = (shows_asset, render.child) {
            let anchor = render.declaration.kind.anchor().unwrap_or_default();
            apply_anchor(host, child, anchor, loaded.resolution(), name.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_top_right() {
        let (w, h, offset) = anchor_geometry(Anchor::TopRight, 200.0, 100.0);
        assert_eq!(w, 1.0);
        assert_eq!(h, 0.5);
        assert_eq!(offset, Vec3::new(-0.5, -0.25, 0.0));
    }

    #[test]
    fn test_anchor_center_has_no_offset() {
        let (w, h, offset) = anchor_geometry(Anchor::Center, 100.0, 300.0);
        assert_eq!((w, h), (1.0, 3.0));
        assert_eq!(offset, Vec3::zero());
    }

    #[test]
    fn test_anchor_bottom_left() {
        let (_, _, offset) = anchor_geometry(Anchor::BottomLeft, 400.0, 200.0);
        assert_eq!(offset, Vec3::new(0.5, 0.25, 0.0));
    }

    #[test]
    fn test_material_node_prefers_child() {
        assert_eq!(
            material_node(NodeId(1), Some(NodeId(2)), MaterialTarget::Child),
            NodeId(2)
        );
        assert_eq!(material_node(NodeId(1), None, MaterialTarget::Child), NodeId(1));
        assert_eq!(
            material_node(NodeId(1), Some(NodeId(2)), MaterialTarget::Model),
            NodeId(1)
        );
    }
}
