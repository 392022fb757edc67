//! An in-memory scene host.
//!
//! Records every request the interpreter makes as a serialisable scene
//! graph. Tweens and clips are logged on their nodes rather than
//! interpolated, which is enough to inspect what an experience does.

use std::collections::BTreeMap;

use serde::Serialize;
use talkar_core::{Color, Vec3};
use talkar_ir::UniqueName;

use crate::host::{
    AssetRef, Behaviour, ButtonStyle, ClipPlayback, NodeId, Primitive, SceneHost, Tween,
};
use crate::lights::LightSpec;

pub const LOADING_NODE_NAME: &str = "loading";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlessNode {
    pub id: NodeId,
    pub name: String,
    pub primitive: Primitive,
    pub parent: Option<NodeId>,
    pub position: Vec3,
    /// Radians.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_opacity: Option<f64>,
    /// Name of the asset shown on the node's material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture: Option<UniqueName>,
    pub transparent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chroma_key: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<(f64, f64)>,
    /// Accumulated local translation.
    pub offset: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<UniqueName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub behaviours: Vec<Behaviour>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tweens: Vec<Tween>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clips: Vec<ClipPlayback>,
    pub particles_started: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light: Option<LightSpec>,
}

impl HeadlessNode {
    fn new(id: NodeId, name: &str, primitive: Primitive, parent: Option<NodeId>) -> Self {
        Self {
            id,
            name: name.to_string(),
            primitive,
            parent,
            position: Vec3::zero(),
            rotation: Vec3::zero(),
            scale: Vec3::splat(1.0),
            visible: true,
            color: None,
            opacity: None,
            model_opacity: None,
            texture: None,
            transparent: false,
            chroma_key: None,
            size: None,
            offset: Vec3::zero(),
            model: None,
            behaviours: Vec::new(),
            tweens: Vec::new(),
            clips: Vec::new(),
            particles_started: false,
            light: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlessHost {
    nodes: BTreeMap<NodeId, HeadlessNode>,
    #[serde(skip)]
    next_id: u64,
    pub primed_media: Vec<UniqueName>,
    pub played_media: Vec<UniqueName>,
    pub button: Option<ButtonStyle>,
    pub button_visible: bool,
    pub tap_prompt_visible: bool,
    pub loading_text: Option<String>,
    pub authoring_errors: Vec<String>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
            primed_media: Vec::new(),
            played_media: Vec::new(),
            button: None,
            button_visible: false,
            tap_prompt_visible: true,
            loading_text: None,
            authoring_errors: Vec::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&HeadlessNode> {
        self.nodes.get(&id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&HeadlessNode> {
        self.nodes.values().find(|n| n.name == name)
    }

    pub fn children_of(&self, parent: NodeId) -> impl Iterator<Item = &HeadlessNode> {
        self.nodes
            .values()
            .filter(move |n| n.parent == Some(parent))
    }

    pub fn lights(&self) -> impl Iterator<Item = &LightSpec> {
        self.nodes.values().filter_map(|n| n.light.as_ref())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &HeadlessNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, name: &str, primitive: Primitive, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes
            .insert(id, HeadlessNode::new(id, name, primitive, parent));
        id
    }

    fn with_node(&mut self, id: NodeId, f: impl FnOnce(&mut HeadlessNode)) {
        match self.nodes.get_mut(&id) {
            Some(node) => f(node),
            None => tracing::warn!("Headless host has no node {}", id),
        }
    }
}

impl SceneHost for HeadlessHost {
    fn create_node(&mut self, name: &str, primitive: Primitive, parent: Option<NodeId>) -> NodeId {
        self.insert(name, primitive, parent)
    }

    fn set_position(&mut self, node: NodeId, position: Vec3) {
        self.with_node(node, |n| n.position = position);
    }

    fn set_rotation(&mut self, node: NodeId, radians: Vec3) {
        self.with_node(node, |n| n.rotation = radians);
    }

    fn set_scale(&mut self, node: NodeId, scale: Vec3) {
        self.with_node(node, |n| n.scale = scale);
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        self.with_node(node, |n| n.visible = visible);
    }

    fn set_material_color(&mut self, node: NodeId, color: Color) {
        self.with_node(node, |n| n.color = Some(color));
    }

    fn set_material_opacity(&mut self, node: NodeId, opacity: f64) {
        self.with_node(node, |n| n.opacity = Some(opacity));
    }

    fn set_model_opacity(&mut self, node: NodeId, opacity: f64) {
        self.with_node(node, |n| n.model_opacity = Some(opacity));
    }

    fn set_texture(&mut self, node: NodeId, asset: &AssetRef) {
        self.with_node(node, |n| n.texture = Some(asset.name.clone()));
    }

    fn set_transparent(&mut self, node: NodeId, transparent: bool) {
        self.with_node(node, |n| n.transparent = transparent);
    }

    fn set_chroma_key(&mut self, node: NodeId, asset: &AssetRef, key: Color) {
        self.with_node(node, |n| {
            n.texture = Some(asset.name.clone());
            n.chroma_key = Some(key);
        });
    }

    fn set_size(&mut self, node: NodeId, width: f64, height: f64) {
        self.with_node(node, |n| n.size = Some((width, height)));
    }

    fn translate(&mut self, node: NodeId, offset: Vec3) {
        self.with_node(node, |n| n.offset = n.offset + offset);
    }

    fn attach_model(&mut self, node: NodeId, asset: &AssetRef) {
        self.with_node(node, |n| n.model = Some(asset.name.clone()));
    }

    fn add_behaviour(&mut self, node: NodeId, behaviour: Behaviour) {
        self.with_node(node, |n| n.behaviours.push(behaviour));
    }

    fn play_tween(&mut self, node: NodeId, tween: &Tween) {
        self.with_node(node, |n| n.tweens.push(tween.clone()));
    }

    fn play_model_clip(&mut self, node: NodeId, clip: &ClipPlayback) {
        self.with_node(node, |n| n.clips.push(clip.clone()));
    }

    fn start_particles(&mut self, node: NodeId) {
        self.with_node(node, |n| {
            n.particles_started = true;
            for behaviour in &mut n.behaviours {
                if let Behaviour::ParticleSystem(config) = behaviour {
                    config.enabled = true;
                }
            }
        });
    }

    fn prime_media(&mut self, asset: &AssetRef) {
        self.primed_media.push(asset.name.clone());
    }

    fn play_media(&mut self, asset: &AssetRef) {
        self.played_media.push(asset.name.clone());
    }

    fn create_light(&mut self, light: &LightSpec, parent: NodeId) -> NodeId {
        let id = self.insert(&light.name, Primitive::Light, Some(parent));
        self.with_node(id, |n| n.light = Some(light.clone()));
        id
    }

    fn create_loading_indicator(&mut self) -> NodeId {
        self.insert(LOADING_NODE_NAME, Primitive::Entity, None)
    }

    fn set_loading_text(&mut self, _node: NodeId, text: &str) {
        self.loading_text = Some(text.to_string());
    }

    fn hide_tap_prompt(&mut self) {
        self.tap_prompt_visible = false;
    }

    fn style_button(&mut self, style: &ButtonStyle) {
        self.button = Some(style.clone());
    }

    fn show_button(&mut self) {
        self.button_visible = true;
    }

    fn report_authoring_error(&mut self, message: &str) {
        self.authoring_errors.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::{light_spec, default_rig};

    #[test]
    fn test_tree_and_attributes() {
        let mut host = HeadlessHost::new();
        let root = host.create_node("root", Primitive::Entity, None);
        let child = host.create_node("pic", Primitive::Plane, Some(root));
        host.translate(child, Vec3::new(0.5, 0.0, 0.0));
        host.translate(child, Vec3::new(0.0, 0.25, 0.0));
        host.set_visible(root, false);

        assert_eq!(host.len(), 2);
        assert_eq!(host.children_of(root).count(), 1);
        let pic = host.node_by_name("pic").unwrap();
        assert_eq!(pic.offset, Vec3::new(0.5, 0.25, 0.0));
        assert_eq!(pic.scale, Vec3::splat(1.0));
        assert!(!host.node(root).unwrap().visible);
    }

    #[test]
    fn test_lights_are_nodes() {
        let mut host = HeadlessHost::new();
        let root = host.create_node("root", Primitive::Entity, None);
        for light in default_rig(&UniqueName::from("root")) {
            host.create_light(&light_spec(&light, Some(root)), root);
        }
        assert_eq!(host.lights().count(), 2);
        assert_eq!(host.children_of(root).count(), 2);
    }

    #[test]
    fn test_serializes_as_graph() {
        let mut host = HeadlessHost::new();
        let root = host.create_node("root", Primitive::Entity, None);
        host.set_material_opacity(root, 0.5);
        let json = serde_json::to_value(&host).unwrap();
        assert_eq!(json["nodes"]["1"]["name"], "root");
        assert_eq!(json["nodes"]["1"]["opacity"], 0.5);
        assert_eq!(json["tapPromptVisible"], true);
    }

    #[test]
    fn test_unknown_node_is_ignored() {
        let mut host = HeadlessHost::new();
        host.set_position(NodeId(42), Vec3::splat(1.0));
        assert!(host.is_empty());
    }
}
