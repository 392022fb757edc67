use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use talkar_core::TalkarError;

use crate::animation::EndTrigger;
use crate::asset::AssetKind;
use crate::document::ExperienceDocument;
use crate::element::ElementDeclaration;
use crate::property::PropertyType;

/// The order in which elements are materialized, as indices into
/// `ExperienceDocument::elements`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaterializationPlan {
    /// Audio elements, in document order. They have no scene node and are
    /// created first so animation-linked lookups always succeed.
    pub audio: Vec<usize>,
    /// Every other element, each parent ahead of its children and otherwise
    /// in document order.
    pub visual: Vec<usize>,
}

impl MaterializationPlan {
    /// Audio first, then the sorted visual elements.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.audio.iter().chain(self.visual.iter()).copied()
    }

    pub fn len(&self) -> usize {
        self.audio.len() + self.visual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validate an experience document for structural correctness and compute
/// its materialization order. Every problem found is reported.
pub fn validate_document(doc: &ExperienceDocument) -> Result<MaterializationPlan, Vec<TalkarError>> {
    let mut errors = Vec::new();
    let root = doc.root_name().as_str();

    if root.is_empty() {
        errors.push(TalkarError::Validation("root element has an empty unique name".into()));
    }

    // Asset names
    let mut assets: HashMap<&str, AssetKind> = HashMap::new();
    for asset in &doc.assets {
        if assets.insert(asset.unique_name.as_str(), asset.kind).is_some() {
            errors.push(TalkarError::DuplicateName(asset.unique_name.to_string()));
        }
    }

    // Scene node names: root, elements and lights share one namespace.
    let mut nodes: HashSet<&str> = HashSet::new();
    nodes.insert(root);
    for element in &doc.elements {
        if !nodes.insert(element.unique_name.as_str()) {
            errors.push(TalkarError::DuplicateName(element.unique_name.to_string()));
        }
    }
    for light in &doc.lights {
        if !nodes.insert(light.unique_name.as_str()) {
            errors.push(TalkarError::DuplicateName(light.unique_name.to_string()));
        }
    }

    for element in &doc.elements {
        validate_element(element, &assets, &mut errors);
    }

    let plan = order_elements(doc, &mut errors);

    // Lights hang from the root or a visual element.
    let visual: HashSet<&str> = doc
        .elements
        .iter()
        .filter(|e| !e.kind.is_audio())
        .map(|e| e.unique_name.as_str())
        .chain(std::iter::once(root))
        .collect();
    for light in &doc.lights {
        if let Some(parent) = &light.parent_unique_name {
            if !visual.contains(parent.as_str()) {
                errors.push(TalkarError::missing_parent(
                    light.unique_name.as_str(),
                    parent.as_str(),
                ));
            }
        }
        if let Some(target) = light.kind.target() {
            if !visual.contains(target.as_str()) {
                errors.push(TalkarError::Validation(format!(
                    "light '{}' targets unknown element '{}'",
                    light.unique_name, target
                )));
            }
        }
    }

    if errors.is_empty() {
        Ok(plan)
    } else {
        Err(errors)
    }
}

fn validate_element(
    element: &ElementDeclaration,
    assets: &HashMap<&str, AssetKind>,
    errors: &mut Vec<TalkarError>,
) {
    let name = element.unique_name.as_str();

    if let Some((asset, expected)) = element.kind.asset_ref() {
        match assets.get(asset.as_str()) {
            None => errors.push(TalkarError::UnknownAsset {
                element: name.to_string(),
                asset: asset.to_string(),
            }),
            Some(kind) if *kind != expected => errors.push(TalkarError::Validation(format!(
                "{} element '{}' references {} asset '{}', expected {}",
                element.kind.name(),
                name,
                kind,
                asset,
                expected
            ))),
            Some(_) => {}
        }
    }

    let mut seen = HashSet::new();
    for property in &element.properties {
        if !seen.insert(property.property_type) {
            errors.push(TalkarError::Validation(format!(
                "element '{}' declares more than one {} property",
                name, property.property_type
            )));
        }
    }

    for (label, animations) in [
        ("start", &element.start_animations),
        ("end", &element.end_animations),
    ] {
        let mut seen: HashSet<PropertyType> = HashSet::new();
        for animation in animations.iter() {
            if !seen.insert(animation.property_type) {
                errors.push(TalkarError::Validation(format!(
                    "element '{}' declares more than one {} {} animation",
                    name, animation.property_type, label
                )));
            }
        }
    }

    for animation in &element.end_animations {
        if animation.trigger != Some(EndTrigger::Video) {
            continue;
        }
        match &animation.video_asset_unique_name {
            None => errors.push(TalkarError::Validation(format!(
                "element '{}' has a video-triggered {} animation without a video asset",
                name, animation.property_type
            ))),
            Some(video) => match assets.get(video.as_str()) {
                Some(AssetKind::Video) => {}
                Some(kind) => errors.push(TalkarError::Validation(format!(
                    "element '{}' waits on '{}' to end, but it is a {} asset",
                    name, video, kind
                ))),
                None => errors.push(TalkarError::UnknownAsset {
                    element: name.to_string(),
                    asset: video.to_string(),
                }),
            },
        }
    }
}

/// Sort visual elements so every parent precedes its children. Ties are
/// broken by document order, so an already-sorted document is unchanged.
fn order_elements(doc: &ExperienceDocument, errors: &mut Vec<TalkarError>) -> MaterializationPlan {
    let root = doc.root_name().as_str();
    let mut plan = MaterializationPlan::default();

    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, element) in doc.elements.iter().enumerate() {
        if element.kind.is_audio() {
            plan.audio.push(i);
        } else {
            index.entry(element.unique_name.as_str()).or_insert(i);
        }
    }
    let audio: HashSet<&str> = plan
        .audio
        .iter()
        .map(|&i| doc.elements[i].unique_name.as_str())
        .collect();

    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut ready = BinaryHeap::new();
    // Elements whose parent can never be materialized.
    let mut orphaned = HashSet::new();

    for (i, element) in doc.elements.iter().enumerate() {
        if element.kind.is_audio() {
            continue;
        }
        let parent = element
            .parent_unique_name
            .as_ref()
            .map(|p| p.as_str())
            .unwrap_or(root);
        if parent == root {
            ready.push(Reverse(i));
        } else if let Some(&p) = index.get(parent) {
            children.entry(p).or_default().push(i);
        } else {
            if audio.contains(parent) {
                errors.push(TalkarError::Validation(format!(
                    "element '{}' is parented to audio element '{}', which has no scene node",
                    element.unique_name, parent
                )));
            } else {
                errors.push(TalkarError::missing_parent(
                    element.unique_name.as_str(),
                    parent,
                ));
            }
            orphaned.insert(i);
        }
    }

    let mut placed = HashSet::new();
    while let Some(Reverse(i)) = ready.pop() {
        if !placed.insert(i) {
            continue;
        }
        plan.visual.push(i);
        if let Some(kids) = children.get(&i) {
            for &child in kids {
                ready.push(Reverse(child));
            }
        }
    }

    // Whatever is left either sits on a cycle or descends from one (or
    // from an orphan, which was already reported).
    let parent_of = |i: usize| -> Option<usize> {
        doc.elements[i]
            .parent_unique_name
            .as_ref()
            .and_then(|p| index.get(p.as_str()).copied())
    };
    let mut reported: HashSet<usize> = HashSet::new();
    for (i, element) in doc.elements.iter().enumerate() {
        if element.kind.is_audio() || placed.contains(&i) || reported.contains(&i) {
            continue;
        }
        let mut path: Vec<usize> = Vec::new();
        let mut on_path = HashSet::new();
        let mut cursor = Some(i);
        while let Some(c) = cursor {
            if orphaned.contains(&c) || reported.contains(&c) {
                break;
            }
            if !on_path.insert(c) {
                let start = path.iter().position(|&p| p == c).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|&p| doc.elements[p].unique_name.to_string())
                    .collect();
                cycle.push(doc.elements[c].unique_name.to_string());
                errors.push(TalkarError::DependencyCycle(cycle));
                break;
            }
            path.push(c);
            cursor = parent_of(c);
        }
        reported.extend(path);
    }

    plan
}
