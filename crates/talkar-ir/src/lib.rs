//! # talkar-ir
//!
//! The experience document model: a declarative scene graph of assets,
//! elements, lights and animations, as served by the TalkAR backend.
//!
//! Documents are immutable once fetched. The runtime validates them with
//! [`validate::validate_document`] and then interprets them.

pub mod animation;
pub mod asset;
pub mod builder;
mod de;
pub mod document;
pub mod element;
pub mod light;
pub mod particle;
pub mod property;
pub mod validate;

pub use animation::{Animation, EndTrigger, LoopType, ModelAnimation};
pub use asset::{AssetDeclaration, AssetKind};
pub use builder::{AnimationBuilder, DocumentBuilder, ElementBuilder};
pub use document::{
    document_url, experience_id_from_url, ButtonSettings, ExperienceDocument, LoadingSettings,
    RootElement,
};
pub use element::{
    Anchor, AudioElement, AudioTrigger, ElementDeclaration, ElementKind, ImageElement,
    ModelElement, VideoElement,
};
pub use light::{
    DirectionalLight, HemisphereLight, LightDeclaration, LightKind, PointLight, SpotLight,
};
pub use particle::{
    BlendingMode, ParticleElement, ParticleProperty, ParticlePropertyType, ParticleShape,
};
pub use property::{PartialVec3, Property, PropertyType};
pub use validate::{validate_document, MaterializationPlan};

use serde::{Deserialize, Serialize};

/// The author-assigned identity of an asset, element or light.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueName(pub String);

impl UniqueName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UniqueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for UniqueName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UniqueName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
