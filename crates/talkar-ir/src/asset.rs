use serde::{Deserialize, Serialize};

use crate::UniqueName;

/// The media kind of an asset, keyed by the document's `__component` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    #[serde(rename = "assets.image-asset")]
    Image,
    #[serde(rename = "assets.video-asset")]
    Video,
    #[serde(rename = "assets.audio-asset")]
    Audio,
    #[serde(rename = "assets.model-asset")]
    Model,
}

impl AssetKind {
    /// Video and audio assets are playable media.
    pub fn is_media(&self) -> bool {
        matches!(self, AssetKind::Video | AssetKind::Audio)
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Image => write!(f, "image"),
            AssetKind::Video => write!(f, "video"),
            AssetKind::Audio => write!(f, "audio"),
            AssetKind::Model => write!(f, "model"),
        }
    }
}

/// Uploaded file reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetFile {
    pub url: String,
}

/// An asset declared by the experience document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDeclaration {
    pub unique_name: UniqueName,
    #[serde(rename = "__component")]
    pub kind: AssetKind,
    pub file: AssetFile,
    /// Pixel width, when the backend knows it.
    #[serde(default)]
    pub resolution_x: Option<f64>,
    /// Pixel height, when the backend knows it.
    #[serde(default)]
    pub resolution_y: Option<f64>,
}

impl AssetDeclaration {
    pub fn new(unique_name: impl Into<String>, kind: AssetKind, url: impl Into<String>) -> Self {
        Self {
            unique_name: UniqueName::new(unique_name),
            kind,
            file: AssetFile { url: url.into() },
            resolution_x: None,
            resolution_y: None,
        }
    }

    pub fn with_resolution(mut self, width: f64, height: f64) -> Self {
        self.resolution_x = Some(width);
        self.resolution_y = Some(height);
        self
    }

    /// The authored file URL, before resolution against a base.
    pub fn file_url(&self) -> &str {
        &self.file.url
    }

    /// Declared pixel resolution, if both axes are present and non-zero.
    pub fn resolution(&self) -> Option<(f64, f64)> {
        match (self.resolution_x, self.resolution_y) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some((w, h)),
            _ => None,
        }
    }
}
