//! Media decoding.
//! Turns fetched asset bytes into the handle the interpreter keeps for each
//! loaded asset.

use serde::{Deserialize, Serialize};
use talkar_core::{TalkarError, TalkarResult};
use talkar_ir::AssetKind;

/// What the interpreter knows about a loaded asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssetHandle {
    Image {
        width: u32,
        height: u32,
    },
    /// Video or audio, ready to play through.
    Media {
        bytes: usize,
    },
    Model {
        scenes: usize,
        /// Animation clip names, in file order.
        clips: Vec<String>,
    },
}

impl AssetHandle {
    /// Pixel dimensions of an image.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            AssetHandle::Image { width, height } => Some((*width, *height)),
            _ => None,
        }
    }

    pub fn clips(&self) -> &[String] {
        match self {
            AssetHandle::Model { clips, .. } => clips,
            _ => &[],
        }
    }
}

/// Decode fetched bytes according to the declared asset kind.
pub fn decode_asset(kind: AssetKind, data: &[u8]) -> TalkarResult<AssetHandle> {
    match kind {
        AssetKind::Image => decode_image(data),
        AssetKind::Video | AssetKind::Audio => {
            if data.is_empty() {
                return Err(TalkarError::Decode(format!("empty {} asset", kind)));
            }
            Ok(AssetHandle::Media { bytes: data.len() })
        }
        AssetKind::Model => decode_model(data),
    }
}

fn decode_image(data: &[u8]) -> TalkarResult<AssetHandle> {
    let img = image::load_from_memory(data)
        .map_err(|e| TalkarError::Decode(format!("failed to decode image: {}", e)))?;
    Ok(AssetHandle::Image {
        width: img.width(),
        height: img.height(),
    })
}

/// Parse a glTF or GLB container and list its scenes and clips.
fn decode_model(data: &[u8]) -> TalkarResult<AssetHandle> {
    let gltf = gltf::Gltf::from_slice(data)
        .map_err(|e| TalkarError::Decode(format!("failed to parse model: {}", e)))?;

    let clips = gltf
        .animations()
        .map(|anim| {
            anim.name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("clip{}", anim.index()))
        })
        .collect();

    Ok(AssetHandle::Model {
        scenes: gltf.scenes().count(),
        clips,
    })
}
