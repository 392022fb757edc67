use serde::{Deserialize, Serialize};

use crate::asset::AssetDeclaration;
use crate::de::nullable_vec;
use crate::element::ElementDeclaration;
use crate::light::LightDeclaration;
use crate::UniqueName;

/// The synthetic root every element hangs from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootElement {
    pub unique_name: UniqueName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingSettings {
    #[serde(default)]
    pub scale: Option<f64>,
}

/// Call-to-action button shown once the experience is running.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonSettings {
    #[serde(default)]
    pub text: Option<String>,
    /// Hex without `#`.
    #[serde(default)]
    pub text_color: Option<String>,
    /// Hex without `#`.
    #[serde(default)]
    pub button_color: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Seconds; `-1` hides the button for good.
    #[serde(default)]
    pub show_after: Option<f64>,
}

/// A complete experience as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceDocument {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub assets: Vec<AssetDeclaration>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub elements: Vec<ElementDeclaration>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub lights: Vec<LightDeclaration>,
    pub root_element: RootElement,
    #[serde(default)]
    pub loading: Option<LoadingSettings>,
    #[serde(default)]
    pub button: Option<ButtonSettings>,
    #[serde(default)]
    pub debug: Option<bool>,
}

impl ExperienceDocument {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            assets: Vec::new(),
            elements: Vec::new(),
            lights: Vec::new(),
            root_element: RootElement {
                unique_name: UniqueName::new(root),
            },
            loading: None,
            button: None,
            debug: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn root_name(&self) -> &UniqueName {
        &self.root_element.unique_name
    }

    pub fn asset(&self, name: &str) -> Option<&AssetDeclaration> {
        self.assets.iter().find(|a| a.unique_name.as_str() == name)
    }

    pub fn element(&self, name: &str) -> Option<&ElementDeclaration> {
        self.elements.iter().find(|e| e.unique_name.as_str() == name)
    }

    pub fn is_debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }
}

/// The experience identifier: the last path segment of the page URL.
pub fn experience_id_from_url(page_url: &str) -> Option<&str> {
    let path = page_url.split(['?', '#']).next().unwrap_or(page_url);
    path.rsplit('/').next().filter(|s| !s.is_empty())
}

/// Where the document for `experience_id` is served.
pub fn document_url(api_base: &str, experience_id: &str) -> String {
    format!("{}/{}", api_base.trim_end_matches('/'), experience_id)
}
