//! Core error types for the TalkAR interpreter.

/// A specialized Result type for TalkAR operations.
pub type TalkarResult<T> = Result<T, TalkarError>;

/// Top-level error type encompassing all TalkAR subsystems.
#[derive(Debug, thiserror::Error)]
pub enum TalkarError {
    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("asset error: {message} ({url})")]
    Asset { message: String, url: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("document validation error: {0}")]
    Validation(String),

    #[error("element '{element}' references parent '{parent}' which does not exist")]
    MissingParent { element: String, parent: String },

    #[error("element hierarchy contains a cycle through: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("duplicate unique name '{0}'")]
    DuplicateName(String),

    #[error("element '{element}' references unknown asset '{asset}'")]
    UnknownAsset { element: String, asset: String },

    #[error("authoring error: {0}")]
    Authoring(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TalkarError {
    /// Create an asset error tied to the URL it was loaded from.
    pub fn asset(message: impl Into<String>, url: impl Into<String>) -> Self {
        TalkarError::Asset {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create a missing-parent error.
    pub fn missing_parent(element: impl Into<String>, parent: impl Into<String>) -> Self {
        TalkarError::MissingParent {
            element: element.into(),
            parent: parent.into(),
        }
    }
}
