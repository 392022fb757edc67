//! Experience document loading.

use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Client;

use talkar_core::TalkarError;
use talkar_ir::{document_url, experience_id_from_url, ExperienceDocument};

use crate::remote_assets::is_http_url;

/// Where an experience document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File(PathBuf),
    Url(String),
}

impl DocumentSource {
    /// Interpret a command-line source argument.
    ///
    /// Existing paths are read from disk. An http(s) page URL names the
    /// experience by its last path segment, which is looked up under
    /// `api_base`, as is a bare experience id.
    pub fn parse(arg: &str, api_base: &str) -> Result<Self> {
        let path = PathBuf::from(arg);
        if path.exists() {
            return Ok(DocumentSource::File(path));
        }
        if let Some(stripped) = arg.strip_prefix("file://") {
            return Ok(DocumentSource::File(PathBuf::from(stripped)));
        }

        let id = if is_http_url(arg) {
            experience_id_from_url(arg)
                .with_context(|| format!("no experience id in page URL: {}", arg))?
        } else {
            arg.trim().trim_matches('/')
        };
        if id.is_empty() {
            anyhow::bail!("empty experience source");
        }
        Ok(DocumentSource::Url(document_url(api_base, id)))
    }
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSource::File(p) => write!(f, "{}", p.display()),
            DocumentSource::Url(u) => write!(f, "{}", u),
        }
    }
}

/// Fetch and parse the document. Every failure is a `TalkarError::Fetch`
/// so callers can apply the fetch-failure policy uniformly.
pub async fn load_document(
    client: &Client,
    source: &DocumentSource,
) -> Result<ExperienceDocument, TalkarError> {
    let bytes = match source {
        DocumentSource::File(path) => tokio::fs::read(path)
            .await
            .map_err(|e| TalkarError::Fetch(format!("{}: {}", path.display(), e)))?,
        DocumentSource::Url(url) => {
            tracing::info!("Fetching experience from {}", url);
            let res = client
                .get(url)
                .send()
                .await
                .map_err(|e| TalkarError::Fetch(format!("{}: {}", url, e)))?;
            if !res.status().is_success() {
                return Err(TalkarError::Fetch(format!("{}: {}", url, res.status())));
            }
            res.bytes()
                .await
                .map_err(|e| TalkarError::Fetch(format!("{}: {}", url, e)))?
                .to_vec()
        }
    };

    ExperienceDocument::from_slice(&bytes)
        .map_err(|e| TalkarError::Fetch(format!("malformed document from {}: {}", source, e)))
}
