//! Asset fetching for headless runs.
//!
//! `http(s)` URLs are downloaded, optionally through an on-disk cache keyed
//! by the SHA-256 of the URL; `file://` URLs and bare paths are read from
//! disk.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use sha2::{Digest, Sha256};

use talkar_core::{TalkarError, TalkarResult};
use talkar_ir::AssetKind;
use talkar_runtime::{AssetFetcher, AssetRequest};

pub struct HttpAssetFetcher {
    client: Client,
    cache_root: Option<PathBuf>,
}

impl HttpAssetFetcher {
    pub fn new(client: Client, cache_root: Option<PathBuf>) -> Self {
        Self { client, cache_root }
    }

    fn cache_path(&self, request: &AssetRequest) -> Option<PathBuf> {
        let root = self.cache_root.as_ref()?;
        let key = sha256_hex(&format!("asset_fetch|kind={}|url={}", request.kind, request.url));
        let file_name = match infer_extension_from_url(&request.url)
            .or_else(|| Some(default_extension_for_kind(request.kind).to_string()))
        {
            Some(ext) if !ext.is_empty() => format!("{}.{}", key, ext),
            _ => key,
        };
        Some(root.join("assets").join(kind_dir(request.kind)).join(file_name))
    }

    async fn download(&self, url: &str) -> TalkarResult<Vec<u8>> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TalkarError::asset(format!("failed to download asset: {}", e), url))?;

        if !res.status().is_success() {
            let status = res.status();
            return Err(TalkarError::asset(
                format!("remote asset fetch failed: {}", status),
                url,
            ));
        }

        let bytes = res
            .bytes()
            .await
            .map_err(|e| TalkarError::asset(format!("failed to read asset bytes: {}", e), url))?;
        Ok(bytes.to_vec())
    }

    async fn store(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, path).await
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, request: &AssetRequest) -> TalkarResult<Vec<u8>> {
        if !is_http_url(&request.url) {
            let path = local_path(&request.url);
            tracing::debug!("Reading asset {} from {}", request.name, path.display());
            return tokio::fs::read(&path)
                .await
                .map_err(|e| TalkarError::asset(e.to_string(), &request.url));
        }

        let cache_path = self.cache_path(request);
        if let Some(path) = cache_path.as_ref().filter(|p| p.exists()) {
            tracing::debug!("Reusing cached {} for {}", path.display(), request.url);
            if let Ok(bytes) = tokio::fs::read(path).await {
                return Ok(bytes);
            }
        }

        tracing::info!("Downloading {} asset {} from {}", request.kind, request.name, request.url);
        let bytes = self.download(&request.url).await?;

        if let Some(path) = cache_path {
            if let Err(e) = self.store(&path, &bytes).await {
                tracing::warn!("Failed to cache {}: {}", path.display(), e);
            }
        }
        Ok(bytes)
    }
}

/// The default cache directory, `<user cache dir>/talkar`.
pub fn default_cache_root() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("talkar"))
}

pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path == "~" || path.starts_with("~/") {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("failed to resolve home dir"))?;
        if path == "~" {
            return Ok(home);
        }
        return Ok(home.join(path.trim_start_matches("~/")));
    }
    Ok(PathBuf::from(path))
}

pub fn is_http_url(s: &str) -> bool {
    let s = s.trim();
    s.starts_with("http://") || s.starts_with("https://")
}

fn local_path(url: &str) -> PathBuf {
    PathBuf::from(url.trim().strip_prefix("file://").unwrap_or(url.trim()))
}

fn kind_dir(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Image => "images",
        AssetKind::Video => "video",
        AssetKind::Audio => "audio",
        AssetKind::Model => "models",
    }
}

fn default_extension_for_kind(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Image => "png",
        AssetKind::Video => "mp4",
        AssetKind::Audio => "mp3",
        AssetKind::Model => "glb",
    }
}

fn infer_extension_from_url(url: &str) -> Option<String> {
    let no_frag = url.split('#').next().unwrap_or(url);
    let no_query = no_frag.split('?').next().unwrap_or(no_frag);

    let ext = Path::new(no_query)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())?;

    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use talkar_ir::UniqueName;

    fn request(kind: AssetKind, url: &str) -> AssetRequest {
        AssetRequest {
            name: UniqueName::from("a"),
            kind,
            url: url.to_string(),
        }
    }

    #[test]
    fn test_infer_extension_from_url() {
        assert_eq!(infer_extension_from_url("https://x/y.png").as_deref(), Some("png"));
        assert_eq!(
            infer_extension_from_url("https://x/y.GLB?cache=1").as_deref(),
            Some("glb")
        );
        assert_eq!(infer_extension_from_url("https://x/y").as_deref(), None);
    }

    #[test]
    fn test_cache_path_is_stable_per_url() {
        let fetcher = HttpAssetFetcher::new(Client::new(), Some(PathBuf::from("/cache")));
        let a = fetcher.cache_path(&request(AssetKind::Model, "https://x/robot")).unwrap();
        let b = fetcher.cache_path(&request(AssetKind::Model, "https://x/robot")).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("/cache/assets/models"));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("glb"));

        let uncached = HttpAssetFetcher::new(Client::new(), None);
        assert!(uncached.cache_path(&request(AssetKind::Image, "https://x/y.png")).is_none());
    }

    #[test]
    fn test_local_paths() {
        assert_eq!(local_path("file:///tmp/a.png"), PathBuf::from("/tmp/a.png"));
        assert_eq!(local_path("/tmp/a.png"), PathBuf::from("/tmp/a.png"));
        assert!(is_http_url(" https://x"));
        assert!(!is_http_url("file:///x"));
    }

    #[tokio::test]
    async fn test_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"not really a video").unwrap();
        let fetcher = HttpAssetFetcher::new(Client::new(), None);
        let url = format!("file://{}", path.display());
        let bytes = fetcher.fetch(&request(AssetKind::Video, &url)).await.unwrap();
        assert_eq!(bytes, b"not really a video");

        let missing = fetcher
            .fetch(&request(AssetKind::Video, "/definitely/not/here.mp4"))
            .await;
        assert!(matches!(missing, Err(TalkarError::Asset { .. })));
    }
}
