//! Asset loading state.
//!
//! The table records which declared assets have completed and reports
//! aggregate progress. Fetching and decoding happen elsewhere (the host or
//! [`crate::runner`]); completions are fed back in by name.

use std::collections::HashMap;

use serde::Serialize;
use talkar_core::AssetsConfig;
use talkar_ir::{AssetDeclaration, AssetKind, UniqueName};

use crate::host::AssetRef;
use crate::media::AssetHandle;

/// How authored asset URLs become absolute URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlPolicy {
    pub base_url: String,
    pub cdn_prefix: String,
    pub cdn_strip_segment: String,
    pub cdn_host: String,
}

impl UrlPolicy {
    pub fn from_config(config: &AssetsConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            cdn_prefix: config.cdn_prefix.clone(),
            cdn_strip_segment: config.cdn_strip_segment.clone(),
            cdn_host: config.cdn_host.clone(),
        }
    }

    /// The default CDN rules with a different base URL.
    pub fn with_base(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::from_config(&AssetsConfig::default())
        }
    }

    /// Three ordered cases, first match wins: absolute `https` URLs pass
    /// through; storage-provider URLs are rewritten onto the CDN host with
    /// the bucket segment removed; anything else is appended to the base.
    pub fn resolve(&self, file_url: &str) -> String {
        if file_url.starts_with("https") {
            return file_url.to_string();
        }
        if !self.cdn_prefix.is_empty() && file_url.starts_with(&self.cdn_prefix) {
            let stripped = if self.cdn_strip_segment.is_empty() {
                file_url.to_string()
            } else {
                file_url.replacen(&self.cdn_strip_segment, "", 1)
            };
            return format!("{}{}", self.cdn_host, stripped);
        }
        format!("{}{}", self.base_url, file_url)
    }
}

/// Resolve an authored asset URL against `base_url` with the default CDN rules.
pub fn resolve_asset_url(file_url: &str, base_url: &str) -> String {
    UrlPolicy::with_base(base_url).resolve(file_url)
}

/// One asset the interpreter is waiting on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetRequest {
    pub name: UniqueName,
    pub kind: AssetKind,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Pending,
    Loaded,
    /// Given up on; counts toward completion without a handle.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub declaration: AssetDeclaration,
    pub url: String,
    pub state: LoadState,
    pub handle: Option<AssetHandle>,
}

impl LoadedAsset {
    pub fn is_settled(&self) -> bool {
        self.state != LoadState::Pending
    }

    pub fn kind(&self) -> AssetKind {
        self.declaration.kind
    }

    pub fn asset_ref(&self) -> AssetRef {
        AssetRef {
            name: self.declaration.unique_name.clone(),
            kind: self.declaration.kind,
            url: self.url.clone(),
        }
    }

    /// Pixel size: declared resolution first, decoded image size second.
    pub fn resolution(&self) -> Option<(f64, f64)> {
        self.declaration.resolution().or_else(|| {
            self.handle
                .as_ref()
                .and_then(|h| h.dimensions())
                .filter(|(w, h)| *w > 0 && *h > 0)
                .map(|(w, h)| (w as f64, h as f64))
        })
    }
}

/// Result of reporting one asset completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOutcome {
    /// Progress moved to this percentage; more assets are outstanding.
    Progress(f64),
    /// This completion was the last one.
    Complete,
    /// The asset had already completed; nothing changed.
    Duplicate,
    /// No asset by that name was declared.
    Unknown,
}

#[derive(Debug, Default)]
pub struct AssetTable {
    assets: HashMap<UniqueName, LoadedAsset>,
    order: Vec<UniqueName>,
    settled: usize,
}

impl AssetTable {
    pub fn new(declarations: &[AssetDeclaration], policy: &UrlPolicy) -> Self {
        let mut table = Self::default();
        for declaration in declarations {
            let url = policy.resolve(declaration.file_url());
            table.order.push(declaration.unique_name.clone());
            table.assets.insert(
                declaration.unique_name.clone(),
                LoadedAsset {
                    declaration: declaration.clone(),
                    url,
                    state: LoadState::Pending,
                    handle: None,
                },
            );
        }
        table
    }

    /// Fetch requests for every pending asset, in declaration order.
    pub fn requests(&self) -> Vec<AssetRequest> {
        self.iter()
            .filter(|a| !a.is_settled())
            .map(|a| AssetRequest {
                name: a.declaration.unique_name.clone(),
                kind: a.declaration.kind,
                url: a.url.clone(),
            })
            .collect()
    }

    /// Record a completed load. A second completion for the same asset is
    /// ignored, so racing readiness signals count once.
    pub fn mark_loaded(&mut self, name: &str, handle: AssetHandle) -> LoadOutcome {
        self.settle(name, LoadState::Loaded, Some(handle))
    }

    /// Give up on an asset so loading can still finish.
    pub fn mark_skipped(&mut self, name: &str) -> LoadOutcome {
        self.settle(name, LoadState::Skipped, None)
    }

    /// Give up on everything still outstanding. Returns the skipped names.
    pub fn skip_pending(&mut self) -> Vec<UniqueName> {
        let pending: Vec<UniqueName> = self
            .iter()
            .filter(|a| !a.is_settled())
            .map(|a| a.declaration.unique_name.clone())
            .collect();
        for name in &pending {
            self.mark_skipped(name.as_str());
        }
        pending
    }

    fn settle(&mut self, name: &str, state: LoadState, handle: Option<AssetHandle>) -> LoadOutcome {
        let Some(asset) = self.assets.get_mut(name) else {
            return LoadOutcome::Unknown;
        };
        if asset.is_settled() {
            return LoadOutcome::Duplicate;
        }
        asset.state = state;
        asset.handle = handle;
        self.settled += 1;
        if self.is_complete() {
            LoadOutcome::Complete
        } else {
            LoadOutcome::Progress(self.progress())
        }
    }

    /// Percentage of declared assets that have completed; 100 when there
    /// are none.
    pub fn progress(&self) -> f64 {
        if self.order.is_empty() {
            100.0
        } else {
            self.settled as f64 / self.order.len() as f64 * 100.0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.settled == self.order.len()
    }

    pub fn total(&self) -> usize {
        self.order.len()
    }

    pub fn settled(&self) -> usize {
        self.settled
    }

    pub fn get(&self, name: &str) -> Option<&LoadedAsset> {
        self.assets.get(name)
    }

    /// Assets in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &LoadedAsset> {
        self.order.iter().filter_map(|n| self.assets.get(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> AssetTable {
        let decls: Vec<_> = (0..n)
            .map(|i| AssetDeclaration::new(format!("a{}", i), AssetKind::Audio, format!("/a{}.mp3", i)))
            .collect();
        AssetTable::new(&decls, &UrlPolicy::with_base("http://host"))
    }

    fn media() -> AssetHandle {
        AssetHandle::Media { bytes: 1 }
    }

    #[test]
    fn test_https_passes_through() {
        assert_eq!(resolve_asset_url("https://x/y.png", "http://host"), "https://x/y.png");
    }

    #[test]
    fn test_storage_provider_rewritten_to_cdn() {
        assert_eq!(
            resolve_asset_url("nyc3/talkar/a.png", "http://host"),
            "https://talkar.nyc3/a.png"
        );
        assert_eq!(
            resolve_asset_url("nyc3.digitaloceanspaces.com/talkar/a.png", "http://host"),
            "https://talkar.nyc3.digitaloceanspaces.com/a.png"
        );
    }

    #[test]
    fn test_relative_resolved_against_base() {
        assert_eq!(resolve_asset_url("/media/a.png", "http://host"), "http://host/media/a.png");
        assert_eq!(resolve_asset_url("media/a.png", "http://host/"), "http://host/media/a.png");
        assert_eq!(resolve_asset_url("/media/a.png", "http://host/"), "http://host//media/a.png");
    }

    #[test]
    fn test_empty_table_is_complete() {
        let t = table(0);
        assert!(t.is_complete());
        assert_eq!(t.progress(), 100.0);
        assert!(t.requests().is_empty());
    }

    #[test]
    fn test_duplicate_completion_counts_once() {
        let mut t = table(2);
        assert_eq!(t.mark_loaded("a0", media()), LoadOutcome::Progress(50.0));
        assert_eq!(t.mark_loaded("a0", media()), LoadOutcome::Duplicate);
        assert_eq!(t.settled(), 1);
        assert_eq!(t.mark_loaded("a1", media()), LoadOutcome::Complete);
        assert_eq!(t.mark_loaded("a1", media()), LoadOutcome::Duplicate);
        assert_eq!(t.progress(), 100.0);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut t = table(3);
        let mut last = t.progress();
        for name in ["a2", "a0", "a0", "missing", "a1"] {
            t.mark_loaded(name, media());
            assert!(t.progress() >= last);
            last = t.progress();
        }
        assert_eq!(last, 100.0);
        assert!(t.is_complete());
    }

    #[test]
    fn test_unknown_asset() {
        let mut t = table(1);
        assert_eq!(t.mark_loaded("nope", media()), LoadOutcome::Unknown);
        assert!(!t.is_complete());
    }

    #[test]
    fn test_skip_pending() {
        let mut t = table(3);
        t.mark_loaded("a1", media());
        let skipped = t.skip_pending();
        assert_eq!(skipped, vec![UniqueName::from("a0"), UniqueName::from("a2")]);
        assert!(t.is_complete());
        assert_eq!(t.get("a0").unwrap().state, LoadState::Skipped);
        assert!(t.get("a0").unwrap().handle.is_none());
    }

    #[test]
    fn test_resolution_falls_back_to_decoded_size() {
        let decls = vec![AssetDeclaration::new("img", AssetKind::Image, "/i.png")];
        let mut t = AssetTable::new(&decls, &UrlPolicy::with_base("http://host"));
        assert_eq!(t.get("img").unwrap().resolution(), None);
        t.mark_loaded("img", AssetHandle::Image { width: 300, height: 150 });
        assert_eq!(t.get("img").unwrap().resolution(), Some((300.0, 150.0)));
        assert_eq!(t.get("img").unwrap().url, "http://host/i.png");
    }
}
