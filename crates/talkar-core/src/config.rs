use serde::{Deserialize, Serialize};

use crate::{Duration, TalkarError, Vec3};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Experience documents are fetched from `<base_url>/<experience-id>`.
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://admin.talkar.app/experiences".to_string(),
        }
    }
}

/// What to do when an individual asset fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetFailurePolicy {
    /// The asset never completes and the experience waits forever.
    #[default]
    Stall,
    /// The asset is counted as settled without a handle so loading can finish.
    Skip,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Base for relative asset URLs.
    pub base_url: String,
    /// URLs starting with this storage-provider prefix are rewritten to the CDN.
    pub cdn_prefix: String,
    /// Path segment removed from storage-provider URLs before rewriting.
    pub cdn_strip_segment: String,
    /// Prepended to rewritten storage-provider URLs.
    pub cdn_host: String,
    pub failure: AssetFailurePolicy,
    /// Give up waiting on outstanding assets after this many seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://admin.talkar.app".to_string(),
            cdn_prefix: "nyc3".to_string(),
            cdn_strip_segment: "/talkar".to_string(),
            cdn_host: "https://talkar.".to_string(),
            failure: AssetFailurePolicy::Stall,
            timeout_secs: None,
        }
    }
}

impl AssetsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Grace period between starting the experience and firing triggers.
    pub start_grace_ms: u64,
    /// Button reveal delay when the document has no button block.
    pub button_default_delay_ms: u64,
    /// Delay between starting a video and revealing its node.
    pub video_reveal_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_grace_ms: 10,
            button_default_delay_ms: 7000,
            video_reveal_ms: 200,
        }
    }
}

impl TimingConfig {
    pub fn start_grace(&self) -> Duration {
        Duration::from_millis(self.start_grace_ms as f64)
    }

    pub fn button_default_delay(&self) -> Duration {
        Duration::from_millis(self.button_default_delay_ms as f64)
    }

    pub fn video_reveal(&self) -> Duration {
        Duration::from_millis(self.video_reveal_ms as f64)
    }
}

/// What to do when the experience document cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchFailurePolicy {
    /// Log the failure and never start.
    #[default]
    Silent,
    /// Propagate the failure to the caller.
    Surface,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ErrorsConfig {
    pub fetch_failure: FetchFailurePolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SceneConfig {
    /// Offset added to the tap point when placing the root node.
    pub root_offset: [f64; 3],
}

impl SceneConfig {
    pub fn root_offset(&self) -> Vec3 {
        Vec3::from(self.root_offset)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TalkarConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub errors: ErrorsConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

impl TalkarConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, TalkarError> {
        toml::from_str(contents).map_err(|e| TalkarError::Config(e.to_string()))
    }

    pub fn load_from_file(path: &std::path::Path) -> Result<Self, TalkarError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, TalkarError> {
        toml::to_string_pretty(self).map_err(|e| TalkarError::Config(e.to_string()))
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), TalkarError> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_reference_defaults() {
        let config = TalkarConfig::from_toml_str("").unwrap();
        assert_eq!(config.timing.start_grace_ms, 10);
        assert_eq!(config.timing.button_default_delay_ms, 7000);
        assert_eq!(config.timing.video_reveal_ms, 200);
        assert_eq!(config.assets.failure, AssetFailurePolicy::Stall);
        assert!(config.assets.timeout().is_none());
        assert_eq!(config.errors.fetch_failure, FetchFailurePolicy::Silent);
    }

    #[test]
    fn test_partial_sections() {
        let config = TalkarConfig::from_toml_str(
            r#"
            [assets]
            base_url = "http://localhost:1337"
            failure = "skip"
            timeout_secs = 30

            [errors]
            fetch_failure = "surface"
            "#,
        )
        .unwrap();
        assert_eq!(config.assets.base_url, "http://localhost:1337");
        assert_eq!(config.assets.cdn_prefix, "nyc3");
        assert_eq!(config.assets.failure, AssetFailurePolicy::Skip);
        assert_eq!(config.assets.timeout().unwrap().as_seconds(), 30.0);
        assert_eq!(config.errors.fetch_failure, FetchFailurePolicy::Surface);
    }

    #[test]
    fn test_invalid_policy_is_config_error() {
        let err = TalkarConfig::from_toml_str("[assets]\nfailure = \"retry\"\n").unwrap_err();
        assert!(matches!(err, TalkarError::Config(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talkar.toml");
        let mut config = TalkarConfig::default();
        config.scene.root_offset = [0.0, -1.5, 0.0];
        config.save_to_file(&path).unwrap();
        let loaded = TalkarConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.scene.root_offset(), Vec3::new(0.0, -1.5, 0.0));
    }
}
