//! Studio configuration: defaults, an optional TOML file, then environment.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | `GOOGLE_API_KEY` / `API_KEY` | none | Gemini API key. |
//! | `BEASTIFY_MODEL` | `gemini-2.5-flash-image` | Image model identifier. |
//! | `BEASTIFY_BASE_URL` | `https://generativelanguage.googleapis.com` | API root. |
//! | `BEASTIFY_TIMEOUT_SECS` | `120` | Per-request HTTP timeout. |
//! | `BEASTIFY_OUTPUT_DIR` | `.` | Where the CLI writes thumbnails. |

use crate::error::{Result, ThumbnailError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Gemini image model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Settings shared by the library and the CLI.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudioConfig {
    /// Gemini API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Image model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API root, without the `/v1beta` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Directory for saved thumbnails.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            output_dir: default_output_dir(),
        }
    }
}

impl std::fmt::Debug for StudioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl StudioConfig {
    /// Loads defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Parses a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| ThumbnailError::Config(format!("{}: {e}", path.display())))
    }

    /// Parses TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ThumbnailError::Config(e.to_string()))
    }

    /// Applies environment overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GOOGLE_API_KEY").or_else(|| non_empty("API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = non_empty("BEASTIFY_MODEL") {
            self.model = model;
        }
        if let Some(url) = non_empty("BEASTIFY_BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = non_empty("BEASTIFY_TIMEOUT_SECS") {
            self.timeout_secs = secs.trim().parse().map_err(|_| {
                ThumbnailError::Config(format!("BEASTIFY_TIMEOUT_SECS is not a number: {secs}"))
            })?;
        }
        if let Some(dir) = non_empty("BEASTIFY_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(ThumbnailError::Config("timeout_secs must be at least 1".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ThumbnailError::Config(format!(
                "base_url must be an http(s) URL: {}",
                self.base_url
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ThumbnailError::Config("model must not be empty".into()));
        }
        Ok(())
    }

    /// HTTP timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StudioConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_toml_partial_file_keeps_defaults() {
        let config = StudioConfig::from_toml_str("model = \"nano-banana-pro-preview\"").unwrap();
        assert_eq!(config.model, "nano-banana-pro-preview");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_toml_rejects_unknown_keys() {
        let err = StudioConfig::from_toml_str("modle = \"typo\"").unwrap_err();
        assert!(matches!(err, ThumbnailError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = StudioConfig::default()
            .with_env_overrides(env(&[
                ("API_KEY", "fallback"),
                ("BEASTIFY_TIMEOUT_SECS", "30"),
                ("BEASTIFY_OUTPUT_DIR", "/tmp/thumbs"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("fallback"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/thumbs"));
    }

    #[test]
    fn test_google_key_wins_over_generic_key() {
        let config = StudioConfig::default()
            .with_env_overrides(env(&[("API_KEY", "generic"), ("GOOGLE_API_KEY", "google")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("google"));
    }

    #[test]
    fn test_invalid_env_values() {
        assert!(StudioConfig::default()
            .with_env_overrides(env(&[("BEASTIFY_TIMEOUT_SECS", "soon")]))
            .is_err());
        assert!(StudioConfig::default()
            .with_env_overrides(env(&[("BEASTIFY_BASE_URL", "ftp://nope")]))
            .is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = StudioConfig {
            api_key: Some("secret-key".into()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }
}
