use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use finder_platform::options::ProviderOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Log level used when neither RUST_LOG nor --log-level is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Options handed to the provider
    #[serde(default)]
    pub provider: ProviderOptions,
}

impl HarnessConfig {
    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "fox-finder", "finder-fs") {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("finder-fs.json")
        }
    }

    /// Load config from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse config JSON")?;
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finder_platform::options::ListErrorPolicy;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load_or_default(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.provider.list_errors, ListErrorPolicy::Abort);
    }

    #[test]
    fn test_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"provider": {"list_errors": "skip"}}"#).unwrap();

        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.provider.list_errors, ListErrorPolicy::Skip);
        assert!(!config.provider.directories_first);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let mut config = HarnessConfig::default();
        config.log_level = Some("debug".to_string());
        config.provider.create_parent_dirs = true;

        config.save(&path).unwrap();
        assert_eq!(HarnessConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(HarnessConfig::load(&path).is_err());
    }
}
