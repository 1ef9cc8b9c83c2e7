//! Application configuration loaded from `config.toml`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Top-level configuration loaded from `config.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Where the task tree is kept.
    #[serde(default)]
    pub store: StoreConfig,
    /// How intents interact with the local cache.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl AppConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    /// Returns an error for malformed TOML or invalid values.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.store.path {
            if path.as_os_str().is_empty() {
                bail!("store.path must not be empty");
            }
            if path.is_dir() {
                bail!("store.path {} is a directory", path.display());
            }
        }
        Ok(())
    }
}

/// `[store]` block.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// JSON file backing the tree. Callers pick a default location when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Mirror the tree to disk. When false the store lives only in memory.
    #[serde(default = "default_true")]
    pub persist: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            persist: true,
        }
    }
}

/// `[sync]` block.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    /// Apply intents to the local cache before the store acknowledges them.
    #[serde(default = "default_true")]
    pub optimistic: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { optimistic: true }
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_file_missing() -> Result<()> {
        let temp = TempDir::new()?;
        let config = AppConfig::load(temp.path().join("config.toml"))?;
        assert_eq!(config, AppConfig::default());
        assert!(config.store.persist);
        assert!(config.sync.optimistic);
        Ok(())
    }

    #[test]
    fn reads_store_and_sync_sections() -> Result<()> {
        let temp = TempDir::new()?;
        let config_path = temp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[store]
path = "/tmp/tasks.json"
persist = false

[sync]
optimistic = false
"#,
        )?;

        let config = AppConfig::load(&config_path)?;
        assert_eq!(config.store.path, Some(PathBuf::from("/tmp/tasks.json")));
        assert!(!config.store.persist);
        assert!(!config.sync.optimistic);
        Ok(())
    }

    #[test]
    fn partial_sections_keep_defaults() -> Result<()> {
        let config = AppConfig::from_toml_str("[sync]\n")?;
        assert!(config.sync.optimistic);
        assert!(config.store.persist);
        Ok(())
    }

    #[test]
    fn rejects_directory_as_store_path() -> Result<()> {
        let temp = TempDir::new()?;
        let toml = format!("[store]\npath = {:?}\n", temp.path().display().to_string());
        let err = AppConfig::from_toml_str(&toml).err();
        assert!(err.is_some_and(|err| err.to_string().contains("is a directory")));
        Ok(())
    }

    #[test]
    fn malformed_file_reports_its_path() -> Result<()> {
        let temp = TempDir::new()?;
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "[sync\noptimistic = yes")?;
        let err = AppConfig::load(&config_path).err();
        assert!(err.is_some_and(|err| err.to_string().contains("failed to parse")));
        Ok(())
    }
}
