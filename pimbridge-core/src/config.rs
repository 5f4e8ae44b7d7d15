//! pimbridge configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::DEFAULT_HASH_WINDOW_DAYS;
use crate::error::{BridgeError, BridgeResult};

static DEFAULT_STORE_DIR: &str = "~/.pimbridge";

fn default_store_dir() -> String {
    DEFAULT_STORE_DIR.to_string()
}

fn default_hash_window_days() -> i64 {
    DEFAULT_HASH_WINDOW_DAYS
}

/// Configuration at ~/.config/pimbridge/config.toml, overridable with
/// `PIMBRIDGE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    /// Root of the record store. `~` is expanded.
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Default reach of event hash listings, in days either side of now.
    #[serde(default = "default_hash_window_days")]
    pub hash_window_days: i64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            store_dir: default_store_dir(),
            hash_window_days: default_hash_window_days(),
        }
    }
}

impl BridgeConfig {
    pub fn config_path() -> BridgeResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BridgeError::Config("Could not determine config directory".into()))?
            .join("pimbridge");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location. A missing file means defaults.
    pub fn load() -> BridgeResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> BridgeResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("PIMBRIDGE"))
            .build()
            .map_err(|e| BridgeError::Config(e.to_string()))?;

        let loaded: BridgeConfig = settings
            .try_deserialize()
            .map_err(|e| BridgeError::Config(e.to_string()))?;

        if loaded.hash_window_days < 0 {
            return Err(BridgeError::Config(format!(
                "hash_window_days must not be negative, got {}",
                loaded.hash_window_days
            )));
        }

        Ok(loaded)
    }

    /// The store root with `~` and environment variables expanded.
    pub fn store_path(&self) -> BridgeResult<PathBuf> {
        let expanded = shellexpand::full(&self.store_dir)
            .map_err(|e| BridgeError::Config(format!("Could not expand store_dir: {e}")))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }

    /// Create a config file with every option commented out.
    pub fn create_default_config(path: &Path) -> BridgeResult<()> {
        let contents = format!(
            "\
# pimbridge configuration

# Where records are stored:
# store_dir = \"{}\"

# Days either side of today covered by `pimbridge hashes events`:
# hash_window_days = {}
",
            DEFAULT_STORE_DIR, DEFAULT_HASH_WINDOW_DAYS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BridgeError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| BridgeError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.hash_window_days, DEFAULT_HASH_WINDOW_DAYS);
    }

    #[test]
    fn test_file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "store_dir = \"/srv/pim\"\nhash_window_days = 30\n").unwrap();

        let config = BridgeConfig::load_from(&path).unwrap();
        assert_eq!(config.store_dir, "/srv/pim");
        assert_eq!(config.hash_window_days, 30);
        assert_eq!(config.store_path().unwrap(), PathBuf::from("/srv/pim"));
    }

    #[test]
    fn test_default_config_file_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        BridgeConfig::create_default_config(&path).unwrap();

        let config = BridgeConfig::load_from(&path).unwrap();
        assert_eq!(config.hash_window_days, DEFAULT_HASH_WINDOW_DAYS);
    }
}
