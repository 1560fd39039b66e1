// Configuration file loading

use super::{AppConfig, ConfigMerger, PartialConfig};
use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Config loader
pub struct ConfigLoader {
    /// Global config path (`<config dir>/aiuml/config.toml`)
    global_path: Option<PathBuf>,
    /// Config file named on the command line
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            global_path: Self::get_global_config_path(),
            explicit_path: None,
        }
    }

    /// Loader that ignores the user's global file
    pub fn without_global() -> Self {
        Self {
            global_path: None,
            explicit_path: None,
        }
    }

    /// Set an explicit config file, which must exist
    pub fn with_explicit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    /// Get the global config path
    fn get_global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aiuml").join("config.toml"))
    }

    /// Load global config
    pub fn load_global(&self) -> Result<Option<PartialConfig>> {
        if let Some(ref path) = self.global_path {
            self.load_from_path(path)
        } else {
            Ok(None)
        }
    }

    /// Load the explicit config file
    pub fn load_explicit(&self) -> Result<Option<PartialConfig>> {
        match self.explicit_path {
            Some(ref path) if !path.exists() => Err(anyhow!(
                "Config file '{}' does not exist",
                path.display()
            )),
            Some(ref path) => self.load_from_path(path),
            None => Ok(None),
        }
    }

    /// Load config from a specific path, keeping only the keys it sets
    pub fn load_from_path(&self, path: &Path) -> Result<Option<PartialConfig>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: PartialConfig = toml::from_str(&contents)
            .map_err(|e| anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;

        ConfigMerger::apply(&AppConfig::default(), &config)
            .validate()
            .map_err(|e| anyhow!("Invalid config file '{}': {}", path.display(), e))?;

        log::debug!("Loaded config from: {}", path.display());
        Ok(Some(config))
    }

    /// Get the global config path
    pub fn global_config_path(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
