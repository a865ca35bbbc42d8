//! Configuration File Loading
//!
//! Handles loading and saving client configuration files from standard
//! locations with TOML and JSON support and a defaults fallback.

use super::{ClientConfig, ConfigError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configuration search path
const CONFIG_PATH_ENV: &str = "PROMPTLINE_CONFIG";

/// Configuration file loader
pub struct ConfigLoader {
    /// Search paths for configuration files
    search_paths: Vec<PathBuf>,
    /// Current configuration file path (if loaded)
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Whether to fall back to defaults if no file exists
    pub fallback_to_default: bool,
    /// Whether to validate configuration after loading
    pub validate: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            fallback_to_default: true,
            validate: true,
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            search_paths: Self::search_paths(),
            current_path: None,
        }
    }

    /// Load configuration with default options
    pub fn load() -> Result<ClientConfig, ConfigError> {
        Self::load_with_options(LoadOptions::default())
    }

    /// Load configuration with custom options
    pub fn load_with_options(options: LoadOptions) -> Result<ClientConfig, ConfigError> {
        let mut loader = Self::new();

        if let Some((path, config)) = loader.find_and_load()? {
            info!("Configuration loaded from {}", path.display());
            loader.current_path = Some(path);

            if options.validate {
                config.validate()?;
            }
            return Ok(config);
        }

        if options.fallback_to_default {
            debug!("No configuration file found, using defaults");
            Ok(ClientConfig::default())
        } else {
            Err(ConfigError::NotFound)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<ClientConfig, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content, Self::format_for(path)?)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path, format chosen by extension
    pub fn save_to_path(config: &ClientConfig, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = match Self::format_for(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(config)
                .map_err(|e| ConfigError::Parse(e.to_string()))?,
            ConfigFormat::Json => serde_json::to_string_pretty(config)
                .map_err(|e| ConfigError::Parse(e.to_string()))?,
        };

        fs::write(path, content)?;
        Ok(())
    }

    /// Path the configuration was loaded from, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    fn find_and_load(&self) -> Result<Option<(PathBuf, ClientConfig)>, ConfigError> {
        for path in &self.search_paths {
            if !path.exists() {
                continue;
            }
            let content = fs::read_to_string(path)?;
            let config = Self::parse(&content, Self::format_for(path)?)?;
            return Ok(Some((path.clone(), config)));
        }
        Ok(None)
    }

    fn parse(content: &str, format: ConfigFormat) -> Result<ClientConfig, ConfigError> {
        match format {
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
        }
    }

    fn format_for(path: &Path) -> Result<ConfigFormat, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") | None => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(explicit) = env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(explicit));
        }

        paths.push(PathBuf::from("promptline.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("promptline").join("config.toml"));
            paths.push(config_dir.join("promptline").join("config.json"));
        }

        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
