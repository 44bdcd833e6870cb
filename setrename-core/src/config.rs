use crate::engine::MatchMode;
use crate::media::SUPPORTED_EXTENSIONS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".setrename";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Folders kept in sync with the primary folder
    #[serde(default)]
    pub synced_folders: Vec<PathBuf>,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default output format: "summary" or "json"
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// How set members are located: "identifier" or "direct"
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Whether to use color output by default (None = auto-detect)
    #[serde(default)]
    pub use_color: Option<bool>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_format: default_output_format(),
            match_mode: MatchMode::default(),
            use_color: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// File extensions offered for grouping (case-insensitive)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn default_output_format() -> String {
    "summary".to_string()
}

fn default_extensions() -> Vec<String> {
    SUPPORTED_EXTENSIONS.iter().map(ToString::to_string).collect()
}

impl Config {
    /// Load config from .setrename/config.toml, then the user config directory
    pub fn load() -> Result<Self> {
        if let Ok(cwd) = std::env::current_dir() {
            let config_path = cwd.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Self::load_from_path(&config_path);
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("setrename").join(CONFIG_FILE);
            if config_path.exists() {
                return Self::load_from_path(&config_path);
            }
        }

        // Return default config if no config file exists
        Ok(Self::default())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
