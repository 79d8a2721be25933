//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name the external book build writes the search payload to
pub const DEFAULT_INDEX_FILE: &str = "lunr-pretext-search-index.js";

/// File name of the dark-theme script inside the built site
pub const DEFAULT_THEME_SCRIPT: &str = "force-dark.js";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Main configuration struct matching the zettel.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    pub paths: PathsConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub theme: ThemeConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the built HTML site
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Payload file, relative to the output directory
    #[serde(default = "default_index")]
    pub index: PathBuf,

    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_index() -> PathBuf {
    PathBuf::from(DEFAULT_INDEX_FILE)
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Script path, relative to the output directory
    #[serde(default = "default_script")]
    pub script: PathBuf,

    /// Add the script tag to every page on install
    #[serde(default = "default_true")]
    pub inject: bool,
}

fn default_script() -> PathBuf {
    PathBuf::from(DEFAULT_THEME_SCRIPT)
}

fn default_true() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index: default_index(),
            limit: default_limit(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            script: default_script(),
            inject: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse configuration from YAML text (paths resolve against the working directory)
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        if config.paths.output.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("paths.output".into()));
        }
        Ok(config)
    }

    /// Configuration for a built site at `output` with every other value defaulted
    pub fn default_for(output: impl Into<PathBuf>) -> Self {
        Self {
            site: SiteConfig::default(),
            paths: PathsConfig {
                output: output.into(),
            },
            search: SearchConfig::default(),
            theme: ThemeConfig::default(),
            config_path: None,
        }
    }

    /// Load the config file if it exists, otherwise fall back to `default_for(".")`
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {:?}; using defaults", path);
            Ok(Self::default_for("."))
        }
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Location of the search payload inside the output directory
    pub fn index_path(&self) -> PathBuf {
        self.output_dir().join(&self.search.index)
    }

    /// Location of the theme script inside the output directory
    pub fn theme_script_path(&self) -> PathBuf {
        self.output_dir().join(&self.theme.script)
    }

    /// Script `src` as pages reference it (forward slashes, relative to the site root)
    pub fn theme_script_src(&self) -> String {
        self.theme
            .script
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }

    /// Get a nested config value using dotted path (e.g., "search.limit")
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["site", "title"] => Some(self.site.title.clone()),
            ["paths", "output"] => Some(self.paths.output.display().to_string()),
            ["search", "index"] => Some(self.search.index.display().to_string()),
            ["search", "limit"] => Some(self.search.limit.to_string()),
            ["theme", "script"] => Some(self.theme.script.display().to_string()),
            ["theme", "inject"] => Some(self.theme.inject.to_string()),
            _ => None,
        }
    }
}
