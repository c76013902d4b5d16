// File: src/config.rs
// Purpose: Configuration parsing from dispatchr.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub actions: ActionsConfig,

    #[serde(default)]
    pub views: ViewsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Directory static files are streamed from
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
}

/// Where actions are resolved from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsConfig {
    /// Directory action identifiers are resolved against (default: "actions")
    #[serde(default = "default_actions_dir")]
    pub dir: String,

    /// Memoize loaded actions by resolved path
    #[serde(default = "default_true")]
    pub cache: bool,
}

/// Template configuration for `Render` bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewsConfig {
    #[serde(default = "default_views_dir")]
    pub dir: String,

    #[serde(default = "default_extension")]
    pub extension: String,
}

// Default values
fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_actions_dir() -> String {
    "actions".to_string()
}

fn default_views_dir() -> String {
    "views".to_string()
}

fn default_extension() -> String {
    "html".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            public_dir: default_public_dir(),
        }
    }
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            dir: default_actions_dir(),
            cache: true,
        }
    }
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            dir: default_views_dir(),
            extension: default_extension(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./dispatchr.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("dispatchr.toml")
    }
}
