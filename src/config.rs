//! Configuration management
//!
//! Manages where the soul file lives, reflection defaults, the dashboard
//! server and the local model server.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Soul file settings
    #[serde(default)]
    pub soul: SoulConfig,
    /// Dashboard server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Local model server settings
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Lead generation settings
    #[serde(default)]
    pub leads: LeadsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoulConfig {
    /// Path of the persisted soul file
    #[serde(default = "default_soul_path")]
    pub path: PathBuf,
    /// Days of feedback a reflection cycle looks at
    #[serde(default = "default_reflection_window")]
    pub reflection_window_days: i64,
    /// Keep a `.corrupt` copy of unreadable soul files
    #[serde(default = "default_true")]
    pub backup_corrupt: bool,
}

fn default_soul_path() -> PathBuf {
    data_dir()
        .map(|dir| dir.join("soul_file.json"))
        .unwrap_or_else(|_| PathBuf::from("config").join("soul_file.json"))
}

fn default_reflection_window() -> i64 {
    7
}

fn default_true() -> bool {
    true
}

impl Default for SoulConfig {
    fn default() -> Self {
        Self {
            path: default_soul_path(),
            reflection_window_days: default_reflection_window(),
            backup_corrupt: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_ollama_timeout")]
    pub timeout_secs: u64,
}

fn default_ollama_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_ollama_model() -> String {
    "mistral:latest".to_string()
}

fn default_ollama_timeout() -> u64 {
    60
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
            timeout_secs: default_ollama_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadsConfig {
    /// Leads generated when no count is given
    #[serde(default = "default_lead_count")]
    pub default_count: usize,
}

fn default_lead_count() -> usize {
    5
}

impl Default for LeadsConfig {
    fn default() -> Self {
        Self {
            default_count: default_lead_count(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load configuration from `path`, writing defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "icp-architect", "icp-architect")
        .context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config(config: &Config, path: &Path) -> Result<()> {
    println!("Configuration ({})", path.display());
    println!("  Soul file:          {}", config.soul.path.display());
    println!("  Reflection window:  {} days", config.soul.reflection_window_days);
    println!(
        "  Corrupt backups:    {}",
        if config.soul.backup_corrupt { "Enabled" } else { "Disabled" }
    );
    println!("  Dashboard:          http://{}:{}", config.server.host, config.server.port);
    println!("  Model server:       {} ({})", config.ollama.base_url, config.ollama.model);
    println!("  Default lead count: {}", config.leads.default_count);
    Ok(())
}
