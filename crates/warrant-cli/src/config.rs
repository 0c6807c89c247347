// ABOUTME: Configuration management for the warrant CLI
// ABOUTME: TOML config with first-run sample creation at ~/.config/warrant

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One target server the user can open a session to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Display name in the menu.
    pub name: String,
    /// Host to connect to.
    pub host: String,
    /// Login user.
    pub user: String,
}

/// Warrant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarrantConfig {
    /// Identity authority base URL.
    pub authority: String,

    /// Private key path; `~` is expanded.
    pub key_path: String,

    /// Command to launch for an interactive SSH session.
    pub ssh_command: String,

    /// Argument template for the SSH command ({user}/{host} placeholders).
    pub ssh_args: String,

    /// Command to launch for the SFTP browser.
    pub sftp_command: String,

    /// Argument template for the SFTP command ({user}/{host} placeholders).
    pub sftp_args: String,

    /// Servers offered in the menu.
    pub servers: Vec<ServerEntry>,
}

impl Default for WarrantConfig {
    fn default() -> Self {
        Self {
            authority: "https://zero.example.com".to_string(),
            key_path: "~/.ssh/id_ed25519".to_string(),
            ssh_command: "ssh".to_string(),
            ssh_args: "{user}@{host}".to_string(),
            sftp_command: "sftp".to_string(),
            sftp_args: "{user}@{host}".to_string(),
            servers: vec![ServerEntry {
                name: "AppServer".to_string(),
                host: "10.1.10.15".to_string(),
                user: "deployer".to_string(),
            }],
        }
    }
}

impl WarrantConfig {
    /// Returns the config directory path (~/.config/warrant)
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("warrant"))
    }

    /// Returns the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads the configuration, writing a sample on first run.
    ///
    /// Returns `None` after creating the sample: the user is expected to
    /// edit it (at least the authority address) before anything can work.
    pub fn load_or_init() -> Result<Option<Self>> {
        let path = Self::config_path()?;
        if !path.exists() {
            Self::default().save_to(&path)?;
            println!("Config created: {}", path.display());
            println!("Edit the config and run warrant again.");
            return Ok(None);
        }
        Ok(Some(Self::load_from(&path)?))
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Saves configuration to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")
    }

    /// Finds a server entry by its menu name, case-insensitively.
    pub fn find_server(&self, name: &str) -> Option<&ServerEntry> {
        self.servers
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}
