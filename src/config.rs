use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::events::Company;

/// Default backend deployment. Overridable via config file or
/// the FINCHAT_ENDPOINT environment variable.
pub const DEFAULT_ENDPOINT: &str = "https://scalo-technologies-assingment-backe.vercel.app/ask";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend endpoint answering questions
    pub endpoint: String,

    /// Company selected when the app starts
    pub default_company: Company,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,

    /// Finchat home directory
    pub finchat_home: PathBuf,

    /// Saved transcripts directory
    pub transcripts_dir: PathBuf,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub show_timestamps: bool,
    pub max_history: usize,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
        let finchat_home = home.join(".finchat");
        let transcripts_dir = finchat_home.join("transcripts");

        Config {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_company: Company::Bajaj,
            request_timeout_secs: 60,
            finchat_home,
            transcripts_dir,
            ui: UiConfig {
                show_timestamps: true,
                max_history: 200,
            },
        }
    }
}

impl Config {
    /// Load configuration from `~/.finchat/config.toml`, creating the
    /// home directory if needed.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let finchat_home = home.join(".finchat");
        Self::load_from(&finchat_home)
    }

    /// Load configuration rooted at an explicit home directory.
    pub fn load_from(finchat_home: &Path) -> Result<Self> {
        fs::create_dir_all(finchat_home).context("Failed to create .finchat directory")?;

        let config_path = finchat_home.join("config.toml");
        let mut config = if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        // Paths always follow the home we were given, even when the
        // file carries stale ones.
        config.finchat_home = finchat_home.to_path_buf();
        config.transcripts_dir = finchat_home.join("transcripts");

        // First run: persist the defaults so users have a file to edit.
        if !config_path.exists() {
            config.save()?;
        }

        if let Ok(endpoint) = std::env::var("FINCHAT_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                config.endpoint = endpoint;
            }
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.finchat_home)
            .context("Failed to create .finchat directory")?;
        let config_path = self.finchat_home.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_point_at_backend() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.default_company, Company::Bajaj);
        assert!(config.ui.max_history > 0);
    }

    #[test]
    fn missing_file_yields_defaults_with_given_home() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join(".finchat");
        let config = Config::load_from(&home).unwrap();
        assert_eq!(config.finchat_home, home);
        assert_eq!(config.transcripts_dir, home.join("transcripts"));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        // First load writes the defaults out.
        assert!(home.join("config.toml").exists());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join(".finchat");

        let mut config = Config::load_from(&home).unwrap();
        config.endpoint = "http://localhost:9999/ask".to_string();
        config.default_company = Company::Axis;
        config.ui.show_timestamps = false;
        config.save().unwrap();

        let reloaded = Config::load_from(&home).unwrap();
        assert_eq!(reloaded.endpoint, "http://localhost:9999/ask");
        assert_eq!(reloaded.default_company, Company::Axis);
        assert!(!reloaded.ui.show_timestamps);
    }
}
