use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::update::github::{FeedConfig, DEFAULT_API_BASE};

pub const CONFIG_FILE_NAME: &str = "launcher.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// GitHub owner of the release repository
    pub owner: String,
    pub repo: String,
    /// User-Agent sent to GitHub
    pub product_name: String,
    /// Release asset holding the application archive
    pub asset_name: String,
    /// Install directory, relative to `base_dir`
    pub app_dir: String,
    pub executable: String,
    /// Defaults to the launcher's own directory
    pub base_dir: Option<PathBuf>,
    pub api_base: String,
    pub timeout_secs: u64,
    /// Install without asking
    pub auto_confirm: bool,
    /// Start the installed copy when an update fails instead of exiting
    pub fallback_on_update_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: "dbraillon".to_string(),
            repo: "Protagoniste".to_string(),
            product_name: "Protagoniste.Launcher".to_string(),
            asset_name: "Protagoniste.zip".to_string(),
            app_dir: "Protagoniste.App".to_string(),
            executable: "Protagoniste.exe".to_string(),
            base_dir: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
            auto_confirm: false,
            fallback_on_update_failure: false,
        }
    }
}

impl Config {
    /// Load from `explicit`, or the first config file found, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        for path in Self::search_paths() {
            if path.exists() {
                tracing::debug!("using config {}", path.display());
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// `launcher.toml` beside the launcher, then the user config directory
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = launcher_dir() {
            paths.push(dir.join(CONFIG_FILE_NAME));
        }
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("app-launcher").join("config.toml"));
        }
        paths
    }

    pub fn base_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => launcher_dir().context("Failed to locate the launcher executable"),
        }
    }

    pub fn install_dir(&self) -> Result<PathBuf> {
        Ok(self.base_dir()?.join(&self.app_dir))
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            api_base: self.api_base.clone(),
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            product_name: self.product_name.clone(),
            asset_name: self.asset_name.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

fn launcher_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()?
        .parent()
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "owner = \"acme\"\nrepo = \"widget\"\nasset_name = \"Widget.zip\"\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.owner, "acme");
        assert_eq!(config.repo, "widget");
        assert_eq!(config.asset_name, "Widget.zip");
        assert_eq!(config.executable, "Protagoniste.exe");
        assert!(!config.auto_confirm);

        let feed = config.feed_config();
        assert_eq!(feed.timeout, Duration::from_secs(5));
        assert_eq!(feed.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "ownr = \"typo\"\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_install_dir_uses_base_dir() {
        let config = Config {
            base_dir: Some(PathBuf::from("/opt/launcher")),
            ..Config::default()
        };
        assert_eq!(
            config.install_dir().unwrap(),
            PathBuf::from("/opt/launcher").join("Protagoniste.App")
        );
    }
}
