use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PaktError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix for managers that need root (sudo, doas, ...)
    pub escalation: String,
    /// Use this manager instead of detecting one from the distro
    pub default_manager: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config { escalation: "sudo".into(), default_manager: None }
    }
}

fn non_empty_env(key: &str) -> Option<PathBuf> {
    std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// `$XDG_CONFIG_HOME/pakt`, falling back to `$HOME/.config/pakt`.
pub fn config_dir() -> Result<PathBuf> {
    non_empty_env("XDG_CONFIG_HOME")
        .or_else(|| non_empty_env("HOME").map(|h| h.join(".config")))
        .map(|d| d.join("pakt"))
        .ok_or_else(|| PaktError::Configuration("neither XDG_CONFIG_HOME nor HOME is set".into()))
}

pub fn store_path(dir: &Path) -> PathBuf {
    dir.join("package.json")
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

/// Missing or unreadable config falls back to defaults.
pub fn load_config(dir: &Path) -> Config {
    let path = config_path(dir);
    match fs::read_to_string(&path) {
        Ok(s) => toml::from_str(&s).unwrap_or_else(|e| {
            log::warn!("ignoring malformed {}: {}", path.display(), e);
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}
