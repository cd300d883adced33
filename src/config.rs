//! Viewer configuration (`.folio/config.json` under the system cache dir).
//!
//! Loaded once at startup; a missing or malformed file falls back to
//! defaults with a logged warning.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const SETTINGS_DIR: &str = ".folio";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Page size the text engine paginates at.
    #[serde(default = "default_lines_per_page")]
    pub lines_per_page: usize,
    /// Mode the viewer falls back to when a transient tool finishes.
    #[serde(default = "default_mode")]
    pub default_mode: String,
    /// Tool plugin ids left unregistered at startup.
    #[serde(default)]
    pub disabled_plugins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lines_per_page: default_lines_per_page(),
            default_mode: default_mode(),
            disabled_plugins: Vec::new(),
        }
    }
}

fn default_lines_per_page() -> usize {
    crate::engine::file::DEFAULT_LINES_PER_PAGE
}

fn default_mode() -> String {
    crate::kernel::interaction::DEFAULT_MODE.to_string()
}

pub fn folio_dir() -> Option<PathBuf> {
    get_cache_dir().map(|dir| dir.join(SETTINGS_DIR))
}

pub fn get_config_path() -> Option<PathBuf> {
    folio_dir().map(|dir| dir.join(CONFIG_FILE))
}

pub fn ensure_config_file() -> std::io::Result<PathBuf> {
    let path = get_config_path().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Cannot determine config directory",
        )
    })?;
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if !path.exists() {
        let content = serde_json::to_string_pretty(&Config::default())
            .unwrap_or_else(|_| "{}".to_string());
        std::fs::write(&path, content)?;
    }
    Ok(path)
}

pub fn load_config() -> Config {
    let Some(path) = get_config_path() else {
        return Config::default();
    };
    let Ok(data) = std::fs::read_to_string(&path) else {
        return Config::default();
    };
    parse_config(&data).unwrap_or_else(|| {
        tracing::warn!(path = %path.display(), "malformed config, using defaults");
        Config::default()
    })
}

fn parse_config(data: &str) -> Option<Config> {
    serde_json::from_str(data).ok()
}

fn get_cache_dir() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Caches"));
    }
    if cfg!(windows) {
        return std::env::var("LOCALAPPDATA").ok().map(PathBuf::from);
    }
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg));
        }
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".cache"))
}
