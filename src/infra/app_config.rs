use crate::diff::model::DEFAULT_CACHE_CAPACITY;
use crate::diff::window::DEFAULT_CONTEXT_LINES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides where change records are stored.
    pub data_dir: Option<PathBuf>,
    /// Overrides where agent session logs are searched.
    pub sessions_dir: Option<PathBuf>,
    pub context_lines: usize,
    pub show_full_file: bool,
    pub model_cache_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sessions_dir: None,
            context_lines: DEFAULT_CONTEXT_LINES,
            show_full_file: false,
            model_cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn change_records_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(app_data_dir)
            .join("change-records")
    }

    /// Per-session prompt commit records used to backfill missing content.
    pub fn git_records_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(app_data_dir)
            .join("git-records")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.sessions_dir
            .clone()
            .unwrap_or_else(|| agent_home_dir().join("sessions"))
    }
}

pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> AppConfig {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return AppConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Ignoring malformed config {}: {}", path.display(), err);
            AppConfig::default()
        }
    }
}

pub fn save_config(config: &AppConfig) -> std::io::Result<()> {
    save_config_to(&config_path(), config)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config).map_err(std::io::Error::other)?;
    std::fs::write(path, contents)
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("CHANGELENS_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    app_data_dir().join("config.toml")
}

fn agent_home_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("CODEX_HOME") {
        return PathBuf::from(path);
    }
    home::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".codex")
}

fn app_data_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("CHANGELENS_DATA_HOME") {
        return PathBuf::from(path);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("changelens")
}
