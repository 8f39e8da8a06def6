use crate::domain::protocol;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_true(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "smart_bokashi".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Advertised name of the sensor to connect to
    #[serde(default = "default_target_name")]
    pub target_name: String,

    #[serde(default)]
    pub log_settings: LogSettings,

    #[serde(default = "default_false")]
    pub dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_name: default_target_name(),
            log_settings: LogSettings::default(),
            dark_mode: false,
        }
    }
}

fn default_target_name() -> String {
    protocol::TARGET_NAME.to_string()
}

/// Read-only view of the settings file. The app never writes it back.
pub struct SettingsService {
    settings: Settings,
    settings_path: Option<PathBuf>,
}

impl SettingsService {
    /// Load from the user config directory, falling back to defaults when the
    /// file is missing or unreadable
    pub fn load() -> Self {
        let settings_path = Self::get_settings_path();
        let settings = settings_path
            .as_deref()
            .and_then(|path| Self::load_from_file(path).ok())
            .unwrap_or_default();

        Self {
            settings,
            settings_path,
        }
    }

    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings,
            settings_path: None,
        }
    }

    fn get_settings_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("SmartBokashi");
        path.push("settings.json");
        Some(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Settings> {
        let settings = serde_json::from_str(contents)?;
        Ok(settings)
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }
}
