//! # Config Module
//!
//! Widget layout configuration. A TOML file lists widget instances in
//! display order; missing or invalid files fall back to the built-in
//! default layout so the statusline always renders something.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

/// One widget instance in the status line.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WidgetConfig {
    #[serde(rename = "type")]
    pub widget_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl WidgetConfig {
    fn new(widget_type: &str) -> Self {
        WidgetConfig {
            widget_type: widget_type.to_string(),
            color: None,
            bold: false,
            metadata: BTreeMap::new(),
        }
    }

    fn colored(widget_type: &str, color: &str) -> Self {
        WidgetConfig {
            color: Some(color.to_string()),
            ..Self::new(widget_type)
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatusLineConfig {
    pub version: u32,
    #[serde(default)]
    pub widgets: Vec<WidgetConfig>,
}

pub fn default_config() -> StatusLineConfig {
    let sep = WidgetConfig::new("separator");
    StatusLineConfig {
        version: 1,
        widgets: vec![
            WidgetConfig::colored("model", "cyan"),
            sep.clone(),
            WidgetConfig::colored("directory", "blue"),
            sep.clone(),
            WidgetConfig::colored("git-branch", "magenta"),
            sep.clone(),
            WidgetConfig::new("context-percentage"),
            sep.clone(),
            WidgetConfig::new("cost"),
            sep.clone(),
            WidgetConfig::new("lines-changed"),
            sep.clone(),
            WidgetConfig::new("session-id"),
            sep.clone(),
            WidgetConfig::new("session-clock"),
            sep,
            WidgetConfig::colored("subscription", "cyan"),
        ],
    }
}

pub fn config_dir() -> PathBuf {
    let base = env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| directories::BaseDirs::new().map(|b| b.config_dir().to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("claude-statusline")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Widget types present in the defaults but absent from a user config.
pub fn missing_widgets(config: &StatusLineConfig) -> Vec<String> {
    let user: Vec<&str> = config
        .widgets
        .iter()
        .map(|w| w.widget_type.as_str())
        .collect();
    let mut missing: Vec<String> = default_config()
        .widgets
        .iter()
        .map(|w| w.widget_type.as_str())
        .filter(|t| *t != "separator" && !user.contains(t))
        .map(String::from)
        .collect();
    missing.sort();
    missing.dedup();
    missing
}

/// Load the layout. Creates the file with defaults on first run; falls
/// back to defaults with a stderr warning when the file is unreadable or
/// invalid.
pub fn load_config() -> StatusLineConfig {
    let path = config_path();

    if !path.exists() {
        let config = default_config();
        let _ = save_config(&config);
        return config;
    }

    let raw = match fs::read_to_string(&path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Warning: failed to read config from {}: {e}", path.display());
            return default_config();
        }
    };

    match toml::from_str::<StatusLineConfig>(&raw) {
        Ok(config) => {
            let missing = missing_widgets(&config);
            if !missing.is_empty() {
                eprintln!(
                    "Warning: config is missing widgets from defaults: {}. \
                     Delete {} to regenerate.",
                    missing.join(", "),
                    path.display()
                );
            }
            config
        }
        Err(e) => {
            eprintln!("Warning: invalid config at {}: {e}", path.display());
            eprintln!("Using default configuration.");
            default_config()
        }
    }
}

pub fn save_config(config: &StatusLineConfig) -> anyhow::Result<()> {
    let path = config_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let serialized = toml::to_string_pretty(config)?;
    fs::write(&path, serialized)?;
    Ok(())
}
