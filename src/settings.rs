//! # Settings Module
//!
//! Read-modify-write of Claude Code's `settings.json` for the install
//! tooling. Writes are preceded by a timestamped backup whenever the file
//! already exists.

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};

const STATUSLINE_COMMAND: &str = "claude-code-statusline";

pub fn settings_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".claude").join("settings.json"))
}

/// Missing or malformed settings read as an empty object.
pub fn read_settings(path: &Path) -> Map<String, Value> {
    let Ok(raw) = fs::read_to_string(path) else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Write settings, optionally backing up the existing file first. Returns
/// the backup path when one was created.
pub fn write_settings(
    path: &Path,
    settings: &Map<String, Value>,
    backup: bool,
) -> Result<Option<PathBuf>> {
    let dir = path.parent().context("settings path has no parent")?;
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let mut backup_path = None;
    if backup && path.exists() {
        let stamped = path.with_file_name(format!(
            "settings.json.backup.{}",
            chrono::Utc::now().timestamp()
        ));
        fs::copy(path, &stamped).with_context(|| format!("back up to {}", stamped.display()))?;
        backup_path = Some(stamped);
    }

    let mut serialized = serde_json::to_string_pretty(&Value::Object(settings.clone()))?;
    serialized.push('\n');
    fs::write(path, serialized).with_context(|| format!("write {}", path.display()))?;
    Ok(backup_path)
}

pub fn statusline_entry() -> Value {
    json!({
        "type": "command",
        "command": STATUSLINE_COMMAND,
        "padding": 0,
    })
}

/// Add or replace the statusLine block. Returns the backup path when the
/// previous configuration was preserved.
pub fn configure_statusline(path: &Path) -> Result<Option<PathBuf>> {
    let mut settings = read_settings(path);
    let had_existing = settings.contains_key("statusLine");
    settings.insert("statusLine".to_string(), statusline_entry());
    write_settings(path, &settings, had_existing)
}

/// Remove the statusLine block. Returns false when nothing was configured.
pub fn remove_statusline(path: &Path) -> Result<bool> {
    let mut settings = read_settings(path);
    if settings.remove("statusLine").is_none() {
        return Ok(false);
    }
    write_settings(path, &settings, true)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_creates_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let backup = configure_statusline(&path).unwrap();
        assert!(backup.is_none());

        let settings = read_settings(&path);
        assert_eq!(settings["statusLine"]["command"], STATUSLINE_COMMAND);
        assert_eq!(settings["statusLine"]["padding"], 0);
    }

    #[test]
    fn configure_backs_up_existing_statusline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"statusLine": {"type": "command", "command": "other"}, "theme": "dark"}"#,
        )
        .unwrap();

        let backup = configure_statusline(&path).unwrap();
        let backup = backup.expect("backup created for existing config");
        assert!(backup.exists());

        // Unrelated keys survive the rewrite
        let settings = read_settings(&path);
        assert_eq!(settings["theme"], "dark");
        assert_eq!(settings["statusLine"]["command"], STATUSLINE_COMMAND);
    }

    #[test]
    fn remove_reports_absent_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        assert!(!remove_statusline(&path).unwrap());

        configure_statusline(&path).unwrap();
        assert!(remove_statusline(&path).unwrap());
        assert!(!read_settings(&path).contains_key("statusLine"));
    }

    #[test]
    fn malformed_settings_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(read_settings(&path).is_empty());
    }
}
