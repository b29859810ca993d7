//! # Debug Module
//!
//! Env-gated per-session breakdown logs. Pure side channel: nothing here
//! ever feeds back into computed output.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

pub fn debug_enabled() -> bool {
    std::env::var("CLAUDE_CODE_STATUSLINE_DEBUG")
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}

fn logs_dir() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().join(".claude").join("statusline-logs"))
}

/// Derive a session id from a transcript filename when none was supplied.
pub fn session_id_from_path(transcript_path: &str) -> Option<String> {
    let name = Path::new(transcript_path).file_name()?.to_str()?;
    let stem = name.strip_suffix(".jsonl")?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

/// Append one line to the per-session debug log. Falls back to stderr when
/// the log file cannot be written; silently a no-op when debugging is off.
pub fn debug_log(message: &str, session_id: &str, transcript_path: &str) {
    if !debug_enabled() {
        return;
    }

    let effective = if !session_id.is_empty() {
        session_id.to_string()
    } else {
        session_id_from_path(transcript_path).unwrap_or_else(|| "unknown".to_string())
    };

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let prefix = if session_id.is_empty() {
        String::new()
    } else {
        format!("[{session_id}] ")
    };
    let line = format!("[{timestamp}] {prefix}{message}\n");

    let written = logs_dir().is_some_and(|dir| {
        if fs::create_dir_all(&dir).is_err() {
            return false;
        }
        let log_file = dir.join(format!("statusline_debug_{effective}.log"));
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .and_then(|mut f| f.write_all(line.as_bytes()))
            .is_ok()
    });

    if !written {
        eprintln!("DEBUG: {prefix}{message}");
    }
}
