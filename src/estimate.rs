//! # Estimate Module
//!
//! Character-based token estimation for transcripts without
//! `message.usage` fields. One pass over the file: classify each line,
//! reset the live-character accumulator at every real compact boundary,
//! then convert characters to tokens with an empirical ratio plus a
//! fixed system-overhead allowance.

use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::classify::{ExclusionRules, classify, content_chars};
use crate::debug::{debug_enabled, debug_log};
use crate::models::LineClass;

/// Empirical ratio calibrated offline against `/context` ground truth
/// (see the `calibrate` binary). Deliberately a compile-time constant.
pub const CHARS_PER_TOKEN: f64 = 3.31;

const DEFAULT_SYSTEM_OVERHEAD_TOKENS: u64 = 21_400;
const DEFAULT_RESERVED_TOKENS: u64 = 0;

/// Tunables for the character estimate, read once per scan instead of
/// probed ambiently at call sites.
#[derive(Debug, Clone, Copy)]
pub struct EstimateConfig {
    pub chars_per_token: f64,
    pub system_overhead_tokens: u64,
    pub reserved_tokens: u64,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        EstimateConfig {
            chars_per_token: CHARS_PER_TOKEN,
            system_overhead_tokens: DEFAULT_SYSTEM_OVERHEAD_TOKENS,
            reserved_tokens: DEFAULT_RESERVED_TOKENS,
        }
    }
}

impl EstimateConfig {
    /// Overhead and reserve are overridable via environment; the ratio is
    /// not. Unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        EstimateConfig {
            chars_per_token: CHARS_PER_TOKEN,
            system_overhead_tokens: parse_env_u64("CLAUDE_CODE_SYSTEM_OVERHEAD")
                .unwrap_or(DEFAULT_SYSTEM_OVERHEAD_TOKENS),
            reserved_tokens: parse_env_u64("CLAUDE_CODE_RESERVED_TOKENS")
                .unwrap_or(DEFAULT_RESERVED_TOKENS),
        }
    }
}

fn parse_env_u64(var: &str) -> Option<u64> {
    env::var(var).ok().and_then(|v| v.trim().parse::<u64>().ok())
}

/// Results from the character scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTranscript {
    /// First sessionId seen in the file.
    pub session_id: String,
    /// Characters of live content (after the last real boundary).
    pub context_chars: u64,
    pub total_file_chars: u64,
    pub boundaries_found: u32,
    pub is_jsonl: bool,
}

fn safe_file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Single-pass character scan.
///
/// Tracks characters before and after the latest boundary simultaneously,
/// so boundary handling and exclusion run in the same loop. A file with
/// zero valid JSON lines degrades to counting its entire raw size:
/// deliberately crude, for non-standard transcript formats.
pub fn parse_transcript(file_path: &Path) -> ParsedTranscript {
    if !file_path.is_file() {
        debug_log("No valid transcript file", "", &file_path.to_string_lossy());
        return ParsedTranscript::default();
    }

    let total_file_chars = safe_file_size(file_path);
    let content = match fs::read_to_string(file_path) {
        Ok(c) => c,
        Err(_) => {
            return ParsedTranscript {
                total_file_chars,
                ..ParsedTranscript::default()
            };
        }
    };

    let rules = ExclusionRules::default();
    let detailed = debug_enabled();
    let path_str = file_path.to_string_lossy();

    let mut session_id = String::new();
    let mut boundary_count: u32 = 0;
    let mut is_jsonl = false;
    let mut chars_before_latest_boundary: u64 = 0;
    let mut chars_after_latest_boundary: u64 = 0;

    let mut type_chars: HashMap<String, u64> = HashMap::new();
    let mut excluded_counts: HashMap<String, u64> = HashMap::new();

    for line in content.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        let data: Value = match serde_json::from_str(stripped) {
            Ok(v) => v,
            Err(_) => continue,
        };
        is_jsonl = true;

        if session_id.is_empty() {
            if let Some(sid) = data.get("sessionId").and_then(Value::as_str) {
                session_id = sid.to_string();
            }
        }

        match classify(&data, &rules) {
            LineClass::CompactBoundary => {
                boundary_count += 1;
                chars_before_latest_boundary += chars_after_latest_boundary;
                chars_after_latest_boundary = 0;
            }
            LineClass::Excluded(reason) => {
                if detailed {
                    *excluded_counts.entry(reason.to_string()).or_insert(0) += 1;
                }
            }
            LineClass::Content => {
                let chars = content_chars(&data) as u64;
                chars_after_latest_boundary += chars;
                if detailed && chars > 0 {
                    let msg_type = data
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown");
                    let role = data
                        .get("message")
                        .and_then(|m| m.get("role"))
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    let key = if role.is_empty() {
                        msg_type.to_string()
                    } else {
                        format!("{msg_type}:{role}")
                    };
                    *type_chars.entry(key).or_insert(0) += chars;
                }
            }
        }
    }

    if !is_jsonl {
        debug_log("File is not JSONL format, using fallback", "", &path_str);
        return ParsedTranscript {
            session_id: String::new(),
            context_chars: total_file_chars,
            total_file_chars,
            boundaries_found: 0,
            is_jsonl: false,
        };
    }

    let context_chars = if boundary_count > 0 {
        chars_after_latest_boundary
    } else {
        chars_before_latest_boundary + chars_after_latest_boundary
    };

    debug_log(
        &format!("Session: {session_id}, boundaries: {boundary_count}"),
        &session_id,
        &path_str,
    );
    debug_log(
        &format!("Message content chars: {context_chars}/{total_file_chars}"),
        &session_id,
        &path_str,
    );
    if detailed {
        for (reason, count) in &excluded_counts {
            debug_log(&format!("  excluded {reason}: {count} lines"), &session_id, &path_str);
        }
        for (key, chars) in &type_chars {
            debug_log(&format!("  {key}: {chars} chars"), &session_id, &path_str);
        }
    }

    ParsedTranscript {
        session_id,
        context_chars,
        total_file_chars,
        boundaries_found: boundary_count,
        is_jsonl: true,
    }
}

/// Convert live characters to an estimated token total. Even an empty
/// session carries the system overhead.
pub fn estimate_total_tokens(transcript: &ParsedTranscript, cfg: &EstimateConfig) -> u64 {
    let conversation = (transcript.context_chars as f64 / cfg.chars_per_token) as u64;
    conversation + cfg.system_overhead_tokens + cfg.reserved_tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn transcript_with(lines: &[serde_json::Value]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn user_line(text: &str) -> serde_json::Value {
        serde_json::json!({
            "type": "user",
            "sessionId": "sess-1",
            "message": {"role": "user", "content": text},
        })
    }

    #[test]
    fn counts_only_live_content_after_last_boundary() {
        let boundary = serde_json::json!({
            "type": "system",
            "subtype": "compact_boundary",
            "compactMetadata": {"trigger": "auto"},
        });
        let with_history = transcript_with(&[
            user_line("ancient history that was summarized away"),
            boundary.clone(),
            user_line("live"),
        ]);
        let fresh = transcript_with(&[boundary, user_line("live")]);

        let a = parse_transcript(with_history.path());
        let b = parse_transcript(fresh.path());
        assert_eq!(a.boundaries_found, 1);
        assert_eq!(a.context_chars, b.context_chars);
    }

    #[test]
    fn no_boundary_counts_everything() {
        let file = transcript_with(&[user_line("one"), user_line("two")]);
        let parsed = parse_transcript(file.path());
        assert_eq!(parsed.boundaries_found, 0);
        let single = parse_transcript(transcript_with(&[user_line("one")]).path());
        assert!(parsed.context_chars > single.context_chars);
    }

    #[test]
    fn excluded_lines_contribute_zero() {
        let base = transcript_with(&[user_line("hello")]);
        let with_noise = transcript_with(&[
            user_line("hello"),
            serde_json::json!({"type": "summary", "summary": "Long UI summary text"}),
            serde_json::json!({"type": "file-history-snapshot", "snapshot": {"big": "blob"},
                               "message": {"role": "user", "content": "should not count"}}),
        ]);
        assert_eq!(
            parse_transcript(base.path()).context_chars,
            parse_transcript(with_noise.path()).context_chars
        );
    }

    #[test]
    fn non_jsonl_file_uses_raw_size() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "this is not json at all\nneither is this").unwrap();
        let parsed = parse_transcript(file.path());
        assert!(!parsed.is_jsonl);
        assert_eq!(parsed.context_chars, parsed.total_file_chars);
        assert!(parsed.context_chars > 0);
    }

    #[test]
    fn empty_file_has_zero_context_chars() {
        let file = NamedTempFile::new().unwrap();
        let parsed = parse_transcript(file.path());
        assert!(!parsed.is_jsonl);
        assert_eq!(parsed.context_chars, 0);
    }

    #[test]
    fn missing_file_is_default() {
        let parsed = parse_transcript(Path::new("/nonexistent/t.jsonl"));
        assert_eq!(parsed, ParsedTranscript::default());
    }

    #[test]
    fn estimate_includes_overhead_even_when_empty() {
        let cfg = EstimateConfig::default();
        let empty = ParsedTranscript::default();
        assert_eq!(estimate_total_tokens(&empty, &cfg), cfg.system_overhead_tokens);

        let some = ParsedTranscript {
            context_chars: 4000,
            ..ParsedTranscript::default()
        };
        let tokens = estimate_total_tokens(&some, &cfg);
        assert_eq!(
            tokens,
            (4000.0 / CHARS_PER_TOKEN) as u64 + cfg.system_overhead_tokens
        );
    }

    #[test]
    #[serial]
    fn env_overrides_overhead_and_reserve() {
        unsafe {
            env::set_var("CLAUDE_CODE_SYSTEM_OVERHEAD", "1000");
            env::set_var("CLAUDE_CODE_RESERVED_TOKENS", "45000");
        }
        let cfg = EstimateConfig::from_env();
        assert_eq!(cfg.system_overhead_tokens, 1000);
        assert_eq!(cfg.reserved_tokens, 45_000);

        unsafe {
            env::set_var("CLAUDE_CODE_SYSTEM_OVERHEAD", "not-a-number");
            env::remove_var("CLAUDE_CODE_RESERVED_TOKENS");
        }
        let cfg = EstimateConfig::from_env();
        assert_eq!(cfg.system_overhead_tokens, DEFAULT_SYSTEM_OVERHEAD_TOKENS);
        assert_eq!(cfg.reserved_tokens, DEFAULT_RESERVED_TOKENS);

        unsafe {
            env::remove_var("CLAUDE_CODE_SYSTEM_OVERHEAD");
        }
    }

    #[test]
    fn image_payload_size_does_not_change_count() {
        let small = transcript_with(&[serde_json::json!({
            "type": "user",
            "message": {"role": "user", "content": [
                {"type": "text", "text": "look at this"},
                {"type": "image", "source": {"type": "base64", "data": "ab"}},
            ]},
        })]);
        let huge = transcript_with(&[serde_json::json!({
            "type": "user",
            "message": {"role": "user", "content": [
                {"type": "text", "text": "look at this"},
                {"type": "image", "source": {"type": "base64", "data": "A".repeat(500_000)}},
            ]},
        })]);
        assert_eq!(
            parse_transcript(small.path()).context_chars,
            parse_transcript(huge.path()).context_chars
        );
    }
}
