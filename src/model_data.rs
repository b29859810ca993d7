//! # Model Data Module
//!
//! Context-limit lookup for the current model: builtin table for known
//! families, with a week-long on-disk cache of the litellm model catalog
//! for everything else. Network errors always degrade to the builtin
//! table; concurrent invocations may race to refresh the cache file, and
//! the overwrite is idempotent.

use serde_json::Value;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

const CACHE_FILE_NAME: &str = "claude_code_model_data_cache.json";
const CACHE_TTL_SECONDS: u64 = 604_800; // 1 week
const FETCH_TIMEOUT_SECS: u64 = 5;
const MODEL_DATA_URL: &str =
    "https://raw.githubusercontent.com/BerriAI/litellm/main/model_prices_and_context_window.json";

pub const DEFAULT_CONTEXT_LIMIT: u64 = 200_000;

/// Known models checked before any catalog lookup. Kept short on purpose;
/// unknown ids go through the cached catalog.
const MODEL_LIMITS: &[(&str, u64)] = &[
    ("claude", 200_000),
    ("claude-sonnet-4", 200_000),
    ("claude-sonnet-4-20250514", 200_000),
    ("claude-sonnet-4-20250514[1m]", 1_000_000),
    ("claude-sonnet-4-5-20250929", 200_000),
    ("claude-sonnet-4-5-20250929[1m]", 1_000_000),
    ("claude-opus-4", 200_000),
    ("claude-opus-4.1", 200_000),
    ("claude-opus-4-1", 200_000),
    ("claude-opus-4-1-20250805", 200_000),
    ("claude-opus-4.5", 200_000),
    ("claude-opus-4-5", 200_000),
    ("claude-opus-4-5-20251101", 200_000),
    ("gemini", 1_000_000),
    ("gpt-4", 8_192),
    ("gpt-4-32k", 32_768),
    ("gpt-4-turbo", 128_000),
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
    ("gpt-5", 400_000),
];

/// Catalog cache with an injected location and clock, passed by reference
/// to whatever needs a limit lookup. No ambient globals.
pub struct ModelDataCache {
    cache_path: PathBuf,
    ttl: Duration,
    clock: fn() -> SystemTime,
}

impl Default for ModelDataCache {
    fn default() -> Self {
        ModelDataCache {
            cache_path: env::temp_dir().join(CACHE_FILE_NAME),
            ttl: Duration::from_secs(CACHE_TTL_SECONDS),
            clock: SystemTime::now,
        }
    }
}

impl ModelDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache_path: PathBuf, ttl: Duration, clock: fn() -> SystemTime) -> Self {
        ModelDataCache {
            cache_path,
            ttl,
            clock,
        }
    }

    fn is_fresh(&self) -> bool {
        let Ok(meta) = fs::metadata(&self.cache_path) else {
            return false;
        };
        let Ok(modified) = meta.modified() else {
            return false;
        };
        match (self.clock)().duration_since(modified) {
            Ok(age) => age <= self.ttl,
            // Cache file from the future: treat as fresh
            Err(_) => true,
        }
    }

    fn read_cache(&self) -> Option<Value> {
        if !self.is_fresh() {
            return None;
        }
        let raw = fs::read_to_string(&self.cache_path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn fetch_remote(&self) -> Option<Value> {
        let agent = ureq::AgentBuilder::new()
            .timeout_read(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .timeout_write(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build();
        let response = agent.get(MODEL_DATA_URL).call().ok()?;
        if response.status() != 200 {
            return None;
        }
        let data: Value = response.into_json().ok()?;
        if let Ok(serialized) = serde_json::to_string(&data) {
            let _ = fs::write(&self.cache_path, serialized);
        }
        Some(data)
    }

    /// Warm the cache when stale. Safe to call from a worker thread; the
    /// result is discarded and the next lookup reads the file.
    pub fn prefetch(&self) {
        if !self.is_fresh() {
            let _ = self.fetch_remote();
        }
    }

    fn catalog(&self) -> Option<Value> {
        self.read_cache().or_else(|| self.fetch_remote())
    }

    /// Context limit for the model. Lookup order: env override, 1M
    /// markers, builtin table, cached/fetched catalog, builtin default.
    pub fn context_limit(&self, model_id: &str, display_name: &str) -> u64 {
        if let Some(v) = env::var("CLAUDE_CONTEXT_LIMIT")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            return v;
        }
        if model_id.is_empty() {
            return DEFAULT_CONTEXT_LIMIT;
        }

        let model_lower = model_id.to_lowercase();
        if model_lower.contains("[1m]") || display_name.to_lowercase().contains("1m") {
            return 1_000_000;
        }

        if let Some(limit) = builtin_limit(&model_lower) {
            return limit;
        }

        if let Some(catalog) = self.catalog() {
            if let Some(limit) = catalog_limit(&catalog, model_id, &model_lower) {
                return limit;
            }
        }

        DEFAULT_CONTEXT_LIMIT
    }
}

fn builtin_limit(model_lower: &str) -> Option<u64> {
    if let Some((_, limit)) = MODEL_LIMITS.iter().find(|(k, _)| *k == model_lower) {
        return Some(*limit);
    }
    // Longest key first so "claude-opus-4-1" beats "claude-opus-4"
    let mut keys: Vec<&(&str, u64)> = MODEL_LIMITS.iter().collect();
    keys.sort_by_key(|(k, _)| std::cmp::Reverse(k.len()));
    keys.iter()
        .find(|(k, _)| model_lower.contains(k) || k.contains(model_lower))
        .map(|(_, limit)| *limit)
}

fn extract_token_limit(model_info: &Value) -> Option<u64> {
    model_info
        .get("max_input_tokens")
        .or_else(|| model_info.get("max_tokens"))
        .and_then(Value::as_u64)
        .filter(|v| *v > 0)
}

fn catalog_limit(catalog: &Value, model_id: &str, model_lower: &str) -> Option<u64> {
    let map = catalog.as_object()?;
    if let Some(info) = map.get(model_id) {
        if let Some(limit) = extract_token_limit(info) {
            return Some(limit);
        }
    }
    if let Some(info) = map.get(model_lower) {
        if let Some(limit) = extract_token_limit(info) {
            return Some(limit);
        }
    }
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
    for key in keys {
        let key_lower = key.to_lowercase();
        if model_lower.contains(&key_lower) || key_lower.contains(model_lower) {
            if let Some(limit) = extract_token_limit(&map[key]) {
                return Some(limit);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn offline_cache(dir: &std::path::Path, catalog: &Value) -> ModelDataCache {
        let path = dir.join("model_cache.json");
        fs::write(&path, catalog.to_string()).unwrap();
        ModelDataCache::with_cache(path, Duration::from_secs(CACHE_TTL_SECONDS), SystemTime::now)
    }

    #[test]
    #[serial]
    fn builtin_models_resolve_without_catalog() {
        let cache = ModelDataCache::with_cache(
            PathBuf::from("/nonexistent/cache.json"),
            Duration::from_secs(0),
            SystemTime::now,
        );
        assert_eq!(
            cache.context_limit("claude-sonnet-4-5-20250929", "Sonnet 4.5"),
            200_000
        );
        assert_eq!(cache.context_limit("gpt-5", "GPT-5"), 400_000);
        assert_eq!(cache.context_limit("", ""), DEFAULT_CONTEXT_LIMIT);
    }

    #[test]
    #[serial]
    fn one_million_markers_win() {
        let cache = ModelDataCache::with_cache(
            PathBuf::from("/nonexistent/cache.json"),
            Duration::from_secs(0),
            SystemTime::now,
        );
        assert_eq!(
            cache.context_limit("claude-sonnet-4-20250514[1m]", "Sonnet 4"),
            1_000_000
        );
        assert_eq!(
            cache.context_limit("claude-sonnet-4-20250514", "Sonnet 4 (1M context)"),
            1_000_000
        );
    }

    #[test]
    #[serial]
    fn catalog_resolves_unknown_models() {
        let dir = tempfile::tempdir().unwrap();
        let cache = offline_cache(
            dir.path(),
            &serde_json::json!({
                "some-exotic-model": {"max_input_tokens": 123_456},
            }),
        );
        assert_eq!(cache.context_limit("some-exotic-model", ""), 123_456);
    }

    #[test]
    #[serial]
    fn env_override_wins() {
        unsafe { env::set_var("CLAUDE_CONTEXT_LIMIT", "55555") };
        let cache = ModelDataCache::new();
        assert_eq!(cache.context_limit("claude-opus-4-5", "Opus 4.5"), 55_555);
        unsafe { env::remove_var("CLAUDE_CONTEXT_LIMIT") };
    }

    #[test]
    #[serial]
    fn substring_match_prefers_longest_key() {
        let cache = ModelDataCache::with_cache(
            PathBuf::from("/nonexistent/cache.json"),
            Duration::from_secs(0),
            SystemTime::now,
        );
        // Falls through exact match, hits "claude-opus-4-1" before "claude"
        assert_eq!(
            cache.context_limit("claude-opus-4-1-preview", "Opus"),
            200_000
        );
    }
}
