use serial_test::serial;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use claude_code_statusline::config::default_config;
use claude_code_statusline::model_data::ModelDataCache;
use claude_code_statusline::models::{HookJson, SessionMetrics, SubscriptionInfo, TokenMetrics};
use claude_code_statusline::render::{RenderContext, render_status_line};

fn offline_model_data() -> ModelDataCache {
    // Builtin-table-only lookups; nothing to read, nothing to fetch
    ModelDataCache::with_cache(
        PathBuf::from("/nonexistent/model_cache.json"),
        Duration::from_secs(0),
        SystemTime::now,
    )
}

fn hook(transcript_dir: &std::path::Path) -> HookJson {
    serde_json::from_value(serde_json::json!({
        "session_id": "0a1b2c3d-4e5f-6789-abcd-ef0123456789",
        "transcript_path": transcript_dir.join("t.jsonl").to_string_lossy(),
        "model": {"id": "claude-sonnet-4-5-20250929", "display_name": "Sonnet 4.5"},
        "workspace": {"current_dir": transcript_dir.join("workspace").to_string_lossy()},
        "cost": {"total_cost_usd": 1.23, "total_lines_added": 12, "total_lines_removed": 3},
    }))
    .unwrap()
}

#[test]
#[serial]
fn renders_all_default_segments() {
    unsafe { std::env::set_var("NO_COLOR", "1") };
    let dir = tempfile::tempdir().unwrap();
    let hook = hook(dir.path());
    let metrics = TokenMetrics {
        context_length: 50_000,
        total_tokens: 60_000,
        transcript_exists: true,
        ..TokenMetrics::default()
    };
    let session = SessionMetrics {
        start_time: "2025-03-01T10:00:00Z".parse().unwrap(),
        last_activity: "2025-03-01T12:15:00Z".parse().unwrap(),
        duration_seconds: 2 * 3600 + 15 * 60,
    };
    let subscription = SubscriptionInfo::default();
    let model_data = offline_model_data();

    let ctx = RenderContext::new(
        &hook,
        hook.session_id.clone(),
        Some(&metrics),
        Some(&session),
        Some(&subscription),
        &model_data,
    );
    let line = render_status_line(&default_config().widgets, &ctx);

    assert!(line.contains("Sonnet 4.5"));
    assert!(line.contains("Context:"));
    assert!(line.contains("25.0%"), "line: {line}");
    assert!(line.contains("50K/200K"));
    assert!(line.contains("Cost: $1.23 USD"));
    assert!(line.contains("+12 (added)"));
    assert!(line.contains("-3 (removed)"));
    assert!(line.contains("Session: 0a1b2c3d"));
    assert!(line.contains("Elapsed: 2hr 15m"));
    assert!(line.contains("API usage"));
    assert!(line.contains(" | "));
    assert!(!line.starts_with(" | "));
    assert!(!line.ends_with(" | "));
    unsafe { std::env::remove_var("NO_COLOR") };
}

#[test]
#[serial]
fn missing_transcript_shows_indicator() {
    unsafe { std::env::set_var("NO_COLOR", "1") };
    let dir = tempfile::tempdir().unwrap();
    let hook = hook(dir.path());
    let metrics = TokenMetrics::default(); // transcript_exists = false
    let subscription = SubscriptionInfo::default();
    let model_data = offline_model_data();

    let ctx = RenderContext::new(
        &hook,
        hook.session_id.clone(),
        Some(&metrics),
        None,
        Some(&subscription),
        &model_data,
    );
    let line = render_status_line(&default_config().widgets, &ctx);
    assert!(line.contains("No active transcript"));
    assert!(!line.contains("Elapsed:"));
    unsafe { std::env::remove_var("NO_COLOR") };
}

#[test]
#[serial]
fn payload_context_window_overrides_transcript() {
    unsafe { std::env::set_var("NO_COLOR", "1") };
    let dir = tempfile::tempdir().unwrap();
    let mut hook = hook(dir.path());
    hook.context_window = serde_json::from_value(serde_json::json!({
        "context_window_size": 200_000,
        "current_usage": {
            "input_tokens": 90_000,
            "cache_read_input_tokens": 10_000,
        },
    }))
    .ok();
    // Transcript says something else entirely; payload wins
    let metrics = TokenMetrics {
        context_length: 1,
        transcript_exists: true,
        ..TokenMetrics::default()
    };
    let subscription = SubscriptionInfo::default();
    let model_data = offline_model_data();

    let ctx = RenderContext::new(
        &hook,
        hook.session_id.clone(),
        Some(&metrics),
        None,
        Some(&subscription),
        &model_data,
    );
    assert_eq!(ctx.context_length(), Some(100_000));
    let line = render_status_line(&default_config().widgets, &ctx);
    assert!(line.contains("50.0%"), "line: {line}");
    unsafe { std::env::remove_var("NO_COLOR") };
}

#[test]
#[serial]
fn empty_payload_still_renders_a_line() {
    unsafe { std::env::set_var("NO_COLOR", "1") };
    let hook = HookJson::default();
    let subscription = SubscriptionInfo::default();
    let model_data = offline_model_data();

    let ctx = RenderContext::new(
        &hook,
        String::new(),
        None,
        None,
        Some(&subscription),
        &model_data,
    );
    let line = render_status_line(&default_config().widgets, &ctx);
    // Fallback texts keep the line non-empty even with nothing to show
    assert!(line.contains("Unknown model"));
    assert!(line.contains("No active transcript"));
    unsafe { std::env::remove_var("NO_COLOR") };
}
