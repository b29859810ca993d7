//! # Tokens Module
//!
//! Extracts real token counts from `message.usage` fields already present
//! in the transcript, in one streaming pass. This is the preferred
//! strategy; [`scan_transcript`] falls back to the character estimate for
//! transcripts without usage data.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::classify::is_real_compact_boundary;
use crate::estimate::{self, EstimateConfig};
use crate::models::{SessionMetrics, TokenMetrics};

struct UsageScan {
    metrics: TokenMetrics,
    usage_seen: bool,
    first_ts: Option<DateTime<Utc>>,
    last_ts: Option<DateTime<Utc>>,
}

fn parse_timestamp(data: &Value) -> Option<DateTime<Utc>> {
    let ts = data.get("timestamp")?.as_str()?;
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn usage_u64(usage: &Value, key: &str) -> u64 {
    usage.get(key).and_then(Value::as_u64).unwrap_or(0)
}

/// One forward pass over the file. Streams line-by-line to avoid loading
/// entire transcripts into memory; malformed lines are skipped, never fatal.
fn scan_usage(transcript_path: &Path) -> UsageScan {
    let mut scan = UsageScan {
        metrics: TokenMetrics::default(),
        usage_seen: false,
        first_ts: None,
        last_ts: None,
    };

    let file = match File::open(transcript_path) {
        Ok(f) => f,
        Err(_) => return scan,
    };
    scan.metrics.transcript_exists = true;

    let mut input_tokens: u64 = 0;
    let mut output_tokens: u64 = 0;
    let mut cached_tokens: u64 = 0;
    let mut most_recent_time: Option<DateTime<Utc>> = None;
    let mut most_recent_context: u64 = 0;

    let reader = BufReader::new(file);
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let data: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(_) => continue,
        };

        // Last seen session id across all records, not just qualifying
        // ones: the filename-derived id goes stale after forks/resumes.
        if let Some(sid) = data.get("sessionId").and_then(Value::as_str) {
            if !sid.is_empty() {
                scan.metrics.session_id = sid.to_string();
            }
        }

        if let Some(ts) = parse_timestamp(&data) {
            if scan.first_ts.is_none() {
                scan.first_ts = Some(ts);
            }
            scan.last_ts = Some(ts);
        }

        if is_real_compact_boundary(&data) {
            // Everything before the boundary was summarized out of context.
            scan.metrics.had_compact_boundary = true;
            input_tokens = 0;
            output_tokens = 0;
            cached_tokens = 0;
            most_recent_time = None;
            most_recent_context = 0;
            continue;
        }

        let Some(usage) = data.get("message").and_then(|m| m.get("usage")) else {
            continue;
        };
        scan.usage_seen = true;

        input_tokens += usage_u64(usage, "input_tokens");
        output_tokens += usage_u64(usage, "output_tokens");
        cached_tokens += usage_u64(usage, "cache_read_input_tokens");
        cached_tokens += usage_u64(usage, "cache_creation_input_tokens");

        // Most recent main-chain completed response drives context_length.
        // Skip sidechains, API errors and streaming partials (null
        // stop_reason); summing across turns would double-count cached
        // context.
        let is_sidechain = data.get("isSidechain").and_then(Value::as_bool) == Some(true);
        let is_api_error =
            data.get("isApiErrorMessage").and_then(Value::as_bool) == Some(true);
        let stop_reason_set = data
            .get("message")
            .and_then(|m| m.get("stop_reason"))
            .is_some_and(|r| !r.is_null());

        if !is_sidechain && !is_api_error && stop_reason_set {
            if let Some(ts) = parse_timestamp(&data) {
                if most_recent_time.is_none_or(|t| ts > t) {
                    most_recent_time = Some(ts);
                    most_recent_context = usage_u64(usage, "input_tokens")
                        + usage_u64(usage, "cache_read_input_tokens")
                        + usage_u64(usage, "cache_creation_input_tokens");
                }
            }
        }
    }

    scan.metrics.input_tokens = input_tokens;
    scan.metrics.output_tokens = output_tokens;
    scan.metrics.cached_tokens = cached_tokens;
    scan.metrics.total_tokens = input_tokens + output_tokens + cached_tokens;
    scan.metrics.context_length = most_recent_context;
    scan
}

/// Token metrics from API-reported usage only. Returns a zeroed record
/// with `transcript_exists = false` when the file is missing or unreadable.
pub fn token_metrics(transcript_path: &Path) -> TokenMetrics {
    scan_usage(transcript_path).metrics
}

/// Session duration spans the whole file, independent of compaction.
/// Returns None rather than a false near-zero duration when the transcript
/// has no parseable timestamps.
pub fn session_duration(transcript_path: &Path) -> Option<SessionMetrics> {
    let scan = scan_usage(transcript_path);
    session_from_scan(&scan)
}

fn session_from_scan(scan: &UsageScan) -> Option<SessionMetrics> {
    let (first, last) = (scan.first_ts?, scan.last_ts?);
    Some(SessionMetrics {
        start_time: first,
        last_activity: last,
        duration_seconds: (last - first).num_seconds(),
    })
}

/// Full transcript scan: usage sums when the transcript reports them,
/// otherwise the character estimate ([`estimate`]). The selection is by
/// transcript capability, not configuration.
pub fn scan_transcript(
    transcript_path: &Path,
    cfg: &EstimateConfig,
) -> (TokenMetrics, Option<SessionMetrics>) {
    let scan = scan_usage(transcript_path);
    let session = session_from_scan(&scan);
    let mut metrics = scan.metrics;

    if !scan.usage_seen && metrics.transcript_exists {
        let parsed = estimate::parse_transcript(transcript_path);
        let estimated = estimate::estimate_total_tokens(&parsed, cfg);
        metrics.total_tokens = estimated;
        metrics.context_length = estimated;
        metrics.had_compact_boundary = parsed.boundaries_found > 0;
        if metrics.session_id.is_empty() {
            metrics.session_id = parsed.session_id;
        }
    }

    (metrics, session)
}
