use chrono::{DateTime, Utc};

/// Token usage extracted from JSONL `message.usage` fields, or estimated
/// from character counts when no usage fields exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMetrics {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// cache reads + cache creation combined
    pub cached_tokens: u64,
    pub total_tokens: u64,
    /// Occupancy from the most recent qualifying response, never a running sum.
    pub context_length: u64,
    pub transcript_exists: bool,
    /// Last non-empty sessionId seen in the file (forked/resumed logs).
    pub session_id: String,
    pub had_compact_boundary: bool,
}

/// Session timing derived from the first and last parseable timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMetrics {
    pub start_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub duration_seconds: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionInfo {
    pub is_subscription: bool,
    pub subscription_type: Option<String>,
    pub rate_limit_tier: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GitStatus {
    pub branch: Option<String>,
    pub insertions: u64,
    pub deletions: u64,
    pub worktree: Option<String>,
    pub is_git_repo: bool,
}
