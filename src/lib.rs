//! # Claude Code Statusline
//!
//! A single-line status display for Claude Code sessions: model name,
//! working directory, git branch, context-window usage, spend, and
//! elapsed time. Runs once per invocation, reading a JSON payload from
//! stdin and the session transcript (JSONL) from disk.
//!
//! ## Overview
//!
//! Context accounting prefers exact `message.usage` sums from the
//! transcript and falls back to a character-based estimate when usage
//! fields are absent. Both strategies share the same compact-boundary and
//! line-exclusion semantics, so only content still live in the context
//! window is counted.
//!
//! ## Features
//!
//! - `git` (default): repository inspection via gix
//! - `colors` (default): terminal color output via owo-colors

/// Line classification: compact boundaries, exclusion rules, content size
pub mod classify;

/// Command-line argument parsing and install subcommands
pub mod cli;

/// Named ANSI colors and the usage/cost ramps
pub mod colors;

/// Widget layout configuration (TOML)
pub mod config;

/// Subscription info from Claude credentials
pub mod credentials;

/// Env-gated per-session debug logging
pub mod debug;

/// Character-based token estimation fallback
pub mod estimate;

/// Git repository inspection (feature-gated)
#[cfg(feature = "git")]
pub mod git;

/// Model context-limit lookup with a TTL file cache
pub mod model_data;

/// Data models for the hook payload, transcript records, and metrics
pub mod models;

/// Widget registry and status-line assembly
pub mod render;

/// Claude Code settings.json read-modify-write
pub mod settings;

/// Usage-sum token extraction and session duration
pub mod tokens;

/// Formatting helpers and stdin
pub mod utils;

/// Builtin widgets
pub mod widgets;
