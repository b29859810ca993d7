use anyhow::Result;
use std::path::Path;

use claude_code_statusline::cli::{Args, Command, cmd_doctor, cmd_install, cmd_uninstall};
use claude_code_statusline::config;
use claude_code_statusline::credentials;
use claude_code_statusline::debug::debug_log;
use claude_code_statusline::estimate::EstimateConfig;
use claude_code_statusline::model_data::ModelDataCache;
use claude_code_statusline::models::HookJson;
use claude_code_statusline::render::{RenderContext, render_status_line};
use claude_code_statusline::tokens;
use claude_code_statusline::utils::read_stdin;

fn main() -> Result<()> {
    let args = Args::parse();
    let code = match args.command {
        Some(Command::Install { force }) => cmd_install(force)?,
        Some(Command::Uninstall) => cmd_uninstall()?,
        Some(Command::Doctor) => cmd_doctor()?,
        None => run_statusline()?,
    };
    std::process::exit(code);
}

fn run_statusline() -> Result<i32> {
    let stdin = read_stdin()?;
    // Malformed or empty input degrades to an all-default payload; the
    // parent UI must always get a line back.
    let hook: HookJson = serde_json::from_slice(&stdin).unwrap_or_default();

    let transcript_path = find_transcript_path(&hook);
    let mut session_id = extract_session_id(&hook, &transcript_path);

    debug_log("=== SESSION START ===", &session_id, &transcript_path);
    debug_log(
        &format!("Working directory: {}", hook.workspace.current_dir),
        &session_id,
        &transcript_path,
    );
    debug_log(
        &format!("Model: {}", hook.model.id),
        &session_id,
        &transcript_path,
    );
    debug_log(
        &format!("Transcript: {transcript_path}"),
        &session_id,
        &transcript_path,
    );

    let estimate_cfg = EstimateConfig::from_env();
    let model_data = ModelDataCache::new();
    let payload_has_window = hook
        .context_window
        .as_ref()
        .is_some_and(|cw| cw.context_window_size > 0);

    // Independent I/O joined before rendering; the transcript scan itself
    // stays sequential.
    let ((token_metrics, session_metrics), subscription) = std::thread::scope(|s| {
        let transcript = s.spawn(|| {
            tokens::scan_transcript(Path::new(&transcript_path), &estimate_cfg)
        });
        let creds = s.spawn(credentials::read_subscription_info);
        if !payload_has_window {
            s.spawn(|| model_data.prefetch());
        }
        (
            transcript.join().unwrap_or_default(),
            creds.join().unwrap_or_default(),
        )
    });

    // The filename-derived id goes stale after /compact; prefer the
    // transcript's when a boundary was seen.
    if token_metrics.had_compact_boundary && !token_metrics.session_id.is_empty() {
        session_id = token_metrics.session_id.clone();
    }

    debug_log(
        &format!("Token metrics: {token_metrics:?}"),
        &session_id,
        &transcript_path,
    );

    let layout = config::load_config();
    let ctx = RenderContext::new(
        &hook,
        session_id,
        Some(&token_metrics),
        session_metrics.as_ref(),
        Some(&subscription),
        &model_data,
    );
    print!("{}", render_status_line(&layout.widgets, &ctx));
    Ok(0)
}

/// Fall back to the conventional transcript location when the payload's
/// path is missing or stale.
fn find_transcript_path(hook: &HookJson) -> String {
    if !hook.transcript_path.is_empty() && Path::new(&hook.transcript_path).is_file() {
        return hook.transcript_path.clone();
    }

    if !hook.session_id.is_empty() && !hook.workspace.current_dir.is_empty() {
        let encoded = hook.workspace.current_dir.replace('/', "-");
        let encoded = encoded.trim_start_matches('-');
        if let Some(base) = directories::BaseDirs::new() {
            let candidate = base
                .home_dir()
                .join(".claude")
                .join("projects")
                .join(format!("-{encoded}"))
                .join(format!("{}.jsonl", hook.session_id));
            if candidate.is_file() {
                return candidate.to_string_lossy().to_string();
            }
        }
    }

    hook.transcript_path.clone()
}

/// Payload session id, else a UUID-shaped transcript filename stem.
fn extract_session_id(hook: &HookJson, transcript_path: &str) -> String {
    if !hook.session_id.is_empty() {
        return hook.session_id.clone();
    }
    if let Some(stem) = claude_code_statusline::debug::session_id_from_path(transcript_path) {
        if stem.len() == 36 && stem.matches('-').count() == 4 {
            return stem;
        }
    }
    String::new()
}
