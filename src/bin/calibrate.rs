//! Offline calibration for the character-based token estimate.
//!
//! Walks recent session transcripts, runs the estimator on each, and asks
//! for the token count Claude's `/context` command reports for that
//! session. Prints per-session discrepancies and the implied
//! chars-per-token ratio. Never touched by the statusline hot path.

use anyhow::{Context, Result};
use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use walkdir::WalkDir;

use claude_code_statusline::debug::session_id_from_path;
use claude_code_statusline::estimate::{
    CHARS_PER_TOKEN, EstimateConfig, estimate_total_tokens, parse_transcript,
};

#[derive(Parser, Debug)]
#[command(
    name = "calibrate",
    version,
    about = "Compare the character-based token estimate against /context ground truth"
)]
struct Args {
    /// Transcript files to calibrate; scans recent sessions when empty
    #[arg(value_name = "TRANSCRIPT")]
    transcripts: Vec<PathBuf>,

    /// Maximum number of recent sessions to scan
    #[arg(long, default_value_t = 5)]
    limit: usize,

    /// Skip transcripts smaller than this many bytes
    #[arg(long, default_value_t = 10_000)]
    min_bytes: u64,
}

struct CalibrationResult {
    session_file: PathBuf,
    estimated_tokens: u64,
    claude_tokens: u64,
    implied_ratio: Option<f64>,
}

impl CalibrationResult {
    fn discrepancy_percent(&self) -> f64 {
        if self.claude_tokens == 0 {
            return 0.0;
        }
        (self.estimated_tokens as f64 - self.claude_tokens as f64) * 100.0
            / self.claude_tokens as f64
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let files = if args.transcripts.is_empty() {
        recent_sessions(args.limit, args.min_bytes)?
    } else {
        args.transcripts
    };
    if files.is_empty() {
        println!("No transcript files found under ~/.claude/projects");
        return Ok(());
    }

    let cfg = EstimateConfig::from_env();
    let mut results: Vec<CalibrationResult> = Vec::new();

    for file in files {
        let parsed = parse_transcript(&file);
        if !parsed.is_jsonl {
            println!("Skipping {} (not JSONL)", file.display());
            continue;
        }
        let estimated = estimate_total_tokens(&parsed, &cfg);
        let session = session_id_from_path(&file.to_string_lossy())
            .unwrap_or_else(|| "unknown".to_string());

        println!("\nSession {session}");
        println!("  file:     {}", file.display());
        println!(
            "  estimate: {estimated} tokens ({} live chars, {} boundaries)",
            parsed.context_chars, parsed.boundaries_found
        );
        println!("  To collect ground truth:");
        println!("    1. claude --resume {session}");
        println!("    2. run /context and note the used token count");

        let Some(claude_tokens) = prompt_ground_truth(&session)? else {
            println!("  skipped");
            continue;
        };

        // Back out the ratio that would have made the estimate exact,
        // after removing the fixed overheads.
        let fixed = cfg.system_overhead_tokens + cfg.reserved_tokens;
        let implied_ratio = claude_tokens.checked_sub(fixed).and_then(|conv| {
            if conv == 0 {
                None
            } else {
                Some(parsed.context_chars as f64 / conv as f64)
            }
        });

        let result = CalibrationResult {
            session_file: file,
            estimated_tokens: estimated,
            claude_tokens,
            implied_ratio,
        };
        println!(
            "  claude:   {claude_tokens} tokens, discrepancy {:+.1}%",
            result.discrepancy_percent()
        );
        if let Some(ratio) = result.implied_ratio {
            println!("  implied chars/token: {ratio:.2}");
        }
        results.push(result);
    }

    if results.is_empty() {
        println!("\nNo sessions calibrated.");
        return Ok(());
    }

    println!("\n=== Calibration Summary ===");
    println!("sessions: {}", results.len());
    for r in &results {
        println!(
            "  {}: estimate {} vs claude {} ({:+.1}%)",
            r.session_file.display(),
            r.estimated_tokens,
            r.claude_tokens,
            r.discrepancy_percent()
        );
    }
    let mean_abs = results
        .iter()
        .map(|r| r.discrepancy_percent().abs())
        .sum::<f64>()
        / results.len() as f64;
    println!("mean |discrepancy|: {mean_abs:.1}%");

    let ratios: Vec<f64> = results.iter().filter_map(|r| r.implied_ratio).collect();
    if !ratios.is_empty() {
        let mean_ratio = ratios.iter().sum::<f64>() / ratios.len() as f64;
        println!(
            "suggested chars/token: {mean_ratio:.2} (currently {CHARS_PER_TOKEN})"
        );
    }
    Ok(())
}

fn recent_sessions(limit: usize, min_bytes: u64) -> Result<Vec<PathBuf>> {
    let base = directories::BaseDirs::new().context("could not locate a home directory")?;
    let projects = base.home_dir().join(".claude").join("projects");
    if !projects.is_dir() {
        return Ok(Vec::new());
    }

    let mut candidates: Vec<(std::time::SystemTime, PathBuf)> = WalkDir::new(&projects)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("jsonl"))
        .filter_map(|e| {
            let meta = e.metadata().ok()?;
            if meta.len() < min_bytes {
                return None;
            }
            Some((meta.modified().ok()?, e.into_path()))
        })
        .collect();

    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(candidates
        .into_iter()
        .take(limit)
        .map(|(_, p)| p)
        .collect())
}

static TOKEN_INPUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*([kK])?(?:\s*/\s*\d+(?:\.\d+)?\s*[kK]?\s*tokens?)?\s*$")
        .unwrap()
});

/// Accepts "108k", "108000", or the pasted "/context" line "108k/200k tokens".
fn parse_token_input(input: &str) -> Option<u64> {
    let caps = TOKEN_INPUT_RE.captures(input)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let multiplier = if caps.get(2).is_some() { 1000.0 } else { 1.0 };
    Some((value * multiplier) as u64)
}

fn prompt_ground_truth(session: &str) -> Result<Option<u64>> {
    print!("  Token count for {session} (empty to skip): ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match parse_token_input(trimmed) {
        Some(tokens) => Ok(Some(tokens)),
        None => {
            println!("  could not parse {trimmed:?}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_input_formats() {
        assert_eq!(parse_token_input("108000"), Some(108_000));
        assert_eq!(parse_token_input("108k"), Some(108_000));
        assert_eq!(parse_token_input("108K"), Some(108_000));
        assert_eq!(parse_token_input("31.5k"), Some(31_500));
        assert_eq!(parse_token_input("108k/200k tokens"), Some(108_000));
        assert_eq!(parse_token_input("garbage"), None);
        assert_eq!(parse_token_input(""), None);
    }
}
