//! # CLI Module
//!
//! Argument parsing and the installation subcommands. With no subcommand
//! the binary reads the hook JSON from stdin and prints the statusline.

use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};

use crate::config;
use crate::credentials;
use crate::settings;

#[derive(clap::Parser, Debug)]
#[command(
    name = "claude-code-statusline",
    version,
    about = "Claude Code statusline - context usage tracking for Claude Code",
    after_help = "When no subcommand is given, reads JSON from stdin and outputs the statusline."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Configure Claude Code to use this statusline
    Install {
        /// Skip the confirmation prompt when a statusLine already exists
        #[arg(long)]
        force: bool,
    },
    /// Remove the statusLine configuration from Claude Code settings
    Uninstall,
    /// Verify installation health
    Doctor,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }
}

pub fn cmd_install(force: bool) -> Result<i32> {
    let Some(path) = settings::settings_path() else {
        bail!("could not locate a home directory");
    };
    println!("Configuring Claude Code at {}...", path.display());

    let existing = settings::read_settings(&path);
    if existing.contains_key("statusLine") && !force {
        println!("\nExisting statusLine configuration detected:\n");
        println!(
            "  Current: {}",
            serde_json::to_string_pretty(&existing["statusLine"])?
        );
        println!(
            "  New:     {}",
            serde_json::to_string_pretty(&settings::statusline_entry())?
        );
        println!("\nA backup will be created before making changes.");
        if !confirm("Proceed? [y/N]: ")? {
            println!("Aborted.");
            return Ok(1);
        }
    }

    match settings::configure_statusline(&path) {
        Ok(Some(backup)) => {
            println!("✓ Existing configuration backed up to {}", backup.display());
        }
        Ok(None) => println!("✓ Claude Code configured successfully"),
        Err(e) => {
            eprintln!("✗ Failed to write settings: {e}");
            return Ok(1);
        }
    }

    println!("\nNext steps:");
    println!("1. Restart Claude Code or start a new session");
    println!("2. The statusline should appear automatically");
    println!("3. Customize via {}", config::config_path().display());
    Ok(0)
}

pub fn cmd_uninstall() -> Result<i32> {
    let Some(path) = settings::settings_path() else {
        bail!("could not locate a home directory");
    };
    println!(
        "Removing statusLine configuration from {}...",
        path.display()
    );
    match settings::remove_statusline(&path) {
        Ok(true) => println!("✓ statusLine configuration removed"),
        Ok(false) => println!("✓ No statusLine configuration found"),
        Err(e) => {
            eprintln!("✗ Failed to write settings: {e}");
            return Ok(1);
        }
    }
    Ok(0)
}

pub fn cmd_doctor() -> Result<i32> {
    println!("claude-code-statusline v{}", env!("CARGO_PKG_VERSION"));
    println!("\nChecking installation...\n");
    let mut issues = 0;

    let settings_path = settings::settings_path().context("could not locate a home directory")?;
    println!("[1/4] settings.json at {}", settings_path.display());
    if !settings_path.exists() {
        println!("      ⚠ settings.json not found (Claude Code will create it)");
    } else {
        let data = settings::read_settings(&settings_path);
        match data
            .get("statusLine")
            .and_then(|s| s.get("command"))
            .and_then(|c| c.as_str())
        {
            Some("claude-code-statusline") => {
                println!("      ✓ statusLine configured");
            }
            Some(other) => {
                println!("      ⚠ statusLine runs a different command: {other}");
                issues += 1;
            }
            None => {
                println!("      ⚠ no statusLine configuration found");
                println!("      → run 'claude-code-statusline install' to configure");
                issues += 1;
            }
        }
    }

    let config_path = config::config_path();
    println!("[2/4] widget config at {}", config_path.display());
    if config_path.exists() {
        // load_config reports parse problems itself
        let config = config::load_config();
        println!("      ✓ {} widgets configured", config.widgets.len());
    } else {
        println!("      ⚠ no config yet (defaults will be written on first render)");
    }

    println!("[3/4] credentials");
    match credentials::credentials_path() {
        Some(p) if p.exists() => println!("      ✓ {}", p.display()),
        _ => println!("      ⚠ no credentials file (subscription widget shows API usage)"),
    }

    println!("[4/4] transcripts");
    let projects = directories::BaseDirs::new()
        .map(|b| b.home_dir().join(".claude").join("projects"));
    match projects {
        Some(p) if p.is_dir() => println!("      ✓ {}", p.display()),
        Some(p) => {
            println!("      ⚠ {} does not exist yet", p.display());
        }
        None => {
            println!("      ⚠ could not locate a home directory");
            issues += 1;
        }
    }

    if issues == 0 {
        println!("\nAll checks passed.");
    } else {
        println!("\n{issues} issue(s) found.");
    }
    Ok(if issues == 0 { 0 } else { 1 })
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
