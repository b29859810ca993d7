//! # Widgets Module
//!
//! Builtin widgets. Each one renders a single segment or returns `None`
//! to hide itself (the registry substitutes its fallback text, if any).

use std::collections::HashMap;
use std::path::Path;

use crate::colors::{colorize, get_cost_color, get_usage_color};
use crate::config::WidgetConfig;
use crate::render::{RenderContext, Widget};
use crate::utils::{format_duration, format_number, format_percentage, render_progress_bar};

pub(crate) fn builtin_widgets() -> HashMap<&'static str, Box<dyn Widget>> {
    let mut registry: HashMap<&'static str, Box<dyn Widget>> = HashMap::new();
    registry.insert("model", Box::new(ModelWidget));
    registry.insert("directory", Box::new(DirectoryWidget));
    registry.insert("git-branch", Box::new(GitBranchWidget));
    registry.insert("git-changes", Box::new(GitChangesWidget));
    registry.insert("git-worktree", Box::new(GitWorktreeWidget));
    registry.insert("context-percentage", Box::new(ContextPercentageWidget));
    registry.insert("context-tokens", Box::new(ContextTokensWidget));
    registry.insert("cost", Box::new(CostWidget));
    registry.insert("lines-added", Box::new(LinesAddedWidget));
    registry.insert("lines-removed", Box::new(LinesRemovedWidget));
    registry.insert("lines-changed", Box::new(LinesChangedWidget));
    registry.insert("session-id", Box::new(SessionIdWidget));
    registry.insert("session-clock", Box::new(SessionClockWidget));
    registry.insert("subscription", Box::new(SubscriptionWidget));
    registry.insert("separator", Box::new(SeparatorWidget));
    registry
}

struct ModelWidget;

impl Widget for ModelWidget {
    fn default_color(&self) -> &'static str {
        "cyan"
    }
    fn fallback_text(&self) -> Option<&'static str> {
        Some("Unknown model")
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let model = &ctx.hook.model;
        if !model.display_name.is_empty() {
            Some(model.display_name.clone())
        } else if !model.id.is_empty() {
            Some(model.id.clone())
        } else {
            None
        }
    }
}

struct DirectoryWidget;

impl Widget for DirectoryWidget {
    fn default_color(&self) -> &'static str {
        "blue"
    }
    fn fallback_text(&self) -> Option<&'static str> {
        Some("--")
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let dir = &ctx.hook.workspace.current_dir;
        if dir.is_empty() {
            return None;
        }
        Path::new(dir)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }
}

struct GitBranchWidget;

impl Widget for GitBranchWidget {
    fn default_color(&self) -> &'static str {
        "magenta"
    }
    fn fallback_text(&self) -> Option<&'static str> {
        Some("No repo")
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let status = ctx.git_status()?;
        if !status.is_git_repo {
            return None;
        }
        status.branch.clone()
    }
}

struct GitChangesWidget;

impl Widget for GitChangesWidget {
    fn default_color(&self) -> &'static str {
        "yellow"
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let status = ctx.git_status()?;
        if !status.is_git_repo || (status.insertions == 0 && status.deletions == 0) {
            return None;
        }
        let mut parts = Vec::new();
        if status.insertions > 0 {
            parts.push(format!("+{}", status.insertions));
        }
        if status.deletions > 0 {
            parts.push(format!("-{}", status.deletions));
        }
        Some(format!(" {}", parts.join("/")))
    }
}

struct GitWorktreeWidget;

impl Widget for GitWorktreeWidget {
    fn default_color(&self) -> &'static str {
        "blue"
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let status = ctx.git_status()?;
        let worktree = status.worktree.as_ref()?;
        Some(format!(" [{worktree}]"))
    }
}

struct ContextPercentageWidget;

impl Widget for ContextPercentageWidget {
    fn default_color(&self) -> &'static str {
        "none"
    }
    fn fallback_text(&self) -> Option<&'static str> {
        Some("No active transcript")
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let length = ctx.context_length()?;
        let limit = ctx.context_limit();
        if limit == 0 {
            return None;
        }

        let percentage = (length as f64 * 1000.0 / limit as f64).round() / 10.0;
        let bar = render_progress_bar(percentage, 10);
        let colored_bar = colorize(&bar, Some(get_usage_color(percentage)), false);

        Some(format!(
            "Context: {colored_bar} {} ({}/{})",
            format_percentage(percentage),
            format_number(length, 0),
            format_number(limit, 0)
        ))
    }
}

struct ContextTokensWidget;

impl Widget for ContextTokensWidget {
    fn default_color(&self) -> &'static str {
        "auto"
    }
    fn fallback_text(&self) -> Option<&'static str> {
        Some("No active transcript")
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let length = ctx.context_length()?;
        Some(format!(
            "{}/{} tokens",
            format_number(length, 0),
            format_number(ctx.context_limit(), 0)
        ))
    }
}

struct CostWidget;

impl Widget for CostWidget {
    fn default_color(&self) -> &'static str {
        "none"
    }
    fn fallback_text(&self) -> Option<&'static str> {
        Some("Cost: Not Found")
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let total = ctx.hook.cost.as_ref()?.total_cost_usd?;
        let amount = colorize(
            &format!("${total:.2} USD"),
            Some(get_cost_color(total)),
            false,
        );
        Some(format!("Cost: {amount}"))
    }
}

struct LinesAddedWidget;

impl Widget for LinesAddedWidget {
    fn default_color(&self) -> &'static str {
        "green"
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let added = ctx.hook.cost.as_ref()?.total_lines_added.unwrap_or(0);
        if added == 0 {
            return None;
        }
        Some(format!("+{added} (added)"))
    }
}

struct LinesRemovedWidget;

impl Widget for LinesRemovedWidget {
    fn default_color(&self) -> &'static str {
        "red"
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let removed = ctx.hook.cost.as_ref()?.total_lines_removed.unwrap_or(0);
        if removed == 0 {
            return None;
        }
        Some(format!("-{removed} (removed)"))
    }
}

struct LinesChangedWidget;

impl Widget for LinesChangedWidget {
    fn default_color(&self) -> &'static str {
        "none"
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let cost = ctx.hook.cost.as_ref()?;
        let added = cost.total_lines_added.unwrap_or(0);
        let removed = cost.total_lines_removed.unwrap_or(0);
        if added == 0 && removed == 0 {
            return None;
        }
        let mut parts = Vec::new();
        if added > 0 {
            parts.push(colorize(&format!("+{added} (added)"), Some("green"), false));
        }
        if removed > 0 {
            parts.push(colorize(&format!("-{removed} (removed)"), Some("red"), false));
        }
        Some(parts.join(" / "))
    }
}

struct SessionIdWidget;

impl Widget for SessionIdWidget {
    fn default_color(&self) -> &'static str {
        "none"
    }
    fn fallback_text(&self) -> Option<&'static str> {
        Some("No session")
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        if ctx.session_id.is_empty() {
            return None;
        }
        let colored = colorize(&ctx.session_id, Some("grey"), false);
        Some(format!("Session: {colored}"))
    }
}

struct SessionClockWidget;

impl Widget for SessionClockWidget {
    fn default_color(&self) -> &'static str {
        "none"
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let session = ctx.session_metrics?;
        let duration = colorize(
            &format_duration(session.duration_seconds),
            Some("cyan"),
            false,
        );
        Some(format!("Elapsed: {duration}"))
    }
}

struct SubscriptionWidget;

impl Widget for SubscriptionWidget {
    fn default_color(&self) -> &'static str {
        "cyan"
    }
    fn fallback_text(&self) -> Option<&'static str> {
        Some("Unknown")
    }
    fn render(&self, _config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
        let info = ctx.subscription?;
        if !info.is_subscription {
            return Some("API usage".to_string());
        }
        match &info.subscription_type {
            Some(kind) => Some(capitalize(kind)),
            None => Some("Subscription".to_string()),
        }
    }
}

struct SeparatorWidget;

impl Widget for SeparatorWidget {
    fn default_color(&self) -> &'static str {
        "dim"
    }
    fn render(&self, config: &WidgetConfig, _ctx: &RenderContext) -> Option<String> {
        let text = config
            .metadata
            .get("text")
            .map(String::as_str)
            .unwrap_or("|");
        Some(format!(" {text} "))
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
