//! # Render Module
//!
//! Widget trait, registry, and status-line assembly. Widgets return
//! `None` to hide themselves; orphaned separators are removed after the
//! individual renders so the line never starts, ends, or doubles up on
//! dividers.

use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use std::collections::HashMap;
#[cfg(feature = "git")]
use std::path::Path;

use crate::colors::{colorize, get_cost_color, get_usage_color};
use crate::config::WidgetConfig;
use crate::model_data::ModelDataCache;
use crate::models::{ContextWindow, GitStatus, HookJson, SessionMetrics, SubscriptionInfo, TokenMetrics};
use crate::widgets;

/// Everything a widget may consult while rendering.
pub struct RenderContext<'a> {
    pub hook: &'a HookJson,
    /// Resolved session id (payload, filename, or post-compaction override).
    pub session_id: String,
    pub token_metrics: Option<&'a TokenMetrics>,
    pub session_metrics: Option<&'a SessionMetrics>,
    pub subscription: Option<&'a SubscriptionInfo>,
    pub model_data: &'a ModelDataCache,
    pub terminal_width: Option<u16>,
    git: OnceCell<Option<GitStatus>>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        hook: &'a HookJson,
        session_id: String,
        token_metrics: Option<&'a TokenMetrics>,
        session_metrics: Option<&'a SessionMetrics>,
        subscription: Option<&'a SubscriptionInfo>,
        model_data: &'a ModelDataCache,
    ) -> Self {
        RenderContext {
            hook,
            session_id,
            token_metrics,
            session_metrics,
            subscription,
            model_data,
            terminal_width: terminal_size::terminal_size().map(|(w, _)| w.0),
            git: OnceCell::new(),
        }
    }

    /// Lazily resolved on first git widget; one probe per invocation.
    pub fn git_status(&self) -> Option<&GitStatus> {
        #[cfg(feature = "git")]
        {
            self.git
                .get_or_init(|| {
                    let dir = &self.hook.workspace.current_dir;
                    if dir.is_empty() {
                        return None;
                    }
                    crate::git::read_git_status(Path::new(dir))
                })
                .as_ref()
        }
        #[cfg(not(feature = "git"))]
        {
            let _ = &self.git;
            None
        }
    }

    /// Payload context_window block, when usable.
    pub fn context_window(&self) -> Option<&'a ContextWindow> {
        self.hook
            .context_window
            .as_ref()
            .filter(|cw| cw.context_window_size > 0)
    }

    pub fn context_limit(&self) -> u64 {
        if let Some(cw) = self.context_window() {
            return cw.context_window_size;
        }
        self.model_data
            .context_limit(&self.hook.model.id, &self.hook.model.display_name)
    }

    /// Current occupancy: the payload's current_usage when Claude Code
    /// supplies one, otherwise the transcript-derived value.
    pub fn context_length(&self) -> Option<u64> {
        if let Some(cw) = self.context_window() {
            if cw.has_current_usage() {
                return Some(cw.current_context_tokens());
            }
        }
        self.token_metrics
            .filter(|m| m.transcript_exists)
            .map(|m| m.context_length)
    }
}

pub trait Widget: Send + Sync {
    fn default_color(&self) -> &'static str {
        "white"
    }
    fn fallback_text(&self) -> Option<&'static str> {
        None
    }
    fn render(&self, config: &WidgetConfig, ctx: &RenderContext) -> Option<String>;
}

static REGISTRY: Lazy<HashMap<&'static str, Box<dyn Widget>>> =
    Lazy::new(widgets::builtin_widgets);

pub fn get_widget(widget_type: &str) -> Option<&'static dyn Widget> {
    REGISTRY.get(widget_type).map(|w| w.as_ref())
}

pub fn widget_types() -> Vec<&'static str> {
    let mut types: Vec<&'static str> = REGISTRY.keys().copied().collect();
    types.sort_unstable();
    types
}

fn resolve_auto_color(widget_type: &str, ctx: &RenderContext) -> &'static str {
    match widget_type {
        "context-percentage" | "context-tokens" => {
            if let Some(length) = ctx.context_length() {
                let limit = ctx.context_limit();
                if length > 0 && limit > 0 {
                    return get_usage_color(length as f64 * 100.0 / limit as f64);
                }
            }
            "white"
        }
        "cost" => {
            let cost = ctx
                .hook
                .cost
                .as_ref()
                .and_then(|c| c.total_cost_usd)
                .unwrap_or(0.0);
            get_cost_color(cost)
        }
        _ => "white",
    }
}

/// Render one widget with its color applied. "none" leaves the content
/// untouched (widget colors itself); "auto" resolves from context.
pub fn render_widget(config: &WidgetConfig, ctx: &RenderContext) -> Option<String> {
    let widget = get_widget(&config.widget_type)?;

    let content = match widget.render(config, ctx) {
        Some(c) => c,
        None => widget.fallback_text()?.to_string(),
    };

    let mut color: &str = match &config.color {
        Some(c) => c.as_str(),
        None => widget.default_color(),
    };
    let resolved;
    if color == "auto" {
        resolved = resolve_auto_color(&config.widget_type, ctx);
        color = resolved;
    }
    if color == "none" {
        return Some(content);
    }
    Some(colorize(&content, Some(color), config.bold))
}

fn remove_orphaned_separators(pairs: Vec<(bool, String)>) -> Vec<String> {
    let mut result: Vec<(bool, String)> = Vec::new();
    let mut prev_was_separator = true; // drops leading separators too
    for (is_separator, content) in pairs {
        if is_separator {
            if !prev_was_separator {
                result.push((true, content));
            }
            prev_was_separator = true;
        } else {
            result.push((false, content));
            prev_was_separator = false;
        }
    }
    if result.last().is_some_and(|(sep, _)| *sep) {
        result.pop();
    }
    result.into_iter().map(|(_, content)| content).collect()
}

pub fn render_status_line(widget_configs: &[WidgetConfig], ctx: &RenderContext) -> String {
    let pairs: Vec<(bool, String)> = widget_configs
        .iter()
        .filter_map(|cfg| {
            render_widget(cfg, ctx).map(|s| (cfg.widget_type == "separator", s))
        })
        .collect();
    remove_orphaned_separators(pairs).concat()
}
