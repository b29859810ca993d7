use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct HookModel {
    pub id: String,
    pub display_name: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct HookWorkspace {
    pub current_dir: String,
    pub project_dir: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct OutputStyle {
    pub name: String,
}

/// Optional cost summary provided by Claude Code's statusLine input
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct HookCost {
    pub total_cost_usd: Option<f64>,
    pub total_duration_ms: Option<u64>,
    pub total_api_duration_ms: Option<u64>,
    pub total_lines_added: Option<i64>,
    pub total_lines_removed: Option<i64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CurrentUsage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cache_creation_input_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
}

/// Context window block newer Claude Code versions attach to the payload.
/// When present with a non-zero window size it supersedes the transcript scan.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ContextWindow {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub context_window_size: u64,
    pub current_usage: Option<CurrentUsage>,
}

impl ContextWindow {
    pub fn has_current_usage(&self) -> bool {
        self.current_usage
            .as_ref()
            .is_some_and(|u| u.input_tokens.is_some())
    }

    /// Current context occupancy: input + cache creation + cache read.
    pub fn current_context_tokens(&self) -> u64 {
        match &self.current_usage {
            Some(u) if u.input_tokens.is_some() => {
                u.input_tokens.unwrap_or(0)
                    + u.cache_creation_input_tokens.unwrap_or(0)
                    + u.cache_read_input_tokens.unwrap_or(0)
            }
            _ => 0,
        }
    }
}

/// Payload Claude Code writes to the statusline's stdin. Every field is
/// optional: malformed or empty input degrades to the all-default value
/// instead of failing the parent UI.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct HookJson {
    pub session_id: String,
    pub transcript_path: String,
    pub cwd: Option<String>,
    pub model: HookModel,
    pub workspace: HookWorkspace,
    pub version: Option<String>,
    pub output_style: Option<OutputStyle>,
    pub cost: Option<HookCost>,
    pub context_window: Option<ContextWindow>,
}
