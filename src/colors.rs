//! # Colors Module
//!
//! Named ANSI colors for widget configs, plus the usage/cost color ramps.
//! Honors `NO_COLOR`; compiled to plain passthrough without the `colors`
//! feature.

#[cfg(feature = "colors")]
use owo_colors::{AnsiColors, OwoColorize, Style};

#[cfg(feature = "colors")]
fn ansi_for(name: &str) -> Option<AnsiColors> {
    Some(match name {
        "black" => AnsiColors::Black,
        "red" => AnsiColors::Red,
        "green" => AnsiColors::Green,
        "yellow" => AnsiColors::Yellow,
        "blue" => AnsiColors::Blue,
        "magenta" => AnsiColors::Magenta,
        "cyan" => AnsiColors::Cyan,
        "white" => AnsiColors::White,
        "bright_black" | "gray" | "grey" => AnsiColors::BrightBlack,
        "bright_red" => AnsiColors::BrightRed,
        "bright_green" => AnsiColors::BrightGreen,
        "bright_yellow" => AnsiColors::BrightYellow,
        "bright_blue" => AnsiColors::BrightBlue,
        "bright_magenta" => AnsiColors::BrightMagenta,
        "bright_cyan" => AnsiColors::BrightCyan,
        "bright_white" => AnsiColors::BrightWhite,
        _ => return None,
    })
}

/// Apply a named color to text. `None` and unknown names leave the text
/// plain; `"none"` means the widget handles its own coloring; `"dim"`
/// maps to the dimmed attribute.
#[cfg(feature = "colors")]
pub fn colorize(text: &str, color: Option<&str>, bold: bool) -> String {
    if text.is_empty() || std::env::var("NO_COLOR").is_ok() {
        return text.to_string();
    }
    let name = match color {
        Some("none") => return text.to_string(),
        Some(n) => Some(n.to_lowercase()),
        None => None,
    };

    let mut style = Style::new();
    let mut styled = false;
    if bold {
        style = style.bold();
        styled = true;
    }
    match name.as_deref() {
        Some("dim") => {
            style = style.dimmed();
            styled = true;
        }
        Some(n) => {
            if let Some(ansi) = ansi_for(n) {
                style = style.color(ansi);
                styled = true;
            }
        }
        None => {}
    }

    if styled {
        format!("{}", text.style(style))
    } else {
        text.to_string()
    }
}

#[cfg(not(feature = "colors"))]
pub fn colorize(text: &str, _color: Option<&str>, _bold: bool) -> String {
    text.to_string()
}

/// Ramp for context-usage percentages.
pub fn get_usage_color(percentage: f64) -> &'static str {
    if percentage < 50.0 {
        "green"
    } else if percentage < 80.0 {
        "yellow"
    } else {
        "red"
    }
}

/// Ramp for session cost in USD.
pub fn get_cost_color(cost_usd: f64) -> &'static str {
    if cost_usd == 0.0 {
        "grey"
    } else if cost_usd < 5.0 {
        "green"
    } else if cost_usd < 10.0 {
        "yellow"
    } else {
        "red"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_ramp_thresholds() {
        assert_eq!(get_usage_color(0.0), "green");
        assert_eq!(get_usage_color(49.9), "green");
        assert_eq!(get_usage_color(50.0), "yellow");
        assert_eq!(get_usage_color(79.9), "yellow");
        assert_eq!(get_usage_color(80.0), "red");
    }

    #[test]
    fn cost_ramp_thresholds() {
        assert_eq!(get_cost_color(0.0), "grey");
        assert_eq!(get_cost_color(1.0), "green");
        assert_eq!(get_cost_color(5.0), "yellow");
        assert_eq!(get_cost_color(10.0), "red");
    }

    #[test]
    fn none_color_passes_through() {
        assert_eq!(colorize("text", Some("none"), false), "text");
        assert_eq!(colorize("", Some("cyan"), false), "");
    }
}
