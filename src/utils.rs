use std::io::Read;

pub fn read_stdin() -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin().read_to_end(&mut buf)?;
    Ok(buf)
}

/// Format a count with K/M suffixes ("120K", "1.5M").
pub fn format_number(num: u64, decimals: usize) -> String {
    if num < 1000 {
        num.to_string()
    } else if num < 1_000_000 {
        let k = num as f64 / 1000.0;
        if decimals == 0 {
            format!("{}K", k.round() as u64)
        } else {
            trim_trailing(&format!("{k:.decimals$}"), "K")
        }
    } else {
        let m = num as f64 / 1_000_000.0;
        if decimals == 0 {
            format!("{}M", m.round() as u64)
        } else {
            trim_trailing(&format!("{m:.decimals$}"), "M")
        }
    }
}

fn trim_trailing(value: &str, suffix: &str) -> String {
    let trimmed = value.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}{suffix}")
}

pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.1}%")
}

/// Filled/empty circle bar, ten segments by default.
pub fn render_progress_bar(percentage: f64, segments: usize) -> String {
    let filled = ((percentage / 100.0) * segments as f64) as usize;
    let filled = filled.min(segments);
    format!("{}{}", "●".repeat(filled), "○".repeat(segments - filled))
}

/// Human-readable elapsed time: "<1m", "45m", "2hr", "2hr 15m".
pub fn format_duration(duration_seconds: i64) -> String {
    if duration_seconds < 60 {
        return "<1m".to_string();
    }
    let total_minutes = duration_seconds / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours == 0 {
        format!("{minutes}m")
    } else if minutes == 0 {
        format!("{hours}hr")
    } else {
        format!("{hours}hr {minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_suffixes() {
        assert_eq!(format_number(999, 0), "999");
        assert_eq!(format_number(1000, 0), "1K");
        assert_eq!(format_number(120_400, 0), "120K");
        assert_eq!(format_number(1_500_000, 1), "1.5M");
        assert_eq!(format_number(2_000_000, 1), "2M");
    }

    #[test]
    fn progress_bar_fill() {
        assert_eq!(render_progress_bar(0.0, 10), "○○○○○○○○○○");
        assert_eq!(render_progress_bar(50.0, 10), "●●●●●○○○○○");
        assert_eq!(render_progress_bar(100.0, 10), "●●●●●●●●●●");
        assert_eq!(render_progress_bar(250.0, 10), "●●●●●●●●●●");
    }

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(0), "<1m");
        assert_eq!(format_duration(59), "<1m");
        assert_eq!(format_duration(60), "1m");
        assert_eq!(format_duration(45 * 60), "45m");
        assert_eq!(format_duration(2 * 3600), "2hr");
        assert_eq!(format_duration(2 * 3600 + 15 * 60), "2hr 15m");
    }
}
