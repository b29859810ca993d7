//! # Classification Module
//!
//! Per-line decisions over the JSONL transcript: compact boundary
//! detection, exclusion rules, and content character measurement.
//!
//! Both context accounting strategies (usage sums and the character
//! estimate) route every parsed line through [`classify`] so that
//! boundary and exclusion semantics cannot drift between them.

use serde_json::{Map, Value};

use crate::models::{ExclusionReason, LineClass};

/// Which lines are excluded from context accounting.
///
/// The listed fields are stored in Claude Code's JSONL files for debugging
/// and UI purposes but are not part of the context sent upstream. Records
/// carrying `toolUseResult`, `isMeta` or `thinkingMetadata` DO count: their
/// message content is transmitted.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    /// Presence of any of these keys excludes the record.
    pub metadata_fields: &'static [&'static str],
    /// Records whose `type` is one of these are excluded.
    pub excluded_types: &'static [&'static str],
    /// Boolean flags that exclude when true.
    pub excluded_flags: &'static [&'static str],
}

impl Default for ExclusionRules {
    fn default() -> Self {
        ExclusionRules {
            metadata_fields: &["snapshot", "leafUuid"],
            excluded_types: &["summary", "system"],
            excluded_flags: &[],
        }
    }
}

/// Real compact boundaries require all four markers: cosmetic or truncated
/// `system`/`compact_boundary` lines without trigger metadata must not
/// reset the accumulators.
pub fn is_real_compact_boundary(data: &Value) -> bool {
    data.get("type").and_then(Value::as_str) == Some("system")
        && data.get("subtype").and_then(Value::as_str) == Some("compact_boundary")
        && data
            .get("compactMetadata")
            .and_then(Value::as_object)
            .is_some_and(|m| m.contains_key("trigger"))
}

/// Evaluation order is fixed: metadata-field presence, then excluded type,
/// then flag truthiness. First match wins and supplies the reason.
pub fn should_exclude_line(
    data: &Value,
    rules: &ExclusionRules,
) -> Option<ExclusionReason> {
    for field in rules.metadata_fields {
        if data.get(*field).is_some() {
            return Some(ExclusionReason::MetadataField(field));
        }
    }

    if let Some(line_type) = data.get("type").and_then(Value::as_str) {
        if rules.excluded_types.contains(&line_type) {
            return Some(ExclusionReason::RecordType(line_type.to_string()));
        }
    }

    for flag in rules.excluded_flags {
        if data.get(*flag).and_then(Value::as_bool) == Some(true) {
            return Some(ExclusionReason::Flag(flag));
        }
    }

    None
}

/// Resolve one parsed line to its category. Boundary status is checked
/// before the exclusion rules: a real boundary is also `type=system` and
/// would otherwise be misfiled as merely excluded.
pub fn classify(data: &Value, rules: &ExclusionRules) -> LineClass {
    if is_real_compact_boundary(data) {
        return LineClass::CompactBoundary;
    }
    match should_exclude_line(data, rules) {
        Some(reason) => LineClass::Excluded(reason),
        None => LineClass::Content,
    }
}

/// Count the characters of a record that actually reach the model.
///
/// Only `role` and `content` are serialized; response metadata (usage
/// stats, request ids, model tags) would wildly overcount. Inline image
/// parts are dropped entirely: their base64 payloads are not billed as
/// text tokens and would dominate the estimate.
pub fn content_chars(data: &Value) -> usize {
    let Some(message) = data.get("message").and_then(Value::as_object) else {
        return 0;
    };
    if message.is_empty() {
        return 0;
    }

    let mut filtered = Map::new();

    if let Some(role) = message.get("role") {
        filtered.insert("role".to_string(), role.clone());
    }

    if let Some(content) = message.get("content") {
        let kept = match content {
            Value::Array(parts) => Value::Array(
                parts
                    .iter()
                    .filter(|part| {
                        part.get("type").and_then(Value::as_str) != Some("image")
                    })
                    .cloned()
                    .collect(),
            ),
            other => other.clone(),
        };
        filtered.insert("content".to_string(), kept);
    }

    serde_json::to_string(&Value::Object(filtered))
        .map(|s| s.len())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_compact_boundary() {
        let data = json!({
            "type": "system",
            "subtype": "compact_boundary",
            "compactMetadata": {"trigger": "manual"},
        });
        assert!(is_real_compact_boundary(&data));
    }

    #[test]
    fn missing_compact_metadata_is_not_boundary() {
        let data = json!({"type": "system", "subtype": "compact_boundary"});
        assert!(!is_real_compact_boundary(&data));
    }

    #[test]
    fn boundary_requires_trigger_key() {
        let data = json!({
            "type": "system",
            "subtype": "compact_boundary",
            "compactMetadata": {},
        });
        assert!(!is_real_compact_boundary(&data));
    }

    #[test]
    fn excludes_summary_and_system_types() {
        let rules = ExclusionRules::default();
        assert!(should_exclude_line(&json!({"type": "summary"}), &rules).is_some());
        assert!(should_exclude_line(&json!({"type": "system"}), &rules).is_some());
    }

    #[test]
    fn excludes_snapshot_and_leaf_uuid_metadata() {
        let rules = ExclusionRules::default();
        let snap = json!({"type": "file-history-snapshot", "snapshot": {}});
        assert_eq!(
            should_exclude_line(&snap, &rules),
            Some(ExclusionReason::MetadataField("snapshot"))
        );
        let leaf = json!({"type": "user", "leafUuid": "abc-123"});
        assert_eq!(
            should_exclude_line(&leaf, &rules),
            Some(ExclusionReason::MetadataField("leafUuid"))
        );
    }

    #[test]
    fn includes_tool_results_meta_and_thinking() {
        // These carry message content that is transmitted upstream.
        let rules = ExclusionRules::default();
        let tool = json!({"type": "user", "toolUseResult": {"output": "result"}});
        assert!(should_exclude_line(&tool, &rules).is_none());
        let meta = json!({"type": "user", "isMeta": true});
        assert!(should_exclude_line(&meta, &rules).is_none());
        let thinking = json!({"type": "assistant", "thinkingMetadata": {"duration": 1000}});
        assert!(should_exclude_line(&thinking, &rules).is_none());
    }

    #[test]
    fn includes_plain_user_message() {
        let rules = ExclusionRules::default();
        let data = json!({"type": "user", "message": {"role": "user", "content": "Hello"}});
        assert!(should_exclude_line(&data, &rules).is_none());
        assert_eq!(classify(&data, &rules), LineClass::Content);
    }

    #[test]
    fn metadata_presence_wins_over_type() {
        let rules = ExclusionRules::default();
        let data = json!({"type": "summary", "snapshot": {}});
        assert_eq!(
            should_exclude_line(&data, &rules),
            Some(ExclusionReason::MetadataField("snapshot"))
        );
    }

    #[test]
    fn filters_base64_images_from_char_count() {
        let large = "A".repeat(100_000);
        let data = json!({
            "message": {
                "role": "user",
                "content": [
                    {"type": "text", "text": "Here is an image:"},
                    {"type": "image", "source": {"type": "base64", "data": large}},
                ],
            }
        });
        assert!(content_chars(&data) < 1000);
    }

    #[test]
    fn counts_text_alongside_images() {
        let data = json!({
            "message": {
                "role": "user",
                "content": [
                    {"type": "text", "text": "Description of the image"},
                    {"type": "image", "source": {"type": "base64", "data": "abc123"}},
                ],
            }
        });
        assert!(content_chars(&data) > 0);
    }

    #[test]
    fn ignores_non_content_message_fields() {
        let bare = json!({"message": {"role": "assistant", "content": "hi"}});
        let noisy = json!({
            "message": {
                "role": "assistant",
                "content": "hi",
                "model": "claude-sonnet-4-5-20250929",
                "usage": {"input_tokens": 12345, "output_tokens": 678},
                "id": "msg_0123456789abcdef",
            }
        });
        assert_eq!(content_chars(&bare), content_chars(&noisy));
    }

    #[test]
    fn empty_message_contributes_nothing() {
        assert_eq!(content_chars(&json!({"message": {}})), 0);
        assert_eq!(content_chars(&json!({"type": "user"})), 0);
    }
}
