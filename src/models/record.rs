use std::fmt;

/// Category a parsed transcript line resolves to. The classifier produces
/// exactly one of these per line; callers never probe raw fields themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Real compact boundary: everything scanned so far leaves live context.
    CompactBoundary,
    /// Carried for diagnostics only, never affects accounting beyond skipping.
    Excluded(ExclusionReason),
    /// Content-bearing record whose filtered message characters count.
    Content,
}

/// Why a line was excluded from context accounting. Rendered only into
/// debug logs; correctness never depends on the reason text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    MetadataField(&'static str),
    RecordType(String),
    Flag(&'static str),
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::MetadataField(name) => write!(f, "has {name}"),
            ExclusionReason::RecordType(t) => write!(f, "type={t}"),
            ExclusionReason::Flag(name) => write!(f, "{name}=true"),
        }
    }
}
