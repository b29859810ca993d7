pub mod hook;
pub mod metrics;
pub mod record;

pub use hook::{ContextWindow, HookCost, HookJson, HookModel, HookWorkspace, OutputStyle};
pub use metrics::{GitStatus, SessionMetrics, SubscriptionInfo, TokenMetrics};
pub use record::{ExclusionReason, LineClass};
