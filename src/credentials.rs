//! # Credentials Module
//!
//! Subscription info from `~/.claude/.credentials.json`. A console API key
//! in the environment short-circuits the file read; every failure mode
//! degrades to the default (unknown) info.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::models::SubscriptionInfo;

pub fn credentials_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".claude").join(".credentials.json"))
}

pub fn read_subscription_info() -> SubscriptionInfo {
    // sk-ant-api* keys are console keys, not OAuth tokens
    if let Ok(api_key) = std::env::var("ANTHROPIC_API_KEY") {
        if api_key.starts_with("sk-ant-api") {
            return SubscriptionInfo {
                is_subscription: false,
                ..SubscriptionInfo::default()
            };
        }
    }

    match credentials_path() {
        Some(path) => read_subscription_info_from(&path),
        None => SubscriptionInfo::default(),
    }
}

pub fn read_subscription_info_from(path: &Path) -> SubscriptionInfo {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return SubscriptionInfo::default();
    };
    let Ok(data) = serde_json::from_str::<Value>(&raw) else {
        return SubscriptionInfo::default();
    };

    match data.get("claudeAiOauth").and_then(Value::as_object) {
        Some(oauth) => SubscriptionInfo {
            is_subscription: true,
            subscription_type: oauth
                .get("subscriptionType")
                .and_then(Value::as_str)
                .map(String::from),
            rate_limit_tier: oauth
                .get("rateLimitTier")
                .and_then(Value::as_str)
                .map(String::from),
        },
        None => SubscriptionInfo {
            is_subscription: false,
            ..SubscriptionInfo::default()
        },
    }
}
