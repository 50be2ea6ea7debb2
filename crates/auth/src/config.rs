//! Gate configuration.

use serde::{Deserialize, Serialize};

pub const NORMALIZE_ABILITY_NAMES_ENV: &str = "GATEHOUSE_NORMALIZE_ABILITY_NAMES";
pub const LOG_DECISIONS_ENV: &str = "GATEHOUSE_LOG_DECISIONS";

/// Tunables for a [`Gate`](crate::Gate). Derived gates inherit them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Map dashed ability names to camelCase policy methods (`edit-post` -> `editPost`).
    pub normalize_ability_names: bool,

    /// Emit a `debug` record for every decision.
    pub log_decisions: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            normalize_ability_names: true,
            log_decisions: true,
        }
    }
}

impl GateConfig {
    /// Read overrides from `GATEHOUSE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; missing or unparseable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            normalize_ability_names: flag(&lookup, NORMALIZE_ABILITY_NAMES_ENV, defaults.normalize_ability_names),
            log_decisions: flag(&lookup, LOG_DECISIONS_ENV, defaults.log_decisions),
        }
    }
}

fn flag<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        other => {
            tracing::warn!("{} has unrecognized value '{}'; using default {}", key, other, default);
            default
        }
    }
}
