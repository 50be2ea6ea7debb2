//! Ability definitions and ability-name handling.

use std::borrow::Cow;
use std::sync::Arc;

use gatehouse_core::{Arguments, PolicyRef};

use crate::error::{GateError, GateResult};
use crate::response::Outcome;

/// Inline ability callback: `(actor, arguments) -> outcome`.
pub type AbilityFn<U> = dyn Fn(&U, &Arguments) -> GateResult<Outcome> + Send + Sync;

/// How a registered ability is evaluated.
pub enum AbilityDefinition<U> {
    /// Call the closure directly.
    Callback(Arc<AbilityFn<U>>),
    /// Resolve `policy` through the policy factory and call `method` on it.
    Delegate { policy: PolicyRef, method: String },
}

impl<U> AbilityDefinition<U> {
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&U, &Arguments) -> GateResult<Outcome> + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(callback))
    }

    /// Parse a `"Type@method"` definition.
    pub fn parse(definition: &str) -> GateResult<Self> {
        let Some((policy, method)) = definition.split_once('@') else {
            return Err(GateError::invalid_ability(format!(
                "'{definition}' is not a 'Type@method' string"
            )));
        };

        let (policy, method) = (policy.trim(), method.trim());
        if policy.is_empty() || method.is_empty() || method.contains('@') {
            return Err(GateError::invalid_ability(format!(
                "'{definition}' is not a 'Type@method' string"
            )));
        }

        Ok(Self::Delegate {
            policy: PolicyRef::new(policy.to_string()),
            method: method.to_string(),
        })
    }

    pub fn is_delegate(&self) -> bool {
        matches!(self, Self::Delegate { .. })
    }
}

impl<U> Clone for AbilityDefinition<U> {
    fn clone(&self) -> Self {
        match self {
            Self::Callback(callback) => Self::Callback(Arc::clone(callback)),
            Self::Delegate { policy, method } => Self::Delegate {
                policy: policy.clone(),
                method: method.clone(),
            },
        }
    }
}

impl<U> core::fmt::Debug for AbilityDefinition<U> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Delegate { policy, method } => write!(f, "Delegate({policy}@{method})"),
        }
    }
}

/// Policy method name for an ability (`"edit-post"` becomes `"editPost"`).
pub fn policy_method_name(ability: &str) -> Cow<'_, str> {
    if ability.contains('-') {
        Cow::Owned(camel_case(ability))
    } else {
        Cow::Borrowed(ability)
    }
}

/// camelCase a dash/underscore/space separated word list.
pub fn camel_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut upper_next = false;

    for ch in value.chars() {
        if matches!(ch, '-' | '_' | ' ') {
            upper_next = !out.is_empty();
            continue;
        }

        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}
