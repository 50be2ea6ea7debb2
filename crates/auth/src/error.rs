//! Gate error model.

use thiserror::Error;

use gatehouse_core::{PolicyRef, SubjectType};

use crate::response::{DEFAULT_DENIAL_MESSAGE, Response};

/// Result type used across the gate.
pub type GateResult<T> = Result<T, GateError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// A `"Type@method"` ability definition could not be parsed.
    #[error("invalid ability definition: {0}")]
    InvalidAbility(String),

    /// No policy is registered for the requested subject type.
    #[error("policy not defined for [{0}]")]
    PolicyNotDefined(SubjectType),

    /// The policy factory failed to build a policy instance.
    #[error("unable to resolve policy [{policy}]: {reason}")]
    PolicyResolution { policy: PolicyRef, reason: String },

    /// The ability was denied and the caller asked for exception-style control flow.
    #[error("{}", .0.message().unwrap_or(DEFAULT_DENIAL_MESSAGE))]
    Unauthorized(Response),
}

impl GateError {
    pub fn invalid_ability(msg: impl Into<String>) -> Self {
        Self::InvalidAbility(msg.into())
    }

    pub fn unauthorized(response: Response) -> Self {
        Self::Unauthorized(response)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// The denial response, when this is an authorization denial.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Unauthorized(response) => Some(response),
            _ => None,
        }
    }
}
