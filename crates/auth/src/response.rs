//! Evaluation outcomes and structured authorization responses.

use serde::{Deserialize, Serialize};

use crate::error::{GateError, GateResult};

/// Message carried by denials that do not provide their own.
pub const DEFAULT_DENIAL_MESSAGE: &str = "This action is unauthorized.";

/// Structured result of an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    allowed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<u16>,
}

impl Response {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            message: None,
            code: None,
        }
    }

    /// A denial carrying [`DEFAULT_DENIAL_MESSAGE`].
    pub fn deny() -> Self {
        Self {
            allowed: false,
            message: Some(DEFAULT_DENIAL_MESSAGE.to_string()),
            code: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn without_message(mut self) -> Self {
        self.message = None;
        self
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn allowed(&self) -> bool {
        self.allowed
    }

    pub fn denied(&self) -> bool {
        !self.allowed
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn code(&self) -> Option<u16> {
        self.code
    }
}

/// What an ability callback, policy method or hook produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Bool(bool),
    Response(Response),
}

impl Outcome {
    pub fn is_allowed(&self) -> bool {
        match self {
            Self::Bool(allowed) => *allowed,
            Self::Response(response) => response.allowed(),
        }
    }

    pub fn into_response(self) -> Response {
        match self {
            Self::Bool(true) => Response::allow(),
            Self::Bool(false) => Response::deny(),
            Self::Response(response) => response,
        }
    }
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Response> for Outcome {
    fn from(value: Response) -> Self {
        Self::Response(value)
    }
}

/// Grant from inside an ability callback or policy method.
pub fn allow() -> GateResult<Outcome> {
    Ok(Outcome::Response(Response::allow()))
}

/// Deny from inside an ability callback or policy method.
///
/// Raises an authorization error: `check` turns it into `false`, `authorize`
/// hands it to the caller.
pub fn deny(message: impl Into<String>) -> GateResult<Outcome> {
    Err(GateError::Unauthorized(Response::deny().with_message(message)))
}
