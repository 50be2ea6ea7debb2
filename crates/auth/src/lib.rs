//! `gatehouse-auth` — the authorization gate.
//!
//! Abilities, policies and before/after hooks, evaluated against an actor
//! supplied by the host. Sessions, storage and transport stay with the host.

pub mod ability;
pub mod authorizable;
pub mod config;
pub mod error;
pub mod gate;
pub mod policy;
pub mod response;

pub use ability::{AbilityDefinition, AbilityFn};
pub use authorizable::Authorizable;
pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use gate::{AfterHook, BeforeHook, Gate, UserResolver};
pub use policy::{Policy, PolicyContainer, PolicyFactory, PolicyMethods};
pub use response::{DEFAULT_DENIAL_MESSAGE, Outcome, Response, allow, deny};

pub use gatehouse_core::{Argument, Arguments, PolicyRef, Subject, SubjectType};
