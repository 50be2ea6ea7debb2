//! Ability checks from the actor's side (`user.can(&gate, "update", post)`).

use std::sync::Arc;

use gatehouse_core::Arguments;

use crate::error::GateResult;
use crate::gate::Gate;

/// Opt-in helpers for actor types.
///
/// ```ignore
/// impl Authorizable for User {}
///
/// if user.can(&gate, "update", Subject::new(post))? { ... }
/// ```
pub trait Authorizable: Clone + Send + Sync + Sized + 'static {
    /// Whether `self` holds `ability`, regardless of who the gate would resolve.
    fn can(&self, gate: &Gate<Self>, ability: &str, arguments: impl Into<Arguments>) -> GateResult<bool> {
        gate.for_user(Arc::new(self.clone())).check(ability, arguments)
    }

    fn cant(&self, gate: &Gate<Self>, ability: &str, arguments: impl Into<Arguments>) -> GateResult<bool> {
        Ok(!self.can(gate, ability, arguments)?)
    }

    fn cannot(&self, gate: &Gate<Self>, ability: &str, arguments: impl Into<Arguments>) -> GateResult<bool> {
        self.cant(gate, ability, arguments)
    }
}
