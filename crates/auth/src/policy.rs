//! Policies: ability checks grouped around one subject type.
//!
//! The gate never builds policies itself. It asks a [`PolicyFactory`] for an
//! instance by [`PolicyRef`], so hosts are free to wire policies up however
//! they like (a plain map, a DI container, lazily from config, ...).

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;

use gatehouse_core::{Arguments, PolicyRef};

use crate::ability::AbilityFn;
use crate::error::GateResult;
use crate::response::Outcome;

/// Policy-level interceptor: `(actor, ability, arguments) -> Some(outcome)` to short-circuit.
pub type PolicyBeforeFn<U> =
    dyn Fn(&U, &str, &Arguments) -> GateResult<Option<Outcome>> + Send + Sync;

/// A bundle of ability checks for one subject type.
pub trait Policy<U>: Send + Sync {
    /// Runs ahead of every method of this policy; `Some` short-circuits.
    ///
    /// Receives the original, untouched arguments.
    fn before(&self, _actor: &U, _ability: &str, _arguments: &Arguments) -> GateResult<Option<Outcome>> {
        Ok(None)
    }

    /// Whether the policy has a method called `method`.
    fn responds_to(&self, method: &str) -> bool;

    /// Invoke `method`. Unknown methods deny.
    fn call(&self, method: &str, actor: &U, arguments: &Arguments) -> GateResult<Outcome>;
}

/// Closure-backed policy: a method table built once, looked up by name.
pub struct PolicyMethods<U> {
    before: Option<Arc<PolicyBeforeFn<U>>>,
    methods: HashMap<String, Arc<AbilityFn<U>>>,
}

impl<U> PolicyMethods<U> {
    pub fn new() -> Self {
        Self {
            before: None,
            methods: HashMap::new(),
        }
    }

    pub fn with_before<F>(mut self, before: F) -> Self
    where
        F: Fn(&U, &str, &Arguments) -> GateResult<Option<Outcome>> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(before));
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&U, &Arguments) -> GateResult<Outcome> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<U> Default for PolicyMethods<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> Policy<U> for PolicyMethods<U> {
    fn before(&self, actor: &U, ability: &str, arguments: &Arguments) -> GateResult<Option<Outcome>> {
        match &self.before {
            Some(before) => before(actor, ability, arguments),
            None => Ok(None),
        }
    }

    fn responds_to(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    fn call(&self, method: &str, actor: &U, arguments: &Arguments) -> GateResult<Outcome> {
        match self.methods.get(method) {
            Some(method) => method(actor, arguments),
            None => Ok(Outcome::Bool(false)),
        }
    }
}

/// Builds policy instances from policy references.
pub trait PolicyFactory<U>: Send + Sync {
    fn resolve(&self, policy: &PolicyRef) -> anyhow::Result<Arc<dyn Policy<U>>>;
}

impl<U, F> PolicyFactory<U> for F
where
    F: Fn(&PolicyRef) -> anyhow::Result<Arc<dyn Policy<U>>> + Send + Sync,
{
    fn resolve(&self, policy: &PolicyRef) -> anyhow::Result<Arc<dyn Policy<U>>> {
        self(policy)
    }
}

type PolicyConstructor<U> = dyn Fn() -> anyhow::Result<Arc<dyn Policy<U>>> + Send + Sync;

/// In-memory [`PolicyFactory`]: policy references bound to constructors.
pub struct PolicyContainer<U> {
    bindings: HashMap<PolicyRef, Arc<PolicyConstructor<U>>>,
}

impl<U: 'static> PolicyContainer<U> {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Build a fresh instance on every resolution.
    pub fn bind<P, F>(&mut self, policy: impl Into<PolicyRef>, constructor: F) -> &mut Self
    where
        P: Policy<U> + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.bindings.insert(
            policy.into(),
            Arc::new(move || -> anyhow::Result<Arc<dyn Policy<U>>> {
                Ok(Arc::new(constructor()))
            }),
        );
        self
    }

    /// Bind a constructor that may fail (e.g. one that needs configuration).
    pub fn bind_fallible<F>(&mut self, policy: impl Into<PolicyRef>, constructor: F) -> &mut Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn Policy<U>>> + Send + Sync + 'static,
    {
        self.bindings.insert(policy.into(), Arc::new(constructor));
        self
    }

    /// Share one instance across every resolution.
    pub fn singleton(&mut self, policy: impl Into<PolicyRef>, instance: Arc<dyn Policy<U>>) -> &mut Self {
        self.bindings.insert(
            policy.into(),
            Arc::new(move || -> anyhow::Result<Arc<dyn Policy<U>>> { Ok(Arc::clone(&instance)) }),
        );
        self
    }

    pub fn contains(&self, policy: &PolicyRef) -> bool {
        self.bindings.contains_key(policy)
    }
}

impl<U: 'static> Default for PolicyContainer<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: 'static> PolicyFactory<U> for PolicyContainer<U> {
    fn resolve(&self, policy: &PolicyRef) -> anyhow::Result<Arc<dyn Policy<U>>> {
        let constructor = self
            .bindings
            .get(policy)
            .ok_or_else(|| anyhow!("no binding for policy [{policy}]"))?;
        constructor()
    }
}
