//! The authorization gate: ability/policy registry plus evaluation pipeline.
//!
//! Every check goes through [`Gate::raw`]:
//!
//! 1. resolve the actor (none means `false`, no hooks run);
//! 2. run before-hooks in order, the first `Some` wins;
//! 3. otherwise run the policy method or inline ability;
//! 4. run every after-hook with the result (they only observe it).
//!
//! `check`/`allows`/`denies` swallow authorization denials raised during
//! evaluation and answer with a boolean. `authorize` does not: it hands denials
//! back as [`GateError::Unauthorized`].

use std::collections::HashMap;
use std::sync::Arc;

use gatehouse_core::{Argument, Arguments, PolicyRef, SubjectType};

use crate::ability::{AbilityDefinition, policy_method_name};
use crate::config::GateConfig;
use crate::error::{GateError, GateResult};
use crate::policy::{Policy, PolicyFactory};
use crate::response::{Outcome, Response};

/// Supplies the current actor, or `None` when nobody is authenticated.
pub type UserResolver<U> = dyn Fn() -> Option<Arc<U>> + Send + Sync;

/// Global interceptor run ahead of every check: `(actor, ability, arguments)`.
pub type BeforeHook<U> = dyn Fn(&U, &str, &Arguments) -> GateResult<Option<Outcome>> + Send + Sync;

/// Global observer run after every check: `(actor, ability, arguments, result)`.
pub type AfterHook<U> = dyn Fn(&U, &str, &Arguments, &Outcome) + Send + Sync;

pub struct Gate<U> {
    factory: Arc<dyn PolicyFactory<U>>,
    user_resolver: Arc<UserResolver<U>>,
    abilities: HashMap<String, AbilityDefinition<U>>,
    policies: HashMap<SubjectType, PolicyRef>,
    before_callbacks: Vec<Arc<BeforeHook<U>>>,
    after_callbacks: Vec<Arc<AfterHook<U>>>,
    config: GateConfig,
}

impl<U> Clone for Gate<U> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            user_resolver: Arc::clone(&self.user_resolver),
            abilities: self.abilities.clone(),
            policies: self.policies.clone(),
            before_callbacks: self.before_callbacks.clone(),
            after_callbacks: self.after_callbacks.clone(),
            config: self.config.clone(),
        }
    }
}

impl<U> core::fmt::Debug for Gate<U> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Gate")
            .field("abilities", &self.abilities)
            .field("policies", &self.policies)
            .field("before_callbacks", &self.before_callbacks.len())
            .field("after_callbacks", &self.after_callbacks.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<U: Send + Sync + 'static> Gate<U> {
    pub fn new<F, R>(factory: F, user_resolver: R) -> Self
    where
        F: PolicyFactory<U> + 'static,
        R: Fn() -> Option<Arc<U>> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            user_resolver: Arc::new(user_resolver),
            abilities: HashMap::new(),
            policies: HashMap::new(),
            before_callbacks: Vec::new(),
            after_callbacks: Vec::new(),
            config: GateConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether an ability has been defined under `ability`.
    pub fn has(&self, ability: &str) -> bool {
        self.abilities.contains_key(ability)
    }

    /// Define (or redefine) an ability with an inline callback.
    pub fn define<F>(&mut self, ability: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn(&U, &Arguments) -> GateResult<Outcome> + Send + Sync + 'static,
    {
        self.insert_ability(ability.into(), AbilityDefinition::callback(callback))
    }

    /// Define an ability as `"Type@method"`: resolve `Type` through the policy
    /// factory and call its `method`.
    pub fn define_delegate(&mut self, ability: impl Into<String>, definition: &str) -> GateResult<&mut Self> {
        let definition = AbilityDefinition::parse(definition)?;
        Ok(self.insert_ability(ability.into(), definition))
    }

    /// Register a prepared definition.
    pub fn define_with(&mut self, ability: impl Into<String>, definition: AbilityDefinition<U>) -> &mut Self {
        self.insert_ability(ability.into(), definition)
    }

    fn insert_ability(&mut self, ability: String, definition: AbilityDefinition<U>) -> &mut Self {
        tracing::trace!(ability = %ability, ?definition, "ability defined");
        self.abilities.insert(ability, definition);
        self
    }

    /// Use `policy` for every subject of `subject_type`; replaces any previous binding.
    pub fn policy(&mut self, subject_type: impl Into<SubjectType>, policy: impl Into<PolicyRef>) -> &mut Self {
        self.policies.insert(subject_type.into(), policy.into());
        self
    }

    pub fn before<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&U, &str, &Arguments) -> GateResult<Option<Outcome>> + Send + Sync + 'static,
    {
        self.before_callbacks.push(Arc::new(callback));
        self
    }

    pub fn after<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&U, &str, &Arguments, &Outcome) + Send + Sync + 'static,
    {
        self.after_callbacks.push(Arc::new(callback));
        self
    }

    /// Defined ability names, sorted.
    pub fn abilities(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.abilities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Policy bindings, sorted by subject type.
    pub fn policies(&self) -> Vec<(&SubjectType, &PolicyRef)> {
        let mut bindings: Vec<_> = self.policies.iter().collect();
        bindings.sort_unstable_by(|a, b| a.0.cmp(b.0));
        bindings
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Evaluation
    // ─────────────────────────────────────────────────────────────────────────

    pub fn allows(&self, ability: &str, arguments: impl Into<Arguments>) -> GateResult<bool> {
        self.check(ability, arguments)
    }

    pub fn denies(&self, ability: &str, arguments: impl Into<Arguments>) -> GateResult<bool> {
        Ok(!self.allows(ability, arguments)?)
    }

    /// Boolean answer. Authorization denials raised while evaluating become
    /// `false`; policy resolution failures still propagate.
    pub fn check(&self, ability: &str, arguments: impl Into<Arguments>) -> GateResult<bool> {
        match self.raw(ability, arguments) {
            Ok(result) => Ok(result.is_allowed()),
            Err(GateError::Unauthorized(response)) => {
                tracing::debug!(
                    "ability '{}' raised a denial ({}); answering false",
                    ability,
                    response.message().unwrap_or("no message")
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Strict answer: a response when granted, [`GateError::Unauthorized`] when denied.
    ///
    /// A [`Response`] produced by a callback or hook is returned unchanged.
    pub fn authorize(&self, ability: &str, arguments: impl Into<Arguments>) -> GateResult<Response> {
        match self.raw(ability, arguments)? {
            Outcome::Response(response) => Ok(response),
            Outcome::Bool(true) => Ok(Response::allow()),
            Outcome::Bool(false) => Err(GateError::Unauthorized(Response::deny())),
        }
    }

    /// Run the pipeline and return whatever it produced.
    pub fn raw(&self, ability: &str, arguments: impl Into<Arguments>) -> GateResult<Outcome> {
        let Some(user) = self.resolve_user() else {
            tracing::debug!("no actor resolved; denying ability '{}'", ability);
            return Ok(Outcome::Bool(false));
        };

        let arguments = arguments.into();

        let result = match self.call_before_callbacks(&user, ability, &arguments)? {
            Some(result) => result,
            None => self.call_auth_callback(&user, ability, &arguments)?,
        };

        self.call_after_callbacks(&user, ability, &arguments, &result);

        if self.config.log_decisions {
            tracing::debug!(
                ability = %ability,
                arguments = arguments.len(),
                allowed = result.is_allowed(),
                "gate decision"
            );
        }

        Ok(result)
    }

    fn call_before_callbacks(&self, user: &U, ability: &str, arguments: &Arguments) -> GateResult<Option<Outcome>> {
        for (index, before) in self.before_callbacks.iter().enumerate() {
            if let Some(result) = before(user, ability, arguments)? {
                tracing::trace!(ability = %ability, hook = index, "before-hook decided");
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    fn call_after_callbacks(&self, user: &U, ability: &str, arguments: &Arguments, result: &Outcome) {
        for after in &self.after_callbacks {
            after(user, ability, arguments, result);
        }
    }

    fn call_auth_callback(&self, user: &U, ability: &str, arguments: &Arguments) -> GateResult<Outcome> {
        if let Some(policy) = self.policy_for_ability(ability, arguments)? {
            tracing::trace!(ability = %ability, "resolved through policy");
            return self.call_policy(&*policy, user, ability, arguments);
        }

        match self.abilities.get(ability) {
            Some(AbilityDefinition::Callback(callback)) => callback(user, arguments),
            Some(AbilityDefinition::Delegate { policy, method }) => {
                self.resolve_policy(policy)?.call(method, user, arguments)
            }
            None => {
                tracing::trace!(ability = %ability, "ability not defined");
                Ok(Outcome::Bool(false))
            }
        }
    }

    /// The policy that should handle `ability`, when the first argument maps to
    /// a registered policy and that policy has a matching method.
    fn policy_for_ability(&self, ability: &str, arguments: &Arguments) -> GateResult<Option<Arc<dyn Policy<U>>>> {
        let Some(subject_type) = arguments.first().and_then(|first| self.registered_subject_type(first)) else {
            return Ok(None);
        };

        let policy = self.get_policy_for(subject_type)?;
        let method = self.method_name(ability);

        Ok(policy.responds_to(&method).then_some(policy))
    }

    fn call_policy(&self, policy: &dyn Policy<U>, user: &U, ability: &str, arguments: &Arguments) -> GateResult<Outcome> {
        if let Some(result) = policy.before(user, ability, arguments)? {
            return Ok(result);
        }

        let method = self.method_name(ability);

        // A leading type name only selected the policy; the method never sees it.
        let forwarded;
        let arguments = if arguments.first().is_some_and(Argument::is_type_reference) {
            forwarded = arguments.rest();
            &forwarded
        } else {
            arguments
        };

        if !policy.responds_to(&method) {
            return Ok(Outcome::Bool(false));
        }

        policy.call(&method, user, arguments)
    }

    fn method_name<'a>(&self, ability: &'a str) -> std::borrow::Cow<'a, str> {
        if self.config.normalize_ability_names {
            policy_method_name(ability)
        } else {
            std::borrow::Cow::Borrowed(ability)
        }
    }

    fn registered_subject_type(&self, argument: &Argument) -> Option<&str> {
        let name = argument.type_name()?;
        self.policies.get_key_value(name).map(|(key, _)| key.as_str())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Policies
    // ─────────────────────────────────────────────────────────────────────────

    pub fn has_policy_for(&self, subject_type: impl AsRef<str>) -> bool {
        self.policies.contains_key(subject_type.as_ref())
    }

    /// Policy instance for `subject_type`.
    pub fn get_policy_for(&self, subject_type: impl AsRef<str>) -> GateResult<Arc<dyn Policy<U>>> {
        let subject_type = subject_type.as_ref();
        let Some(policy) = self.policies.get(subject_type) else {
            return Err(GateError::PolicyNotDefined(SubjectType::new(subject_type.to_string())));
        };
        self.resolve_policy(policy)
    }

    /// Build a policy instance through the factory.
    pub fn resolve_policy(&self, policy: &PolicyRef) -> GateResult<Arc<dyn Policy<U>>> {
        self.factory.resolve(policy).map_err(|err| {
            tracing::warn!("failed to resolve policy [{}]: {:#}", policy, err);
            GateError::PolicyResolution {
                policy: policy.clone(),
                reason: format!("{err:#}"),
            }
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actors
    // ─────────────────────────────────────────────────────────────────────────

    /// A gate that always evaluates as `user`.
    ///
    /// The derived gate starts with the same abilities, policies and hooks
    /// (callbacks are shared, not copied); later registrations on either gate
    /// are not seen by the other.
    pub fn for_user(&self, user: impl Into<Arc<U>>) -> Self {
        let user: Arc<U> = user.into();
        Self {
            user_resolver: Arc::new(move || Some(Arc::clone(&user))),
            ..self.clone()
        }
    }

    /// `authorize` on behalf of `user` instead of the resolved actor.
    pub fn authorize_for_user(
        &self,
        user: impl Into<Arc<U>>,
        ability: &str,
        arguments: impl Into<Arguments>,
    ) -> GateResult<Response> {
        self.for_user(user).authorize(ability, arguments)
    }

    fn resolve_user(&self) -> Option<Arc<U>> {
        (self.user_resolver)()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;
    use gatehouse_core::Subject;
    use proptest::prelude::*;

    use super::*;
    use crate::policy::{PolicyContainer, PolicyMethods};
    use crate::response::deny;

    #[derive(Debug, Clone, PartialEq)]
    struct User {
        id: u64,
        is_admin: bool,
    }

    #[derive(Debug)]
    struct Post {
        owner_id: u64,
    }

    fn user(id: u64) -> User {
        User { id, is_admin: false }
    }

    fn admin(id: u64) -> User {
        User { id, is_admin: true }
    }

    fn post_policy() -> PolicyMethods<User> {
        PolicyMethods::new()
            .method("update", |actor: &User, args: &Arguments| {
                let post = args.first().and_then(Argument::downcast_ref::<Post>);
                Ok(Outcome::from(post.is_some_and(|p| p.owner_id == actor.id)))
            })
            .method("create", |actor: &User, args: &Arguments| {
                // Type references are dropped: anything left is a real argument.
                Ok(Outcome::from(args.is_empty() && actor.id > 0))
            })
            .method("editPost", |_: &User, _: &Arguments| Ok(Outcome::from(true)))
            .method("publish", |_: &User, _: &Arguments| deny("posts are published by editors"))
    }

    fn container() -> PolicyContainer<User> {
        let mut container = PolicyContainer::new();
        container.bind("PostPolicy", post_policy);
        container
    }

    fn gate_for(actor: Option<User>) -> Gate<User> {
        let actor = actor.map(Arc::new);
        Gate::new(container(), move || actor.clone())
    }

    fn post_gate(actor: User) -> Gate<User> {
        let mut gate = gate_for(Some(actor));
        gate.policy(SubjectType::of::<Post>(), "PostPolicy");
        gate
    }

    fn post(owner_id: u64) -> Subject {
        Subject::new(Post { owner_id })
    }

    #[test]
    fn view_dashboard_follows_the_admin_flag() {
        let mut gate = gate_for(Some(admin(1)));
        gate.define("view-dashboard", |actor: &User, _: &Arguments| Ok(actor.is_admin.into()));

        assert!(gate.allows("view-dashboard", ()).unwrap());
        assert!(!gate.for_user(user(2)).allows("view-dashboard", ()).unwrap());
    }

    #[test]
    fn policy_checks_post_ownership() {
        let gate = post_gate(user(1));

        assert!(gate.allows("update", post(1)).unwrap());
        assert!(!gate.allows("update", post(2)).unwrap());
    }

    #[test]
    fn authorize_raises_where_check_answers_false() {
        let gate = post_gate(user(1));

        let err = gate.authorize("update", post(2)).unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "This action is unauthorized.");

        assert!(!gate.check("update", post(2)).unwrap());
        assert!(gate.authorize("update", post(1)).unwrap().allowed());
    }

    #[test]
    fn raised_denials_are_swallowed_only_by_check() {
        let gate = post_gate(user(1));

        assert!(!gate.check("publish", post(1)).unwrap());
        assert!(gate.denies("publish", post(1)).unwrap());

        let err = gate.authorize("publish", post(1)).unwrap_err();
        assert_eq!(err.to_string(), "posts are published by editors");
    }

    #[test]
    fn undefined_abilities_deny_without_error() {
        let gate = gate_for(Some(admin(1)));

        assert!(!gate.allows("launch-rockets", ()).unwrap());
        assert!(!gate.has("launch-rockets"));
        assert!(gate.authorize("launch-rockets", ()).unwrap_err().is_unauthorized());
    }

    #[test]
    fn missing_actor_denies_without_running_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut gate = gate_for(None);

        let before_calls = Arc::clone(&calls);
        gate.before(move |_: &User, _: &str, _: &Arguments| {
            before_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Outcome::Bool(true)))
        });
        let after_calls = Arc::clone(&calls);
        gate.after(move |_: &User, _: &str, _: &Arguments, _: &Outcome| {
            after_calls.fetch_add(1, Ordering::SeqCst);
        });
        gate.define("anything", |_: &User, _: &Arguments| Ok(true.into()));

        assert!(!gate.check("anything", ()).unwrap());
        assert!(gate.denies("anything", ()).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn first_non_null_before_hook_short_circuits() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut gate = gate_for(Some(user(1)));

        let log = Arc::clone(&seen);
        gate.before(move |_: &User, _: &str, _: &Arguments| {
            log.lock().unwrap().push("first");
            Ok(None)
        });
        let log = Arc::clone(&seen);
        gate.before(move |_: &User, ability: &str, _: &Arguments| {
            log.lock().unwrap().push("second");
            Ok((ability == "edit").then_some(Outcome::Bool(true)))
        });
        let log = Arc::clone(&seen);
        gate.before(move |_: &User, _: &str, _: &Arguments| {
            log.lock().unwrap().push("third");
            Ok(Some(Outcome::Bool(false)))
        });
        let log = Arc::clone(&seen);
        gate.define("edit", move |_: &User, _: &Arguments| {
            log.lock().unwrap().push("ability");
            Ok(false.into())
        });

        assert!(gate.allows("edit", ()).unwrap());
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn after_hooks_observe_but_cannot_change_the_result() {
        let observed = Arc::new(Mutex::new(Vec::new()));
        let mut gate = gate_for(Some(user(1)));
        gate.define("edit", |_: &User, _: &Arguments| Ok(false.into()));

        let log = Arc::clone(&observed);
        gate.after(move |actor: &User, ability: &str, args: &Arguments, result: &Outcome| {
            log.lock()
                .unwrap()
                .push((actor.id, ability.to_string(), args.len(), result.clone()));
        });
        let log = Arc::clone(&observed);
        gate.after(move |_: &User, _: &str, _: &Arguments, result: &Outcome| {
            log.lock().unwrap().push((0, "second".to_string(), 0, result.clone()));
        });

        assert!(!gate.allows("edit", Argument::from(7i64)).unwrap());
        assert_eq!(
            *observed.lock().unwrap(),
            vec![
                (1, "edit".to_string(), 1, Outcome::Bool(false)),
                (0, "second".to_string(), 0, Outcome::Bool(false)),
            ]
        );
    }

    #[test]
    fn policy_methods_win_over_direct_abilities() {
        let mut gate = post_gate(user(1));
        gate.define("update", |_: &User, _: &Arguments| Ok(true.into()));

        // Subject instance: the policy decides.
        assert!(!gate.allows("update", post(2)).unwrap());
        // No subject: the direct ability decides.
        assert!(gate.allows("update", ()).unwrap());
    }

    #[test]
    fn direct_ability_is_used_when_the_policy_lacks_the_method() {
        let mut gate = post_gate(user(1));
        gate.define("archive", |_: &User, args: &Arguments| Ok((args.len() == 1).into()));

        assert!(gate.allows("archive", post(2)).unwrap());
    }

    #[test]
    fn dashed_abilities_map_to_camel_case_methods() {
        let gate = post_gate(user(1));
        assert!(gate.allows("edit-post", post(9)).unwrap());

        let strict = post_gate(user(1)).with_config(GateConfig {
            normalize_ability_names: false,
            ..GateConfig::default()
        });
        assert!(!strict.allows("edit-post", post(9)).unwrap());
    }

    #[test]
    fn type_references_select_the_policy_and_are_dropped() {
        let gate = post_gate(user(3));

        assert!(gate.allows("create", SubjectType::of::<Post>()).unwrap());
        assert!(gate.allows("create", Argument::from(SubjectType::of::<Post>().as_str())).unwrap());
        assert!(!gate.for_user(user(0)).allows("create", Argument::type_of::<Post>()).unwrap());
    }

    #[test]
    fn policy_before_short_circuits_with_original_arguments() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut container = PolicyContainer::new();
        let counter = Arc::clone(&seen);
        container.bind("PostPolicy", move || {
            let counter = Arc::clone(&counter);
            post_policy().with_before(move |actor: &User, ability: &str, args: &Arguments| {
                counter.store(args.len(), Ordering::SeqCst);
                Ok((actor.is_admin && ability != "publish").then_some(Outcome::Bool(true)))
            })
        });

        let boss = Arc::new(admin(1));
        let mut gate = Gate::new(container, move || Some(Arc::clone(&boss)));
        gate.policy(SubjectType::of::<Post>(), "PostPolicy");

        assert!(gate.allows("update", vec![Argument::from(post(2)), Argument::from(5i64)]).unwrap());
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        assert!(gate.allows("create", Argument::type_of::<Post>()).unwrap());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delegate_definitions_call_the_named_policy_method() {
        let mut gate = gate_for(Some(user(4)));
        gate.define_delegate("update-post", "PostPolicy@update").unwrap();

        assert!(gate.has("update-post"));
        assert!(gate.allows("update-post", post(4)).unwrap());
        assert!(!gate.allows("update-post", post(5)).unwrap());
    }

    #[test]
    fn malformed_delegates_fail_at_definition() {
        let mut gate = gate_for(Some(user(4)));

        let err = gate.define_delegate("update-post", "PostPolicy").unwrap_err();
        assert!(matches!(err, GateError::InvalidAbility(_)));
        assert!(!gate.has("update-post"));
    }

    #[test]
    fn redefinition_overwrites() {
        let mut gate = gate_for(Some(user(1)));
        gate.define("edit", |_: &User, _: &Arguments| Ok(false.into()));
        gate.define("edit", |_: &User, _: &Arguments| Ok(true.into()));

        assert!(gate.allows("edit", ()).unwrap());
        assert_eq!(gate.abilities(), vec!["edit"]);
    }

    #[test]
    fn last_policy_registration_wins() {
        let mut container = container();
        container.bind("DenyAll", || {
            PolicyMethods::new().method("update", |_: &User, _: &Arguments| Ok(false.into()))
        });
        let owner = Arc::new(user(1));
        let mut gate = Gate::new(container, move || Some(Arc::clone(&owner)));
        gate.policy(SubjectType::of::<Post>(), "PostPolicy");
        gate.policy(SubjectType::of::<Post>(), "DenyAll");

        assert!(!gate.allows("update", post(1)).unwrap());
        assert_eq!(gate.policies().len(), 1);
        assert_eq!(gate.policies()[0].1.as_str(), "DenyAll");
    }

    #[test]
    fn policy_lookup_and_resolution_errors() {
        let mut gate = post_gate(user(1));

        assert!(gate.has_policy_for(SubjectType::of::<Post>()));
        assert!(gate.has_policy_for(post(1).subject_type()));
        assert!(!gate.has_policy_for("Comment"));

        assert!(gate.get_policy_for(SubjectType::of::<Post>()).unwrap().responds_to("update"));
        let err = gate.get_policy_for("Comment").err().unwrap();
        assert_eq!(err, GateError::PolicyNotDefined(SubjectType::new("Comment")));

        // Registered type whose policy the factory cannot build.
        gate.policy("Comment", "CommentPolicy");
        let err = gate.check("update", Argument::from("Comment")).unwrap_err();
        assert!(matches!(err, GateError::PolicyResolution { ref policy, .. } if policy.as_str() == "CommentPolicy"));
    }

    #[test]
    fn factory_failures_propagate_from_check_and_authorize() {
        let factory = |policy: &PolicyRef| -> anyhow::Result<Arc<dyn Policy<User>>> {
            Err(anyhow!("container has no entry for {policy}"))
        };
        let actor = Arc::new(user(1));
        let mut gate = Gate::new(factory, move || Some(Arc::clone(&actor)));
        gate.policy(SubjectType::of::<Post>(), "PostPolicy");

        assert!(matches!(gate.check("update", post(1)), Err(GateError::PolicyResolution { .. })));
        assert!(matches!(gate.authorize("update", post(1)), Err(GateError::PolicyResolution { .. })));
    }

    #[test]
    fn responses_pass_through_authorize_untouched() {
        let mut gate = gate_for(Some(user(1)));
        gate.define("export", |_: &User, _: &Arguments| {
            Ok(Response::allow().with_message("export queued").with_code(202).into())
        });
        gate.define("purge", |_: &User, _: &Arguments| Ok(Response::deny().with_code(451).into()));

        let response = gate.authorize("export", ()).unwrap();
        assert_eq!(response.message(), Some("export queued"));
        assert_eq!(response.code(), Some(202));

        let response = gate.authorize("purge", ()).unwrap();
        assert!(response.denied());
        assert!(!gate.check("purge", ()).unwrap());
    }

    #[test]
    fn for_user_snapshots_the_registries() {
        let mut original = gate_for(Some(user(1)));
        original.define("shared", |_: &User, _: &Arguments| Ok(true.into()));

        let mut derived = original.for_user(user(2));
        original.define("late", |_: &User, _: &Arguments| Ok(true.into()));
        derived.define("derived-only", |_: &User, _: &Arguments| Ok(true.into()));

        assert!(derived.allows("shared", ()).unwrap());
        assert!(!derived.has("late"));
        assert!(!original.has("derived-only"));
        assert_eq!(original.abilities(), vec!["late", "shared"]);
    }

    #[test]
    fn for_user_binds_the_actor() {
        let mut gate = gate_for(None);
        gate.define("owns", |actor: &User, args: &Arguments| {
            let id = args.first().and_then(Argument::as_value).and_then(|v| v.as_u64());
            Ok((id == Some(actor.id)).into())
        });

        assert!(!gate.allows("owns", Argument::value(5)).unwrap());
        assert!(gate.for_user(user(5)).allows("owns", Argument::value(5)).unwrap());
        assert!(gate.authorize_for_user(user(5), "owns", Argument::value(5)).is_ok());
        assert!(gate.authorize_for_user(user(6), "owns", Argument::value(5)).is_err());
    }

    #[test]
    fn gates_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Gate<User>>();

        let gate = Arc::new(post_gate(user(1)));
        let handles: Vec<_> = (0..4)
            .map(|owner| {
                let gate = Arc::clone(&gate);
                std::thread::spawn(move || gate.for_user(user(owner)).allows("update", post(owner)))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().unwrap());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: undefined abilities never pass, whatever the actor or arguments.
        #[test]
        fn undefined_abilities_never_pass(
            ability in "[a-z][a-z-]{0,16}",
            id in 0u64..1_000,
            is_admin in any::<bool>(),
            values in prop::collection::vec(any::<i64>(), 0..4),
        ) {
            let gate = gate_for(Some(User { id, is_admin }));
            let args: Arguments = values.into_iter().map(Argument::from).collect();
            prop_assert!(!gate.allows(&ability, args).unwrap());
        }

        /// Property: `denies` is the negation of `allows`.
        #[test]
        fn denies_negates_allows(id in 0u64..50, owner in 0u64..50, is_admin in any::<bool>()) {
            let mut gate = post_gate(User { id, is_admin });
            gate.before(|actor: &User, _: &str, _: &Arguments| Ok(actor.is_admin.then_some(Outcome::Bool(true))));

            let allowed = gate.allows("update", post(owner)).unwrap();
            prop_assert_eq!(gate.denies("update", post(owner)).unwrap(), !allowed);
            prop_assert_eq!(allowed, is_admin || id == owner);
        }

        /// Property: after-hooks cannot flip the result.
        #[test]
        fn after_hooks_do_not_alter_results(granted in any::<bool>()) {
            let mut gate = gate_for(Some(user(1)));
            gate.define("toggle", move |_: &User, _: &Arguments| Ok(granted.into()));
            gate.after(|_: &User, _: &str, _: &Arguments, _: &Outcome| {});

            prop_assert_eq!(gate.allows("toggle", ()).unwrap(), granted);
        }
    }
}
