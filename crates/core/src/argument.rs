//! Ability arguments.
//!
//! Ability checks take an ordered list of arguments. The first one is special:
//! when it is a subject (or names a subject type) the gate may hand the check
//! to the policy registered for that type.

use std::any::Any;

use serde_json::Value;

use crate::{Subject, SubjectType};

/// A single argument to an ability check.
#[derive(Debug, Clone)]
pub enum Argument {
    /// A subject instance; its runtime type selects the policy.
    Subject(Subject),
    /// A bare subject type, used when there is no instance yet (e.g. "create").
    Type(SubjectType),
    /// Any other value.
    Value(Value),
}

impl Argument {
    pub fn subject<T: Any + Send + Sync>(value: T) -> Self {
        Self::Subject(Subject::new(value))
    }

    pub fn type_of<T: ?Sized + 'static>() -> Self {
        Self::Type(SubjectType::of::<T>())
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Subject type this argument carries or names, if any.
    ///
    /// Plain string values count too: a string equal to a registered subject
    /// type is treated as a type reference by the gate.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Subject(subject) => Some(subject.subject_type().as_str()),
            Self::Type(ty) => Some(ty.as_str()),
            Self::Value(Value::String(s)) => Some(s.as_str()),
            Self::Value(_) => None,
        }
    }

    /// True when the argument names a type rather than carrying an instance.
    pub fn is_type_reference(&self) -> bool {
        matches!(self, Self::Type(_) | Self::Value(Value::String(_)))
    }

    pub fn as_subject(&self) -> Option<&Subject> {
        match self {
            Self::Subject(subject) => Some(subject),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_subject().and_then(Subject::downcast_ref::<T>)
    }
}

impl From<Subject> for Argument {
    fn from(value: Subject) -> Self {
        Self::Subject(value)
    }
}

impl From<SubjectType> for Argument {
    fn from(value: SubjectType) -> Self {
        Self::Type(value)
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for Argument {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

/// Ordered arguments of an ability check.
///
/// Anything convertible into a single [`Argument`] can be passed where
/// `impl Into<Arguments>` is expected and becomes a one-element list; `()`
/// means no arguments.
#[derive(Debug, Clone, Default)]
pub struct Arguments(Vec<Argument>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, argument: impl Into<Argument>) {
        self.0.push(argument.into());
    }

    pub fn first(&self) -> Option<&Argument> {
        self.0.first()
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Argument] {
        &self.0
    }

    /// All arguments but the first.
    pub fn rest(&self) -> Self {
        Self(self.0.iter().skip(1).cloned().collect())
    }

    pub fn into_vec(self) -> Vec<Argument> {
        self.0
    }
}

impl From<()> for Arguments {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Argument> for Arguments {
    fn from(value: Argument) -> Self {
        Self(vec![value])
    }
}

impl From<Subject> for Arguments {
    fn from(value: Subject) -> Self {
        Self(vec![Argument::Subject(value)])
    }
}

impl From<SubjectType> for Arguments {
    fn from(value: SubjectType) -> Self {
        Self(vec![Argument::Type(value)])
    }
}

impl From<Vec<Argument>> for Arguments {
    fn from(value: Vec<Argument>) -> Self {
        Self(value)
    }
}

impl<const N: usize> From<[Argument; N]> for Arguments {
    fn from(value: [Argument; N]) -> Self {
        Self(value.into())
    }
}

impl FromIterator<Argument> for Arguments {
    fn from_iter<I: IntoIterator<Item = Argument>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Arguments {
    type Item = Argument;
    type IntoIter = std::vec::IntoIter<Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
