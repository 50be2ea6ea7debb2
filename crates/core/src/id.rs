//! Strongly-typed identifiers used across the gate.

use std::borrow::{Borrow, Cow};

use serde::{Deserialize, Serialize};

/// Identifier of a subject type (the key a policy is registered under).
///
/// Usually derived from a Rust type via [`SubjectType::of`], but hosts may also
/// register short, stable names (e.g. `"Post"`) and tag their subjects with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectType(Cow<'static, str>);

/// Reference to a policy, as understood by a policy factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyRef(Cow<'static, str>);

macro_rules! impl_name_newtype {
    ($t:ty) => {
        impl $t {
            pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        // Hash/Eq of the newtype match those of the inner `str`.
        impl Borrow<str> for $t {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&'static str> for $t {
            fn from(value: &'static str) -> Self {
                Self(Cow::Borrowed(value))
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(Cow::Owned(value))
            }
        }
    };
}

impl_name_newtype!(SubjectType);
impl_name_newtype!(PolicyRef);

impl SubjectType {
    /// The subject type identifying values of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Cow::Borrowed(std::any::type_name::<T>()))
    }
}

impl PolicyRef {
    /// A policy reference named after the policy type `P`.
    pub fn of<P: ?Sized + 'static>() -> Self {
        Self(Cow::Borrowed(std::any::type_name::<P>()))
    }
}
