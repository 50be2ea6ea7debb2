//! Opaque subject values an ability can be checked against.

use std::any::Any;
use std::sync::Arc;

use crate::SubjectType;

/// A subject instance (a post, an invoice, ...) passed to an ability check.
///
/// The value is type-erased but keeps its [`SubjectType`], which is what the
/// gate uses to pick a policy. Policy methods recover the concrete value with
/// [`Subject::downcast_ref`].
#[derive(Clone)]
pub struct Subject {
    subject_type: SubjectType,
    value: Arc<dyn Any + Send + Sync>,
}

impl Subject {
    /// Wrap a value, typed by its Rust type name.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            subject_type: SubjectType::of::<T>(),
            value: Arc::new(value),
        }
    }

    /// Wrap a value under an explicit subject type name.
    pub fn with_type<T: Any + Send + Sync>(subject_type: impl Into<SubjectType>, value: T) -> Self {
        Self {
            subject_type: subject_type.into(),
            value: Arc::new(value),
        }
    }

    /// Wrap an already shared value without copying it.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            subject_type: SubjectType::of::<T>(),
            value,
        }
    }

    pub fn subject_type(&self) -> &SubjectType {
        &self.subject_type
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.value).downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.value).is::<T>()
    }
}

impl core::fmt::Debug for Subject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subject")
            .field("subject_type", &self.subject_type)
            .finish_non_exhaustive()
    }
}
