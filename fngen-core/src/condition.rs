//! Error conditions bound to caller-declared failures

use crate::errors::{Failure, FunctionError, FunctionResult};
use std::fmt;
use std::sync::Arc;

/// Predicate over the function input, evaluated before any backend call
pub type Predicate<I> = Arc<dyn Fn(&I) -> bool + Send + Sync>;

/// A rule that maps an input situation to a declared failure.
///
/// `Local` conditions run client-side before the backend is contacted.
/// `Remote` conditions are described to the backend in natural language and
/// matched afterwards by exact error-message text.
pub enum ErrorCondition<I> {
    Local { predicate: Predicate<I>, failure: Failure },
    Remote { description: String, failure: Failure },
}

impl<I> ErrorCondition<I> {
    pub fn local<P>(failure: Failure, predicate: P) -> Self
    where
        P: Fn(&I) -> bool + Send + Sync + 'static,
    {
        Self::Local { predicate: Arc::new(predicate), failure }
    }

    pub fn remote(failure: Failure, description: impl Into<String>) -> FunctionResult<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(FunctionError::invalid_argument(
                "An execution error needs a condition description",
            ));
        }
        Ok(Self::Remote { description, failure })
    }

    pub fn is_natural_language(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    pub fn failure(&self) -> &Failure {
        match self {
            Self::Local { failure, .. } | Self::Remote { failure, .. } => failure,
        }
    }

    /// Message the backend must report for this condition
    pub fn error_message(&self) -> &str {
        self.failure().message()
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Remote { description, .. } => Some(description),
            Self::Local { .. } => None,
        }
    }

    /// Raise the bound failure if the local predicate holds
    pub fn validate(&self, input: &I) -> FunctionResult<()> {
        match self {
            Self::Local { predicate, failure } => {
                if predicate(input) {
                    return Err(FunctionError::LocalCondition(failure.clone()));
                }
                Ok(())
            }
            Self::Remote { .. } => Err(FunctionError::invalid_argument(
                "Execution errors are evaluated by the backend, not locally",
            )),
        }
    }

    /// Prompt line describing a remote condition
    pub(crate) fn prompt_line(&self) -> Option<String> {
        self.description().map(|description| {
            format!("- Condition: {} | Error Message: {}", description, self.error_message())
        })
    }
}

impl<I> Clone for ErrorCondition<I> {
    fn clone(&self) -> Self {
        match self {
            Self::Local { predicate, failure } => {
                Self::Local { predicate: Arc::clone(predicate), failure: failure.clone() }
            }
            Self::Remote { description, failure } => {
                Self::Remote { description: description.clone(), failure: failure.clone() }
            }
        }
    }
}

impl<I> fmt::Debug for ErrorCondition<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { failure, .. } => {
                f.debug_struct("Local").field("failure", failure).finish_non_exhaustive()
            }
            Self::Remote { description, failure } => f
                .debug_struct("Remote")
                .field("description", description)
                .field("failure", failure)
                .finish(),
        }
    }
}
