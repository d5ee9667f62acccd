// Copyright 2025 Cowboy AI, LLC.

//! Error types for catalog and definition operations

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::element::CompositionElementInfo;

/// Errors that can occur while building definitions or querying catalogs
#[derive(Debug, Clone, Error)]
pub enum CompositionError {
    /// An argument was rejected at construction or call time
    #[error("Invalid argument `{parameter}`: {reason}")]
    InvalidArgument {
        /// Name of the offending parameter
        parameter: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Raw cardinality value outside the three legal values
    #[error("Invalid import cardinality: {0}")]
    InvalidCardinality(i64),

    /// Raw creation policy value that is not Shared, NonShared or Any
    #[error("Invalid creation policy: {0}")]
    InvalidCreationPolicy(String),

    /// A required metadata element had no key
    #[error("Required metadata element at index {index} is null")]
    NullRequiredMetadataElement {
        /// Position of the element in declaration order
        index: usize,
    },

    /// The object was disposed before the call
    #[error("Object disposed: {object}")]
    ObjectDisposed {
        /// Name of the disposed object
        object: String,
    },

    /// An abstract member was used without a concrete implementation
    #[error("`{member}` is not overridden by the derived type")]
    NotOverridden {
        /// Name of the member
        member: String,
    },

    /// A composable part failed
    #[error(transparent)]
    ComposablePart(#[from] ComposablePartError),

    /// A bound delegate was invoked with incompatible arguments
    #[error("Delegate invocation failed: {0}")]
    DelegateInvocation(String),

    /// Producing an exported value failed
    #[error("Export value error: {0}")]
    ExportValue(String),

    /// A catalog manifest could not be read
    #[error("Manifest error: {0}")]
    Manifest(String),
}

/// Result type for composition operations
pub type CompositionResult<T> = Result<T, CompositionError>;

impl From<serde_json::Error> for CompositionError {
    fn from(err: serde_json::Error) -> Self {
        CompositionError::Manifest(err.to_string())
    }
}

impl CompositionError {
    /// Create an invalid argument error
    pub fn invalid_argument(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        CompositionError::InvalidArgument {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a disposed-object error
    pub fn disposed(object: impl Into<String>) -> Self {
        CompositionError::ObjectDisposed {
            object: object.into(),
        }
    }

    /// Create a missing-override error
    pub fn not_overridden(member: impl Into<String>) -> Self {
        CompositionError::NotOverridden {
            member: member.into(),
        }
    }

    /// Check if this is an argument error
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            CompositionError::InvalidArgument { .. }
                | CompositionError::InvalidCardinality(_)
                | CompositionError::InvalidCreationPolicy(_)
                | CompositionError::NullRequiredMetadataElement { .. }
        )
    }

    /// Check if this is a disposed-state error
    pub fn is_disposed(&self) -> bool {
        matches!(self, CompositionError::ObjectDisposed { .. })
    }

    /// Check if this error signals a programming mistake rather than bad input
    pub fn is_programming_error(&self) -> bool {
        matches!(self, CompositionError::NotOverridden { .. })
    }
}

/// Failure raised by a composable part, carrying the implicated element
///
/// The matching core never raises this itself; it exists for the
/// composition engine layered above the catalogs.
#[derive(Clone, Error)]
#[error("{message}")]
pub struct ComposablePartError {
    message: String,
    element: Option<CompositionElementInfo>,
    #[source]
    inner: Option<Arc<dyn StdError + Send + Sync + 'static>>,
}

impl ComposablePartError {
    /// Create an error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            element: None,
            inner: None,
        }
    }

    /// Attach the element that caused the failure
    pub fn with_element(mut self, element: CompositionElementInfo) -> Self {
        self.element = Some(element);
        self
    }

    /// Attach the underlying error
    pub fn with_inner<E>(mut self, inner: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.inner = Some(Arc::new(inner));
        self
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The implicated composition element, if any
    pub fn element(&self) -> Option<&CompositionElementInfo> {
        self.element.as_ref()
    }

    /// The underlying error, if any
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.inner.as_deref()
    }
}

impl fmt::Debug for ComposablePartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposablePartError")
            .field("message", &self.message)
            .field("element", &self.element)
            .field("inner", &self.inner.as_ref().map(|e| e.to_string()))
            .finish()
    }
}
