//! Error types for the IoC container.

use std::sync::Arc;

/// Boxed error returned by user hooks: factories, initializers, postprocessors
/// and `close` implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared form of a user error, so that [`DiError`] stays `Clone`.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Container errors.
///
/// Every failure the container reports falls into one of the classes listed
/// by [`ErrorKind`]. State and validation errors are raised at the call that
/// caused them (registration, initialization, lookup); resolution, cycle and
/// user errors abort only the graph being resolved.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, DiError, ErrorKind};
///
/// let container = Container::new();
/// match container.instance("anything") {
///     Err(err @ DiError::NotInitialized) => {
///         assert_eq!(err.kind(), ErrorKind::State);
///         assert_eq!(
///             err.to_string(),
///             "container is not initialized: can't lookup instances of beans yet"
///         );
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// Lookup attempted before a successful initialization
    #[error("container is not initialized: can't lookup instances of beans yet")]
    NotInitialized,
    /// Registration or initialization attempted on an initialized container
    #[error("container is already initialized: {operation}")]
    AlreadyInitialized { operation: &'static str },
    /// Lookup attempted while the container is shutting down
    #[error("container is closed: can't lookup instances of beans")]
    Closed,

    /// Scope literal that names none of the supported scopes
    #[error("unsupported scope: {0}")]
    UnsupportedScope(String),
    /// Optional flag literal that does not parse as a boolean
    #[error("invalid optional value for field '{field}': {value}")]
    InvalidOptional { field: &'static str, value: String },

    /// No bean registered under the requested id
    #[error("no bean registered with id: {0}")]
    NotFound(String),
    /// A required injection target could not be satisfied
    #[error("no dependency found for field '{field}' of bean '{bean}'")]
    NoDependencyFound { bean: String, field: &'static str },
    /// Type-based injection of a single reference matched several beans
    #[error("ambiguous dependency for field '{field}' of bean '{bean}': candidates {candidates:?}")]
    AmbiguousDependency {
        bean: String,
        field: &'static str,
        candidates: Vec<String>,
    },
    /// A request-scoped bean was selected as an injection target
    #[error("request-scoped beans can't be injected: '{target}' into field '{field}' of bean '{bean}'")]
    RequestInjection {
        bean: String,
        field: &'static str,
        target: String,
    },
    /// A request-scoped bean was looked up directly
    #[error("request-scoped beans can't be retrieved directly from the container: {0}")]
    RequestRetrieval(String),
    /// An explicit injection target does not provide the field's element type
    #[error("bean '{target}' can't be injected into field '{field}' of bean '{bean}': expected {expected}")]
    IncompatibleDependency {
        bean: String,
        field: &'static str,
        target: String,
        expected: &'static str,
    },
    /// A looked up bean does not provide the requested type
    #[error("bean '{bean}' is not of type {expected}")]
    TypeMismatch { bean: String, expected: &'static str },

    /// A bean recurred in its own active resolution chain
    #[error("circular dependency detected for bean: {bean} ({})", .path.join(" -> "))]
    Circular { bean: String, path: Vec<String> },
    /// Resolution went deeper than the configured limit
    #[error("max resolution depth {0} exceeded")]
    DepthExceeded(usize),

    /// A bean factory returned an error
    #[error("bean factory for '{bean}' failed: {source}")]
    Factory {
        bean: String,
        #[source]
        source: SharedError,
    },
    /// An initializer hook returned an error
    #[error("initialization of bean '{bean}' failed: {source}")]
    Initializer {
        bean: String,
        #[source]
        source: SharedError,
    },
    /// A postprocessor returned an error
    #[error("postprocessing of bean '{bean}' failed: {source}")]
    Postprocessor {
        bean: String,
        #[source]
        source: SharedError,
    },
    /// A closeable bean failed to close
    #[error("closing bean '{bean}' failed: {source}")]
    Close {
        bean: String,
        #[source]
        source: SharedError,
    },
}

/// Classes of [`DiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation is invalid for the current container state
    State,
    /// Malformed bean descriptor
    Validation,
    /// Dependency graph can't be satisfied
    Resolution,
    /// Bean observed in its own resolution chain
    Cycle,
    /// Application-level error raised by a user hook
    User,
}

impl DiError {
    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiError::NotInitialized | DiError::AlreadyInitialized { .. } | DiError::Closed => {
                ErrorKind::State
            }
            DiError::UnsupportedScope(_) | DiError::InvalidOptional { .. } => ErrorKind::Validation,
            DiError::NotFound(_)
            | DiError::NoDependencyFound { .. }
            | DiError::AmbiguousDependency { .. }
            | DiError::RequestInjection { .. }
            | DiError::RequestRetrieval(_)
            | DiError::IncompatibleDependency { .. }
            | DiError::TypeMismatch { .. } => ErrorKind::Resolution,
            DiError::Circular { .. } | DiError::DepthExceeded(_) => ErrorKind::Cycle,
            DiError::Factory { .. }
            | DiError::Initializer { .. }
            | DiError::Postprocessor { .. }
            | DiError::Close { .. } => ErrorKind::User,
        }
    }

    pub(crate) fn factory(bean: &str, source: BoxError) -> Self {
        DiError::Factory { bean: bean.to_string(), source: Arc::from(source) }
    }

    pub(crate) fn initializer(bean: &str, source: BoxError) -> Self {
        DiError::Initializer { bean: bean.to_string(), source: Arc::from(source) }
    }

    pub(crate) fn postprocessor(bean: &str, source: BoxError) -> Self {
        DiError::Postprocessor { bean: bean.to_string(), source: Arc::from(source) }
    }

    pub(crate) fn close(bean: &str, source: BoxError) -> Self {
        DiError::Close { bean: bean.to_string(), source: Arc::from(source) }
    }
}

/// Result type for container operations.
pub type DiResult<T> = Result<T, DiError>;
