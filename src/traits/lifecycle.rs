//! Optional lifecycle capabilities a bean can opt into.
//!
//! The container never probes a bean for methods. A bean type advertises a
//! capability by implementing the trait and returning itself from the matching
//! accessor on [`Bean`](crate::Bean).

use crate::context::Context;
use crate::error::BoxError;

/// Trait for beans that need initialization once they are wired.
///
/// `post_construct` runs after all of the bean's injections are satisfied and
/// before any postprocessor. For singletons it runs once the container is
/// ready, so it may look up other beans. An error aborts the resolution (or
/// the whole initialization, for singletons).
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Bean, BoxError, Component, Container, Initializing};
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct Greeting {
///     text: Mutex<String>,
/// }
///
/// impl Initializing for Greeting {
///     fn post_construct(&self) -> Result<(), BoxError> {
///         *self.text.lock().unwrap() = "hello".to_string();
///         Ok(())
///     }
/// }
///
/// impl Bean for Greeting {
///     fn as_initializing(&self) -> Option<&dyn Initializing> {
///         Some(self)
///     }
/// }
///
/// impl Component for Greeting {}
///
/// let container = Container::new();
/// container.register_bean::<Greeting>("greeting").unwrap();
/// container.initialize().unwrap();
///
/// let greeting = container.get_instance::<Greeting>("greeting");
/// assert_eq!(*greeting.text.lock().unwrap(), "hello");
/// ```
pub trait Initializing: Send + Sync {
    /// Completes the construction of the bean.
    fn post_construct(&self) -> Result<(), BoxError>;
}

/// Trait for beans that hold resources released at the end of their lifetime.
///
/// Singletons are closed by [`Container::close`](crate::Container::close);
/// request-scoped beans are closed when their request context is done.
pub trait Closeable: Send + Sync {
    /// Releases the bean's resources.
    fn close(&self) -> Result<(), BoxError>;
}

/// Trait for beans that want the lifetime context they were created under.
///
/// Singletons receive [`Context::background`]; beans created on demand receive
/// the caller's context. Called last, after initializer and postprocessors.
pub trait ContextAware: Send + Sync {
    /// Hands the lifetime context to the bean.
    fn set_context(&self, context: &Context);
}
