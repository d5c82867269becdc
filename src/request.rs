//! Request-scoped beans.
//!
//! Request-scoped beans are never injected and never returned by the generic
//! lookups. Instead, a [`RequestScope`] is opened per unit of work (typically
//! one inbound request): it creates every request-scoped bean under that unit's
//! context, publishes them in the context, and closes the closeable ones when
//! the context is done.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::container::Container;
use crate::context::{BeanKey, Context};
use crate::error::{DiError, DiResult};

type CloseOutcome = Arc<Mutex<Option<DiError>>>;

/// One unit of work's set of request-scoped beans.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::request::RequestScope;
/// use ferrous_ioc::{Bean, BoxError, Closeable, Component, Container, Context, Scope, Shape};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct Session {
///     closed: AtomicBool,
/// }
///
/// impl Closeable for Session {
///     fn close(&self) -> Result<(), BoxError> {
///         self.closed.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// impl Bean for Session {
///     fn as_closeable(&self) -> Option<&dyn Closeable> {
///         Some(self)
///     }
/// }
///
/// impl Component for Session {
///     fn describe(shape: &mut Shape<Self>) {
///         shape.scope(Scope::Request);
///     }
/// }
///
/// let container = Container::new();
/// container.register_bean::<Session>("session").unwrap();
/// container.initialize().unwrap();
///
/// let scope = RequestScope::begin(&container, &Context::background()).unwrap();
/// let session = scope.bean::<Session>("session").unwrap();
/// assert!(!session.closed.load(Ordering::SeqCst));
///
/// scope.finish().unwrap();
/// assert!(session.closed.load(Ordering::SeqCst));
/// ```
pub struct RequestScope {
    context: Context,
    outcome: CloseOutcome,
    finished: bool,
}

impl RequestScope {
    /// Opens a request scope as a child of `parent`.
    ///
    /// Every request-scoped bean is created in bean id order. If any creation
    /// fails, the beans created so far are closed and the error is returned.
    pub fn begin(container: &Container, parent: &Context) -> DiResult<Self> {
        let mut context = parent.child();
        let outcome: CloseOutcome = Arc::default();

        for id in container.request_bean_ids() {
            let instance = match container.create_in_context(&context, &id) {
                Ok(instance) => instance,
                Err(err) => {
                    tracing::warn!(bean = id.as_str(), error = %err, "request scope aborted");
                    context.cancel();
                    return Err(err);
                }
            };

            if instance.bean().as_closeable().is_some() {
                let closing = instance.clone();
                let outcome = outcome.clone();
                let bean = id.clone();
                context.on_done(move || {
                    let Some(closeable) = closing.bean().as_closeable() else {
                        return;
                    };
                    if let Err(err) = closeable.close() {
                        let err = DiError::close(&bean, err);
                        tracing::error!(bean = bean.as_str(), error = %err, "failed to close request bean");
                        outcome.lock().get_or_insert(err);
                    }
                });
            }

            tracing::trace!(bean = id.as_str(), "request bean published");
            context = context.with_bean(BeanKey::new(id), instance);
        }

        Ok(Self {
            context,
            outcome,
            finished: false,
        })
    }

    /// The request context, with every request-scoped bean published.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The request-scoped bean registered as `id`, viewed as `T`.
    pub fn bean<T: ?Sized + 'static>(&self, id: &str) -> Option<Arc<T>> {
        self.context.bean::<T>(id)
    }

    /// Ends the request: cancels its context, which closes its beans.
    ///
    /// # Errors
    ///
    /// The first close failure, as [`DiError::Close`].
    pub fn finish(mut self) -> DiResult<()> {
        self.finished = true;
        self.context.cancel();
        match self.outcome.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if !self.finished {
            self.context.cancel();
            if let Some(err) = self.outcome.lock().take() {
                tracing::warn!(error = %err, "request scope dropped with a close failure");
            }
        }
    }
}

impl std::fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("context", &self.context)
            .field("finished", &self.finished)
            .finish()
    }
}
