//! Lifetime contexts handed to factories and context-aware beans.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cancellation::CancellationToken;
use crate::instance::Instance;

/// Key under which a bean instance is published in a [`Context`].
///
/// Namespaced by bean id, so values published by the request scope never
/// collide with other context values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BeanKey(pub String);

impl BeanKey {
    /// Key for the bean registered under `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Lifetime context of a unit of work.
///
/// Carries a cancellation signal and the bean instances published for that
/// unit of work. Cloning is cheap; clones share the signal. Publishing a bean
/// returns a new context and leaves the original unchanged.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::Context;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// let parent = Context::background();
/// let request = parent.child();
///
/// let closed = Arc::new(AtomicBool::new(false));
/// let flag = closed.clone();
/// request.on_done(move || flag.store(true, Ordering::SeqCst));
///
/// request.cancel();
/// assert!(request.is_done());
/// assert!(!parent.is_done());
/// assert!(closed.load(Ordering::SeqCst));
/// ```
#[derive(Clone)]
pub struct Context {
    token: CancellationToken,
    beans: Arc<HashMap<BeanKey, Instance>>,
}

impl Context {
    /// A fresh root context. Nothing cancels it unless [`cancel`](Self::cancel)
    /// is called on it explicitly.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            beans: Arc::default(),
        }
    }

    /// Root context driven by an existing token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            beans: Arc::default(),
        }
    }

    /// Derives a child context, done when either it or this context is done.
    ///
    /// The child sees every bean published on this context.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            beans: self.beans.clone(),
        }
    }

    /// Returns a context that additionally publishes `instance` under `key`.
    pub fn with_bean(&self, key: BeanKey, instance: Instance) -> Self {
        let mut beans = (*self.beans).clone();
        beans.insert(key, instance);
        Self {
            token: self.token.clone(),
            beans: Arc::new(beans),
        }
    }

    /// The instance published under bean id `id`.
    pub fn instance(&self, id: &str) -> Option<&Instance> {
        self.beans.get(&BeanKey::new(id))
    }

    /// The bean published under `id`, viewed as `T`.
    pub fn bean<T: ?Sized + 'static>(&self, id: &str) -> Option<Arc<T>> {
        self.instance(id).and_then(Instance::cast::<T>)
    }

    /// Ids of the published beans, in ascending order.
    pub fn bean_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.beans.keys().map(|key| key.0.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Ends the context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context has ended.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Runs `callback` exactly once when the context ends.
    pub fn on_done<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.token.on_cancel(callback);
    }

    /// Completes when the context ends.
    #[cfg(feature = "async")]
    pub async fn done(&self) {
        self.token.cancelled().await;
    }

    /// The cancellation token behind the context.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("done", &self.is_done())
            .field("beans", &self.bean_ids())
            .finish()
    }
}
