//! Cancellation tokens backing lifetime contexts.
//!
//! A token is cancelled at most once. Callbacks registered on it run exactly
//! once, on the cancelling thread, or immediately if the token is already
//! cancelled. Cancelling a token cancels every child derived from it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

type Callback = Box<dyn FnOnce() + Send>;

/// A token used to signal that a unit of work is over.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::CancellationToken;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let parent = CancellationToken::new();
/// let child = parent.child_token();
///
/// let runs = Arc::new(AtomicUsize::new(0));
/// let counter = runs.clone();
/// child.on_cancel(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// parent.cancel();
/// parent.cancel();
/// assert!(child.is_cancelled());
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationTokenInner>,
}

struct CancellationTokenInner {
    cancelled: AtomicBool,
    callbacks: Mutex<Vec<Callback>>,
    children: Mutex<Vec<Weak<CancellationTokenInner>>>,
    created_at: Instant,
}

impl CancellationTokenInner {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            callbacks: Mutex::new(Vec::new()),
            children: Mutex::new(Vec::new()),
            created_at: Instant::now(),
        }
    }

    fn cancel(&self) {
        // Only the first caller runs the callbacks
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let callbacks = std::mem::take(&mut *self.callbacks.lock());
        for callback in callbacks {
            callback();
        }
        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

impl CancellationToken {
    /// Creates a new cancellation token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationTokenInner::new()),
        }
    }

    /// Creates a child token that is cancelled together with this token.
    ///
    /// Cancelling the child leaves the parent untouched.
    pub fn child_token(&self) -> Self {
        let child = Self::new();
        let mut children = self.inner.children.lock();
        if self.is_cancelled() {
            drop(children);
            child.cancel();
        } else {
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child.inner));
        }
        child
    }

    /// Cancels the token and every child token.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns true if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Registers a callback to run once the token is cancelled.
    ///
    /// Runs the callback right away when the token is already cancelled.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut callbacks = self.inner.callbacks.lock();
        if self.is_cancelled() {
            drop(callbacks);
            callback();
        } else {
            callbacks.push(Box::new(callback));
        }
    }

    /// Returns the elapsed time since this token was created.
    pub fn elapsed(&self) -> Duration {
        self.inner.created_at.elapsed()
    }

    /// Returns a future that completes when cancellation is requested.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_ioc::CancellationToken;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let token = CancellationToken::new();
    /// let remote = token.clone();
    /// tokio::spawn(async move { remote.cancel() });
    /// token.cancelled().await;
    /// assert!(token.is_cancelled());
    /// # }
    /// ```
    #[cfg(feature = "async")]
    pub async fn cancelled(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        self.on_cancel(move || {
            let _ = tx.send(());
        });
        let _ = rx.await;
    }

    /// Creates a token that cancels itself after `timeout`.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(feature = "async")]
    pub fn with_timeout(timeout: Duration) -> Self {
        let token = Self::new();
        let token_clone = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            token_clone.cancel();
        });

        token
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
