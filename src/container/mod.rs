//! The bean container.
//!
//! This module contains the [`Container`] type: the bean registry, the state
//! machine guarding it, and the lookup operations built on the resolver.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};

use crate::bean_type::BeanType;
use crate::config::ContainerConfig;
use crate::context::Context;
use crate::descriptors::BeanDescriptor;
use crate::error::{BoxError, DiError, DiResult};
use crate::instance::Instance;
use crate::registration::{postprocessor, Graph, Registration, Registry};
use crate::scope::Scope;
use crate::traits::{Bean, Component};

mod creator;
mod lifecycle;
mod resolver;
mod state;

pub use state::ContainerState;

use resolver::Resolver;
use state::StateCell;

/// IoC container holding bean definitions and the instances built from them.
///
/// A container goes through three phases. While uninitialized it accepts
/// registrations. [`initialize`](Self::initialize) creates and wires every
/// singleton, after which lookups succeed and registrations fail.
/// [`close`](Self::close) closes the singletons, clears everything and makes
/// the container reusable from scratch.
///
/// Cloning is cheap; clones share the same registry and instances.
///
/// # Thread Safety
///
/// Registration, initialization and shutdown serialize on one registry lock,
/// held by `initialize` for its whole run. Lookups read an immutable snapshot
/// published by `initialize` and never take the registry lock, so initializer
/// hooks may look up other beans. Creation of individual instances is
/// serialized on a separate, narrower lock.
///
/// A factory never waits for an `initialize` or `close` running on another
/// thread. Registration from a factory fails with
/// [`DiError::AlreadyInitialized`] instead, `close` and `reset` are ignored,
/// and the definition tables read as empty.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Bean, Component, Container, Inject, Scope, Shape};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Database;
/// impl Bean for Database {}
/// impl Component for Database {}
///
/// #[derive(Default)]
/// struct Handler {
///     db: Inject<Database>,
/// }
/// impl Bean for Handler {}
/// impl Component for Handler {
///     fn describe(shape: &mut Shape<Self>) {
///         shape.scope(Scope::Prototype);
///         shape.inject("db", |h| &h.db);
///     }
/// }
///
/// let container = Container::new();
/// container.register_bean::<Database>("db").unwrap();
/// container.register_bean::<Handler>("handler").unwrap();
/// container.initialize().unwrap();
///
/// let first = container.get_instance::<Handler>("handler");
/// let second = container.get_instance::<Handler>("handler");
/// assert!(!Arc::ptr_eq(&first, &second));
/// assert!(Arc::ptr_eq(first.db.get().unwrap(), second.db.get().unwrap()));
///
/// container.close();
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) config: ContainerConfig,
    pub(crate) state: StateCell,
    /// Reentrant so that hooks running on the initializing thread get a clean
    /// state error instead of a deadlock
    pub(crate) registry: ReentrantMutex<RefCell<Registry>>,
    pub(crate) initializing: AtomicBool,
    pub(crate) graph: RwLock<Option<Arc<Graph>>>,
    pub(crate) creation_lock: ReentrantMutex<()>,
}

impl ContainerInner {
    /// Identity used to keep resolution chains of different containers apart.
    pub(crate) fn owner(&self) -> usize {
        self as *const ContainerInner as usize
    }

    /// Takes the registry lock.
    ///
    /// A thread running a factory holds the creation lock, which `initialize`
    /// and `close` may be waiting on while they hold the registry lock. Such a
    /// thread never blocks on a registry held by an initializing or closing
    /// container: it gets `None` instead.
    pub(crate) fn lock_registry(&self) -> Option<ReentrantMutexGuard<'_, RefCell<Registry>>> {
        if !self.creation_lock.is_owned_by_current_thread() {
            return Some(self.registry.lock());
        }
        loop {
            if let Some(registry) = self.registry.try_lock_for(Duration::from_millis(1)) {
                return Some(registry);
            }
            if self.initializing.load(Ordering::Acquire) || self.state.load() == ContainerState::Closed {
                return None;
            }
        }
    }

    /// Must be called with the registry lock held.
    pub(crate) fn require_registry_open(&self, operation: &'static str) -> DiResult<()> {
        if self.initializing.load(Ordering::Acquire) {
            return Err(DiError::AlreadyInitialized { operation });
        }
        self.state.require_uninitialized(operation)
    }

    fn ready_graph(&self) -> DiResult<Arc<Graph>> {
        self.state.require_ready()?;
        self.graph.read().clone().ok_or(DiError::NotInitialized)
    }

    fn register(&self, id: &str, operation: &'static str, build: impl FnOnce() -> DiResult<Registration>) -> DiResult<bool> {
        let registry = self
            .lock_registry()
            .ok_or(DiError::AlreadyInitialized { operation })?;
        self.require_registry_open(operation)?;
        let registration = build()?;
        let overwritten = registry.borrow_mut().insert(id, registration);
        Ok(overwritten)
    }

    /// Runs `f` over the current bean definitions: the frozen graph when one
    /// is published, the registry otherwise.
    fn with_beans<R>(&self, f: impl FnOnce(&HashMap<String, Registration>) -> R) -> R {
        let graph = self.graph.read().clone();
        match graph {
            Some(graph) => f(&graph.beans),
            None => match self.lock_registry() {
                Some(registry) => {
                    let registry = registry.borrow();
                    f(&registry.beans)
                }
                None => {
                    tracing::warn!("bean definitions are locked by initialize or close; reporting none");
                    f(&HashMap::new())
                }
            },
        }
    }
}

impl Container {
    /// Creates an empty container with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Creates an empty container.
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                config,
                state: StateCell::new(),
                registry: ReentrantMutex::new(RefCell::new(Registry::default())),
                initializing: AtomicBool::new(false),
                graph: RwLock::new(None),
                creation_lock: ReentrantMutex::new(()),
            }),
        }
    }

    /// Configuration the container was built with.
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ContainerState {
        self.inner.state.load()
    }

    /// Registers a bean the container constructs from its type.
    ///
    /// `T::describe` runs now, so a malformed scope or optional literal fails
    /// this call. Returns `true` when a bean with the same id was replaced.
    ///
    /// # Errors
    ///
    /// [`DiError::AlreadyInitialized`] once the container is initialized,
    /// [`DiError::UnsupportedScope`] and [`DiError::InvalidOptional`] for
    /// malformed declarations.
    pub fn register_bean<T: Component>(&self, id: &str) -> DiResult<bool> {
        self.inner
            .register(id, "can't register new bean", Registration::of_type::<T>)
    }

    /// Registers a caller-built singleton.
    ///
    /// The instance is neither constructed nor injected by the container, but
    /// it does go through initializer, postprocessors and context hand-off.
    pub fn register_instance<T: Bean>(&self, id: &str, instance: Arc<T>) -> DiResult<bool> {
        self.inner
            .register(id, "can't register new bean", || Ok(Registration::of_instance(instance)))
    }

    /// Registers a factory producing the bean's instances.
    ///
    /// Singleton factories run exactly once, during initialization, with a
    /// background context. Other scopes run the factory on every resolution
    /// with the caller's context. Factory results are not injected.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_ioc::{Container, Scope};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let calls = Arc::new(AtomicUsize::new(0));
    /// let counter = calls.clone();
    ///
    /// let container = Container::new();
    /// container
    ///     .register_factory("greeting", Scope::Singleton, move |_| {
    ///         counter.fetch_add(1, Ordering::SeqCst);
    ///         Ok(Arc::new("hello".to_string()))
    ///     })
    ///     .unwrap();
    /// container.initialize().unwrap();
    ///
    /// for _ in 0..3 {
    ///     assert_eq!(*container.get_instance::<String>("greeting"), "hello");
    /// }
    /// assert_eq!(calls.load(Ordering::SeqCst), 1);
    /// ```
    pub fn register_factory<T, F>(&self, id: &str, scope: Scope, factory: F) -> DiResult<bool>
    where
        T: Bean,
        F: Fn(&Context) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        self.inner.register(id, "can't register new bean factory", || {
            Ok(Registration::of_factory(scope, factory))
        })
    }

    /// Registers a postprocessor for beans whose concrete type is `T`.
    ///
    /// Postprocessors run after the bean's initializer, in registration order.
    pub fn register_postprocessor<T, F>(&self, hook: F) -> DiResult<()>
    where
        T: Bean,
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let operation = "can't register bean postprocessor";
        let registry = self
            .inner
            .lock_registry()
            .ok_or(DiError::AlreadyInitialized { operation })?;
        self.inner.require_registry_open(operation)?;
        registry
            .borrow_mut()
            .add_postprocessor(BeanType::of::<T>(), postprocessor::<T, F>(hook));
        Ok(())
    }

    /// Creates and wires every singleton, then runs their post-construction.
    ///
    /// Any failure leaves the container uninitialized with its registrations
    /// intact, including a panic in a user hook. When a post-construction
    /// hook fails, singletons that were already post-constructed are closed.
    ///
    /// # Errors
    ///
    /// [`DiError::AlreadyInitialized`] on a second call, otherwise the first
    /// resolution, cycle or hook error encountered.
    pub fn initialize(&self) -> DiResult<()> {
        self.inner.initialize()
    }

    /// Looks up a bean, viewed as `T`.
    ///
    /// # Panics
    ///
    /// Panics on any lookup error. Use [`get_instance_safe`](Self::get_instance_safe)
    /// on paths that must not abort, such as request handlers.
    pub fn get_instance<T: ?Sized + 'static>(&self, id: &str) -> Arc<T> {
        match self.get_instance_safe::<T>(id) {
            Ok(instance) => instance,
            Err(err) => panic!("{err}"),
        }
    }

    /// Looks up a bean, viewed as `T`.
    ///
    /// # Errors
    ///
    /// Any error of [`instance`](Self::instance), plus
    /// [`DiError::TypeMismatch`] when the bean does not provide `T`.
    pub fn get_instance_safe<T: ?Sized + 'static>(&self, id: &str) -> DiResult<Arc<T>> {
        let instance = self.instance(id)?;
        instance.cast::<T>().ok_or_else(|| DiError::TypeMismatch {
            bean: id.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Looks up a bean as a type-erased [`Instance`].
    ///
    /// Singletons are returned from the cache; prototypes are created, wired
    /// and post-constructed on every call.
    ///
    /// # Errors
    ///
    /// [`DiError::NotInitialized`] before initialization,
    /// [`DiError::NotFound`] for unknown ids,
    /// [`DiError::RequestRetrieval`] for request-scoped beans, and any error
    /// raised while building a prototype.
    pub fn instance(&self, id: &str) -> DiResult<Instance> {
        let graph = self.inner.ready_graph()?;
        let registration = graph
            .beans
            .get(id)
            .ok_or_else(|| DiError::NotFound(id.to_string()))?;
        if !registration.scope.is_retrievable() {
            return Err(DiError::RequestRetrieval(id.to_string()));
        }
        Resolver::new(&self.inner, &graph).resolve(&Context::background(), id)
    }

    /// Resolves a bean of any scope under the given lifetime context.
    ///
    /// This is the hook the request scope is built on: request-scoped beans
    /// can only be created through it.
    pub fn create_in_context(&self, ctx: &Context, id: &str) -> DiResult<Instance> {
        let graph = self.inner.ready_graph()?;
        Resolver::new(&self.inner, &graph).resolve(ctx, id)
    }

    /// Ids of every request-scoped bean, in ascending order.
    pub fn request_bean_ids(&self) -> Vec<String> {
        self.inner.with_beans(|beans| {
            let mut ids: Vec<String> = beans
                .iter()
                .filter(|(_, registration)| registration.scope == Scope::Request)
                .map(|(id, _)| id.clone())
                .collect();
            ids.sort();
            ids
        })
    }

    /// Copy of the bean id to concrete type table.
    pub fn bean_types(&self) -> HashMap<String, BeanType> {
        self.inner.with_beans(|beans| {
            beans
                .iter()
                .map(|(id, registration)| (id.clone(), registration.bean_type))
                .collect()
        })
    }

    /// Copy of the bean id to scope table.
    pub fn bean_scopes(&self) -> HashMap<String, Scope> {
        self.inner.with_beans(|beans| {
            beans
                .iter()
                .map(|(id, registration)| (id.clone(), registration.scope))
                .collect()
        })
    }

    /// Descriptors of every registered bean, ordered by id.
    pub fn descriptors(&self) -> Vec<BeanDescriptor> {
        self.inner.with_beans(|beans| {
            let mut descriptors: Vec<BeanDescriptor> = beans
                .iter()
                .map(|(id, registration)| registration.describe(id))
                .collect();
            descriptors.sort_by(|a, b| a.id.cmp(&b.id));
            descriptors
        })
    }

    /// Closes every closeable singleton, then clears the container.
    ///
    /// Close failures are logged and do not stop the remaining beans from
    /// being closed. Afterwards the container is uninitialized and empty.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Clears the container without closing anything.
    ///
    /// Meant for isolating independent runs, such as tests.
    pub fn reset(&self) {
        self.inner.reset();
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("state", &self.state())
            .field("config", &self.inner.config)
            .finish()
    }
}
