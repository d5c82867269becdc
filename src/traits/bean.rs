//! Bean and component traits.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::descriptors::Shape;
use crate::instance::Casts;
use crate::traits::{Closeable, ContextAware, Initializing};

/// Trait for every type the container can hold.
///
/// The accessors are the container's view of a bean's optional capabilities.
/// Their defaults say "not supported"; a bean opts in by returning `Some(self)`.
///
/// `interfaces` declares the other types a bean can be injected as, which is
/// what type-based (id-less) injection matches against. Every bean provides
/// its own type implicitly.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Bean, Provides};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".to_string()
///     }
/// }
///
/// impl Bean for English {
///     fn interfaces(provides: &mut Provides<Self>) {
///         provides.add::<dyn Greeter>(|bean| bean as Arc<dyn Greeter>);
///     }
/// }
/// ```
pub trait Bean: std::any::Any + Send + Sync {
    /// Declares the interfaces this bean type can be injected as.
    fn interfaces(provides: &mut Provides<Self>)
    where
        Self: Sized,
    {
        let _ = provides;
    }

    /// Initializer capability.
    fn as_initializing(&self) -> Option<&dyn Initializing> {
        None
    }

    /// Closing capability.
    fn as_closeable(&self) -> Option<&dyn Closeable> {
        None
    }

    /// Context-receiving capability.
    fn as_context_aware(&self) -> Option<&dyn ContextAware> {
        None
    }
}

/// Trait for beans the container can construct by type.
///
/// `Default::default()` produces the blank instance; `describe` declares the
/// bean's scope and its injectable fields. `describe` runs once, when the type
/// is registered, and any malformed declaration fails that registration.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Bean, Component, Container, Inject, Scope, Shape};
///
/// #[derive(Default)]
/// struct Repository;
/// impl Bean for Repository {}
/// impl Component for Repository {}
///
/// #[derive(Default)]
/// struct Service {
///     repository: Inject<Repository>,
/// }
///
/// impl Bean for Service {}
/// impl Component for Service {
///     fn describe(shape: &mut Shape<Self>) {
///         shape.scope(Scope::Prototype);
///         shape.inject("repository", |s| &s.repository).id("repository");
///     }
/// }
///
/// let container = Container::new();
/// container.register_bean::<Repository>("repository").unwrap();
/// container.register_bean::<Service>("service").unwrap();
/// container.initialize().unwrap();
///
/// let service = container.get_instance::<Service>("service");
/// assert!(service.repository.get().is_some());
/// ```
pub trait Component: Bean + Default {
    /// Declares scope and injection points.
    fn describe(shape: &mut Shape<Self>) {
        let _ = shape;
    }
}

/// Collector for the interfaces a bean type provides.
///
/// Each entry is an upcast from `Arc<T>` to `Arc<I>`, typically the unsizing
/// coercion to a trait object.
pub struct Provides<T> {
    casts: Casts,
    _bean: PhantomData<fn() -> T>,
}

impl<T: Bean> Provides<T> {
    /// Collects the cast table of `T`: its own type plus declared interfaces.
    pub(crate) fn collect() -> Casts {
        let mut provides = Provides {
            casts: Casts::default(),
            _bean: PhantomData,
        };
        provides.add::<T>(|bean| bean);
        T::interfaces(&mut provides);
        provides.casts
    }

    /// Declares that `T` can be injected where an `I` is expected.
    pub fn add<I>(&mut self, upcast: fn(Arc<T>) -> Arc<I>) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.casts.insert::<T, I>(upcast);
        self
    }
}

// Plain value types carry no capabilities and no injections.
macro_rules! plain_beans {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Bean for $ty {}
            impl Component for $ty {}
        )*
    };
}

plain_beans!(
    String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    std::sync::atomic::AtomicBool,
    std::sync::atomic::AtomicI64,
    std::sync::atomic::AtomicU64,
    std::sync::atomic::AtomicUsize,
);

impl<T: Send + Sync + 'static> Bean for Vec<T> {}
impl<T: Send + Sync + 'static> Component for Vec<T> {}

impl<T: Send + 'static> Bean for std::sync::Mutex<T> {}
impl<T: Send + Default + 'static> Component for std::sync::Mutex<T> {}

impl<T: Send + Sync + 'static> Bean for std::sync::RwLock<T> {}
impl<T: Send + Sync + Default + 'static> Component for std::sync::RwLock<T> {}
