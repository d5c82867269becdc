//! Type-erased bean instances and their cast tables.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::bean_type::BeanType;
use crate::traits::Bean;

/// Type-erased shared pointer to a bean.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

type Caster = Arc<dyn Fn(&AnyArc) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// Upcasts a bean type supports, keyed by target type.
///
/// Each caster downcasts the erased pointer back to the concrete bean and
/// applies the declared upcast, returning the `Arc<I>` boxed as `Any`.
#[derive(Default, Clone)]
pub(crate) struct Casts {
    table: HashMap<TypeId, (BeanType, Caster)>,
}

impl Casts {
    pub(crate) fn insert<T, I>(&mut self, upcast: fn(Arc<T>) -> Arc<I>)
    where
        T: Bean,
        I: ?Sized + Send + Sync + 'static,
    {
        let caster: Caster = Arc::new(move |any: &AnyArc| {
            let bean = any.clone().downcast::<T>().ok()?;
            Some(Box::new(upcast(bean)) as Box<dyn Any + Send + Sync>)
        });
        self.table.insert(TypeId::of::<I>(), (BeanType::of::<I>(), caster));
    }

    pub(crate) fn provides(&self, target: &BeanType) -> bool {
        self.table.contains_key(&target.id())
    }

    pub(crate) fn provided(&self) -> impl Iterator<Item = BeanType> + '_ {
        self.table.values().map(|(bean_type, _)| *bean_type)
    }

    pub(crate) fn cast<I: ?Sized + 'static>(&self, any: &AnyArc) -> Option<Arc<I>> {
        let (_, caster) = self.table.get(&TypeId::of::<I>())?;
        let boxed = caster(any)?;
        boxed.downcast::<Arc<I>>().ok().map(|arc| *arc)
    }
}

impl fmt::Debug for Casts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.table.values().map(|(bean_type, _)| bean_type.name()))
            .finish()
    }
}

/// A live bean held by the container.
///
/// Cloning an `Instance` clones the pointer, never the bean. The same bean can
/// be viewed as its concrete type or as any interface its type declared via
/// [`Bean::interfaces`].
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Bean, Component, Container, Provides};
/// use std::sync::Arc;
///
/// trait Named: Send + Sync {
///     fn name(&self) -> &str;
/// }
///
/// #[derive(Default)]
/// struct Widget;
/// impl Named for Widget {
///     fn name(&self) -> &str {
///         "widget"
///     }
/// }
/// impl Bean for Widget {
///     fn interfaces(provides: &mut Provides<Self>) {
///         provides.add::<dyn Named>(|w| w as Arc<dyn Named>);
///     }
/// }
/// impl Component for Widget {}
///
/// let container = Container::new();
/// container.register_bean::<Widget>("widget").unwrap();
/// container.initialize().unwrap();
///
/// let instance = container.instance("widget").unwrap();
/// assert_eq!(instance.cast::<dyn Named>().unwrap().name(), "widget");
/// assert!(instance.downcast::<Widget>().is_some());
/// assert!(instance.cast::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct Instance {
    any: AnyArc,
    bean: Arc<dyn Bean>,
    bean_type: BeanType,
    casts: Arc<Casts>,
}

impl Instance {
    pub(crate) fn new<T: Bean>(value: Arc<T>, casts: Arc<Casts>) -> Self {
        Self {
            any: value.clone(),
            bean: value,
            bean_type: BeanType::of::<T>(),
            casts,
        }
    }

    /// Concrete type of the bean.
    pub fn bean_type(&self) -> BeanType {
        self.bean_type
    }

    /// Views the bean as `I`, if its type provides `I`.
    pub fn cast<I: ?Sized + 'static>(&self) -> Option<Arc<I>> {
        self.casts.cast::<I>(&self.any)
    }

    /// Views the bean as its concrete type `T`.
    pub fn downcast<T: Bean>(&self) -> Option<Arc<T>> {
        self.any.clone().downcast::<T>().ok()
    }

    pub(crate) fn downcast_ref<T: Bean>(&self) -> Option<&T> {
        self.any.downcast_ref::<T>()
    }

    /// Whether both handles point at the same bean.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.any, &other.any)
    }

    /// Interfaces the bean provides, its own type included.
    pub fn provided_types(&self) -> Vec<BeanType> {
        self.casts.provided().collect()
    }

    pub(crate) fn any(&self) -> &AnyArc {
        &self.any
    }

    pub(crate) fn bean(&self) -> &dyn Bean {
        self.bean.as_ref()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("bean_type", &self.bean_type.name())
            .field("provides", &self.casts)
            .finish()
    }
}
