//! Bean descriptors: how a bean type declares itself, and what the container
//! reports back for introspection.

use std::marker::PhantomData;

use crate::bean_type::BeanType;
use crate::error::{DiError, DiResult};
use crate::inject::{parse_flag, Inject, InjectList, InjectMap, InjectionKind, InjectionPoint};
use crate::scope::Scope;
use crate::traits::Component;

/// Declaration of a bean type's scope and injection points.
///
/// Handed to [`Component::describe`] when the type is registered. Scopes and
/// optional flags may be given as literals; a malformed literal is reported
/// as the registration's error.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Bean, Component, Container, Inject, InjectList, Shape};
/// use std::sync::Arc;
///
/// trait Plugin: Send + Sync {}
///
/// #[derive(Default)]
/// struct Audit;
/// impl Plugin for Audit {}
/// impl Bean for Audit {
///     fn interfaces(provides: &mut ferrous_ioc::Provides<Self>) {
///         provides.add::<dyn Plugin>(|a| a as Arc<dyn Plugin>);
///     }
/// }
/// impl Component for Audit {}
///
/// #[derive(Default)]
/// struct Host {
///     plugins: InjectList<dyn Plugin>,
///     fallback: Inject<String>,
/// }
///
/// impl Bean for Host {}
/// impl Component for Host {
///     fn describe(shape: &mut Shape<Self>) {
///         shape.scope_name("prototype");
///         shape.inject_list("plugins", |h| &h.plugins);
///         shape.inject("fallback", |h| &h.fallback).id("fallback").optional_flag("true");
///     }
/// }
///
/// let container = Container::new();
/// container.register_bean::<Audit>("audit").unwrap();
/// container.register_bean::<Host>("host").unwrap();
/// container.initialize().unwrap();
///
/// let host = container.get_instance::<Host>("host");
/// assert_eq!(host.plugins.len(), 1);
/// assert!(!host.fallback.is_set());
/// ```
pub struct Shape<T> {
    scope: Scope,
    points: Vec<InjectionPoint>,
    error: Option<DiError>,
    _bean: PhantomData<fn() -> T>,
}

impl<T: Component> Shape<T> {
    /// Runs `T::describe` and returns the declared scope and injection points.
    pub(crate) fn collect() -> DiResult<(Scope, Vec<InjectionPoint>)> {
        let mut shape = Shape {
            scope: Scope::default(),
            points: Vec::new(),
            error: None,
            _bean: PhantomData,
        };
        T::describe(&mut shape);
        match shape.error {
            Some(err) => Err(err),
            None => Ok((shape.scope, shape.points)),
        }
    }

    /// Sets the bean's scope. Defaults to [`Scope::Singleton`].
    pub fn scope(&mut self, scope: Scope) -> &mut Self {
        self.scope = scope;
        self
    }

    /// Sets the bean's scope from its literal form.
    pub fn scope_name(&mut self, literal: &str) -> &mut Self {
        match literal.parse() {
            Ok(scope) => self.scope = scope,
            Err(err) => self.fail(err),
        }
        self
    }

    /// Declares a single-reference injection point.
    ///
    /// Without an explicit id the dependency is matched by type: exactly one
    /// bean must provide `E`.
    pub fn inject<E>(&mut self, field: &'static str, slot: fn(&T) -> &Inject<E>) -> InjectionBuilder<'_, T>
    where
        E: ?Sized + 'static,
    {
        self.push(InjectionPoint::single(field, slot))
    }

    /// Declares a list injection point collecting every bean providing `E`.
    pub fn inject_list<E>(&mut self, field: &'static str, slot: fn(&T) -> &InjectList<E>) -> InjectionBuilder<'_, T>
    where
        E: ?Sized + 'static,
    {
        self.push(InjectionPoint::list(field, slot))
    }

    /// Declares a map injection point collecting every bean providing `E`,
    /// keyed by bean id.
    pub fn inject_map<E>(&mut self, field: &'static str, slot: fn(&T) -> &InjectMap<E>) -> InjectionBuilder<'_, T>
    where
        E: ?Sized + 'static,
    {
        self.push(InjectionPoint::map(field, slot))
    }

    fn push(&mut self, point: InjectionPoint) -> InjectionBuilder<'_, T> {
        self.points.push(point);
        let index = self.points.len() - 1;
        InjectionBuilder { shape: self, index }
    }

    fn fail(&mut self, err: DiError) {
        // Keep the first malformed declaration
        self.error.get_or_insert(err);
    }
}

/// Refines the injection point just declared on a [`Shape`].
pub struct InjectionBuilder<'a, T> {
    shape: &'a mut Shape<T>,
    index: usize,
}

impl<'a, T: Component> InjectionBuilder<'a, T> {
    /// Injects the bean registered under `id` instead of matching by type.
    pub fn id(self, id: impl Into<String>) -> Self {
        self.shape.points[self.index].target = Some(id.into());
        self
    }

    /// Leaves the slot empty instead of failing when no dependency is found.
    pub fn optional(self) -> Self {
        self.shape.points[self.index].optional = true;
        self
    }

    /// Sets optionality from a boolean literal such as `"true"` or `"0"`.
    pub fn optional_flag(self, literal: &str) -> Self {
        let field = self.shape.points[self.index].field;
        match parse_flag(literal) {
            Some(optional) => self.shape.points[self.index].optional = optional,
            None => self.shape.fail(DiError::InvalidOptional {
                field,
                value: literal.to_string(),
            }),
        }
        self
    }
}

/// How a registered bean gets its instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeanOrigin {
    /// Constructed by the container from the bean type
    Type,
    /// Supplied pre-built at registration
    Instance,
    /// Produced by a registered factory
    Factory,
}

/// Declared injection point, as reported by [`BeanDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionDescriptor {
    /// Field name
    pub field: &'static str,
    /// Explicit bean id, `None` for type-based injection
    pub target: Option<String>,
    /// Whether a missing dependency is tolerated
    pub optional: bool,
    /// Single reference, list or map
    pub kind: InjectionKind,
    /// Element type
    pub element: BeanType,
}

impl From<&InjectionPoint> for InjectionDescriptor {
    fn from(point: &InjectionPoint) -> Self {
        Self {
            field: point.field,
            target: point.target.clone(),
            optional: point.optional,
            kind: point.kind,
            element: point.element,
        }
    }
}

/// Registered bean, for introspection and diagnostics.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{BeanOrigin, Container, Scope};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.register_bean::<String>("name").unwrap();
/// container
///     .register_factory("port", Scope::Prototype, |_| Ok(Arc::new(8080u16)))
///     .unwrap();
///
/// let descriptors = container.descriptors();
/// assert_eq!(descriptors.len(), 2);
/// assert_eq!(descriptors[0].id, "name");
/// assert_eq!(descriptors[1].origin, BeanOrigin::Factory);
/// assert_eq!(descriptors[1].scope, Scope::Prototype);
/// ```
#[derive(Debug, Clone)]
pub struct BeanDescriptor {
    /// Bean id
    pub id: String,
    /// Scope
    pub scope: Scope,
    /// Concrete type
    pub bean_type: BeanType,
    /// Where instances come from
    pub origin: BeanOrigin,
    /// Types the bean can be injected as, its own included
    pub provides: Vec<BeanType>,
    /// Declared injection points, in declaration order
    pub injections: Vec<InjectionDescriptor>,
}

impl BeanDescriptor {
    /// Whether the bean can be injected where an `I` is expected.
    pub fn provides<I: ?Sized + 'static>(&self) -> bool {
        self.provides.contains(&BeanType::of::<I>())
    }
}
