//! Bean registration types.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::bean_type::BeanType;
use crate::context::Context;
use crate::descriptors::{BeanDescriptor, BeanOrigin, Shape};
use crate::error::{BoxError, DiResult};
use crate::inject::InjectionPoint;
use crate::instance::{Casts, Instance};
use crate::scope::Scope;
use crate::traits::{Bean, Component, Provides};

pub(crate) type Construct = Arc<dyn Fn() -> Instance + Send + Sync>;
pub(crate) type Factory = Arc<dyn Fn(&Context) -> Result<Instance, BoxError> + Send + Sync>;
pub(crate) type Postprocessor = Arc<dyn Fn(&Instance) -> Result<(), BoxError> + Send + Sync>;

/// Where a registered bean's instances come from.
#[derive(Clone)]
pub(crate) enum Source {
    /// Blank construction followed by field injection
    Type {
        construct: Construct,
        injections: Arc<[InjectionPoint]>,
    },
    /// Pre-built by the caller; never constructed or injected
    Instance(Instance),
    /// User factory, invoked with the resolution context
    Factory(Factory),
}

/// Bean registration with scope and instance source
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) scope: Scope,
    pub(crate) bean_type: BeanType,
    pub(crate) casts: Arc<Casts>,
    pub(crate) source: Source,
}

impl Registration {
    /// Registration constructed by the container from `T`'s declaration.
    pub(crate) fn of_type<T: Component>() -> DiResult<Self> {
        let (scope, injections) = Shape::<T>::collect()?;
        let casts = Arc::new(Provides::<T>::collect());
        let construct: Construct = {
            let casts = casts.clone();
            Arc::new(move || Instance::new(Arc::new(T::default()), casts.clone()))
        };
        Ok(Self {
            scope,
            bean_type: BeanType::of::<T>(),
            casts,
            source: Source::Type {
                construct,
                injections: injections.into(),
            },
        })
    }

    /// Singleton registration of a caller-supplied instance.
    pub(crate) fn of_instance<T: Bean>(value: Arc<T>) -> Self {
        let casts = Arc::new(Provides::<T>::collect());
        Self {
            scope: Scope::Singleton,
            bean_type: BeanType::of::<T>(),
            casts: casts.clone(),
            source: Source::Instance(Instance::new(value, casts)),
        }
    }

    /// Registration producing instances through a user factory.
    pub(crate) fn of_factory<T, F>(scope: Scope, factory: F) -> Self
    where
        T: Bean,
        F: Fn(&Context) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let casts = Arc::new(Provides::<T>::collect());
        let factory: Factory = {
            let casts = casts.clone();
            Arc::new(move |ctx: &Context| factory(ctx).map(|value| Instance::new(value, casts.clone())))
        };
        Self {
            scope,
            bean_type: BeanType::of::<T>(),
            casts,
            source: Source::Factory(factory),
        }
    }

    pub(crate) fn provides(&self, target: &BeanType) -> bool {
        self.casts.provides(target)
    }

    pub(crate) fn origin(&self) -> BeanOrigin {
        match self.source {
            Source::Type { .. } => BeanOrigin::Type,
            Source::Instance(_) => BeanOrigin::Instance,
            Source::Factory(_) => BeanOrigin::Factory,
        }
    }

    pub(crate) fn describe(&self, id: &str) -> BeanDescriptor {
        let mut provides: Vec<BeanType> = self.casts.provided().collect();
        provides.sort_by_key(|t| t.name());
        let injections = match &self.source {
            Source::Type { injections, .. } => injections.iter().map(Into::into).collect(),
            _ => Vec::new(),
        };
        BeanDescriptor {
            id: id.to_string(),
            scope: self.scope,
            bean_type: self.bean_type,
            origin: self.origin(),
            provides,
            injections,
        }
    }
}

/// Wraps a typed postprocessor so it can run against erased instances.
pub(crate) fn postprocessor<T, F>(hook: F) -> Postprocessor
where
    T: Bean,
    F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(move |instance: &Instance| match instance.downcast_ref::<T>() {
        Some(bean) => hook(bean),
        None => Ok(()),
    })
}

/// Mutable bean definitions, edited until the container is initialized.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) beans: HashMap<String, Registration>,
    pub(crate) postprocessors: HashMap<TypeId, Vec<Postprocessor>>,
}

impl Registry {
    /// Inserts a registration, replacing any bean with the same id.
    ///
    /// Returns whether a bean was replaced.
    pub(crate) fn insert(&mut self, id: &str, registration: Registration) -> bool {
        let bean_type = registration.bean_type;
        let scope = registration.scope;
        match self.beans.insert(id.to_string(), registration) {
            Some(previous) => {
                tracing::warn!(
                    bean = id,
                    previous = previous.bean_type.name(),
                    replacement = bean_type.name(),
                    %scope,
                    "bean definition overwritten"
                );
                true
            }
            None => {
                tracing::debug!(bean = id, bean_type = bean_type.name(), %scope, "bean registered");
                false
            }
        }
    }

    pub(crate) fn add_postprocessor(&mut self, bean_type: BeanType, hook: Postprocessor) {
        self.postprocessors.entry(bean_type.id()).or_default().push(hook);
    }

    pub(crate) fn clear(&mut self) {
        self.beans.clear();
        self.postprocessors.clear();
    }
}

/// Frozen bean definitions plus the singletons created from them.
///
/// Published once initialization has created and wired every singleton, and
/// read without locking by every later resolution.
pub(crate) struct Graph {
    pub(crate) beans: HashMap<String, Registration>,
    pub(crate) postprocessors: HashMap<TypeId, Vec<Postprocessor>>,
    pub(crate) singletons: HashMap<String, Instance>,
}

impl Graph {
    pub(crate) fn postprocessors_for(&self, bean_type: &BeanType) -> &[Postprocessor] {
        self.postprocessors
            .get(&bean_type.id())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ids of the beans providing `target`, in ascending order.
    pub(crate) fn candidates(&self, target: &BeanType) -> Vec<&String> {
        let mut ids: Vec<&String> = self
            .beans
            .iter()
            .filter(|(_, registration)| registration.provides(target))
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }
}
