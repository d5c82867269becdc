//! Dependency resolution and field injection.

use crate::context::Context;
use crate::error::{DiError, DiResult};
use crate::inject::{InjectionKind, InjectionPoint};
use crate::instance::Instance;
use crate::internal::ChainGuard;
use crate::registration::{Graph, Source};
use crate::scope::Scope;

use super::ContainerInner;

/// Resolves beans against one frozen graph.
pub(crate) struct Resolver<'a> {
    inner: &'a ContainerInner,
    graph: &'a Graph,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(inner: &'a ContainerInner, graph: &'a Graph) -> Self {
        Self { inner, graph }
    }

    /// Returns the instance of `id` for `ctx`.
    ///
    /// Singletons come from the cache. Every other scope gets a fresh,
    /// wired and post-constructed instance, tracked in the resolution chain
    /// while its own dependencies are being resolved.
    pub(crate) fn resolve(&self, ctx: &Context, id: &str) -> DiResult<Instance> {
        let registration = self
            .graph
            .beans
            .get(id)
            .ok_or_else(|| DiError::NotFound(id.to_string()))?;

        if registration.scope == Scope::Singleton {
            return self
                .graph
                .singletons
                .get(id)
                .cloned()
                .ok_or_else(|| DiError::NotFound(id.to_string()));
        }

        let _link = ChainGuard::enter(self.inner.owner(), id, &self.inner.config)?;
        let instance = self.inner.create(ctx, id, registration)?;
        // Factories hand back fully built instances
        if let Source::Type { injections, .. } = &registration.source {
            self.inject(ctx, id, &instance, injections)?;
        }
        super::lifecycle::post_construct(self.graph, ctx, id, &instance)?;
        Ok(instance)
    }

    /// Fills every injection point of `instance`, the bean registered as `bean`.
    pub(crate) fn inject(
        &self,
        ctx: &Context,
        bean: &str,
        instance: &Instance,
        injections: &[InjectionPoint],
    ) -> DiResult<()> {
        for point in injections {
            let Some(targets) = self.targets(bean, point)? else {
                tracing::trace!(bean, field = point.field, "optional dependency left unset");
                continue;
            };

            let mut resolved = Vec::with_capacity(targets.len());
            for target in targets {
                let dependency = self.resolve(ctx, &target)?;
                resolved.push((target, dependency));
            }

            (point.assign)(instance.any(), resolved).map_err(|target| DiError::IncompatibleDependency {
                bean: bean.to_string(),
                field: point.field,
                target,
                expected: point.element.name(),
            })?;
            tracing::trace!(bean, field = point.field, "dependency injected");
        }
        Ok(())
    }

    /// Selects the bean ids an injection point resolves to.
    ///
    /// `None` means an optional point with nothing to inject.
    fn targets(&self, bean: &str, point: &InjectionPoint) -> DiResult<Option<Vec<String>>> {
        let missing = || {
            if point.optional {
                Ok(None)
            } else {
                Err(DiError::NoDependencyFound {
                    bean: bean.to_string(),
                    field: point.field,
                })
            }
        };

        if let Some(target) = &point.target {
            let Some(registration) = self.graph.beans.get(target) else {
                return missing();
            };
            self.check_injectable(bean, point, target, registration.scope)?;
            return Ok(Some(vec![target.clone()]));
        }

        let candidates = self.graph.candidates(&point.element);
        for candidate in &candidates {
            if let Some(registration) = self.graph.beans.get(*candidate) {
                self.check_injectable(bean, point, candidate, registration.scope)?;
            }
        }

        match point.kind {
            InjectionKind::Single => match candidates.len() {
                0 => missing(),
                1 => Ok(Some(candidates.into_iter().cloned().collect())),
                // Ambiguity fails even for optional points
                _ => Err(DiError::AmbiguousDependency {
                    bean: bean.to_string(),
                    field: point.field,
                    candidates: candidates.into_iter().cloned().collect(),
                }),
            },
            InjectionKind::List | InjectionKind::Map => {
                if candidates.is_empty() && point.optional {
                    Ok(None)
                } else {
                    Ok(Some(candidates.into_iter().cloned().collect()))
                }
            }
        }
    }

    fn check_injectable(&self, bean: &str, point: &InjectionPoint, target: &str, scope: Scope) -> DiResult<()> {
        if scope.is_injectable() {
            Ok(())
        } else {
            Err(DiError::RequestInjection {
                bean: bean.to_string(),
                field: point.field,
                target: target.to_string(),
            })
        }
    }
}
