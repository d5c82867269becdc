//! Container-wide initialization and shutdown, and the per-instance
//! post-construction pipeline.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{DiError, DiResult};
use crate::instance::Instance;
use crate::registration::{Graph, Source};
use crate::scope::Scope;

use super::resolver::Resolver;
use super::state::ContainerState;
use super::ContainerInner;

/// Runs initializer, matching postprocessors, then context hand-off.
pub(crate) fn post_construct(graph: &Graph, ctx: &Context, id: &str, instance: &Instance) -> DiResult<()> {
    let bean = instance.bean();
    if let Some(initializing) = bean.as_initializing() {
        initializing
            .post_construct()
            .map_err(|err| DiError::initializer(id, err))?;
    }
    for hook in graph.postprocessors_for(&instance.bean_type()) {
        hook(instance).map_err(|err| DiError::postprocessor(id, err))?;
    }
    if let Some(aware) = bean.as_context_aware() {
        aware.set_context(ctx);
    }
    tracing::trace!(bean = id, "bean post-constructed");
    Ok(())
}

/// Clears the initializing flag however `bootstrap` exits, and rolls the
/// container back to Uninitialized unless it completed.
struct Bootstrapping<'a> {
    inner: &'a ContainerInner,
    completed: bool,
}

impl<'a> Bootstrapping<'a> {
    fn start(inner: &'a ContainerInner) -> Self {
        inner.initializing.store(true, Ordering::Release);
        Self { inner, completed: false }
    }
}

impl Drop for Bootstrapping<'_> {
    fn drop(&mut self) {
        if !self.completed {
            // Back to a clean, retryable state; the registry is kept
            self.inner.state.store(ContainerState::Uninitialized);
            *self.inner.graph.write() = None;
            if std::thread::panicking() {
                tracing::error!("container initialization panicked");
            }
        }
        self.inner.initializing.store(false, Ordering::Release);
    }
}

/// Best-effort close of every closeable among `instances`, in the given order.
fn close_all<'a>(instances: impl IntoIterator<Item = (&'a String, &'a Instance)>) {
    for (id, instance) in instances {
        if let Some(closeable) = instance.bean().as_closeable() {
            match closeable.close() {
                Ok(()) => tracing::debug!(bean = id.as_str(), "bean closed"),
                Err(err) => {
                    let err = DiError::close(id, err);
                    tracing::error!(bean = id.as_str(), error = %err, "failed to close bean");
                }
            }
        }
    }
}

impl ContainerInner {
    pub(crate) fn initialize(&self) -> DiResult<()> {
        let operation = "reinitialization is not supported";
        let registry = self
            .lock_registry()
            .ok_or(DiError::AlreadyInitialized { operation })?;
        self.require_registry_open(operation)?;

        let (beans, postprocessors) = {
            let registry = registry.borrow();
            (registry.beans.clone(), registry.postprocessors.clone())
        };
        tracing::info!(beans = beans.len(), "initializing container");

        let mut bootstrapping = Bootstrapping::start(self);
        let result = self.bootstrap(Graph {
            beans,
            postprocessors,
            singletons: HashMap::new(),
        });
        match &result {
            Ok(()) => {
                bootstrapping.completed = true;
                tracing::info!("container initialized");
            }
            Err(err) => tracing::error!(error = %err, "container initialization failed"),
        }
        drop(bootstrapping);
        drop(registry);
        result
    }

    fn bootstrap(&self, mut graph: Graph) -> DiResult<()> {
        let background = Context::background();
        let mut ids: Vec<String> = graph.beans.keys().cloned().collect();
        ids.sort();

        // Create: type-registered singletons first, then singleton factories.
        // Caller-supplied instances are taken as they are.
        for id in &ids {
            let registration = &graph.beans[id];
            if registration.scope != Scope::Singleton {
                continue;
            }
            match registration.source {
                Source::Type { .. } => {
                    let instance = self.create(&background, id, registration)?;
                    graph.singletons.insert(id.clone(), instance);
                }
                Source::Instance(ref instance) => {
                    graph.singletons.insert(id.clone(), instance.clone());
                }
                Source::Factory(_) => {}
            }
        }
        for id in &ids {
            let registration = &graph.beans[id];
            if registration.scope == Scope::Singleton && matches!(registration.source, Source::Factory(_)) {
                let instance = self.create(&background, id, registration)?;
                graph.singletons.insert(id.clone(), instance);
            }
        }

        // Wire type-registered singletons
        {
            let resolver = Resolver::new(self, &graph);
            for id in &ids {
                let registration = &graph.beans[id];
                if registration.scope != Scope::Singleton {
                    continue;
                }
                if let (Source::Type { injections, .. }, Some(instance)) =
                    (&registration.source, graph.singletons.get(id))
                {
                    resolver.inject(&background, id, instance, injections)?;
                }
            }
        }

        // Publish, flip, then post-construct so hooks can use lookups
        let graph = Arc::new(graph);
        *self.graph.write() = Some(graph.clone());
        self.state.store(ContainerState::Ready);

        let mut singletons: Vec<(&String, &Instance)> = graph.singletons.iter().collect();
        singletons.sort_by(|a, b| a.0.cmp(b.0));
        for (done, (id, instance)) in singletons.iter().enumerate() {
            if let Err(err) = post_construct(&graph, &background, id, instance) {
                // Release whatever the already started singletons acquired
                close_all(singletons[..done].iter().copied());
                return Err(err);
            }
        }
        Ok(())
    }

    pub(crate) fn close(&self) {
        let Some(registry) = self.lock_registry() else {
            tracing::warn!("close requested from a factory while the container is initializing or closing; ignored");
            return;
        };
        // Only the initializing thread itself can get here mid-initialization
        if self.initializing.load(Ordering::Acquire) {
            tracing::warn!("close requested while the container is initializing; ignored");
            return;
        }
        if self.state.load() == ContainerState::Closed {
            tracing::warn!("close requested while the container is already closing; ignored");
            return;
        }
        let graph = self.graph.read().clone();

        if let Some(graph) = graph {
            self.state.store(ContainerState::Closed);
            tracing::info!(singletons = graph.singletons.len(), "closing container");

            let mut singletons: Vec<(&String, &Instance)> = graph.singletons.iter().collect();
            singletons.sort_by(|a, b| a.0.cmp(b.0));
            close_all(singletons);
        }

        registry.borrow_mut().clear();
        *self.graph.write() = None;
        self.state.store(ContainerState::Uninitialized);
        tracing::info!("container closed");
    }

    pub(crate) fn reset(&self) {
        let Some(registry) = self.lock_registry() else {
            tracing::warn!("reset requested from a factory while the container is initializing or closing; ignored");
            return;
        };
        // Set only while this very thread is inside `initialize`
        if self.initializing.load(Ordering::Acquire) {
            tracing::warn!("reset requested while the container is initializing; ignored");
            return;
        }
        registry.borrow_mut().clear();
        *self.graph.write() = None;
        self.state.store(ContainerState::Uninitialized);
        tracing::debug!("container reset");
    }
}
