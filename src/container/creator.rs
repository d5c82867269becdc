//! Instance creation.

use crate::context::Context;
use crate::error::{DiError, DiResult};
use crate::instance::Instance;
use crate::registration::{Registration, Source};

use super::ContainerInner;

impl ContainerInner {
    /// Produces a fresh, unwired instance of the bean registered as `id`.
    ///
    /// Factories receive `ctx`; type-registered beans start from their
    /// `Default`. Only one instance is under construction at a time; the lock
    /// is reentrant so a factory may resolve other beans on the same thread.
    pub(crate) fn create(&self, ctx: &Context, id: &str, registration: &Registration) -> DiResult<Instance> {
        let _creating = self.creation_lock.lock();
        let instance = match &registration.source {
            Source::Type { construct, .. } => construct(),
            Source::Instance(instance) => instance.clone(),
            Source::Factory(factory) => factory(ctx).map_err(|err| DiError::factory(id, err))?,
        };
        tracing::trace!(
            bean = id,
            bean_type = instance.bean_type().name(),
            scope = %registration.scope,
            "bean instance created"
        );
        Ok(instance)
    }
}
