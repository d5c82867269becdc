//! Process-wide container.
//!
//! Free functions operating on one lazily created, process-wide [`Container`],
//! for applications that want a single container without threading a handle
//! through their code. Each function delegates to the method of the same name.
//!
//! ```rust
//! use ferrous_ioc::global;
//! use std::sync::Arc;
//!
//! global::register_bean_instance("motd", Arc::new("hello".to_string())).unwrap();
//! global::initialize_container().unwrap();
//! assert_eq!(*global::get_instance::<String>("motd"), "hello");
//! global::close();
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::bean_type::BeanType;
use crate::container::Container;
use crate::context::Context;
use crate::error::{BoxError, DiResult};
use crate::scope::Scope;
use crate::traits::{Bean, Component};

static CONTAINER: Lazy<Container> = Lazy::new(Container::new);

/// The process-wide container.
pub fn container() -> &'static Container {
    &CONTAINER
}

/// See [`Container::register_bean`].
pub fn register_bean<T: Component>(id: &str) -> DiResult<bool> {
    CONTAINER.register_bean::<T>(id)
}

/// See [`Container::register_instance`].
pub fn register_bean_instance<T: Bean>(id: &str, instance: Arc<T>) -> DiResult<bool> {
    CONTAINER.register_instance(id, instance)
}

/// See [`Container::register_factory`].
pub fn register_bean_factory<T, F>(id: &str, scope: Scope, factory: F) -> DiResult<bool>
where
    T: Bean,
    F: Fn(&Context) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
{
    CONTAINER.register_factory(id, scope, factory)
}

/// See [`Container::register_postprocessor`].
pub fn register_bean_postprocessor<T, F>(hook: F) -> DiResult<()>
where
    T: Bean,
    F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
{
    CONTAINER.register_postprocessor(hook)
}

/// See [`Container::initialize`].
pub fn initialize_container() -> DiResult<()> {
    CONTAINER.initialize()
}

/// See [`Container::get_instance`].
pub fn get_instance<T: ?Sized + 'static>(id: &str) -> Arc<T> {
    CONTAINER.get_instance::<T>(id)
}

/// See [`Container::get_instance_safe`].
pub fn get_instance_safe<T: ?Sized + 'static>(id: &str) -> DiResult<Arc<T>> {
    CONTAINER.get_instance_safe::<T>(id)
}

/// See [`Container::bean_types`].
pub fn get_bean_types() -> HashMap<String, BeanType> {
    CONTAINER.bean_types()
}

/// See [`Container::bean_scopes`].
pub fn get_bean_scopes() -> HashMap<String, Scope> {
    CONTAINER.bean_scopes()
}

/// See [`Container::close`].
pub fn close() {
    CONTAINER.close()
}

/// See [`Container::reset`].
pub fn reset_container() {
    CONTAINER.reset()
}
