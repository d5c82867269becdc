//! # ferrous-ioc
//!
//! Bean-style inversion of control for Rust: register beans under string ids,
//! let the container construct and wire them, and look them up by id.
//!
//! ## Features
//!
//! - **Three scopes**: Singleton, Prototype and Request
//! - **Field injection**: by explicit bean id or by type, into single, list
//!   and map slots
//! - **Trait injection**: beans declare the interfaces they can be injected as
//! - **Cycle detection**: prototype cycles are reported with the full path,
//!   while singletons may reference each other freely
//! - **Lifecycle hooks**: initializers, typed postprocessors, context hand-off
//!   and closing
//! - **Thread-safe**: registration, initialization and shutdown are serialized;
//!   lookups are lock-free reads of a frozen graph
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{Bean, Component, Container, Inject, Shape};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Database;
//! impl Bean for Database {}
//! impl Component for Database {}
//!
//! #[derive(Default)]
//! struct UserService {
//!     db: Inject<Database>,
//! }
//!
//! impl Bean for UserService {}
//! impl Component for UserService {
//!     fn describe(shape: &mut Shape<Self>) {
//!         shape.inject("db", |s| &s.db).id("database");
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_bean::<Database>("database").unwrap();
//! container.register_bean::<UserService>("users").unwrap();
//! container.initialize().unwrap();
//!
//! let users = container.get_instance::<UserService>("users");
//! let database = container.get_instance::<Database>("database");
//! assert!(Arc::ptr_eq(users.db.get().unwrap(), &database));
//! ```
//!
//! ## Bean Scopes
//!
//! - **Singleton**: created once during initialization and shared
//! - **Prototype**: created, wired and initialized on every resolution
//! - **Request**: created per unit of work by [`request::RequestScope`], never
//!   injected and never returned by the generic lookups
//!
//! ## Trait Injection
//!
//! ```rust
//! use ferrous_ioc::{Bean, Component, Container, InjectList, Provides, Shape};
//! use std::sync::Arc;
//!
//! trait Check: Send + Sync {
//!     fn healthy(&self) -> bool;
//! }
//!
//! #[derive(Default)]
//! struct Disk;
//! impl Check for Disk {
//!     fn healthy(&self) -> bool {
//!         true
//!     }
//! }
//! impl Bean for Disk {
//!     fn interfaces(provides: &mut Provides<Self>) {
//!         provides.add::<dyn Check>(|d| d as Arc<dyn Check>);
//!     }
//! }
//! impl Component for Disk {}
//!
//! #[derive(Default)]
//! struct Health {
//!     checks: InjectList<dyn Check>,
//! }
//! impl Bean for Health {}
//! impl Component for Health {
//!     fn describe(shape: &mut Shape<Self>) {
//!         shape.inject_list("checks", |h| &h.checks);
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_bean::<Disk>("disk").unwrap();
//! container.register_bean::<Health>("health").unwrap();
//! container.initialize().unwrap();
//!
//! let health = container.get_instance::<Health>("health");
//! assert!(health.checks.iter().all(|c| c.healthy()));
//! assert!(container.get_instance::<dyn Check>("disk").healthy());
//! ```

// Module declarations
pub mod bean_type;
pub mod cancellation;
pub mod config;
pub mod container;
pub mod context;
pub mod descriptors;
pub mod error;
pub mod global;
pub mod inject;
pub mod instance;
pub mod request;
pub mod scope;
pub mod traits;

#[cfg(feature = "axum-integration")]
pub mod axum_integration;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use bean_type::BeanType;
pub use cancellation::CancellationToken;
pub use config::ContainerConfig;
pub use container::{Container, ContainerState};
pub use context::{BeanKey, Context};
pub use descriptors::{BeanDescriptor, BeanOrigin, InjectionBuilder, InjectionDescriptor, Shape};
pub use error::{BoxError, DiError, DiResult, ErrorKind, SharedError};
pub use inject::{Inject, InjectList, InjectMap, InjectionKind};
pub use instance::Instance;
pub use scope::Scope;
pub use traits::{Bean, Closeable, Component, ContextAware, Initializing, Provides};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        hits: AtomicUsize,
    }

    impl Bean for Counter {}
    impl Component for Counter {
        fn describe(shape: &mut Shape<Self>) {
            shape.scope(Scope::Prototype);
        }
    }

    #[test]
    fn lookups_require_initialization() {
        let container = Container::new();
        container.register_bean::<Counter>("counter").unwrap();
        assert!(matches!(
            container.get_instance_safe::<Counter>("counter"),
            Err(DiError::NotInitialized)
        ));
        assert_eq!(container.state(), ContainerState::Uninitialized);
    }

    #[test]
    fn prototype_instances_are_independent() {
        let container = Container::new();
        container.register_bean::<Counter>("counter").unwrap();
        container.initialize().unwrap();

        let a = container.get_instance::<Counter>("counter");
        let b = container.get_instance::<Counter>("counter");
        a.hits.fetch_add(1, Ordering::SeqCst);
        assert_eq!(b.hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn containers_are_isolated() {
        let first = Container::new();
        let second = Container::new();
        first.register_bean::<String>("name").unwrap();
        assert!(second.bean_types().is_empty());
        assert_eq!(first.clone().bean_types().len(), 1);
    }

    #[test]
    fn type_mismatch_on_lookup() {
        let container = Container::new();
        container.register_instance("name", std::sync::Arc::new("x".to_string())).unwrap();
        container.initialize().unwrap();
        match container.get_instance_safe::<u32>("name") {
            Err(err @ DiError::TypeMismatch { .. }) => assert_eq!(err.kind(), ErrorKind::Resolution),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
