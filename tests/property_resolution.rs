/// Property-based tests for bean resolution
///
/// These tests verify that resolution behavior follows expected patterns
/// regardless of the specific bean ids, values or graph shapes used.
use ferrous_ioc::{Bean, Component, Container, ContainerConfig, DiError, Inject, InjectList, Scope, Shape};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Default)]
struct Hop {
    next: Inject<Hop>,
}
impl Bean for Hop {}
impl Component for Hop {
    fn describe(shape: &mut Shape<Self>) {
        shape.scope(Scope::Prototype);
        shape.inject("next", |h| &h.next).id("hop");
    }
}

#[derive(Default)]
struct Collector {
    all: InjectList<String>,
}
impl Bean for Collector {}
impl Component for Collector {
    fn describe(shape: &mut Shape<Self>) {
        shape.inject_list("all", |c| &c.all);
    }
}

fn bean_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}"
}

// Property: singleton lookups always return the registered instance
proptest! {
    #[test]
    fn singleton_lookup_returns_registered_instance(id in bean_id(), value in "\\PC{0,50}") {
        let container = Container::new();
        let instance = Arc::new(value.clone());
        container.register_instance(&id, instance.clone()).unwrap();
        container.initialize().unwrap();

        let first = container.get_instance::<String>(&id);
        let second = container.get_instance::<String>(&id);
        prop_assert!(Arc::ptr_eq(&first, &instance));
        prop_assert!(Arc::ptr_eq(&first, &second));
        prop_assert_eq!(&*first, &value);
    }
}

// Property: the last registration under an id wins
proptest! {
    #[test]
    fn last_registration_wins(id in bean_id(), values in prop::collection::vec(any::<u64>(), 1..8)) {
        let container = Container::new();
        for (i, value) in values.iter().enumerate() {
            let overwritten = container.register_instance(&id, Arc::new(*value)).unwrap();
            prop_assert_eq!(overwritten, i > 0);
        }
        container.initialize().unwrap();
        prop_assert_eq!(*container.get_instance::<u64>(&id), *values.last().unwrap());
    }
}

// Property: list injection collects every candidate in id order
proptest! {
    #[test]
    fn list_injection_collects_in_id_order(ids in prop::collection::hash_set(bean_id(), 0..10)) {
        let container = Container::new();
        for id in &ids {
            container.register_instance(id, Arc::new(id.clone())).unwrap();
        }
        // Outside the generated id alphabet, so no candidate is overwritten
        container.register_bean::<Collector>("~collector").unwrap();
        container.initialize().unwrap();

        let collector = container.get_instance::<Collector>("~collector");
        let collected: Vec<String> = collector.all.iter().map(|s| s.to_string()).collect();
        let mut expected: Vec<String> = ids.into_iter().collect();
        expected.sort();
        prop_assert_eq!(collected, expected);
    }
}

// Property: a self-referencing prototype fails exactly when recurrences exceed the tolerance
proptest! {
    #[test]
    fn cycle_path_grows_with_tolerance(tolerance in 0usize..6) {
        let container = Container::with_config(ContainerConfig::default().cycle_tolerance(tolerance));
        container.register_bean::<Hop>("hop").unwrap();
        container.initialize().unwrap();

        match container.get_instance_safe::<Hop>("hop").map(|_| ()) {
            Err(DiError::Circular { bean, path }) => {
                prop_assert_eq!(bean, "hop");
                prop_assert_eq!(path.len(), tolerance + 2);
            }
            other => prop_assert!(false, "unexpected: {:?}", other),
        }
    }
}

// Property: unknown ids never resolve
proptest! {
    #[test]
    fn unknown_ids_are_not_found(registered in prop::collection::hash_set(bean_id(), 0..6), probe in bean_id()) {
        prop_assume!(!registered.contains(&probe));
        let container = Container::new();
        for id in &registered {
            container.register_instance(id, Arc::new(0u8)).unwrap();
        }
        container.initialize().unwrap();

        let is_not_found = matches!(container.instance(&probe), Err(DiError::NotFound(id)) if id == probe);
        prop_assert!(is_not_found);
        let ids: HashSet<String> = container.bean_types().into_keys().collect();
        prop_assert_eq!(ids, registered);
    }
}
