/// Process-wide container tests
///
/// The global container is shared by every test in this binary, so each test
/// runs serially and starts from a reset container.
use ferrous_ioc::global;
use ferrous_ioc::{Bean, BeanType, Component, ContainerState, DiError, Inject, Scope, Shape};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Repository;
impl Bean for Repository {}
impl Component for Repository {}

#[derive(Default)]
struct Controller {
    repository: Inject<Repository>,
}
impl Bean for Controller {}
impl Component for Controller {
    fn describe(shape: &mut Shape<Self>) {
        shape.scope(Scope::Prototype);
        shape.inject("repository", |c| &c.repository);
    }
}

#[test]
#[serial]
fn test_global_registration_and_lookup() {
    global::reset_container();

    global::register_bean::<Repository>("repository").unwrap();
    global::register_bean::<Controller>("controller").unwrap();
    global::register_bean_instance("name", Arc::new("app".to_string())).unwrap();
    global::initialize_container().unwrap();

    let controller = global::get_instance::<Controller>("controller");
    let repository = global::get_instance::<Repository>("repository");
    assert!(Arc::ptr_eq(controller.repository.get().unwrap(), &repository));
    assert_eq!(*global::get_instance::<String>("name"), "app");

    assert_eq!(global::get_bean_types()["controller"], BeanType::of::<Controller>());
    assert_eq!(global::get_bean_scopes()["controller"], Scope::Prototype);

    global::close();
    assert_eq!(global::container().state(), ContainerState::Uninitialized);
}

#[test]
#[serial]
fn test_global_factory_and_postprocessor() {
    global::reset_container();

    let processed = Arc::new(AtomicUsize::new(0));
    let counter = processed.clone();
    global::register_bean_factory("port", Scope::Singleton, |_| Ok(Arc::new(8080u16))).unwrap();
    global::register_bean_postprocessor::<u16, _>(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();
    global::initialize_container().unwrap();

    assert_eq!(*global::get_instance::<u16>("port"), 8080);
    assert_eq!(processed.load(Ordering::SeqCst), 1);
    global::close();
}

#[test]
#[serial]
fn test_global_lookup_before_initialization() {
    global::reset_container();

    global::register_bean::<Repository>("repository").unwrap();
    assert!(matches!(
        global::get_instance_safe::<Repository>("repository"),
        Err(DiError::NotInitialized)
    ));

    global::initialize_container().unwrap();
    assert!(matches!(
        global::register_bean::<Repository>("other"),
        Err(DiError::AlreadyInitialized { .. })
    ));
    global::reset_container();
}
