/// Circular dependency tests
use ferrous_ioc::{Bean, Component, Container, ContainerConfig, DiError, ErrorKind, Inject, Scope, Shape};
use std::sync::Arc;

// Prototype cycle: Left -> Right -> Left
#[derive(Default)]
struct Left {
    right: Inject<Right>,
}
impl Bean for Left {}
impl Component for Left {
    fn describe(shape: &mut Shape<Self>) {
        shape.scope(Scope::Prototype);
        shape.inject("right", |l| &l.right).id("right");
    }
}

#[derive(Default)]
struct Right {
    left: Inject<Left>,
}
impl Bean for Right {}
impl Component for Right {
    fn describe(shape: &mut Shape<Self>) {
        shape.scope(Scope::Prototype);
        shape.inject("left", |r| &r.left).id("left").optional();
    }
}

// Singleton pointing at itself
#[derive(Default)]
struct Node {
    next: Inject<Node>,
}
impl Bean for Node {}
impl Component for Node {
    fn describe(shape: &mut Shape<Self>) {
        shape.inject("next", |n| &n.next).id("node");
    }
}

// Singleton pair pointing at each other
#[derive(Default)]
struct Ping {
    pong: Inject<Pong>,
}
impl Bean for Ping {}
impl Component for Ping {
    fn describe(shape: &mut Shape<Self>) {
        shape.inject("pong", |p| &p.pong).id("pong");
    }
}

#[derive(Default)]
struct Pong {
    ping: Inject<Ping>,
}
impl Bean for Pong {}
impl Component for Pong {
    fn describe(shape: &mut Shape<Self>) {
        shape.inject("ping", |p| &p.ping).id("ping");
    }
}

#[test]
fn test_prototype_cycle_is_detected() {
    let container = Container::new();
    container.register_bean::<Left>("left").unwrap();
    container.register_bean::<Right>("right").unwrap();
    container.initialize().unwrap();

    match container.get_instance_safe::<Left>("left").map(|_| ()) {
        Err(err @ DiError::Circular { .. }) => {
            assert_eq!(err.kind(), ErrorKind::Cycle);
            let DiError::Circular { bean, path } = &err else {
                unreachable!()
            };
            assert_eq!(bean, "left");
            assert_eq!(path, &["left", "right", "left"]);
            assert!(err.to_string().contains("circular dependency detected for bean: left"));
            assert!(err.to_string().contains("left -> right -> left"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_cycle_is_reported_from_either_end() {
    let container = Container::new();
    container.register_bean::<Left>("left").unwrap();
    container.register_bean::<Right>("right").unwrap();
    container.initialize().unwrap();

    assert!(matches!(
        container.get_instance_safe::<Right>("right"),
        Err(DiError::Circular { bean, .. }) if bean == "right"
    ));
}

#[test]
fn test_cycle_tolerance_allows_bounded_recurrence() {
    let config = ContainerConfig::default().cycle_tolerance(1);
    let container = Container::with_config(config);
    container.register_bean::<Left>("left").unwrap();
    container.register_bean::<Right>("right").unwrap();
    container.initialize().unwrap();

    // One recurrence is tolerated, the second is not
    match container.get_instance_safe::<Left>("left").map(|_| ()) {
        Err(DiError::Circular { path, .. }) => {
            assert_eq!(path, ["left", "right", "left", "right", "left"]);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_failed_resolution_leaves_no_stale_chain() {
    let container = Container::new();
    container.register_bean::<Left>("left").unwrap();
    container.register_bean::<Right>("right").unwrap();
    container.initialize().unwrap();

    for _ in 0..3 {
        match container.get_instance_safe::<Left>("left").map(|_| ()) {
            Err(DiError::Circular { path, .. }) => assert_eq!(path.len(), 3),
            other => panic!("unexpected: {other:?}"),
        }
    }
}

#[test]
fn test_singleton_self_reference() {
    let container = Container::new();
    container.register_bean::<Node>("node").unwrap();
    container.initialize().unwrap();

    let node = container.get_instance::<Node>("node");
    assert!(Arc::ptr_eq(node.next.get().unwrap(), &node));
}

#[test]
fn test_singletons_referencing_each_other() {
    let container = Container::new();
    container.register_bean::<Ping>("ping").unwrap();
    container.register_bean::<Pong>("pong").unwrap();
    container.initialize().unwrap();

    let ping = container.get_instance::<Ping>("ping");
    let pong = container.get_instance::<Pong>("pong");
    assert!(Arc::ptr_eq(ping.pong.get().unwrap(), &pong));
    assert!(Arc::ptr_eq(pong.ping.get().unwrap(), &ping));
}

#[test]
fn test_diamond_is_not_a_cycle() {
    #[derive(Default)]
    struct Leaf;
    impl Bean for Leaf {}
    impl Component for Leaf {
        fn describe(shape: &mut Shape<Self>) {
            shape.scope(Scope::Prototype);
        }
    }

    #[derive(Default)]
    struct Branch {
        leaf: Inject<Leaf>,
    }
    impl Bean for Branch {}
    impl Component for Branch {
        fn describe(shape: &mut Shape<Self>) {
            shape.scope(Scope::Prototype);
            shape.inject("leaf", |b| &b.leaf).id("leaf");
        }
    }

    #[derive(Default)]
    struct Root {
        first: Inject<Branch>,
        second: Inject<Branch>,
        leaf: Inject<Leaf>,
    }
    impl Bean for Root {}
    impl Component for Root {
        fn describe(shape: &mut Shape<Self>) {
            shape.scope(Scope::Prototype);
            shape.inject("first", |r| &r.first).id("branch");
            shape.inject("second", |r| &r.second).id("branch");
            shape.inject("leaf", |r| &r.leaf).id("leaf");
        }
    }

    let container = Container::new();
    container.register_bean::<Leaf>("leaf").unwrap();
    container.register_bean::<Branch>("branch").unwrap();
    container.register_bean::<Root>("root").unwrap();
    container.initialize().unwrap();

    let root = container.get_instance::<Root>("root");
    assert!(!Arc::ptr_eq(root.first.get().unwrap(), root.second.get().unwrap()));
}

#[test]
fn test_singleton_depending_on_a_prototype_cycle_fails_initialization() {
    #[derive(Default)]
    struct Holder {
        left: Inject<Left>,
    }
    impl Bean for Holder {}
    impl Component for Holder {
        fn describe(shape: &mut Shape<Self>) {
            shape.inject("left", |h| &h.left).id("left");
        }
    }

    let container = Container::new();
    container.register_bean::<Left>("left").unwrap();
    container.register_bean::<Right>("right").unwrap();
    container.register_bean::<Holder>("holder").unwrap();

    assert!(matches!(container.initialize(), Err(DiError::Circular { .. })));
}

#[test]
fn test_depth_guard() {
    #[derive(Default)]
    struct Chain {
        next: Inject<Chain>,
    }
    impl Bean for Chain {}
    impl Component for Chain {
        fn describe(shape: &mut Shape<Self>) {
            shape.scope(Scope::Prototype);
            shape.inject("next", |c| &c.next).id("chain");
        }
    }

    let config = ContainerConfig::default().cycle_tolerance(usize::MAX).max_depth(16);
    let container = Container::with_config(config);
    container.register_bean::<Chain>("chain").unwrap();
    container.initialize().unwrap();

    assert!(matches!(
        container.get_instance_safe::<Chain>("chain"),
        Err(DiError::DepthExceeded(16))
    ));
}
