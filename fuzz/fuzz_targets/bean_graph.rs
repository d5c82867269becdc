#![no_main]

use ferrous_ioc::{Bean, Component, Container, DiError, Inject, InjectList, Scope, Shape};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

const IDS: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Default)]
struct Single {
    next: Inject<Single>,
}
impl Bean for Single {}
impl Component for Single {
    fn describe(shape: &mut Shape<Self>) {
        shape.inject("next", |s| &s.next).id("a").optional();
    }
}

#[derive(Default)]
struct Proto {
    next: Inject<Single>,
}
impl Bean for Proto {}
impl Component for Proto {
    fn describe(shape: &mut Shape<Self>) {
        shape.scope(Scope::Prototype);
        shape.inject("next", |p| &p.next).id("b");
    }
}

#[derive(Default)]
struct Fanout {
    all: InjectList<Single>,
}
impl Bean for Fanout {}
impl Component for Fanout {
    fn describe(shape: &mut Shape<Self>) {
        shape.scope(Scope::Prototype);
        shape.inject_list("all", |f| &f.all);
    }
}

fuzz_target!(|data: &[u8]| {
    let container = Container::new();

    // Each byte registers one bean: low bits pick the id, high bits the kind
    for &byte in data.iter().take(16) {
        let id = IDS[(byte & 0b11) as usize];
        let _ = match byte >> 2 & 0b111 {
            0 => container.register_bean::<Single>(id),
            1 => container.register_bean::<Proto>(id),
            2 => container.register_bean::<Fanout>(id),
            3 => container.register_instance(id, Arc::new(byte as u64)),
            4 => container.register_factory(id, Scope::Prototype, move |_| Ok(Arc::new(byte as u64))),
            5 => container.register_factory(id, Scope::Request, |_| Ok(Arc::new(0u64))),
            _ => container.register_postprocessor::<u64, _>(|_| Ok(())).map(|_| false),
        };
    }

    if container.initialize().is_err() {
        return;
    }

    for id in IDS {
        match container.instance(id) {
            Ok(first) => {
                if container.bean_scopes()[id] == Scope::Singleton {
                    let second = container.instance(id).unwrap();
                    assert!(first.ptr_eq(&second));
                }
            }
            Err(DiError::NotInitialized | DiError::Closed | DiError::AlreadyInitialized { .. }) => {
                panic!("state error on a ready container")
            }
            Err(_) => {}
        }
    }

    container.close();
    assert!(container.bean_types().is_empty());
});
