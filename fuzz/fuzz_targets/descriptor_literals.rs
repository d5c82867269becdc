#![no_main]

use ferrous_ioc::{Bean, Component, Container, DiError, Inject, Scope, Shape};
use libfuzzer_sys::fuzz_target;
use std::cell::RefCell;

thread_local! {
    static LITERALS: RefCell<(String, String)> = RefCell::new(Default::default());
}

#[derive(Default)]
struct Literal {
    dep: Inject<String>,
}
impl Bean for Literal {}
impl Component for Literal {
    fn describe(shape: &mut Shape<Self>) {
        LITERALS.with(|literals| {
            let literals = literals.borrow();
            shape.scope_name(&literals.0);
            shape.inject("dep", |l| &l.dep).id("dep").optional_flag(&literals.1);
        });
    }
}

fuzz_target!(|data: (String, String)| {
    let (scope, optional) = data;
    let parsed: Result<Scope, _> = scope.parse();
    LITERALS.with(|literals| *literals.borrow_mut() = (scope.clone(), optional.clone()));

    let container = Container::new();
    match container.register_bean::<Literal>("literal") {
        Ok(_) => {
            assert_eq!(container.bean_scopes()["literal"], parsed.unwrap());
            assert_eq!(container.descriptors()[0].injections.len(), 1);
        }
        Err(DiError::UnsupportedScope(literal)) => {
            assert!(parsed.is_err());
            assert_eq!(literal, scope);
        }
        Err(DiError::InvalidOptional { value, .. }) => assert_eq!(value, optional),
        Err(other) => panic!("unexpected registration error: {other}"),
    }
});
