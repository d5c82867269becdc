#![cfg(feature = "axum-integration")]
/// Axum integration tests: one request scope per HTTP request
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use ferrous_ioc::axum_integration::{RequestBeans, RequestScopeLayer};
use ferrous_ioc::{Bean, BoxError, Closeable, Component, Container, Context, Inject, Scope, Shape};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

#[derive(Default)]
struct Tracker {
    opened: AtomicUsize,
    closed: AtomicUsize,
}
impl Bean for Tracker {}
impl Component for Tracker {}

#[derive(Default)]
struct RequestInfo {
    tracker: Inject<Tracker>,
    number: AtomicUsize,
}

impl Closeable for RequestInfo {
    fn close(&self) -> Result<(), BoxError> {
        self.tracker.get().unwrap().closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Bean for RequestInfo {
    fn as_closeable(&self) -> Option<&dyn Closeable> {
        Some(self)
    }
}

impl Component for RequestInfo {
    fn describe(shape: &mut Shape<Self>) {
        shape.scope(Scope::Request);
        shape.inject("tracker", |r| &r.tracker).id("tracker");
    }
}

#[derive(Default)]
struct Leaky;
impl Closeable for Leaky {
    fn close(&self) -> Result<(), BoxError> {
        Err("connection reset".into())
    }
}
impl Bean for Leaky {
    fn as_closeable(&self) -> Option<&dyn Closeable> {
        Some(self)
    }
}
impl Component for Leaky {
    fn describe(shape: &mut Shape<Self>) {
        shape.scope(Scope::Request);
    }
}

async fn handler(beans: RequestBeans) -> String {
    let info = beans.bean::<RequestInfo>("info").unwrap();
    let tracker = info.tracker.get().unwrap();
    let number = tracker.opened.fetch_add(1, Ordering::SeqCst) + 1;
    info.number.store(number, Ordering::SeqCst);
    format!("request {number}")
}

fn app(container: &Container) -> Router {
    Router::new()
        .route("/", get(handler))
        .layer(RequestScopeLayer::new(container.clone()))
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn container() -> Container {
    let container = Container::new();
    container.register_bean::<Tracker>("tracker").unwrap();
    container.register_bean::<RequestInfo>("info").unwrap();
    container.initialize().unwrap();
    container
}

#[tokio::test]
async fn test_request_beans_live_for_one_request() {
    let container = container();
    let tracker = container.get_instance::<Tracker>("tracker");

    for expected in ["request 1", "request 2"] {
        let response = app(&container)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, expected);
    }
    assert_eq!(tracker.closed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_extractor_without_layer_is_rejected() {
    let app = Router::new().route("/", get(handler));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_close_failure_turns_into_server_error() {
    let container = Container::new();
    container.register_bean::<Leaky>("leaky").unwrap();
    container.initialize().unwrap();

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .layer(RequestScopeLayer::new(container));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("connection reset"));
}

#[tokio::test]
async fn test_uninitialized_container_turns_into_server_error() {
    let container = Container::new();
    container.register_bean::<Leaky>("leaky").unwrap();

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .layer(RequestScopeLayer::new(container));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_parent_context_is_shared_by_requests() {
    let container = container();
    let parent = Context::background();
    let app = Router::new()
        .route(
            "/",
            get(|beans: RequestBeans| async move { beans.context().is_done().to_string() }),
        )
        .layer(RequestScopeLayer::with_parent(container, parent.clone()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "false");

    parent.cancel();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "true");
}
