//! Axum integration for request-scoped beans.
//!
//! [`RequestScopeLayer`] opens a [`RequestScope`] for every HTTP request and
//! finishes it once the response is ready, so request-scoped beans live exactly
//! as long as the request. Handlers reach them through the [`RequestBeans`]
//! extractor.
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use ferrous_ioc::axum_integration::{RequestBeans, RequestScopeLayer};
//! use ferrous_ioc::Container;
//!
//! async fn handler(beans: RequestBeans) -> String {
//!     beans
//!         .bean::<String>("request_id")
//!         .map(|id| id.to_string())
//!         .unwrap_or_default()
//! }
//!
//! # fn build(container: Container) -> Router {
//! Router::new()
//!     .route("/", get(handler))
//!     .layer(RequestScopeLayer::new(container))
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::container::Container;
use crate::context::Context;
use crate::error::DiError;
use crate::request::RequestScope;

/// Tower layer opening a request scope per request.
#[derive(Clone, Debug)]
pub struct RequestScopeLayer {
    container: Container,
    parent: Context,
}

impl RequestScopeLayer {
    /// Layer whose request contexts derive from a fresh background context.
    pub fn new(container: Container) -> Self {
        Self::with_parent(container, Context::background())
    }

    /// Layer whose request contexts derive from `parent`; cancelling it ends
    /// every in-flight request scope.
    pub fn with_parent(container: Container, parent: Context) -> Self {
        Self { container, parent }
    }
}

impl<S> tower::Layer<S> for RequestScopeLayer {
    type Service = RequestScopeService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestScopeService {
            inner,
            container: self.container.clone(),
            parent: self.parent.clone(),
        }
    }
}

/// Service produced by [`RequestScopeLayer`].
#[derive(Clone, Debug)]
pub struct RequestScopeService<S> {
    inner: S,
    container: Container,
    parent: Context,
}

impl<S, B> tower::Service<Request<B>> for RequestScopeService<S>
where
    S: tower::Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        // Take the service that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let container = self.container.clone();
        let parent = self.parent.clone();

        Box::pin(async move {
            let scope = match RequestScope::begin(&container, &parent) {
                Ok(scope) => scope,
                Err(err) => return Ok(failure("failed to open request scope", &err)),
            };
            req.extensions_mut().insert(RequestBeans {
                context: scope.context().clone(),
            });

            let response = inner.call(req).await?;
            match scope.finish() {
                Ok(()) => Ok(response),
                Err(err) => Ok(failure("failed to close request scope", &err)),
            }
        })
    }
}

fn failure(message: &'static str, err: &DiError) -> Response {
    tracing::error!(error = %err, "{message}");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}

/// Extractor exposing the request-scoped beans of the current request.
#[derive(Clone, Debug)]
pub struct RequestBeans {
    context: Context,
}

impl RequestBeans {
    /// The request-scoped bean registered as `id`, viewed as `T`.
    pub fn bean<T: ?Sized + 'static>(&self, id: &str) -> Option<Arc<T>> {
        self.context.bean::<T>(id)
    }

    /// The request's lifetime context.
    pub fn context(&self) -> &Context {
        &self.context
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestBeans
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestBeans>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "request scope not found in extensions; add RequestScopeLayer to the router",
        ))
    }
}
