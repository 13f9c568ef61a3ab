//! Middleware wraps a handler to produce another handler.
//!
//! Any [`tower_layer::Layer`] turning a [`BoxHandler`] into a [`BoxHandler`] is a
//! middleware. For the common case of running code around the inner handler,
//! [`from_fn`] adapts an async function receiving the request and a [`Next`]:
//!
//! ```
//! use micro_mux::middleware::{from_fn, Next};
//! use micro_mux::RequestContext;
//!
//! let log = from_fn(|req: RequestContext, next: Next| async move {
//!     let path = req.path().to_owned();
//!     let response = next.run(req).await;
//!     println!("{path} -> {}", response.status());
//!     response
//! });
//! # let _ = log;
//! ```
//!
//! Chains are assembled per dispatch from the global, group and route lists, in
//! that order, with the first middleware of the chain executing outermost.

use crate::body::ResponseBody;
use crate::handler::{BoxHandler, RequestHandler};
use crate::request::RequestContext;
use crate::responder::Responder;
use async_trait::async_trait;
use http::Response;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tower_layer::Layer;

/// A shared, type erased middleware.
pub type Middleware = Arc<dyn Layer<BoxHandler, Service = BoxHandler> + Send + Sync>;

/// Erases a layer into a [`Middleware`].
pub fn middleware<L>(layer: L) -> Middleware
where
    L: Layer<BoxHandler, Service = BoxHandler> + Send + Sync + 'static,
{
    Arc::new(layer)
}

/// Wraps `handler` with `layers`, the first layer ending up outermost.
pub(crate) fn compose<'m>(handler: BoxHandler, layers: impl DoubleEndedIterator<Item = &'m Middleware>) -> BoxHandler {
    layers.rev().fold(handler, |inner, layer| layer.layer(inner))
}

/// The rest of the chain, handed to a [`from_fn`] middleware.
#[derive(Clone)]
pub struct Next {
    inner: BoxHandler,
}

impl Next {
    /// Invokes the wrapped handler.
    pub async fn run(&self, req: RequestContext) -> Response<ResponseBody> {
        self.inner.invoke(req).await
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

/// Creates a middleware from an async function of the request and the [`Next`] handler.
pub fn from_fn<F, Fut>(f: F) -> FromFnLayer<F>
where
    F: Fn(RequestContext, Next) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    FromFnLayer { f: Arc::new(f) }
}

/// The layer built by [`from_fn`].
pub struct FromFnLayer<F> {
    f: Arc<F>,
}

impl<F> fmt::Debug for FromFnLayer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FromFnLayer")
    }
}

impl<F> Clone for FromFnLayer<F> {
    fn clone(&self) -> Self {
        Self { f: Arc::clone(&self.f) }
    }
}

impl<F, Fut> Layer<BoxHandler> for FromFnLayer<F>
where
    F: Fn(RequestContext, Next) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    type Service = BoxHandler;

    fn layer(&self, inner: BoxHandler) -> Self::Service {
        Arc::new(FromFn { f: Arc::clone(&self.f), next: Next { inner } })
    }
}

struct FromFn<F> {
    f: Arc<F>,
    next: Next,
}

#[async_trait]
impl<F, Fut> RequestHandler for FromFn<F>
where
    F: Fn(RequestContext, Next) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    async fn invoke(&self, req: RequestContext) -> Response<ResponseBody> {
        (self.f)(req, self.next.clone()).await.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{Middleware, Next, compose, from_fn, middleware};
    use crate::handler::{BoxHandler, RequestHandler, handler_fn};
    use crate::request::RequestContext;
    use bytes::Bytes;
    use http::{HeaderValue, Request, StatusCode};
    use std::sync::{Arc, Mutex};

    type Trace = Arc<Mutex<Vec<String>>>;

    fn tracing_middleware(name: &'static str, trace: &Trace) -> Middleware {
        let trace = Arc::clone(trace);
        middleware(from_fn(move |req: RequestContext, next: Next| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().unwrap().push(format!("{name} before"));
                let response = next.run(req).await;
                trace.lock().unwrap().push(format!("{name} after"));
                response
            }
        }))
    }

    fn request() -> RequestContext {
        Request::builder().uri("/").body(Bytes::new()).unwrap().into()
    }

    #[tokio::test]
    async fn test_first_layer_is_outermost() {
        let trace: Trace = Arc::default();
        let handler_trace = Arc::clone(&trace);
        let handler: BoxHandler = Arc::new(handler_fn(move |_req: RequestContext| {
            let trace = Arc::clone(&handler_trace);
            async move {
                trace.lock().unwrap().push("handler".to_owned());
                "ok"
            }
        }));

        let layers = vec![tracing_middleware("global", &trace), tracing_middleware("route", &trace)];
        let chain = compose(handler, layers.iter());

        let response = chain.invoke(request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["global before", "route before", "handler", "route after", "global after"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit() {
        let handler: BoxHandler = Arc::new(handler_fn(|_req: RequestContext| async { "secret" }));
        let deny = middleware(from_fn(|_req: RequestContext, _next: Next| async { (StatusCode::UNAUTHORIZED, ()) }));

        let response = compose(handler, [deny].iter()).invoke(request()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_layer_fn() {
        struct Tagged(BoxHandler);

        #[async_trait::async_trait]
        impl RequestHandler for Tagged {
            async fn invoke(&self, req: RequestContext) -> http::Response<crate::ResponseBody> {
                let mut response = self.0.invoke(req).await;
                response.headers_mut().insert("x-tagged", HeaderValue::from_static("1"));
                response
            }
        }

        let handler: BoxHandler = Arc::new(handler_fn(|_req: RequestContext| async { "ok" }));
        let tag = middleware(tower_layer::layer_fn(|inner: BoxHandler| -> BoxHandler { Arc::new(Tagged(inner)) }));

        let response = compose(handler, [tag].iter()).invoke(request()).await;
        assert_eq!(response.headers()["x-tagged"], "1");
    }
}
