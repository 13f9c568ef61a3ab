use crate::body::ResponseBody;
use crate::request::RequestContext;
use crate::responder::Responder;
use async_trait::async_trait;
use http::{Response, StatusCode};
use std::future::Future;
use std::sync::Arc;

/// The terminal request handling capability a route resolves to.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: RequestContext) -> Response<ResponseBody>;
}

/// A shared, type erased [`RequestHandler`].
pub type BoxHandler = Arc<dyn RequestHandler>;

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    async fn invoke(&self, req: RequestContext) -> Response<ResponseBody> {
        self.as_ref().invoke(req).await
    }
}

/// a holder which represents any async Fn taking the request
#[derive(Debug, Clone, Copy)]
pub struct FnHandler<F> {
    f: F,
}

/// Creates a [`RequestHandler`] from an async function.
///
/// # Example
/// ```
/// use micro_mux::{handler_fn, RequestContext};
///
/// let handler = handler_fn(|req: RequestContext| async move {
///     format!("hello {}", req.param("name"))
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> RequestHandler for FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    async fn invoke(&self, req: RequestContext) -> Response<ResponseBody> {
        (self.f)(req).await.into_response()
    }
}

/// Responds with a fixed status code and its canonical reason as plain text.
#[derive(Debug, Clone, Copy)]
pub struct StatusHandler(StatusCode);

impl StatusHandler {
    pub const fn new(status: StatusCode) -> Self {
        Self(status)
    }

    /// `404 Not Found`
    pub const fn not_found() -> Self {
        Self(StatusCode::NOT_FOUND)
    }

    /// `405 Method Not Allowed`
    pub const fn method_not_allowed() -> Self {
        Self(StatusCode::METHOD_NOT_ALLOWED)
    }

    /// `204 No Content`, the default answer to automatic OPTIONS requests
    pub const fn no_content() -> Self {
        Self(StatusCode::NO_CONTENT)
    }
}

#[async_trait]
impl RequestHandler for StatusHandler {
    async fn invoke(&self, _req: RequestContext) -> Response<ResponseBody> {
        match self.0.canonical_reason() {
            Some(reason) if self.0 != StatusCode::NO_CONTENT => (self.0, reason).into_response(),
            _ => (self.0, ()).into_response(),
        }
    }
}
