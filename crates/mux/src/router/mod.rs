//! The route registry and request dispatch.
//!
//! A [`Router`] owns the route [`Trie`], the global middleware list and the
//! fallback handlers. Routes are registered once during setup through
//! [`Router::handle`] or a method shortcut, then [`Router::dispatch`] serves requests
//! from the shared, read-only router.
//!
//! # Example
//! ```
//! use micro_mux::{handler_fn, RequestContext, Router};
//!
//! let mut router = Router::new();
//! router.get("/users/:id|^[0-9]+$", handler_fn(|req: RequestContext| async move {
//!     format!("user {}", req.param("id"))
//! }));
//!
//! let mut v1 = router.group("/v1/auth");
//! v1.post("/login", handler_fn(|_req: RequestContext| async { "welcome" }));
//!
//! assert_eq!(router.routes(), vec![("GET", "/users/:id|^[0-9]+$"), ("POST", "/v1/auth/login")]);
//! ```

macro_rules! method_routes {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Registers a `", stringify!($method), "` route, panicking on registration errors.")]
            pub fn $name<H: RequestHandler + 'static>(&mut self, pattern: &str, handler: H) -> Routes<'_> {
                self.handle(pattern, handler, &[http::Method::$method.as_str()])
            }
        )*
    };
}

macro_rules! all_method_routes {
    () => {
        method_routes! {
            get => GET,
            post => POST,
            put => PUT,
            patch => PATCH,
            delete => DELETE,
            head => HEAD,
            options => OPTIONS,
            connect => CONNECT,
            trace => TRACE,
        }
    };
}

mod group;
mod static_files;

pub use group::RouteGroup;
pub use static_files::{FileServer, StreamingFileServer};

use crate::body::ResponseBody;
use crate::config::RouterConfig;
use crate::error::RouteError;
use crate::handler::{BoxHandler, RequestHandler, StatusHandler};
use crate::middleware::{Middleware, compose, middleware};
use crate::request::RequestContext;
use crate::trie::segment::{clean_path, normalize_pattern};
use crate::trie::{Node, Overlap, Trie};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderValue, Method, Request, Response};
use std::fmt;
use std::sync::Arc;
use tower_layer::Layer;
use tracing::{debug, error, warn};

/// The methods a route registered without an explicit method list answers to.
const ALL_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

/// What a route leaf carries: the terminal handler and the middleware attached to it.
pub(crate) struct Endpoint {
    handler: BoxHandler,
    middlewares: Vec<Middleware>,
}

impl Endpoint {
    fn new(handler: BoxHandler) -> Self {
        Self { handler, middlewares: vec![] }
    }
}

/// The main router, mapping request methods and paths to handlers.
pub struct Router {
    trie: Trie<Endpoint>,
    middlewares: Vec<Middleware>,
    not_found: BoxHandler,
    method_not_allowed: BoxHandler,
    options: BoxHandler,
    config: RouterConfig,
}

/// The leaves created by one registration call.
///
/// Middleware added through [`Routes::with`] applies to every method of the call,
/// innermost of the chain.
pub struct Routes<'r> {
    trie: &'r mut Trie<Endpoint>,
    pattern: String,
    methods: Vec<String>,
}

/// Builder for [`Router`] with its optional behaviors and fallback handlers.
pub struct RouterBuilder {
    config: RouterConfig,
    not_found: Option<BoxHandler>,
    method_not_allowed: Option<BoxHandler>,
    options: Option<BoxHandler>,
}

impl Router {
    /// Creates a router with default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub fn config(&self) -> RouterConfig {
        self.config
    }

    /// Registers `handler` for `pattern` under each of `methods`.
    ///
    /// Methods are upper-cased and deduplicated; an empty list registers all nine
    /// standard methods. The pattern is normalized first: a leading `/` is added,
    /// repeated slashes are collapsed and a trailing slash is removed.
    ///
    /// Either every method is registered or, on error, none is.
    ///
    /// # Errors
    /// Fails on an empty pattern, an invalid method, a malformed segment or when a
    /// method already has a route at the same position.
    pub fn try_handle<H>(&mut self, pattern: &str, handler: H, methods: &[&str]) -> Result<Routes<'_>, RouteError>
    where
        H: RequestHandler + 'static,
    {
        self.insert(pattern, Arc::new(handler), methods)
    }

    /// Same as [`try_handle`](Self::try_handle), but registration errors are fatal.
    ///
    /// # Panics
    /// Panics on any [`RouteError`].
    pub fn handle<H>(&mut self, pattern: &str, handler: H, methods: &[&str]) -> Routes<'_>
    where
        H: RequestHandler + 'static,
    {
        match self.try_handle(pattern, handler, methods) {
            Ok(routes) => routes,
            Err(e) => {
                error!(cause = %e, pattern, "route registration failed");
                panic!("{e}")
            }
        }
    }

    all_method_routes!();

    pub(crate) fn insert(
        &mut self,
        pattern: &str,
        handler: BoxHandler,
        methods: &[&str],
    ) -> Result<Routes<'_>, RouteError> {
        if pattern.is_empty() {
            return Err(RouteError::EmptyPattern);
        }

        let pattern = normalize_pattern(pattern);
        let methods = normalize_methods(methods)?;

        if let Some(method) = methods.iter().find(|method| self.trie.leaf_mut(method, &pattern).is_some()) {
            return Err(RouteError::conflict(method, &pattern));
        }

        for method in &methods {
            self.trie.insert(method, &pattern, Endpoint::new(Arc::clone(&handler)))?;
            debug!(method = %method, pattern = %pattern, "route registered");
        }

        Ok(Routes { trie: &mut self.trie, pattern, methods })
    }

    /// Adds a global middleware, wrapping every route as well as the fallback handlers.
    ///
    /// The first global middleware added executes outermost.
    pub fn with<L>(&mut self, layer: L) -> &mut Self
    where
        L: Layer<BoxHandler, Service = BoxHandler> + Send + Sync + 'static,
    {
        self.middlewares.push(middleware(layer));
        self
    }

    /// Number of registered routes, one per method and pattern
    pub fn size(&self) -> usize {
        self.trie.size()
    }

    /// All registered `(method, pattern)` pairs, sorted.
    pub fn routes(&self) -> Vec<(&str, &str)> {
        self.trie.routes()
    }

    /// The route trie rendered as JSON.
    ///
    /// # Errors
    /// Fails only if serialization itself fails.
    pub fn routes_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.trie)
    }

    /// Logs the route trie as JSON at debug level.
    pub fn print_routes(&self) {
        match self.routes_json() {
            Ok(json) => debug!("route trie:\n{json}"),
            Err(e) => warn!(cause = %e, "failed to render the route trie"),
        }
    }

    /// Reports routes of the same method that can match the same request path.
    ///
    /// Each overlap is also logged at warn level. Overlaps are legal: matching
    /// precedence decides which route serves such a request.
    pub fn validate(&self) -> Vec<Overlap> {
        let overlaps = self.trie.overlaps();
        for overlap in &overlaps {
            warn!(
                method = %overlap.method,
                first = %overlap.first,
                second = %overlap.second,
                kind = ?overlap.kind,
                "routes overlap, matching precedence decides which one serves"
            );
        }
        overlaps
    }

    /// Resolves the request to a route and runs it through its middleware chain.
    ///
    /// Unmatched requests are answered by the not-found handler, or by the options
    /// and method-not-allowed handlers when enabled. Fallback handlers are wrapped by
    /// the global middleware too.
    pub async fn dispatch(&self, mut req: RequestContext) -> Response<ResponseBody> {
        let path = clean_path(req.path()).into_owned();
        let method = req.method().as_str().to_owned();

        if let Some(matched) = self.trie.at(&method, &path) {
            if let Some(endpoint) = matched.value() {
                let handler =
                    compose(Arc::clone(&endpoint.handler), self.middlewares.iter().chain(endpoint.middlewares.iter()));
                req.set_path_params(matched.into_params());
                return handler.invoke(req).await;
            }
        }

        self.fallback(req, &method, &path).await
    }

    /// Dispatches a plain [`http::Request`].
    pub async fn call(&self, req: Request<Bytes>) -> Response<ResponseBody> {
        self.dispatch(req.into()).await
    }

    async fn fallback(&self, req: RequestContext, method: &str, path: &str) -> Response<ResponseBody> {
        let allowed = if self.config.handle_options || self.config.handle_method_not_allowed {
            self.trie.allowed_methods(method, path)
        } else {
            vec![]
        };

        if allowed.is_empty() {
            debug!(method, path, "no route matched");
            return self.invoke_fallback(&self.not_found, req).await;
        }

        if self.config.handle_options && method == Method::OPTIONS.as_str() {
            debug!(method, path, "answering options");
            let mut response = self.invoke_fallback(&self.options, req).await;
            set_allow(&mut response, allowed.into_iter().chain([Method::OPTIONS.as_str()]));
            return response;
        }

        if self.config.handle_method_not_allowed {
            debug!(method, path, allowed = ?allowed, "method not allowed");
            let mut response = self.invoke_fallback(&self.method_not_allowed, req).await;
            set_allow(&mut response, allowed.into_iter());
            return response;
        }

        debug!(method, path, "no route matched");
        self.invoke_fallback(&self.not_found, req).await
    }

    async fn invoke_fallback(&self, handler: &BoxHandler, req: RequestContext) -> Response<ResponseBody> {
        compose(Arc::clone(handler), self.middlewares.iter()).invoke(req).await
    }
}

/// Sets the `Allow` header unless the handler already did.
fn set_allow<'a>(response: &mut Response<ResponseBody>, methods: impl Iterator<Item = &'a str>) {
    let mut methods = methods.collect::<Vec<_>>();
    methods.sort_unstable();
    methods.dedup();

    if let Ok(value) = HeaderValue::from_str(&methods.join(", ")) {
        response.headers_mut().entry(http::header::ALLOW).or_insert(value);
    }
}

fn normalize_methods(methods: &[&str]) -> Result<Vec<String>, RouteError> {
    if methods.is_empty() {
        return Ok(ALL_METHODS.iter().map(|method| method.as_str().to_owned()).collect());
    }

    let mut normalized = Vec::with_capacity(methods.len());
    for method in methods {
        let upper = method.to_ascii_uppercase();
        if Method::from_bytes(upper.as_bytes()).is_err() {
            return Err(RouteError::invalid_method(method));
        }
        if !normalized.contains(&upper) {
            normalized.push(upper);
        }
    }
    Ok(normalized)
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes())
            .field("middlewares", &self.middlewares.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RequestHandler for Router {
    async fn invoke(&self, req: RequestContext) -> Response<ResponseBody> {
        self.dispatch(req).await
    }
}

impl Routes<'_> {
    /// Attaches a middleware to every route of this registration.
    pub fn with<L>(self, layer: L) -> Self
    where
        L: Layer<BoxHandler, Service = BoxHandler> + Send + Sync + 'static,
    {
        self.with_middleware(&middleware(layer))
    }

    pub(crate) fn with_middleware(mut self, middleware: &Middleware) -> Self {
        for method in &self.methods {
            if let Some(endpoint) = self.trie.leaf_mut(method, &self.pattern).and_then(Node::value_mut) {
                endpoint.middlewares.push(Arc::clone(middleware));
            }
        }
        self
    }

    /// The normalized pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The upper-cased methods registered
    pub fn methods(&self) -> &[String] {
        &self.methods
    }
}

impl fmt::Debug for Routes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routes").field("pattern", &self.pattern).field("methods", &self.methods).finish()
    }
}

impl RouterBuilder {
    fn new() -> Self {
        Self { config: RouterConfig::default(), not_found: None, method_not_allowed: None, options: None }
    }

    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Answer requests whose path only matches under other methods with 405 and `Allow`.
    pub fn handle_method_not_allowed(mut self, enabled: bool) -> Self {
        self.config.handle_method_not_allowed = enabled;
        self
    }

    /// Answer OPTIONS requests without an explicit route, listing the allowed methods.
    pub fn handle_options(mut self, enabled: bool) -> Self {
        self.config.handle_options = enabled;
        self
    }

    pub fn not_found<H: RequestHandler + 'static>(mut self, handler: H) -> Self {
        self.not_found = Some(Arc::new(handler));
        self
    }

    pub fn method_not_allowed<H: RequestHandler + 'static>(mut self, handler: H) -> Self {
        self.method_not_allowed = Some(Arc::new(handler));
        self
    }

    pub fn options<H: RequestHandler + 'static>(mut self, handler: H) -> Self {
        self.options = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Router {
        Router {
            trie: Trie::new(),
            middlewares: vec![],
            not_found: self.not_found.unwrap_or_else(|| Arc::new(StatusHandler::not_found())),
            method_not_allowed: self
                .method_not_allowed
                .unwrap_or_else(|| Arc::new(StatusHandler::method_not_allowed())),
            options: self.options.unwrap_or_else(|| Arc::new(StatusHandler::no_content())),
            config: self.config,
        }
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder").field("config", &self.config).finish_non_exhaustive()
    }
}
