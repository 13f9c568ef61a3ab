use super::{Router, Routes};
use crate::error::RouteError;
use crate::handler::{BoxHandler, RequestHandler};
use crate::middleware::{Middleware, middleware};
use crate::trie::segment::normalize_pattern;
use std::fmt;
use std::sync::Arc;
use tower_layer::Layer;
use tracing::error;

/// A path prefix and a middleware list shared by the routes registered through it.
///
/// Registering `/login` on the group `/v1/auth` is the same as registering
/// `/v1/auth/login` on the router with the group middleware attached first.
/// Group middleware only applies to routes registered after it was added.
pub struct RouteGroup<'r> {
    router: &'r mut Router,
    prefix: String,
    middlewares: Vec<Middleware>,
}

impl Router {
    /// Opens a route group under `prefix`.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup { router: self, prefix: normalize_pattern(prefix), middlewares: vec![] }
    }
}

impl RouteGroup<'_> {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Adds a middleware for the routes registered through this group from now on.
    pub fn with<L>(&mut self, layer: L) -> &mut Self
    where
        L: Layer<BoxHandler, Service = BoxHandler> + Send + Sync + 'static,
    {
        self.middlewares.push(middleware(layer));
        self
    }

    /// Opens a nested group, inheriting this group's prefix and middleware.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup {
            router: &mut *self.router,
            prefix: normalize_pattern(&join(&self.prefix, prefix)),
            middlewares: self.middlewares.clone(),
        }
    }

    /// Registers a route relative to the group prefix.
    ///
    /// # Errors
    /// See [`Router::try_handle`].
    pub fn try_handle<H>(&mut self, pattern: &str, handler: H, methods: &[&str]) -> Result<Routes<'_>, RouteError>
    where
        H: RequestHandler + 'static,
    {
        let pattern = join(&self.prefix, pattern);
        let routes = self.router.insert(&pattern, Arc::new(handler), methods)?;
        Ok(self.middlewares.iter().fold(routes, Routes::with_middleware))
    }

    /// # Panics
    /// Panics on any [`RouteError`].
    pub fn handle<H>(&mut self, pattern: &str, handler: H, methods: &[&str]) -> Routes<'_>
    where
        H: RequestHandler + 'static,
    {
        let prefix = self.prefix.clone();
        match self.try_handle(pattern, handler, methods) {
            Ok(routes) => routes,
            Err(e) => {
                error!(cause = %e, prefix = %prefix, pattern, "route registration failed");
                panic!("{e}")
            }
        }
    }

    all_method_routes!();
}

fn join(prefix: &str, pattern: &str) -> String {
    format!("{prefix}/{pattern}")
}

impl fmt::Debug for RouteGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroup")
            .field("prefix", &self.prefix)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}
