//! Runtime replacement of the route table.
//!
//! A [`Router`] is built once and then only read. When routes must change while
//! serving, build a new router and swap it in: requests in flight keep the snapshot
//! they started with, new requests see the new one. Reads never take a lock.

use crate::body::ResponseBody;
use crate::handler::RequestHandler;
use crate::request::RequestContext;
use crate::router::Router;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use http::Response;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// A [`Router`] snapshot that can be replaced atomically.
pub struct SharedRouter {
    current: ArcSwap<Router>,
}

impl SharedRouter {
    /// Creates a new `SharedRouter` serving `router`.
    pub fn new(router: Router) -> Self {
        Self { current: ArcSwap::from_pointee(router) }
    }

    /// Returns the router currently serving requests.
    pub fn load(&self) -> Arc<Router> {
        self.current.load_full()
    }

    /// Installs `router` for subsequent requests.
    ///
    /// # Returns
    /// The router previously in place.
    pub fn replace(&self, router: Router) -> Arc<Router> {
        info!(routes = router.size(), "replacing route table");
        self.current.swap(Arc::new(router))
    }

    /// Dispatches the request on the current snapshot.
    pub async fn dispatch(&self, req: RequestContext) -> Response<ResponseBody> {
        let router = self.load();
        router.dispatch(req).await
    }
}

impl From<Router> for SharedRouter {
    fn from(router: Router) -> Self {
        Self::new(router)
    }
}

impl fmt::Debug for SharedRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRouter").field("current", &self.load()).finish()
    }
}

#[async_trait]
impl RequestHandler for SharedRouter {
    async fn invoke(&self, req: RequestContext) -> Response<ResponseBody> {
        self.dispatch(req).await
    }
}
