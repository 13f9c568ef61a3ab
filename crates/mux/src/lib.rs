//! A trie based HTTP request router.
//!
//! Route patterns are `/` separated segments compiled into a prefix tree keyed
//! first by HTTP method:
//!
//! - `users` matches the exact text
//! - `:id` binds any segment to the parameter `id`
//! - `:id|^[0-9]+$` binds segments matching the regex after `|`
//! - `:filepath` as last segment binds the rest of the path, used for static files
//!
//! Requests are resolved by [`Router::dispatch`], which binds the path parameters
//! into the [`RequestContext`] and runs the matched handler inside its middleware
//! chain: global middleware outermost, then group middleware, then route middleware.
//!
//! ```
//! use micro_mux::middleware::{from_fn, Next};
//! use micro_mux::{handler_fn, RequestContext, Router};
//!
//! let mut router = Router::builder().handle_method_not_allowed(true).build();
//!
//! router.with(from_fn(|req: RequestContext, next: Next| async move {
//!     tracing::info!(path = req.path(), "request");
//!     next.run(req).await
//! }));
//!
//! router.get("/", handler_fn(|_req: RequestContext| async { "index" }));
//! router.get("/hello/:name", handler_fn(|req: RequestContext| async move {
//!     format!("hello {}", req.param("name"))
//! }));
//! router.static_files("/static", "./assets");
//! ```
//!
//! The transport is not part of this crate: any server able to produce an
//! [`http::Request<Bytes>`](http::Request) can call [`Router::call`].

mod body;
mod config;
mod error;
mod handler;
mod params;
mod request;
mod responder;
mod router;
mod shared;

pub mod middleware;
pub mod trie;

pub use body::ResponseBody;
pub use config::RouterConfig;
pub use error::RouteError;
pub use handler::BoxHandler;
pub use handler::FnHandler;
pub use handler::RequestHandler;
pub use handler::StatusHandler;
pub use handler::handler_fn;
pub use middleware::Middleware;
pub use params::PathParams;
pub use request::RequestContext;
pub use responder::Responder;
pub use router::{FileServer, RouteGroup, Router, RouterBuilder, Routes, StreamingFileServer};
pub use shared::SharedRouter;
pub use trie::Trie;
pub use trie::segment::CATCH_ALL_PARAM;
