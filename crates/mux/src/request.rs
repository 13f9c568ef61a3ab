//! The request as seen by handlers and middleware.
//!
//! The transport hands the router an [`http::request::Parts`] plus the request body;
//! the router adds the [`PathParams`] bound by the matched route before invoking
//! the handler chain.

use crate::params::PathParams;
use bytes::Bytes;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Request, Uri, Version};

/// Represents the context of an HTTP request, providing access to the request
/// header, the request body and the path parameters extracted from the URL.
#[derive(Debug)]
pub struct RequestContext {
    header: Parts,
    body: Bytes,
    path_params: PathParams,
}

impl RequestContext {
    /// Creates a new RequestContext with empty path parameters
    pub fn new(header: Parts, body: Bytes) -> Self {
        Self { header, body, path_params: PathParams::empty() }
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.header.method
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        &self.header.uri
    }

    /// Returns the path of the request URI
    pub fn path(&self) -> &str {
        self.header.uri.path()
    }

    /// Returns the HTTP version of the request
    pub fn version(&self) -> Version {
        self.header.version
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        &self.header.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.header.headers
    }

    /// Typed request scoped values
    pub fn extensions(&self) -> &Extensions {
        &self.header.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.header.extensions
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns a reference to the path parameters extracted from the request URL
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub fn path_params_mut(&mut self) -> &mut PathParams {
        &mut self.path_params
    }

    /// Shortcut of [`PathParams::param`], empty for unknown names
    pub fn param(&self, name: impl AsRef<str>) -> &str {
        self.path_params.param(name)
    }

    pub(crate) fn set_path_params(&mut self, path_params: PathParams) {
        self.path_params = path_params;
    }

    pub fn into_parts(self) -> (Parts, Bytes) {
        (self.header, self.body)
    }
}

impl From<Request<Bytes>> for RequestContext {
    fn from(request: Request<Bytes>) -> Self {
        let (header, body) = request.into_parts();
        Self::new(header, body)
    }
}
