//! Request-scoped context handed down the middleware chain.

use std::sync::Arc;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};

use crate::handler::BoxedHandler;
use crate::params::Params;
use crate::route::Route;

/// An incoming request plus everything routing learned about it.
///
/// Passed by value through each middleware into the handler, so bindings
/// and extensions set upstream are visible downstream.
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    extensions: Extensions,
    pub(crate) params: Params,
    pub(crate) route: Option<Arc<Route>>,
    pub(crate) allowed: Vec<Method>,
    /// The chain picked by the router, run once global middleware is through.
    pub(crate) endpoint: Option<BoxedHandler>,
}

impl Request {
    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            extensions: parts.extensions,
            params: Params::new(),
            route: None,
            allowed: Vec::new(),
            endpoint: None,
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn query(&self) -> Option<&str> { self.uri.query() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }
    pub fn params(&self) -> &Params { &self.params }

    /// Case-insensitive header lookup. Non-UTF-8 values read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// The matched route, or `None` inside a not-found / not-allowed fallback.
    pub fn route(&self) -> Option<&Route> {
        self.route.as_deref()
    }

    /// Methods registered for this path when the request's own method is not.
    /// Empty unless the router is answering 405 or an automatic `OPTIONS`.
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed
    }

    /// Typed request-scoped storage for passing data between middleware.
    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_from_http_request() {
        let req: Request = http::Request::builder()
            .method(Method::POST)
            .uri("/users?page=2")
            .header("Content-Type", "application/json")
            .body(Bytes::from_static(b"{}"))
            .unwrap()
            .into();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/users");
        assert_eq!(req.query(), Some("page=2"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body().as_ref(), b"{}");
        assert!(req.params().is_empty());
        assert!(req.route().is_none());
    }
}
