//! Route groups: a shared prefix plus a shared middleware stack.
//!
//! A group borrows its [`Router`] mutably and writes routes straight into
//! the router's trees. A child group reborrows that same router from its
//! parent and starts from a snapshot of the parent's composed prefix and
//! middleware, so it can never outlive the parent and never owns it.
//!
//! ```rust
//! use tsu_router::{Method, Request, RouteOptions, Router, middleware};
//!
//! # async fn show_user(_: Request) -> &'static str { "" }
//! # let auth = middleware::from_fn(|req, next| next.run(req));
//! let mut router = Router::new();
//! let mut api = router.group("/api");
//! let mut v1 = api.group("/v1").with(auth);
//! v1.handle(Method::GET, "/users/:name", show_user, RouteOptions::new().name("user"));
//! assert_eq!(router.url("user", &[("name", "ferris")]).unwrap(), "/api/v1/users/ferris");
//! ```

use std::sync::Arc;

use http::Method;

use crate::error::RouteError;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{self, Middleware};
use crate::path;
use crate::route::{Route, RouteOptions};
use crate::router::Router;

pub struct RouteGroup<'r> {
    router: &'r mut Router,
    prefix: String,
    name: String,
    middleware: Vec<Middleware>,
}

impl<'r> RouteGroup<'r> {
    /// A top-level group on `router`.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` does not start with `/`. See [`try_new`](Self::try_new).
    pub fn new(router: &'r mut Router, prefix: &str) -> Self {
        Self::try_new(router, prefix).unwrap_or_else(|e| panic!("invalid route group: {e}"))
    }

    pub fn try_new(router: &'r mut Router, prefix: &str) -> Result<Self, RouteError> {
        let prefix = path::normalize_prefix(prefix)?;
        Ok(Self { router, name: prefix.clone(), prefix, middleware: Vec::new() })
    }

    /// Append group middleware. It wraps routes registered through this
    /// group, or any child group created afterwards.
    pub fn with(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Override the diagnostic name, which defaults to the composed prefix.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn prefix(&self) -> &str { &self.prefix }
    pub fn name(&self) -> &str { &self.name }

    /// A nested group: prefixes concatenate, middleware stacks extend.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` does not start with `/`.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        self.try_group(prefix).unwrap_or_else(|e| panic!("invalid route group: {e}"))
    }

    pub fn try_group(&mut self, prefix: &str) -> Result<RouteGroup<'_>, RouteError> {
        let prefix = path::join_prefix(&self.prefix, &path::normalize_prefix(prefix)?);
        Ok(RouteGroup {
            router: &mut *self.router,
            name: prefix.clone(),
            prefix,
            middleware: self.middleware.clone(),
        })
    }

    /// Register `handler` for `method` at the group prefix + `path`.
    ///
    /// # Panics
    ///
    /// Panics on any [`RouteError`]: malformed pattern, ambiguous parameter
    /// name, duplicate route or name. See [`try_handle`](Self::try_handle).
    pub fn handle(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
        options: RouteOptions,
    ) -> Arc<Route> {
        self.try_handle(method, path, handler, options)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"))
    }

    pub fn try_handle(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
        options: RouteOptions,
    ) -> Result<Arc<Route>, RouteError> {
        let pattern = path::join_route(&self.prefix, path)?;
        self.register(method, pattern, handler.into_boxed_handler(), options)
    }

    /// Register one handler under several methods at once.
    ///
    /// # Panics
    ///
    /// Panics on any [`RouteError`]. See [`try_route`](Self::try_route).
    pub fn route(
        &mut self,
        methods: &[Method],
        path: &str,
        handler: impl Handler,
        options: RouteOptions,
    ) -> Vec<Arc<Route>> {
        self.try_route(methods, path, handler, options)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"))
    }

    /// Either every method is registered or, on error, none is.
    pub fn try_route(
        &mut self,
        methods: &[Method],
        path: &str,
        handler: impl Handler,
        options: RouteOptions,
    ) -> Result<Vec<Arc<Route>>, RouteError> {
        let pattern = path::join_route(&self.prefix, path)?;
        let handler = handler.into_boxed_handler();
        let routes = methods.iter()
            .map(|m| self.build(m.clone(), pattern.clone(), Arc::clone(&handler), options.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        self.router.insert_all(routes)
    }

    pub fn get(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::GET, path, handler, RouteOptions::new());
        self
    }

    pub fn post(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::POST, path, handler, RouteOptions::new());
        self
    }

    pub fn put(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::PUT, path, handler, RouteOptions::new());
        self
    }

    pub fn patch(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::PATCH, path, handler, RouteOptions::new());
        self
    }

    pub fn delete(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::DELETE, path, handler, RouteOptions::new());
        self
    }

    pub fn head(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::HEAD, path, handler, RouteOptions::new());
        self
    }

    pub fn options(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::OPTIONS, path, handler, RouteOptions::new());
        self
    }

    fn register(
        &mut self,
        method: Method,
        pattern: String,
        handler: BoxedHandler,
        options: RouteOptions,
    ) -> Result<Arc<Route>, RouteError> {
        let route = self.build(method, pattern, handler, options)?;
        self.router.insert(route)
    }

    /// Wrap `handler` in this group's middleware, then the route's own.
    fn build(
        &self,
        method: Method,
        pattern: String,
        handler: BoxedHandler,
        options: RouteOptions,
    ) -> Result<Route, RouteError> {
        let chain = middleware::compose(
            self.middleware.iter().chain(&options.middleware),
            handler,
        );
        Route::new(method, pattern, options.name, self.name.clone(), chain)
    }
}
