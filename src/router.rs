//! The router: one radix tree per HTTP method, plus dispatch.
//!
//! Build it once at startup, by value (`Router::new().get(..)`) or through
//! [`RouteGroup`]s, then share it behind an `Arc`. Lookups are pure reads,
//! so any number of requests can be dispatched concurrently; per-request
//! parameter bindings are allocated fresh for every call.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::debug;

use crate::error::RouteError;
use crate::group::RouteGroup;
use crate::handler::{BoxFuture, BoxedHandler, Handler, Link};
use crate::middleware::{self, Middleware};
use crate::params::Params;
use crate::path;
use crate::request::Request;
use crate::response::Response;
use crate::route::{Route, RouteOptions};
use crate::tree::{InsertError, Tree};

/// Outcome of matching a method and path. None of these is an error.
#[derive(Debug)]
pub enum Lookup {
    Found { route: Arc<Route>, params: Params },
    /// The path is registered, but not for this method. Lists the methods
    /// it *is* registered for, sorted.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// The application router.
pub struct Router {
    trees: HashMap<Method, Tree<Arc<Route>>>,
    names: HashMap<String, Arc<Route>>,
    routes: Vec<Arc<Route>>,
    middleware: Vec<Middleware>,
    /// Global middleware composed around [`Endpoint`].
    entry: BoxedHandler,
    not_found: BoxedHandler,
    method_not_allowed: BoxedHandler,
    options: BoxedHandler,
    handle_method_not_allowed: bool,
    handle_options: bool,
}

impl Router {
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            names: HashMap::new(),
            routes: Vec::new(),
            middleware: Vec::new(),
            entry: Arc::new(Endpoint),
            not_found: default_not_found.into_boxed_handler(),
            method_not_allowed: default_method_not_allowed.into_boxed_handler(),
            options: default_options.into_boxed_handler(),
            handle_method_not_allowed: true,
            handle_options: true,
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    /// Append global middleware. It runs before any group or route
    /// middleware, and also wraps the not-found and not-allowed fallbacks.
    pub fn with(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self.entry = middleware::compose(self.middleware.iter(), Arc::new(Endpoint));
        self
    }

    /// Replace the `404 Not Found` fallback.
    pub fn not_found(mut self, handler: impl Handler) -> Self {
        self.not_found = handler.into_boxed_handler();
        self
    }

    /// Replace the `405 Method Not Allowed` fallback.
    /// [`Request::allowed_methods`] lists what the path does accept.
    pub fn method_not_allowed(mut self, handler: impl Handler) -> Self {
        self.method_not_allowed = handler.into_boxed_handler();
        self
    }

    /// When off, a path registered only under other methods is a plain 404.
    /// On by default.
    pub fn handle_method_not_allowed(mut self, enabled: bool) -> Self {
        self.handle_method_not_allowed = enabled;
        self
    }

    /// When on, `OPTIONS` on a path without its own `OPTIONS` route answers
    /// `204` with an `Allow` header. On by default.
    pub fn handle_options(mut self, enabled: bool) -> Self {
        self.handle_options = enabled;
        self
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// ```rust
    /// # use tsu_router::{Method, Request, Router};
    /// # async fn show(_: Request) -> &'static str { "" }
    /// # async fn create(_: Request) -> &'static str { "" }
    /// let router = Router::new()
    ///     .on(Method::GET,  "/users/:id", show)
    ///     .on(Method::POST, "/users",     create);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics on any [`RouteError`].
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.root().handle(method, path, handler, RouteOptions::new());
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// The root group, prefix `/`.
    pub fn root(&mut self) -> RouteGroup<'_> {
        RouteGroup::new(self, "/")
    }

    /// A top-level group.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` does not start with `/`.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup::new(self, prefix)
    }

    pub fn try_group(&mut self, prefix: &str) -> Result<RouteGroup<'_>, RouteError> {
        RouteGroup::try_new(self, prefix)
    }

    pub(crate) fn insert(&mut self, route: Route) -> Result<Arc<Route>, RouteError> {
        self.check(&route)?;
        self.commit(route)
    }

    /// Register every route or none of them.
    pub(crate) fn insert_all(&mut self, routes: Vec<Route>) -> Result<Vec<Arc<Route>>, RouteError> {
        for (i, route) in routes.iter().enumerate() {
            self.check(route)?;
            let repeated = routes[..i].iter()
                .any(|r| r.method() == route.method() && r.pattern() == route.pattern());
            if repeated {
                return Err(RouteError::Duplicate {
                    method: route.method().clone(),
                    pattern: route.pattern().to_owned(),
                });
            }
        }
        routes.into_iter().map(|route| self.commit(route)).collect()
    }

    /// Everything that can refuse `route`, with no side effects.
    fn check(&self, route: &Route) -> Result<(), RouteError> {
        // patterns are not names: only an explicit name can clash
        if route.is_named() {
            if let Some(existing) = self.names.get(route.name()) {
                if existing.pattern() != route.pattern() {
                    return Err(RouteError::DuplicateName {
                        name: route.name().to_owned(),
                        existing: existing.pattern().to_owned(),
                    });
                }
            }
        }

        match self.trees.get(route.method()) {
            Some(tree) => tree.check(route.pattern()).map_err(|e| insert_error(route, e)),
            None => Ok(()),
        }
    }

    fn commit(&mut self, route: Route) -> Result<Arc<Route>, RouteError> {
        let route = Arc::new(route);
        self.trees
            .entry(route.method().clone())
            .or_default()
            .insert(route.pattern(), Arc::clone(&route))
            .map_err(|e| insert_error(&route, e))?;

        if route.is_named() {
            if let Entry::Vacant(slot) = self.names.entry(route.name().to_owned()) {
                slot.insert(Arc::clone(&route));
            }
        }
        self.routes.push(Arc::clone(&route));

        debug!(
            method = %route.method(),
            pattern = route.pattern(),
            name = route.name(),
            group = route.group(),
            "route registered",
        );
        Ok(route)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Match `method` and `path` without running anything.
    ///
    /// Duplicate slashes in `path` are collapsed first. When the method's
    /// own tree has no match, every other method's tree is asked so the
    /// caller can tell "wrong method" from "no such path".
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup {
        let path = path::clean(path);

        if let Some(m) = self.trees.get(method).and_then(|tree| tree.at(&path)) {
            return Lookup::Found { route: Arc::clone(m.value), params: m.params };
        }

        let mut allowed: Vec<Method> = self.trees.iter()
            .filter(|(m, tree)| *m != method && tree.at(&path).is_some())
            .map(|(m, _)| m.clone())
            .collect();
        if allowed.is_empty() {
            return Lookup::NotFound;
        }
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Lookup::MethodNotAllowed(allowed)
    }

    /// Route `req` and run the resulting chain: global middleware, then the
    /// matched route's precomposed chain or the appropriate fallback.
    pub fn handle(&self, mut req: Request) -> BoxFuture {
        let endpoint = match self.lookup(req.method(), req.path()) {
            Lookup::Found { route, params } => {
                req.params = params;
                let chain = Arc::clone(&route.chain);
                req.route = Some(route);
                chain
            }
            Lookup::MethodNotAllowed(mut allowed) => {
                if self.handle_options && req.method() == Method::OPTIONS {
                    allowed.push(Method::OPTIONS);
                    allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                    req.allowed = allowed;
                    Arc::clone(&self.options)
                } else if self.handle_method_not_allowed {
                    req.allowed = allowed;
                    Arc::clone(&self.method_not_allowed)
                } else {
                    Arc::clone(&self.not_found)
                }
            }
            Lookup::NotFound => Arc::clone(&self.not_found),
        };

        req.endpoint = Some(endpoint);
        self.entry.call(req)
    }

    /// Build a path for the route registered under `name`.
    ///
    /// Routes without an explicit name are found by their pattern. An
    /// explicit name wins over a pattern that happens to spell the same.
    pub fn url(&self, name: &str, args: &[(&str, &str)]) -> Result<String, RouteError> {
        self.route(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_owned()))?
            .url(args)
    }

    pub fn route(&self, name: &str) -> Option<&Route> {
        self.names.get(name)
            .or_else(|| self.routes.iter().find(|r| r.pattern() == name))
            .map(Arc::as_ref)
    }

    /// Every registered route, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(Arc::as_ref)
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

// ── Dispatch internals ────────────────────────────────────────────────────────

/// Innermost link of the global chain: runs whatever the router picked.
struct Endpoint;

impl Link for Endpoint {
    fn call(&self, mut req: Request) -> BoxFuture {
        match req.endpoint.take() {
            Some(handler) => handler.call(req),
            None => Box::pin(async { Response::status(StatusCode::INTERNAL_SERVER_ERROR) }),
        }
    }
}

fn insert_error(route: &Route, e: InsertError) -> RouteError {
    match e {
        InsertError::Invalid(e) => e,
        InsertError::Conflict { existing, new } => RouteError::ConflictingParam {
            pattern: route.pattern().to_owned(),
            existing,
            new,
        },
        InsertError::Duplicate => RouteError::Duplicate {
            method: route.method().clone(),
            pattern: route.pattern().to_owned(),
        },
    }
}

async fn default_not_found(_req: Request) -> Response {
    Response::status(StatusCode::NOT_FOUND)
}

async fn default_method_not_allowed(req: Request) -> Response {
    with_allow(StatusCode::METHOD_NOT_ALLOWED, req.allowed_methods())
}

async fn default_options(req: Request) -> Response {
    with_allow(StatusCode::NO_CONTENT, req.allowed_methods())
}

fn with_allow(status: StatusCode, methods: &[Method]) -> Response {
    let allow = methods.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    Response::builder()
        .status(status)
        .header("allow", &allow)
        .no_body()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;

    async fn noop(_: Request) -> &'static str { "" }

    async fn echo_params(req: Request) -> String {
        req.params().iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
    }

    fn request(method: Method, uri: &str) -> Request {
        http::Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap().into()
    }

    fn found(lookup: Lookup) -> (String, Params) {
        match lookup {
            Lookup::Found { route, params } => (route.pattern().to_owned(), params),
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn static_route_wins_over_param() {
        let router = Router::new()
            .get("/users/new", noop)
            .get("/users/:id", noop);

        let (pattern, params) = found(router.lookup(&Method::GET, "/users/new"));
        assert_eq!(pattern, "/users/new");
        assert!(params.is_empty());

        let (pattern, params) = found(router.lookup(&Method::GET, "/users/42"));
        assert_eq!(pattern, "/users/:id");
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn wildcard_captures_rest_of_path() {
        let router = Router::new().get("/files/*rest", noop);
        let (_, params) = found(router.lookup(&Method::GET, "/files/a/b/c"));
        assert_eq!(params.get("rest"), Some("a/b/c"));
    }

    #[test]
    fn wrong_method_is_not_the_same_as_not_found() {
        let router = Router::new()
            .get("/ping", noop)
            .delete("/ping", noop);

        match router.lookup(&Method::POST, "/ping") {
            Lookup::MethodNotAllowed(allowed) => assert_eq!(allowed, [Method::DELETE, Method::GET]),
            other => panic!("expected method-not-allowed, got {other:?}"),
        }
        assert!(matches!(router.lookup(&Method::POST, "/pong"), Lookup::NotFound));
    }

    #[test]
    fn duplicate_slashes_in_request_are_collapsed() {
        let router = Router::new().get("/a/b", noop);
        found(router.lookup(&Method::GET, "//a///b"));
    }

    #[test]
    fn ambiguous_params_fail_at_registration() {
        let mut router = Router::new().get("/users/:id", noop);
        let err = router.root()
            .try_handle(Method::GET, "/users/:name", noop, RouteOptions::new())
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::ConflictingParam {
                pattern: "/users/:name".into(),
                existing: "id".into(),
                new: "name".into(),
            },
        );
        // other methods have their own trees
        router.root().handle(Method::POST, "/users/:name", noop, RouteOptions::new());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_route_panics() {
        let _ = Router::new().get("/ping", noop).get("/ping", noop);
    }

    #[test]
    #[should_panic(expected = "final segment")]
    fn misplaced_wildcard_panics() {
        let _ = Router::new().get("/files/*rest/meta", noop);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut router = Router::new();
        let mut root = router.root();
        root.handle(Method::GET, "/a", noop, RouteOptions::new().name("x"));
        let err = root.try_handle(Method::GET, "/b", noop, RouteOptions::new().name("x")).unwrap_err();
        assert_eq!(err, RouteError::DuplicateName { name: "x".into(), existing: "/a".into() });
        // a failed registration leaves the tree untouched
        assert!(matches!(router.lookup(&Method::GET, "/b"), Lookup::NotFound));
    }

    #[test]
    fn explicit_name_does_not_block_an_unnamed_route() {
        let mut router = Router::new();
        let mut root = router.root();
        root.handle(Method::GET, "/a", noop, RouteOptions::new().name("/b"));
        root.try_handle(Method::GET, "/b", noop, RouteOptions::new()).unwrap();

        found(router.lookup(&Method::GET, "/b"));
        assert_eq!(router.url("/b", &[]).unwrap(), "/a");
        assert_eq!(router.route("/a").map(Route::pattern), Some("/a"));
    }

    #[test]
    fn refused_param_conflict_changes_nothing() {
        let mut router = Router::new().get("/users/:id", noop);
        router.root()
            .try_handle(Method::GET, "/users/:name/keys", noop, RouteOptions::new())
            .unwrap_err();
        assert!(matches!(router.lookup(&Method::GET, "/users/1/keys"), Lookup::NotFound));
        assert_eq!(router.routes().count(), 1);
    }

    #[test]
    fn reverse_lookup() {
        let mut router = Router::new().get("/health", noop);
        router.group("/users").handle(Method::GET, "/:id", noop, RouteOptions::new().name("user"));

        assert_eq!(router.url("user", &[("id", "7")]).unwrap(), "/users/7");
        assert_eq!(router.url("/health", &[]).unwrap(), "/health");
        assert_eq!(router.url("nope", &[]), Err(RouteError::UnknownRoute("nope".into())));
        assert_eq!(router.routes().count(), 2);
    }

    #[tokio::test]
    async fn dispatch_binds_params() {
        let router = Router::new().get("/repos/:owner/:repo", echo_params);
        let res = router.handle(request(Method::GET, "/repos/rust-lang/rust")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"owner=rust-lang&repo=rust");
    }

    #[tokio::test]
    async fn dispatch_exposes_the_matched_route() {
        let router = Router::new().get("/users/:id", |req: Request| async move {
            req.route().map(|r| r.pattern().to_owned()).unwrap_or_default()
        });
        let res = router.handle(request(Method::GET, "/users/1")).await;
        assert_eq!(res.body().as_ref(), b"/users/:id");
    }

    #[tokio::test]
    async fn not_allowed_sets_allow_header() {
        let router = Router::new().get("/ping", noop).put("/ping", noop);
        let res = router.handle(request(Method::POST, "/ping")).await;
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.header("allow"), Some("GET, PUT"));
    }

    #[tokio::test]
    async fn not_allowed_can_be_disabled() {
        let router = Router::new().get("/ping", noop).handle_method_not_allowed(false);
        let res = router.handle(request(Method::POST, "/ping")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn automatic_options() {
        let router = Router::new().get("/ping", noop).post("/ping", noop);
        let res = router.handle(request(Method::OPTIONS, "/ping")).await;
        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert_eq!(res.header("allow"), Some("GET, OPTIONS, POST"));

        let router = Router::new().get("/ping", noop).handle_options(false);
        let res = router.handle(request(Method::OPTIONS, "/ping")).await;
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn explicit_options_route_wins() {
        let router = Router::new()
            .get("/ping", noop)
            .on(Method::OPTIONS, "/ping", |_req: Request| async { "custom" });
        let res = router.handle(request(Method::OPTIONS, "/ping")).await;
        assert_eq!(res.body().as_ref(), b"custom");
    }

    #[tokio::test]
    async fn custom_fallbacks() {
        let router = Router::new()
            .get("/ping", noop)
            .not_found(|_req: Request| async { (StatusCode::NOT_FOUND, "nothing here") })
            .method_not_allowed(|req: Request| async move {
                format!("try {}", req.allowed_methods()[0])
            });

        let res = router.handle(request(Method::GET, "/missing")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.body().as_ref(), b"nothing here");

        let res = router.handle(request(Method::POST, "/ping")).await;
        assert_eq!(res.body().as_ref(), b"try GET");
    }

    #[tokio::test]
    async fn global_middleware_wraps_fallbacks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = {
            let seen = Arc::clone(&seen);
            Router::new()
                .with(middleware::from_fn(move |req, next| {
                    seen.lock().unwrap().push(req.path().to_owned());
                    next.run(req)
                }))
                .get("/ping", noop)
        };

        router.handle(request(Method::GET, "/ping")).await;
        router.handle(request(Method::GET, "/missing")).await;
        assert_eq!(*seen.lock().unwrap(), ["/ping", "/missing"]);
    }

    #[tokio::test]
    async fn handler_failure_propagates_untouched() {
        let router = Router::new().get("/fail", |_req: Request| async {
            Err::<&'static str, _>(StatusCode::SERVICE_UNAVAILABLE)
        });
        let res = router.handle(request(Method::GET, "/fail")).await;
        assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn concurrent_dispatch_gets_independent_bindings() {
        let router = Arc::new(Router::new().get("/items/:id", echo_params));
        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let router = Arc::clone(&router);
                tokio::spawn(async move {
                    let res = router.handle(request(Method::GET, &format!("/items/{i}"))).await;
                    (i, res.body().clone())
                })
            })
            .collect();
        for task in tasks {
            let (i, body) = task.await.unwrap();
            assert_eq!(body, format!("id={i}"));
        }
    }
}
