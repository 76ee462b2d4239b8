//! Registered routes and per-route options.

use std::fmt;

use http::Method;

use crate::error::RouteError;
use crate::handler::BoxedHandler;
use crate::middleware::Middleware;
use crate::tree::{Token, tokenize};

/// An immutable method + pattern binding, created by registration.
///
/// `chain` is the handler with every group and route middleware already
/// wrapped around it.
pub struct Route {
    method: Method,
    pattern: String,
    name: String,
    named: bool,
    group: String,
    params: Vec<String>,
    pub(crate) chain: BoxedHandler,
}

impl Route {
    pub(crate) fn new(
        method: Method,
        pattern: String,
        name: Option<String>,
        group: String,
        chain: BoxedHandler,
    ) -> Result<Self, RouteError> {
        let params = tokenize(&pattern)?
            .into_iter()
            .filter_map(|t| match t {
                Token::Param(name) | Token::Wildcard(name) => Some(name.to_owned()),
                Token::Static(_) => None,
            })
            .collect();
        Ok(Self {
            named: name.is_some(),
            name: name.unwrap_or_else(|| pattern.clone()),
            method,
            pattern,
            group,
            params,
            chain,
        })
    }

    pub fn method(&self) -> &Method { &self.method }

    /// Full pattern including every group prefix, e.g. `/api/v1/users/:name`.
    pub fn pattern(&self) -> &str { &self.pattern }

    /// Explicit name if one was given, otherwise the pattern.
    pub fn name(&self) -> &str { &self.name }

    /// Whether the name came from [`RouteOptions::name`].
    pub(crate) fn is_named(&self) -> bool { self.named }

    /// Name of the group the route was registered through.
    pub fn group(&self) -> &str { &self.group }

    /// Parameter and wildcard names in pattern order.
    pub fn params(&self) -> &[String] { &self.params }

    /// Build a concrete path by substituting `args` into the pattern.
    ///
    /// ```rust
    /// # use tsu_router::{Method, Request, RouteOptions, Router};
    /// # async fn show(_: Request) -> &'static str { "" }
    /// let mut router = Router::new();
    /// let route = router.group("/users").handle(Method::GET, "/:id", show, RouteOptions::new());
    /// assert_eq!(route.url(&[("id", "42")]).unwrap(), "/users/42");
    /// ```
    pub fn url(&self, args: &[(&str, &str)]) -> Result<String, RouteError> {
        let mut url = String::with_capacity(self.pattern.len());
        for token in tokenize(&self.pattern)? {
            match token {
                Token::Static(lit) => url.push_str(lit),
                Token::Param(param) | Token::Wildcard(param) => {
                    let (_, value) = args.iter()
                        .find(|(k, _)| *k == param)
                        .ok_or_else(|| RouteError::MissingParam {
                            route: self.name.clone(),
                            param: param.to_owned(),
                        })?;
                    url.push_str(value);
                }
            }
        }
        Ok(url)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("name", &self.name)
            .field("group", &self.group)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Options for a single registration: a diagnostic name and middleware that
/// runs after every group middleware, right before the handler.
#[derive(Clone, Debug, Default)]
pub struct RouteOptions {
    pub(crate) name: Option<String>,
    pub(crate) middleware: Vec<Middleware>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the route for [`Router::url`](crate::Router::url). Has no
    /// effect on matching.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append route-level middleware.
    pub fn with(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use crate::request::Request;

    fn route(pattern: &str, name: Option<&str>) -> Route {
        async fn noop(_: Request) -> &'static str { "" }
        Route::new(
            Method::GET,
            pattern.to_owned(),
            name.map(str::to_owned),
            "/".to_owned(),
            noop.into_boxed_handler(),
        )
        .unwrap()
    }

    #[test]
    fn collects_param_names_in_order() {
        let r = route("/repos/:owner/:repo/blob/*path", None);
        assert_eq!(r.params(), ["owner", "repo", "path"]);
        assert_eq!(r.name(), "/repos/:owner/:repo/blob/*path");
    }

    #[test]
    fn builds_urls() {
        let r = route("/repos/:owner/:repo/blob/*path", Some("blob"));
        assert_eq!(
            r.url(&[("owner", "rust-lang"), ("repo", "rust"), ("path", "src/lib.rs")]),
            Ok("/repos/rust-lang/rust/blob/src/lib.rs".to_owned()),
        );
        assert_eq!(
            r.url(&[("owner", "rust-lang")]),
            Err(RouteError::MissingParam { route: "blob".into(), param: "repo".into() }),
        );
    }
}
