//! Middleware: functions that wrap one handler into another.
//!
//! A [`Middleware`] is applied once, at registration time, to produce the
//! route's chain. Nothing is re-derived per request. For a route registered
//! through nested groups the chain runs
//!
//! ```text
//! global → outer group → … → inner group → route → handler
//! ```
//!
//! and a middleware that returns without calling [`Next::run`] stops the
//! chain there; the handler never runs.
//!
//! ```rust
//! use tsu_router::{Response, StatusCode};
//! use tsu_router::middleware::{self, Middleware};
//!
//! let require_token: Middleware = middleware::from_fn(|req, next| async move {
//!     if req.header("authorization").is_none() {
//!         return Response::status(StatusCode::UNAUTHORIZED);
//!     }
//!     next.run(req).await
//! });
//! ```

mod trace;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, Link};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

pub use trace::trace;

/// A reusable handler transformer. Cheap to clone; one value can be shared
/// by any number of groups and routes.
#[derive(Clone)]
pub struct Middleware {
    wrap: Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync>,
}

impl Middleware {
    pub(crate) fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        (self.wrap)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware")
    }
}

/// Compose `middleware` around `handler`; the first element ends up outermost.
pub(crate) fn compose<'a>(
    middleware: impl DoubleEndedIterator<Item = &'a Middleware>,
    handler: BoxedHandler,
) -> BoxedHandler {
    middleware.rev().fold(handler, |next, mw| mw.wrap(next))
}

/// The rest of the chain, as seen from inside a middleware.
pub struct Next {
    handler: BoxedHandler,
}

impl Next {
    /// Run the remaining middleware and the handler.
    pub async fn run(self, req: Request) -> Response {
        self.handler.call(req).await
    }
}

/// Build a [`Middleware`] from an async function of the request and the
/// rest of the chain.
pub fn from_fn<F, Fut, R>(f: F) -> Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    let f = Arc::new(f);
    Middleware {
        wrap: Arc::new(move |next: BoxedHandler| -> BoxedHandler {
            Arc::new(FromFn { f: Arc::clone(&f), next })
        }),
    }
}

struct FromFn<F> {
    f: Arc<F>,
    next: BoxedHandler,
}

impl<F, Fut, R> Link for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.f)(req, Next { handler: Arc::clone(&self.next) });
        Box::pin(async move { fut.await.into_response() })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::handler::Handler;

    fn request() -> Request {
        http::Request::builder().uri("/").body(Bytes::new()).unwrap().into()
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Middleware {
        let log = Arc::clone(log);
        from_fn(move |req, next| {
            log.lock().unwrap().push(name);
            async move { next.run(req).await }
        })
    }

    #[tokio::test]
    async fn first_middleware_runs_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = [recorder(&log, "a"), recorder(&log, "b"), recorder(&log, "c")];

        let handler = {
            let log = Arc::clone(&log);
            move |_req: Request| {
                log.lock().unwrap().push("handler");
                async { "done" }
            }
        };
        let composed = compose(chain.iter(), handler.into_boxed_handler());

        let res = composed.call(request()).await;
        assert_eq!(res.body().as_ref(), b"done");
        assert_eq!(*log.lock().unwrap(), ["a", "b", "c", "handler"]);
    }

    #[tokio::test]
    async fn short_circuit_skips_the_rest() {
        let reached = Arc::new(Mutex::new(false));
        let deny = from_fn(|_req, _next| async { StatusCode::FORBIDDEN });

        let handler = {
            let reached = Arc::clone(&reached);
            move |_req: Request| {
                *reached.lock().unwrap() = true;
                async { "secret" }
            }
        };
        let composed = compose([deny].iter(), handler.into_boxed_handler());

        let res = composed.call(request()).await;
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
        assert!(!*reached.lock().unwrap());
    }
}
