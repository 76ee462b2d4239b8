//! Handlers and the links of a dispatch chain.
//!
//! A route's chain is a stack of [`Link`]s: middleware links on the outside,
//! one `Terminal` link at the bottom that runs the user's handler. Each
//! link holds the next one as a [`BoxedHandler`], so a whole precomposed
//! chain is a single value stored in the tree.
//!
//! ```text
//! async fn show(req: Request) -> Response { … }      ← user writes this
//!        ↓ group.get("/users/:id", show)
//! Arc<Terminal(show)>                                ← bottom link
//!        ↓ middleware.wrap(next), innermost first
//! Arc<FromFn { f: auth, next: Arc<Terminal(show)> }> ← route chain
//!        ↓ router: req.endpoint = chain
//! global links → Endpoint → route chain               ← per request
//! ```
//!
//! Per request the cost is one `Arc` clone plus one virtual call per link.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// One step of a chain: take the request, produce the response future,
/// usually by calling the link below.
#[doc(hidden)]
pub trait Link {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A link (and everything below it) shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn Link + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// Satisfied automatically by any function or closure shaped like
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// Failure is signalled through the return value: a handler returning
/// `Result<T, E>` with both sides [`IntoResponse`] has its `Err` rendered
/// like any other response. The router never inspects either side.
///
/// Sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(Terminal(self))
    }
}

/// Bottom of every route chain: the handler itself, its output rendered
/// through [`IntoResponse`].
struct Terminal<F>(F);

impl<F, Fut, R> Link for Terminal<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
