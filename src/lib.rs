//! # tsu-router
//!
//! Request routing for HTTP services: a radix tree per method, nested route
//! groups, and middleware chains composed once at startup.
//!
//! ## Patterns
//!
//! | Syntax | Matches | Example |
//! |---|---|---|
//! | literal | itself | `/users/new` |
//! | `:name` | one non-empty segment | `/users/:id` → `id=42` |
//! | `*name` | the rest of the path, slashes included | `/files/*rest` → `rest=a/b/c` |
//!
//! When several patterns could match, static beats param beats wildcard at
//! every branch, and a static branch that dead-ends further down falls back
//! to the param or wildcard beside it.
//!
//! ## Groups and middleware
//!
//! ```rust,no_run
//! use tsu_router::{Method, Request, Response, RouteOptions, Router, Server, middleware};
//!
//! #[tokio::main]
//! async fn main() {
//!     let auth = middleware::from_fn(|req, next| async move {
//!         match req.header("authorization") {
//!             Some(_) => next.run(req).await,
//!             None => Response::status(tsu_router::StatusCode::UNAUTHORIZED),
//!         }
//!     });
//!
//!     let mut app = Router::new().with(middleware::trace());
//!     {
//!         let mut api = app.group("/api");
//!         let mut v1 = api.group("/v1").with(auth);
//!         v1.get("/users/:name", show_user);
//!         v1.handle(Method::POST, "/users", create_user, RouteOptions::new().name("create-user"));
//!     }
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn show_user(req: Request) -> String {
//!     format!("user: {}", req.param("name").unwrap_or_default())
//! }
//!
//! async fn create_user(_req: Request) -> Response {
//!     Response::status(tsu_router::StatusCode::CREATED)
//! }
//! ```
//!
//! The chain for `GET /api/v1/users/ferris` is `trace → auth → show_user`.
//!
//! ## Fail fast
//!
//! A malformed prefix, an ambiguous pattern (`/users/:id` next to
//! `/users/:name`), a misplaced wildcard or a duplicate route is a bug, so
//! the registration methods panic at startup. Every one has a `try_*` twin
//! that returns [`RouteError`] instead.

mod error;
mod group;
mod handler;
mod params;
mod path;
mod request;
mod response;
mod route;
mod router;
mod server;
mod tree;

pub mod middleware;

pub use error::{Error, RouteError};
pub use group::RouteGroup;
pub use handler::{BoxFuture, Handler};
pub use http::{Method, StatusCode};
pub use params::Params;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use route::{Route, RouteOptions};
pub use router::{Lookup, Router};
pub use server::Server;
