//! Nested route groups with layered middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/api/v1/users/42
//!   curl -i -H 'authorization: x' http://localhost:3000/api/v1/users/42
//!   curl -i -X DELETE http://localhost:3000/api/v1/users/42     # 405 + Allow
//!   curl -i -X OPTIONS http://localhost:3000/api/v1/users/42    # 204 + Allow
//!   curl -i http://localhost:3000/static/css/site.css

use tsu_router::{Method, Request, Response, RouteOptions, Router, Server, StatusCode, middleware};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let require_auth = middleware::from_fn(|req, next| async move {
        if req.header("authorization").is_none() {
            return Response::status(StatusCode::UNAUTHORIZED);
        }
        next.run(req).await
    });

    let mut app = Router::new().with(middleware::trace());
    {
        let mut root = app.root();
        root.get("/static/*path", serve_static);

        let mut api = root.group("/api");
        let mut v1 = api.group("/v1").named("v1").with(require_auth);
        v1.handle(Method::GET, "/users/:id", get_user, RouteOptions::new().name("user"));
        v1.get("/users/new", new_user_form)
            .post("/users", create_user);
    }

    if let Ok(url) = app.url("user", &[("id", "42")]) {
        tracing::info!(%url, "example user url");
    }

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

async fn new_user_form(_req: Request) -> &'static str {
    "static route wins over /users/:id"
}

async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }
    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/api/v1/users/99")
        .json(br#"{"id":"99"}"#.to_vec())
}

async fn serve_static(req: Request) -> String {
    format!("would serve {}", req.param("path").unwrap_or_default())
}
