use std::time::Instant;

use tracing::info;

use super::{Middleware, from_fn};

/// One `info!` event per request: method, path, matched route, status, latency.
///
/// Register it globally with [`Router::with`](crate::Router::with) to see
/// 404s and 405s too; on a group it only sees that group's routes.
pub fn trace() -> Middleware {
    from_fn(|req, next| async move {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let route = req.route().map(|r| r.name().to_owned());

        let res = next.run(req).await;

        info!(
            %method,
            path = %path,
            route = route.as_deref().unwrap_or("-"),
            status = res.status_code().as_u16(),
            latency_us = start.elapsed().as_micros() as u64,
            "request",
        );
        res
    })
}
