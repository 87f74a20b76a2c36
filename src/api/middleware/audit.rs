//! Audit logging middleware.
//!
//! Logs every API request with user, method, path, status and latency.
//! Runs innermost (after auth has injected the session).

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::session::SessionView;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user = req
        .extensions()
        .get::<SessionView>()
        .map(|s| s.username.clone())
        .unwrap_or_else(|| "anonymous".to_string());
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        target: "scada_assist_lib::audit",
        user = %user,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "API access"
    );
    response
}
