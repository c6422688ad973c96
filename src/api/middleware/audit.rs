//! Audit logging middleware.
//!
//! Logs every authenticated request with user id, method, path, and
//! response status. Runs innermost (after auth has injected CallerContext).

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::CallerContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user = req
        .extensions()
        .get::<CallerContext>()
        .map(|c| c.user_id.clone())
        .unwrap_or_else(|| "anonymous".into());

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        %user,
        "API access"
    );

    response
}
