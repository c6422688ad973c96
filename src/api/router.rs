//! Medicine API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//!
//! Layer stack (outermost → innermost):
//! 1. CORS (answers pre-flight before anything else)
//! 2. `Cache-Control: no-store`
//! 3. Extension(ApiContext)
//! 4. Per-method: Auth validator → Audit logger → Handler
//!
//! Auth is attached with `route_layer`, so a wrong method on a known path
//! gets 405 from the fallback without needing credentials.

use axum::http::{header, HeaderValue};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the medicine API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as an outer layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn medicine_api_router(ctx: ApiContext) -> Router {
    let add_medicine = post(endpoints::medicines::add)
        .route_layer(from_fn(middleware::audit::log_access))
        .route_layer(from_fn(middleware::auth::require_auth))
        .fallback(endpoints::medicines::allow_post);

    let get_medicines = get(endpoints::medicines::list)
        .route_layer(from_fn(middleware::audit::log_access))
        .route_layer(from_fn(middleware::auth::require_auth))
        .fallback(endpoints::medicines::allow_get);

    Router::new()
        .route("/addMedicine", add_medicine)
        .route("/getMedicines", get_medicines)
        .route("/health", get(endpoints::health::check))
        .with_state(ctx.clone())
        .layer(axum::Extension(ctx))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
}
