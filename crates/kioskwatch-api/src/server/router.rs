//! Application router configuration.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use kioskwatch_core::ServerConfig;

use super::AppState;
use crate::auth::api_key_middleware;
use crate::handlers::{
    get_status_handler, health_handler, list_status_handler, method_not_allowed_handler,
    not_found_handler, preflight_handler, report_handler,
};

/// Permissive CORS for browser dashboards.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
            header::AUTHORIZATION,
        ])
}

/// Create the application router.
///
/// Report routes sit behind the API key middleware; `/api/*` aliases serve
/// dashboards mounted under a prefix.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let report = || {
        post(report_handler)
            .options(preflight_handler)
            .fallback(method_not_allowed_handler)
    };
    let list = || {
        get(list_status_handler)
            .options(preflight_handler)
            .fallback(method_not_allowed_handler)
    };
    let one = || {
        get(get_status_handler)
            .options(preflight_handler)
            .fallback(method_not_allowed_handler)
    };

    let report_routes = Router::new()
        .route("/report", report())
        .route("/api/report", report())
        .route_layer(axum::middleware::from_fn_with_state(
            state.auth.clone(),
            api_key_middleware,
        ));

    let query_routes = Router::new()
        .route("/status", list())
        .route("/api/status", list())
        .route("/status/:id", one())
        .route("/api/status/:id", one())
        .route(
            "/health",
            get(health_handler).fallback(method_not_allowed_handler),
        )
        .route(
            "/api/health",
            get(health_handler).fallback(method_not_allowed_handler),
        );

    let router = report_routes
        .merge(query_routes)
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes));

    let router = if config.cors {
        router.layer(cors_layer())
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
