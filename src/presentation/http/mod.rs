pub mod admin;
pub mod error;
pub mod health;
pub mod notes;
pub mod openapi;
pub mod tags;
pub mod webhook;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::bootstrap::app_context::AppContext;
use crate::bootstrap::config::DEFAULT_BUILD;

pub const VERSION_HEADER: &str = "x-version";

/// Every route of the service. Request tracing is layered on by the binary.
pub fn router(ctx: AppContext) -> Router {
    let version = HeaderValue::from_str(&ctx.cfg.build)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_BUILD));
    let api = Router::new()
        .merge(health::routes(ctx.clone()))
        .merge(tags::api_routes(ctx.clone()))
        .merge(notes::api_routes(ctx.clone()))
        .merge(openapi::routes());

    Router::new()
        .nest("/api", api)
        .merge(webhook::routes(ctx.clone()))
        .merge(admin::routes(ctx.clone()))
        .merge(tags::routes(ctx.clone()))
        .nest_service("/static", ServeDir::new(&ctx.cfg.static_dir))
        .merge(notes::routes(ctx))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(VERSION_HEADER),
            version,
        ))
}
