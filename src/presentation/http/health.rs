use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use utoipa::ToSchema;

use crate::bootstrap::app_context::AppContext;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResp {
    pub status: &'static str,
    pub build: String,
    pub notes: usize,
    pub tags: usize,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, body = HealthResp))
)]
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResp> {
    let notes = ctx.render_cache().len();
    // an empty cache usually means the crawl has not finished yet
    let status = if notes > 0 { "ok" } else { "warming" };
    Json(HealthResp {
        status,
        build: ctx.cfg.build.clone(),
        notes,
        tags: ctx.tag_index().counts().len(),
    })
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new().route("/health", get(health)).with_state(ctx)
}
