use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::post,
};

use crate::bootstrap::app_context::AppContext;
use crate::infrastructure::crypto::tokens_match;

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Starts a bulk crawl in the background. Hidden unless `ADMIN_TOKEN` is set.
pub async fn recrawl(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    let expected = ctx.cfg.admin_token.as_deref().ok_or(StatusCode::NOT_FOUND)?;
    let given = bearer(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    if !tokens_match(given, expected) {
        tracing::warn!("admin_token_rejected");
        return Err(StatusCode::UNAUTHORIZED);
    }
    let engine = ctx.sync_engine();
    tokio::spawn(async move {
        engine.crawl().await;
    });
    tracing::info!("admin_recrawl_started");
    Ok(StatusCode::ACCEPTED)
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/admin/recrawl", post(recrawl))
        .with_state(ctx)
}
