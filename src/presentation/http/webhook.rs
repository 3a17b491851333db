use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::application::use_cases::sync::NudgeOutcome;
use crate::bootstrap::app_context::AppContext;
use crate::domain::notes::errors::NoteError;
use crate::infrastructure::crypto::verify_signature;

pub const SIGNATURE_HEADER: &str = "X-Dropbox-Signature";

#[derive(Debug, Deserialize)]
pub struct Challenge {
    pub challenge: Option<String>,
}

/// Registration handshake: echoes the token back and nothing else.
pub async fn answer_challenge(Query(q): Query<Challenge>) -> Response {
    let mut resp = q.challenge.unwrap_or_default().into_response();
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    resp
}

/// Change notification. The body is only authenticated, never interpreted:
/// the delta listing decides what changed.
pub async fn notify(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, NoteError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(&body, signature, &ctx.cfg.dropbox_app_secret) {
        tracing::warn!(bytes = body.len(), "webhook_signature_rejected");
        return Err(NoteError::SignatureInvalid);
    }
    match ctx.sync_engine().nudge() {
        NudgeOutcome::Started(_) => tracing::info!("webhook_resync_started"),
        NudgeOutcome::Deferred => tracing::info!("webhook_resync_deferred"),
    }
    Ok(StatusCode::OK)
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/dropbox/webhook", get(answer_challenge).post(notify))
        .with_state(ctx)
}
