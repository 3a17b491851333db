use axum::{Json, Router, routing::get};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::health::health,
        crate::presentation::http::tags::list_tags,
        crate::presentation::http::notes::get_backlinks,
    ),
    components(schemas(
        crate::presentation::http::health::HealthResp,
        crate::presentation::http::tags::TagItem,
        crate::presentation::http::notes::BacklinkItem,
        crate::presentation::http::notes::BacklinksResponse,
    )),
    tags(
        (name = "Notes", description = "Published notes"),
        (name = "Tags", description = "Tag index"),
        (name = "Health", description = "System health checks")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn routes() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}
