use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Html,
    routing::get,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::use_cases::tags::get_tag_page::GetTagPage;
use crate::application::use_cases::tags::list_tags::{ListTags, TagCount};
use crate::bootstrap::app_context::AppContext;

#[derive(Serialize, ToSchema)]
pub struct TagItem {
    pub name: String,
    pub count: usize,
}

impl From<TagCount> for TagItem {
    fn from(t: TagCount) -> Self {
        TagItem {
            name: t.name,
            count: t.count,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TagFilter {
    /// Keep tags containing this text.
    pub q: Option<String>,
}

pub async fn tag_page(State(ctx): State<AppContext>, Path(tag): Path<String>) -> Html<String> {
    let uc = GetTagPage {
        tags: ctx.tag_index(),
        template: ctx.template(),
    };
    Html(uc.execute(&tag))
}

#[utoipa::path(get, path = "/api/tags", tag = "Tags",
    params(TagFilter),
    responses((status = 200, body = [TagItem])))]
pub async fn list_tags(
    State(ctx): State<AppContext>,
    Query(filter): Query<TagFilter>,
) -> Json<Vec<TagItem>> {
    let uc = ListTags {
        tags: ctx.tag_index(),
    };
    let out: Vec<TagItem> = uc
        .execute(filter.q.as_deref())
        .into_iter()
        .map(Into::into)
        .collect();
    Json(out)
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new().route("/tag/:tag", get(tag_page)).with_state(ctx)
}

pub fn api_routes(ctx: AppContext) -> Router {
    Router::new().route("/tags", get(list_tags)).with_state(ctx)
}
