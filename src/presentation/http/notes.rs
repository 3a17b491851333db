use axum::{
    Json, Router,
    extract::{Path, State},
    response::Html,
    routing::get,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::use_cases::notes::get_backlinks::GetBacklinks;
use crate::application::use_cases::notes::get_note::GetNotePage;
use crate::bootstrap::app_context::AppContext;
use crate::domain::notes::errors::NoteError;
use crate::domain::notes::note::NoteName;

fn note_page(ctx: &AppContext, name: &NoteName) -> Result<Html<String>, NoteError> {
    let uc = GetNotePage {
        cache: ctx.render_cache(),
        backlinks: ctx.backlink_index(),
    };
    uc.execute(name).map(Html)
}

pub async fn home(State(ctx): State<AppContext>) -> Result<Html<String>, NoteError> {
    note_page(&ctx, ctx.cfg.home_note())
}

pub async fn get_note(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> Result<Html<String>, NoteError> {
    let name = NoteName::parse(&name).ok_or(NoteError::NotFound)?;
    note_page(&ctx, &name)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BacklinkItem {
    pub name: String,
    pub title: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BacklinksResponse {
    pub note: String,
    pub backlinks: Vec<BacklinkItem>,
}

#[utoipa::path(
    get,
    path = "/api/notes/{name}/backlinks",
    tag = "Notes",
    params(("name" = String, Path, description = "Note name, with or without .md")),
    responses(
        (status = 200, body = BacklinksResponse),
        (status = 404, description = "Unknown or unpublished note")
    )
)]
pub async fn get_backlinks(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> Result<Json<BacklinksResponse>, NoteError> {
    let name = NoteName::parse(&name).ok_or(NoteError::NotFound)?;
    let uc = GetBacklinks {
        cache: ctx.render_cache(),
        backlinks: ctx.backlink_index(),
    };
    let backlinks = uc
        .execute(&name)?
        .into_iter()
        .map(|source| BacklinkItem {
            title: source.display_name(),
            name: source.as_str().to_string(),
        })
        .collect();
    Ok(Json(BacklinksResponse {
        note: name.as_str().to_string(),
        backlinks,
    }))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/:name", get(get_note))
        .with_state(ctx)
}

pub fn api_routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/notes/:name/backlinks", get(get_backlinks))
        .with_state(ctx)
}
