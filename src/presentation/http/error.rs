use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::notes::errors::NoteError;

pub const NOT_FOUND_BODY: &str = "File not found";
pub const BAD_SIGNATURE_BODY: &str = "Error with HMAC signature";

impl IntoResponse for NoteError {
    fn into_response(self) -> Response {
        match self {
            // absent, private and unreachable notes all look the same
            NoteError::NotFound | NoteError::Unpublished | NoteError::TransientFetch(_) => {
                (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
            }
            NoteError::SignatureInvalid => {
                (StatusCode::BAD_REQUEST, BAD_SIGNATURE_BODY).into_response()
            }
            NoteError::TemplateMissing(detail) => {
                tracing::error!(%detail, "template_missing");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
