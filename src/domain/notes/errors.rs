/// Failure taxonomy for everything that touches a single note.
///
/// `NotFound` and `Unpublished` must stay indistinguishable to clients; the
/// presentation layer maps both onto the same response.
#[derive(thiserror::Error, Debug)]
pub enum NoteError {
    #[error("note not found")]
    NotFound,
    #[error("note is not published")]
    Unpublished,
    #[error("transient failure while fetching note")]
    TransientFetch(#[source] anyhow::Error),
    #[error("webhook signature invalid")]
    SignatureInvalid,
    #[error("page template missing or unusable: {0}")]
    TemplateMissing(String),
}

impl NoteError {
    /// True for the two variants that clients must not be able to tell apart.
    pub fn is_hidden(&self) -> bool {
        matches!(self, NoteError::NotFound | NoteError::Unpublished)
    }
}
