use crate::application::linkgraph::BacklinkIndex;
use crate::application::services::render_cache::RenderCache;
use crate::application::services::template::{backlinks_html, splice_backlinks};
use crate::domain::notes::errors::NoteError;
use crate::domain::notes::note::NoteName;

/// Serves a note page from the render cache, with the backlink section
/// spliced in at request time. Never touches the note store.
pub struct GetNotePage<'a> {
    pub cache: &'a RenderCache,
    pub backlinks: &'a BacklinkIndex,
}

impl<'a> GetNotePage<'a> {
    pub fn execute(&self, name: &NoteName) -> Result<String, NoteError> {
        let note = self.cache.get(name).ok_or(NoteError::NotFound)?;
        let sources = self.backlinks.backlinks(name);
        Ok(splice_backlinks(&note.html, &backlinks_html(&sources)))
    }
}
