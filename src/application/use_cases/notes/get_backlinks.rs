use crate::application::linkgraph::BacklinkIndex;
use crate::application::services::render_cache::RenderCache;
use crate::domain::notes::errors::NoteError;
use crate::domain::notes::note::NoteName;

pub struct GetBacklinks<'a> {
    pub cache: &'a RenderCache,
    pub backlinks: &'a BacklinkIndex,
}

impl<'a> GetBacklinks<'a> {
    /// Sources referencing a published note. Unknown notes are `NotFound`,
    /// so this cannot be used to probe for private names.
    pub fn execute(&self, name: &NoteName) -> Result<Vec<NoteName>, NoteError> {
        if self.cache.get(name).is_none() {
            return Err(NoteError::NotFound);
        }
        Ok(self.backlinks.backlinks(name))
    }
}
