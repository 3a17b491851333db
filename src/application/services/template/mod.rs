use std::path::Path;

use crate::domain::notes::errors::NoteError;
use crate::domain::notes::note::NoteName;

pub const CONTENT_PLACEHOLDER: &str = "${content}";
pub const TITLE_PLACEHOLDER: &str = "${title}";
pub const BUILD_PLACEHOLDER: &str = "${build}";
pub const BACKLINKS_PLACEHOLDER: &str = "{{backlinks}}";
const BACKLINKS_ENTITIES: &str = "&#123;&#123;backlinks&#125;&#125;";

/// HTML page skeleton every rendered note is injected into.
#[derive(Debug, Clone)]
pub struct PageTemplate {
    source: String,
    build: String,
}

impl PageTemplate {
    pub fn new(source: impl Into<String>, build: impl Into<String>) -> Result<Self, NoteError> {
        let source = source.into();
        if !source.contains(CONTENT_PLACEHOLDER) {
            return Err(NoteError::TemplateMissing(format!(
                "template has no {CONTENT_PLACEHOLDER} placeholder"
            )));
        }
        Ok(Self {
            source,
            build: build.into(),
        })
    }

    pub async fn load(path: &Path, build: impl Into<String>) -> Result<Self, NoteError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| NoteError::TemplateMissing(format!("{}: {e}", path.display())))?;
        Self::new(source, build)
    }

    pub fn fill(&self, title: &str, content: &str) -> String {
        // content goes last so note text can never be mistaken for a placeholder
        let title = htmlescape::encode_minimal(title);
        self.source
            .replace(TITLE_PLACEHOLDER, &inert_backlinks(&title))
            .replace(BUILD_PLACEHOLDER, &htmlescape::encode_minimal(&self.build))
            .replace(CONTENT_PLACEHOLDER, &inert_backlinks(content))
    }
}

// note text spelling out the backlinks slot renders the same but is never spliced
fn inert_backlinks(html: &str) -> String {
    html.replace(BACKLINKS_PLACEHOLDER, BACKLINKS_ENTITIES)
}

/// The "referenced by" section of a note page. Empty when nothing links here.
pub fn backlinks_html(sources: &[NoteName]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let mut buf = String::from("<hr/>This page is referenced by<ul>");
    for source in sources {
        buf.push('\n');
        buf.push_str(&format!(
            "<li><a href=\"/{}\">{}</a></li>",
            urlencoding::encode(source.as_str()),
            htmlescape::encode_minimal(&source.display_name())
        ));
    }
    buf.push_str("</ul>");
    buf
}

pub fn splice_backlinks(page: &str, backlinks: &str) -> String {
    page.replace(BACKLINKS_PLACEHOLDER, backlinks)
}
