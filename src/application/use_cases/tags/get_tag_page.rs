use crate::application::services::markdown::render_page;
use crate::application::services::tagging::TagIndex;
use crate::application::services::template::{PageTemplate, splice_backlinks};

/// Synthesized listing of every note carrying a tag.
pub struct GetTagPage<'a> {
    pub tags: &'a TagIndex,
    pub template: &'a PageTemplate,
}

impl<'a> GetTagPage<'a> {
    /// `tag` is given without the leading `#`. Unknown tags yield an empty list.
    pub fn execute(&self, tag: &str) -> String {
        let tag = format!("#{}", tag.trim_start_matches('#'));
        let mut entries: Vec<(String, String)> = self
            .tags
            .list(&tag)
            .into_iter()
            .map(|name| (name.display_name(), name.as_str().to_string()))
            .collect();
        entries.sort_by_key(|(display, _)| display.to_lowercase());

        let mut markdown = format!("# Articles tagged {tag}\n\n");
        for (display, target) in &entries {
            markdown.push_str(&format!(
                "- <a href=\"/{}\">{}</a>\n",
                urlencoding::encode(target),
                htmlescape::encode_minimal(display)
            ));
        }
        splice_backlinks(
            &render_page(&markdown, tag.trim_start_matches('#'), self.template),
            "",
        )
    }
}
