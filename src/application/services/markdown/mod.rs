use std::collections::BTreeSet;

use crate::application::linkgraph;
use crate::application::services::tagging;
use crate::application::services::template::PageTemplate;
use crate::domain::notes::note::{NoteName, RenderedNote};

/// Title used when a note has no usable first line.
pub const DEFAULT_TITLE: &str = "Notes";

/// Output of the pure render pipeline, before page-template injection.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFragment {
    pub html: String,
    pub title: String,
    pub tags: BTreeSet<String>,
    pub outbound_links: BTreeSet<NoteName>,
}

fn anchor_prefix(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 1);
    let mut dash = false;
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    if !out.ends_with('-') {
        out.push('-');
    }
    out
}

fn title_of(text: &str) -> String {
    let first = text.lines().next().unwrap_or("").trim();
    // only an ATX heading marker is dropped; a leading tag stays part of the title
    let marker = first.trim_start_matches('#');
    let is_heading = marker.len() < first.len()
        && (marker.is_empty() || marker.starts_with(char::is_whitespace));
    let title = if is_heading { marker.trim() } else { first };
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title.to_string()
    }
}

fn to_html(markdown: &str, anchors: &str) -> String {
    let mut c_opts = comrak::ComrakOptions::default();
    c_opts.parse.smart = false;
    c_opts.extension.table = true;
    c_opts.extension.autolink = true;
    c_opts.extension.strikethrough = true;
    c_opts.extension.tasklist = true;
    c_opts.extension.header_ids = Some(anchors.to_string());
    c_opts.render.github_pre_lang = true;
    // tag links arrive as inline html; ammonia cleans up afterwards
    c_opts.render.unsafe_ = true;

    let html = comrak::markdown_to_html(markdown, &c_opts);

    let mut builder = ammonia::Builder::default();
    builder.add_generic_attributes(["class", "id", "title", "aria-hidden"]);
    builder.add_tags(["input"]);
    builder.add_tag_attributes("input", ["type", "checked", "disabled"]);
    builder.url_relative(ammonia::UrlRelative::PassThrough);
    builder.clean(&html).to_string()
}

/// Runs the order-sensitive pipeline on markdown text:
/// tags are collected, linked in place, wiki references become links, then
/// the result is converted to sanitized html.
pub(crate) fn render_text(text: &str, anchors: &str) -> RenderedFragment {
    let tags = tagging::extract_tags(text);
    let outbound_links = linkgraph::parse_links(text);
    let tagged = tagging::link_tags(text);
    let linked = linkgraph::link_wiki_references(&tagged);
    RenderedFragment {
        html: to_html(&linked, anchors),
        title: title_of(text),
        tags,
        outbound_links,
    }
}

/// Pure transformation of raw note bytes. `name` only seeds heading anchors.
pub fn render_fragment(name: &NoteName, raw: &[u8]) -> RenderedFragment {
    let text = String::from_utf8_lossy(raw);
    render_text(&text, &anchor_prefix(name.stem()))
}

/// Full render including page-template injection: the value the render
/// cache serves.
pub fn render_note(name: &NoteName, raw: &[u8], template: &PageTemplate) -> RenderedNote {
    let fragment = render_fragment(name, raw);
    RenderedNote {
        name: name.clone(),
        html: template.fill(&fragment.title, &fragment.html),
        title: fragment.title,
        tags: fragment.tags,
        outbound_links: fragment.outbound_links,
        rendered_at: chrono::Utc::now(),
    }
}

/// Renders synthesized markdown (tag listings) through the same pipeline and
/// template; no publish gate applies.
pub fn render_page(markdown: &str, anchors: &str, template: &PageTemplate) -> String {
    let fragment = render_text(markdown, &anchor_prefix(anchors));
    template.fill(&fragment.title, &fragment.html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> NoteName {
        NoteName::parse(s).unwrap()
    }

    const NOTE: &[u8] = b"# My Note\n\nHello #public #rust world.\n\nSee [[2020 About]] and [[Other]].\n";

    #[test]
    fn rendering_is_deterministic() {
        let a = render_fragment(&name("n"), NOTE);
        let b = render_fragment(&name("n"), NOTE);
        assert_eq!(a, b);
    }

    #[test]
    fn extracts_title_tags_and_links() {
        let f = render_fragment(&name("n"), NOTE);
        assert_eq!(f.title, "My Note");
        let tags: Vec<&str> = f.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["#public", "#rust"]);
        let links: Vec<&str> = f.outbound_links.iter().map(|n| n.as_str()).collect();
        assert_eq!(links, vec!["2020 About.md", "Other.md"]);
    }

    #[test]
    fn html_contains_tag_and_note_links() {
        let f = render_fragment(&name("n"), NOTE);
        assert!(f.html.contains("href=\"/tag/rust\""), "{}", f.html);
        assert!(f.html.contains("class=\"tag\""), "{}", f.html);
        assert!(f.html.contains("href=\"/2020%20About.md\""), "{}", f.html);
        assert!(f.html.contains(">About</a>"), "{}", f.html);
        assert!(f.html.contains(">Other</a>"), "{}", f.html);
        assert!(!f.html.contains("[["), "{}", f.html);
    }

    #[test]
    fn empty_note_gets_default_title_and_no_tags() {
        let f = render_fragment(&name("empty"), b"");
        assert_eq!(f.title, DEFAULT_TITLE);
        assert!(f.tags.is_empty());
        assert!(f.outbound_links.is_empty());
    }

    #[test]
    fn title_keeps_a_leading_tag() {
        assert_eq!(render_fragment(&name("n"), b"#public\nbody").title, "#public");
        assert_eq!(render_fragment(&name("n"), b"  ## Deep  \nbody").title, "Deep");
        assert_eq!(render_fragment(&name("n"), b"###\nbody").title, DEFAULT_TITLE);
    }

    #[test]
    fn scripts_are_stripped() {
        let f = render_fragment(&name("x"), b"hi <script>alert(1)</script>");
        assert!(!f.html.contains("<script>"), "{}", f.html);
    }

    #[test]
    fn render_note_injects_template() {
        let template = PageTemplate::new("<title>${title}</title>${content}", "dev").unwrap();
        let note = render_note(&name("n"), NOTE, &template);
        assert!(note.html.starts_with("<title>My Note</title>"));
        assert_eq!(note.name, name("n"));
    }

    #[test]
    fn anchor_prefix_is_slugged() {
        assert_eq!(anchor_prefix("2020 About Me"), "2020-about-me-");
        assert_eq!(anchor_prefix("#rust"), "rust-");
    }
}
