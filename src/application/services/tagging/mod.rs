use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Range;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use crate::domain::notes::note::NoteName;

// '#' followed by word characters, not glued to a word, an entity (&#39;) or a path (/#frag)
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|[^\w&/#])(#\w+)").unwrap());
// spans where a '#' belongs to a link rather than a tag
static LINK_SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[[^\[\]]*\]\]|\[[^\[\]]*\]\([^)]*\)|<a\s[^>]*>.*?</a>").unwrap()
});
// fenced blocks and inline code spans are shown verbatim
static CODE_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?ms)^[ \t]*```.*?(?:^[ \t]*```|\z)|`[^`\n]*`").unwrap());

fn tag_ranges(text: &str) -> Vec<Range<usize>> {
    let excluded: Vec<Range<usize>> = CODE_SPAN_RE
        .find_iter(text)
        .chain(LINK_SPAN_RE.find_iter(text))
        .map(|m| m.range())
        .collect();
    TAG_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .filter(|m| !excluded.iter().any(|r| r.contains(&m.start())))
        .map(|m| m.range())
        .collect()
}

/// Tags (with their leading `#`) occurring in `text` outside of links.
pub fn extract_tags(text: &str) -> BTreeSet<String> {
    tag_ranges(text)
        .into_iter()
        .map(|r| text[r].to_string())
        .collect()
}

/// Replaces every tag occurrence with a link to its tag page.
pub fn link_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for r in tag_ranges(text) {
        let tag = &text[r.clone()];
        out.push_str(&text[last..r.start]);
        out.push_str(&format!(
            "<a href=\"/tag/{}\" class=\"tag\">{}</a>",
            urlencoding::encode(&tag[1..]),
            htmlescape::encode_minimal(tag)
        ));
        last = r.end;
    }
    out.push_str(&text[last..]);
    out
}

#[derive(Default)]
struct TagState {
    by_tag: HashMap<String, HashSet<NoteName>>,
    by_note: HashMap<NoteName, BTreeSet<String>>,
}

/// Inverted index tag -> notes. A note's membership is always swapped as a
/// whole so dropped tags never linger.
#[derive(Default)]
pub struct TagIndex {
    inner: RwLock<TagState>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, name: &NoteName, tags: &BTreeSet<String>) {
        let mut state = self.inner.write();
        Self::detach(&mut state, name);
        for tag in tags {
            state
                .by_tag
                .entry(tag.clone())
                .or_default()
                .insert(name.clone());
        }
        if !tags.is_empty() {
            state.by_note.insert(name.clone(), tags.clone());
        }
    }

    pub fn remove(&self, name: &NoteName) {
        let mut state = self.inner.write();
        Self::detach(&mut state, name);
    }

    fn detach(state: &mut TagState, name: &NoteName) {
        let Some(previous) = state.by_note.remove(name) else {
            return;
        };
        for tag in previous {
            if let Some(members) = state.by_tag.get_mut(&tag) {
                members.remove(name);
                if members.is_empty() {
                    state.by_tag.remove(&tag);
                }
            }
        }
    }

    /// Notes carrying `tag` (with leading `#`), sorted by name.
    pub fn list(&self, tag: &str) -> Vec<NoteName> {
        let state = self.inner.read();
        let mut out: Vec<NoteName> = state
            .by_tag
            .get(tag)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    /// Every known tag with its member count, sorted by tag.
    pub fn counts(&self) -> Vec<(String, usize)> {
        let state = self.inner.read();
        let mut out: Vec<(String, usize)> = state
            .by_tag
            .iter()
            .map(|(tag, members)| (tag.clone(), members.len()))
            .collect();
        out.sort();
        out
    }
}
