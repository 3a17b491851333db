mod index;

pub use index::BacklinkIndex;

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::notes::note::NoteName;

static WIKI_LINK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\[\]]+)\]\]").unwrap());

/// Display text of a `[[...]]` body: everything after the first space, or the
/// whole body when there is none (`[[2020 About]]` shows `About`, `[[About]]`
/// shows `About`).
fn display_text(body: &str) -> &str {
    match body.split_once(' ') {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim(),
        _ => body,
    }
}

/// Canonical names of all notes referenced with `[[...]]`.
pub fn parse_links(content: &str) -> BTreeSet<NoteName> {
    WIKI_LINK_REGEX
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .filter_map(|m| NoteName::parse(m.as_str()))
        .collect()
}

/// Rewrites `[[target]]` references into regular markdown links pointing at
/// the canonical note name.
pub fn link_wiki_references(content: &str) -> String {
    WIKI_LINK_REGEX
        .replace_all(content, |cap: &regex::Captures| {
            let body = cap[1].trim();
            match NoteName::parse(body) {
                Some(target) => format!(
                    "[{}](/{})",
                    display_text(body),
                    urlencoding::encode(target.as_str())
                ),
                None => cap[0].to_string(),
            }
        })
        .into_owned()
}
