use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

const NOTE_SUFFIX: &str = ".md";

/// Canonical note identifier: case-sensitive, always `.md`-suffixed.
///
/// Every index and the render cache key on this type, so `"About"` and
/// `"About.md"` can never become two entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteName(String);

impl NoteName {
    /// Normalizes a raw reference (URL segment, wiki link target, listing
    /// entry). Returns `None` for references that are empty after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_start_matches('/');
        if trimmed.is_empty() || trimmed == NOTE_SUFFIX {
            return None;
        }
        if trimmed.ends_with(NOTE_SUFFIX) {
            Some(Self(trimmed.to_string()))
        } else {
            Some(Self(format!("{trimmed}{NOTE_SUFFIX}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name without the `.md` suffix.
    pub fn stem(&self) -> &str {
        self.0.strip_suffix(NOTE_SUFFIX).unwrap_or(&self.0)
    }

    /// Human readable form: `202009010520 about me.md` becomes `About Me`.
    pub fn display_name(&self) -> String {
        let stem = self.stem();
        let without_stamp = stem.trim_start_matches(|c: char| c.is_ascii_digit());
        let label = match without_stamp.strip_prefix(' ') {
            Some(rest) if !rest.is_empty() => rest,
            _ if without_stamp.is_empty() => stem,
            _ => without_stamp,
        };
        capitalize_words(label)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn capitalize_words(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A note after the full render pipeline. Never patched; a re-render
/// replaces the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNote {
    pub name: NoteName,
    /// Serving form: the page template with content, title and build filled in.
    /// The `{{backlinks}}` placeholder is left for request time.
    pub html: String,
    pub title: String,
    pub tags: BTreeSet<String>,
    pub outbound_links: BTreeSet<NoteName>,
    pub rendered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub name: NoteName,
    pub kind: ChangeKind,
}
