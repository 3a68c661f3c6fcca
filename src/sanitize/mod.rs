//! Turns raw agent output into text fit for a chat transcript view: the
//! payload and thinking blocks are hidden, markup is stripped, and bulky
//! reference sections are split off into their own block.

pub mod markup;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::Limits;
use crate::extract::marker::{self, END_MARKER, START_MARKER};
use crate::transcript::TranscriptMessage;

/// A line consisting only of a references-style heading, possibly wrapped in
/// markdown emphasis or tags.
static REFERENCE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^(?:[ \t>#*_]|<[^<>\n]*>)*(?:footnotes?|references?|sources?|citations?)(?:[ \t*_:\r]|<[^<>\n]*>)*$",
    )
    .unwrap()
});

static TABLE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<table\b").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizedMessage {
    pub main_text: String,
    pub reference_text: Option<String>,
    pub has_structured_data: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Sanitizer {
    inline_max_chars: usize,
    display_max_chars: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(&Limits::default())
    }
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map_or(0, |i| i + 1)
}

fn reference_start(text: &str) -> Option<usize> {
    let heading = REFERENCE_HEADING.find(text).map(|m| m.start());
    let table = TABLE_OPEN.find(text).map(|m| line_start(text, m.start()));
    match (heading, table) {
        (Some(h), Some(t)) => Some(h.min(t)),
        (h, t) => h.or(t),
    }
}

fn clean(text: &str) -> String {
    let mut plain = markup::to_plain_text(text);
    // Entity decoding can spell out a marker; removal can splice a new one.
    while plain.contains(START_MARKER) || plain.contains(END_MARKER) {
        plain = plain.replace(START_MARKER, "").replace(END_MARKER, "");
    }
    markup::normalize_whitespace(&plain)
}

impl Sanitizer {
    pub fn new(limits: &Limits) -> Self {
        Self {
            inline_max_chars: limits.reference_inline_max_chars,
            display_max_chars: limits.reference_display_max_chars,
        }
    }

    /// Split `text` into (main, reference). The reference section runs from
    /// the earliest heading or table to the end, and is only split off when it
    /// is long or carries markup.
    fn split_reference<'a>(&self, text: &'a str) -> (&'a str, Option<&'a str>) {
        let Some(start) = reference_start(text) else {
            return (text, None);
        };
        let section = &text[start..];
        if section.chars().count() > self.inline_max_chars || markup::has_tags(section) {
            (&text[..start], Some(section))
        } else {
            (text, None)
        }
    }

    fn truncate(&self, text: String) -> String {
        let total = text.chars().count();
        if total <= self.display_max_chars {
            return text;
        }
        let shown: String = text.chars().take(self.display_max_chars).collect();
        format!(
            "{}\n\n[Reference truncated: showing {} of {} characters]",
            shown.trim_end(),
            self.display_max_chars,
            total
        )
    }

    /// One split-then-clean step. The reference comes back untruncated.
    fn split_and_clean(&self, text: &str) -> (String, Option<String>) {
        let (main, reference) = self.split_reference(text);
        let reference = reference.map(clean).filter(|r| !r.is_empty());
        (clean(main), reference)
    }

    pub fn sanitize(&self, content: &str) -> SanitizedMessage {
        let has_structured_data = marker::has_block(content);
        let visible = marker::strip_blocks(content);
        let visible = markup::remove_thinking(&visible);

        let (mut main_text, mut reference) = self.split_and_clean(&visible);

        // Decoding can surface a heading that was hidden behind entities or
        // markup. Repeat on the cleaned text until it is stable; every change
        // shortens it.
        loop {
            let (next, extra) = self.split_and_clean(&main_text);
            if next == main_text {
                break;
            }
            reference = match (extra, reference) {
                (Some(extra), Some(rest)) => Some(format!("{extra}\n\n{rest}")),
                (extra, rest) => extra.or(rest),
            };
            main_text = next;
        }

        SanitizedMessage {
            main_text,
            reference_text: reference.map(|r| self.truncate(r)),
            has_structured_data,
        }
    }

    pub fn sanitize_message(&self, message: &TranscriptMessage) -> SanitizedMessage {
        self.sanitize(&message.content)
    }
}

/// Sanitize with the default limits.
pub fn sanitize(content: &str) -> SanitizedMessage {
    Sanitizer::default().sanitize(content)
}

pub fn sanitize_for_display(message: &TranscriptMessage) -> SanitizedMessage {
    Sanitizer::default().sanitize_message(message)
}
