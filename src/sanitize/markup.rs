//! Best-effort conversion of HTML-ish agent output to plain text. Nothing here
//! can fail: unknown entities and broken tags are left as literal text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static THINKING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:think|thinking|reasoning)\b[^>]*>.*?</(?:think|thinking|reasoning)\s*>").unwrap()
});

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|tr|table|thead|tbody|h[1-6]|ul|ol|blockquote|pre)\s*>").unwrap()
});

static CELL_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</t[dh]\s*>").unwrap());

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"</?[A-Za-z][A-Za-z0-9:-]*(?:\s[^<>]*)?/?>"#).unwrap());

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});").unwrap());

static INLINE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// HTML entities outside the XML predefined set that agents commonly emit.
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&mdash;", "\u{2014}"),
    ("&ndash;", "\u{2013}"),
    ("&hellip;", "\u{2026}"),
    ("&lsquo;", "\u{2018}"),
    ("&rsquo;", "\u{2019}"),
    ("&ldquo;", "\u{201C}"),
    ("&rdquo;", "\u{201D}"),
    ("&bull;", "\u{2022}"),
    ("&middot;", "\u{00B7}"),
    ("&copy;", "\u{00A9}"),
    ("&reg;", "\u{00AE}"),
    ("&trade;", "\u{2122}"),
    ("&deg;", "\u{00B0}"),
    ("&euro;", "\u{20AC}"),
    ("&larr;", "\u{2190}"),
    ("&rarr;", "\u{2192}"),
    ("&crarr;", "\u{21B5}"),
];

/// Drop internal thinking blocks along with their content.
pub fn remove_thinking(text: &str) -> Cow<'_, str> {
    THINKING.replace_all(text, "")
}

fn unescape_entity(entity: &str) -> String {
    if let Some((_, ch)) = HTML_ENTITIES.iter().find(|(name, _)| *name == entity) {
        return ch.to_string();
    }
    match quick_xml::escape::unescape(entity) {
        Ok(text) => text.into_owned(),
        Err(_) => entity.to_string(),
    }
}

/// Unescape each entity on its own so one unknown entity or bare ampersand
/// ("AT&T") does not block the rest.
pub fn unescape_entities(text: &str) -> Cow<'_, str> {
    ENTITY.replace_all(text, |caps: &Captures| unescape_entity(&caps[0]))
}

fn strip_once(text: &str) -> String {
    let text = remove_thinking(text);
    let text = COMMENT.replace_all(&text, "");
    let text = BLOCK_TAG.replace_all(&text, "\n");
    let text = CELL_TAG.replace_all(&text, " ");
    let text = TAG.replace_all(&text, "");
    unescape_entities(&text).into_owned()
}

/// Remove markup and decode entities until the text stops changing. Line
/// structure is kept; whitespace is not normalised here. Every replacement is
/// shorter than what it replaces, so the loop always ends.
pub fn to_plain_text(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = strip_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

pub fn has_tags(text: &str) -> bool {
    TAG.is_match(text)
}

/// Collapse runs of spaces/tabs, trim every line, keep at most one blank line
/// between paragraphs, and trim the whole text.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = text
        .lines()
        .map(|l| INLINE_SPACE.replace_all(l, " ").trim().to_string())
        .collect();
    EXCESS_NEWLINES
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}
