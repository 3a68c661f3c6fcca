//! Delimiters around the machine-readable payload the agent appends to its answers.

use std::sync::LazyLock;

use regex::Regex;

pub const START_MARKER: &str = "---STRUCTURED_DATA---";
pub const END_MARKER: &str = "---END_STRUCTURED_DATA---";

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

pub fn has_block(content: &str) -> bool {
    content.contains(START_MARKER)
}

/// The text strictly between the first start marker and the end marker that
/// follows it, trimmed. `None` when either marker is missing.
pub fn find_block(content: &str) -> Option<&str> {
    let start = content.find(START_MARKER)? + START_MARKER.len();
    let len = content[start..].find(END_MARKER)?;
    Some(content[start..start + len].trim())
}

/// Remove every payload, markers included. An unterminated start marker drops
/// everything after it (a truncated payload is still a payload); a stray end
/// marker is dropped on its own. Runs of 3+ newlines left behind collapse to
/// one blank line and the result is trimmed.
pub fn strip_blocks(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find(START_MARKER) {
        out.push_str(&rest[..start]);
        out.push_str("\n\n");
        let after = &rest[start + START_MARKER.len()..];
        match after.find(END_MARKER) {
            Some(end) => rest = &after[end + END_MARKER.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);

    let out = out.replace(END_MARKER, "");
    EXCESS_NEWLINES.replace_all(&out, "\n\n").trim().to_string()
}
