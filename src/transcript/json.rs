use serde::Deserialize;

use super::{Role, TranscriptError, TranscriptMessage};

/// Chat-export message as written by agent frameworks. Every field is optional
/// so that partial or foreign exports still load.
#[derive(Debug, Deserialize)]
pub struct JsonMessage {
    pub role: Option<String>,
    pub content: Option<serde_json::Value>,
    pub tool_calls: Option<serde_json::Value>,
    #[serde(alias = "hasToolCalls")]
    pub has_tool_calls: Option<bool>,
}

/// Either a bare list of messages or an object wrapping one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum JsonTranscript {
    List(Vec<JsonMessage>),
    Wrapped { messages: Vec<JsonMessage> },
}

impl JsonTranscript {
    pub fn into_messages(self) -> Vec<JsonMessage> {
        match self {
            JsonTranscript::List(m) | JsonTranscript::Wrapped { messages: m } => m,
        }
    }
}

/// Parse a JSON document into transcript messages.
pub fn parse_json(content: &str) -> Result<Vec<TranscriptMessage>, TranscriptError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    from_value(value)
}

/// Parse a YAML document with the same shapes as the JSON format.
pub fn parse_yaml(content: &str) -> Result<Vec<TranscriptMessage>, TranscriptError> {
    let value: serde_json::Value = serde_yaml::from_str(content)?;
    from_value(value)
}

/// Parse newline-delimited JSON, one message object per line.
pub fn parse_jsonl(content: &str) -> Result<Vec<TranscriptMessage>, TranscriptError> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, line)| {
            let m: JsonMessage = serde_json::from_str(line)?;
            convert(i, m)
        })
        .collect()
}

fn from_value(value: serde_json::Value) -> Result<Vec<TranscriptMessage>, TranscriptError> {
    let transcript: JsonTranscript =
        serde_json::from_value(value).map_err(|_| TranscriptError::UnsupportedShape)?;
    transcript
        .into_messages()
        .into_iter()
        .enumerate()
        .map(|(i, m)| convert(i, m))
        .collect()
}

fn convert(index: usize, m: JsonMessage) -> Result<TranscriptMessage, TranscriptError> {
    let raw_role = m.role.unwrap_or_default();
    let role = Role::from_str(&raw_role).ok_or_else(|| TranscriptError::UnknownRole {
        index,
        role: raw_role.clone(),
    })?;

    let has_tool_calls = m.has_tool_calls.unwrap_or(false)
        || match &m.tool_calls {
            Some(serde_json::Value::Array(calls)) => !calls.is_empty(),
            Some(serde_json::Value::Null) | None => false,
            Some(_) => true,
        };

    Ok(TranscriptMessage {
        role,
        content: content_text(m.content),
        has_tool_calls,
    })
}

/// Flatten message content: plain strings pass through, lists of content parts
/// contribute their `text` fields joined by blank lines.
fn content_text(content: Option<serde_json::Value>) -> String {
    match content {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Array(parts)) => parts
            .iter()
            .filter_map(|p| match p {
                serde_json::Value::String(s) => Some(s.as_str()),
                serde_json::Value::Object(obj) => obj.get("text").and_then(|t| t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_list() {
        let msgs = parse_json(
            r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]"#,
        )
        .unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::User);
        assert_eq!(msgs[1].content, "hello");
        assert!(!msgs[1].has_tool_calls);
    }

    #[test]
    fn parses_wrapped_messages_and_tool_calls() {
        let msgs = parse_json(
            r#"{"messages":[
                {"role":"assistant","content":null,"tool_calls":[{"function":{"name":"search","arguments":"{}"}}]},
                {"role":"tool","content":"results"},
                {"role":"assistant","content":"done","tool_calls":[]}
            ]}"#,
        )
        .unwrap();
        assert!(msgs[0].has_tool_calls);
        assert_eq!(msgs[0].content, "");
        assert_eq!(msgs[1].role, Role::Tool);
        assert!(!msgs[2].has_tool_calls);
    }

    #[test]
    fn accepts_camel_case_flag() {
        let msgs = parse_json(r#"[{"role":"assistant","content":"x","hasToolCalls":true}]"#).unwrap();
        assert!(msgs[0].has_tool_calls);
    }

    #[test]
    fn joins_content_parts() {
        let msgs = parse_json(
            r#"[{"role":"assistant","content":[{"type":"text","text":"one"},{"type":"image"},{"type":"text","text":"two"}]}]"#,
        )
        .unwrap();
        assert_eq!(msgs[0].content, "one\n\ntwo");
    }

    #[test]
    fn unknown_role_names_the_index() {
        let err = parse_json(r#"[{"role":"user","content":"a"},{"role":"robot","content":"b"}]"#)
            .unwrap_err();
        assert!(matches!(err, TranscriptError::UnknownRole { index: 1, .. }));
    }

    #[test]
    fn scalar_document_is_unsupported() {
        assert!(matches!(parse_json("42"), Err(TranscriptError::UnsupportedShape)));
    }

    #[test]
    fn parses_yaml_and_jsonl() {
        let yaml = "messages:\n  - role: user\n    content: hi\n  - role: Assistant\n    content: hello\n";
        let msgs = parse_yaml(yaml).unwrap();
        assert_eq!(msgs[1].role, Role::Assistant);

        let jsonl = "{\"role\":\"user\",\"content\":\"a\"}\n\n{\"role\":\"tool\",\"content\":\"b\"}\n";
        let msgs = parse_jsonl(jsonl).unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].role, Role::Tool);
    }
}
