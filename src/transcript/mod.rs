pub mod json;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "tool" => Some(Role::Tool),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One turn of an agent conversation. The core only ever reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub content: String,
    pub has_tool_calls: bool,
}

impl TranscriptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            has_tool_calls: false,
        }
    }

    pub fn with_tool_calls(mut self) -> Self {
        self.has_tool_calls = true;
        self
    }

    /// Whether this message may contribute findings to a report. Tool output and
    /// turns that invoke tools carry agent plumbing, not user-facing conclusions.
    pub fn is_eligible(&self) -> bool {
        self.role != Role::Tool && !self.has_tool_calls
    }
}

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown role {role:?} in message {index}")]
    UnknownRole { index: usize, role: String },

    #[error("Expected a list of messages or an object with a \"messages\" list")]
    UnsupportedShape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Format {
    Json,
    Jsonl,
    Yaml,
}

impl Format {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Format::Json),
            "jsonl" | "ndjson" => Some(Format::Jsonl),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    pub fn detect_from_extension(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::from_str)
    }

    /// Guess the format of piped input: JSON documents start with a bracket.
    pub fn sniff(content: &str) -> Self {
        let trimmed = content.trim_start();
        if trimmed.starts_with('[') {
            Format::Json
        } else if trimmed.starts_with('{') {
            // JSONL: the first line is a complete object and more lines follow.
            let mut lines = trimmed.lines().filter(|l| !l.trim().is_empty());
            let first_complete = lines
                .next()
                .is_some_and(|l| serde_json::from_str::<serde_json::Value>(l).is_ok());
            if first_complete && lines.next().is_some() {
                Format::Jsonl
            } else {
                Format::Json
            }
        } else {
            Format::Yaml
        }
    }
}

pub fn parse_content(content: &str, format: Format) -> Result<Vec<TranscriptMessage>, TranscriptError> {
    match format {
        Format::Json => json::parse_json(content),
        Format::Jsonl => json::parse_jsonl(content),
        Format::Yaml => json::parse_yaml(content),
    }
}

/// Load a transcript from files, directories' worth of glob matches, or both.
/// Multiple sources are concatenated in the order given (glob matches sorted).
pub fn load_paths(paths: &[String], format_override: Option<Format>) -> Result<Vec<TranscriptMessage>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for path_str in paths {
        let path = Path::new(path_str);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }

        let mut matches: Vec<PathBuf> = glob::glob(path_str)
            .with_context(|| format!("Invalid path or glob pattern: {path_str}"))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();

        if matches.is_empty() {
            bail!("No files found matching: {path_str}");
        }
        matches.sort();
        files.extend(matches);
    }

    let mut messages = Vec::new();
    for file in &files {
        messages.extend(load_file(file, format_override)?);
    }
    Ok(messages)
}

pub fn load_file(path: &Path, format_override: Option<Format>) -> Result<Vec<TranscriptMessage>> {
    let format = format_override
        .or_else(|| Format::detect_from_extension(path))
        .with_context(|| format!("Cannot determine format for: {}", path.display()))?;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read: {}", path.display()))?;

    let messages = parse_content(&content, format)
        .with_context(|| format!("Failed to parse transcript: {}", path.display()))?;
    info!("Loaded {} messages from {}", messages.len(), path.display());
    Ok(messages)
}

pub fn load_stdin(format_override: Option<Format>) -> Result<Vec<TranscriptMessage>> {
    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read from stdin")?;

    if content.trim().is_empty() {
        bail!("Empty input from stdin");
    }

    let format = format_override.unwrap_or_else(|| Format::sniff(&content));
    let messages = parse_content(&content, format).context("Failed to parse transcript from stdin")?;
    info!("Loaded {} messages from stdin", messages.len());
    Ok(messages)
}
