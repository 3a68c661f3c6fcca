use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Word lists that drive candidate validation and the heuristic extractor.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Vocabulary {
    /// Names that are never a supplier on their own (compared case-insensitively).
    pub generic_terms: Vec<String>,
    /// Lowercase prefixes that disqualify a supplier name.
    pub excluded_prefixes: Vec<String>,
    /// Phrases that mark agent scratch text rather than a user-facing finding.
    pub reasoning_markers: Vec<String>,
    /// Words that signal a risk finding near a supplier name.
    pub risk_terms: Vec<String>,
    /// Nouns that introduce a supplier ("vendor Acme ...").
    pub supplier_nouns: Vec<String>,
    /// Headings that introduce a list of recommended actions.
    pub action_section_terms: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            generic_terms: strings(&[
                "compliance", "policy", "procurement", "government", "agency", "contract",
                "supplier", "vendor", "contractor", "company", "risk", "issue", "concern",
                "violation", "breach", "procedure", "requirement", "standard", "regulation",
                "framework", "process", "management", "monitoring", "assessment", "audit",
                "review", "knowledge", "assistant", "question", "search", "finding",
            ]),
            excluded_prefixes: strings(&[
                "the question", "the search", "knowledge", "assistant", "policy", "procedure",
            ]),
            reasoning_markers: strings(&[
                "knowledge-assistant", "searching", "verifying", "possible_sources", "tool_calls",
                "tool_call", "function_call", "the search results", "search results",
                "i will structure", "to answer comprehensively", "the question asks",
            ]),
            risk_terms: strings(&[
                "risk", "concern", "issue", "problem", "compliance issue", "violation", "breach",
                "non-compliance", "delay", "investigation", "penalty", "bankruptcy", "insolvency",
                "fraud", "scandal", "lawsuit", "sanction",
            ]),
            supplier_nouns: strings(&[
                "supplier", "vendor", "contractor", "subcontractor", "company", "organisation",
                "organization",
            ]),
            action_section_terms: strings(&[
                "recommended action", "recommended actions", "recommend actions", "next step",
                "next steps", "compliance measure", "compliance measures", "due diligence step",
                "due diligence steps",
            ]),
        }
    }
}

/// Size bounds applied during extraction and display.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Limits {
    pub max_suppliers: usize,
    pub max_actions: usize,
    pub name_min_chars: usize,
    pub name_max_chars: usize,
    pub context_max_chars: usize,
    pub action_min_chars: usize,
    pub action_max_chars: usize,
    pub reference_inline_max_chars: usize,
    pub reference_display_max_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_suppliers: 15,
            max_actions: 25,
            name_min_chars: 3,
            name_max_chars: 100,
            context_max_chars: 1000,
            action_min_chars: 15,
            action_max_chars: 300,
            reference_inline_max_chars: 200,
            reference_display_max_chars: 2000,
        }
    }
}

/// Top-level riskscan config file structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct RiskscanConfig {
    pub vocabulary: Vocabulary,
    pub limits: Limits,
}

impl RiskscanConfig {
    /// Load config from `path`, or from ~/.riskscan/config.toml when no path is given.
    /// Returns defaults if the default file doesn't exist; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let p = config_path()?;
                if !p.exists() {
                    return Ok(RiskscanConfig::default());
                }
                p
            }
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: RiskscanConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Effective config rendered back as TOML, for `riskscan config show`.
    pub fn display(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render config")
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Path to the config file: ~/.riskscan/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".riskscan").join("config.toml"))
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# ~/.riskscan/config.toml
# Omitted keys fall back to the built-in defaults.

[vocabulary]
# generic_terms = ["compliance", "policy", "supplier", "vendor", "risk"]
# excluded_prefixes = ["the question", "the search", "knowledge", "policy"]
# reasoning_markers = ["searching", "verifying", "tool_calls", "the search results"]
# risk_terms = ["risk", "breach", "violation", "delay"]
# supplier_nouns = ["supplier", "vendor", "contractor", "company"]
# action_section_terms = ["recommended actions", "next steps", "due diligence steps"]

[limits]
# max_suppliers = 15
# max_actions = 25
# context_max_chars = 1000
# reference_display_max_chars = 2000
"#
}

/// Create the config file at `path` if it doesn't already exist.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, default_config_template())?;
    Ok(true)
}
