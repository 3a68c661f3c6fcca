//! Pattern-based fallback for messages without a usable payload.
//!
//! Precision over recall: every pattern is anchored on vocabulary that signals
//! a finding, and anything ambiguous is left for the validator to discard.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Vocabulary;
use crate::report::{ActionCategory, ComplianceAction, Priority, RiskType, Severity, SupplierRisk};

/// Capitalised word run: "ABC Transport Services", "Smith & Sons Pty Ltd".
const NAME: &str = r#"[A-Z][\w&'.\-]*(?:[ \t]+(?:&|and|of|[A-Z0-9][\w&'.\-]*))*"#;

const CONTEXT_BEFORE_CHARS: usize = 200;
const CONTEXT_AFTER_CHARS: usize = 300;

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-•*+]|\d{1,2}[.)])\s+(.+?)\s*$").unwrap());

static DIRECTIVE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:should|must|need\s+to|required\s+to|recommend\w*)\b.*:\s*\**\s*$").unwrap()
});

static RECOMMENDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:it\s+is\s+)?(?:recommended|suggested|advised)\s+(?:that|to)\s+([^.;\n]+)").unwrap()
});

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:should|must|need\s+to)\s+([^.;\n]+)").unwrap());

static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*|__|`").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static RISK_FINANCIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:financial|bankrupt\w*|insolven\w*|debts?|liquidat\w*)\b").unwrap());
static RISK_COMPLIANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:compliance|regulatory|violations?|breach\w*)\b").unwrap());
static RISK_REPUTATIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:reputation\w*|negative\s+news|scandal\w*)\b").unwrap());
static RISK_OPERATIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:operational|deliver\w*|performance|delays?)\b").unwrap());

static SEVERITY_HIGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:high|critical|severe|significant|major)\b").unwrap());
static SEVERITY_LOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:low|minor|minimal)\b").unwrap());

static CATEGORY_AUDIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:audit\w*|review\w*|inspect\w*|examin\w*|assess\w*)\b").unwrap());
static CATEGORY_VERIFY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:verif\w*|confirm\w*|check\w*|validat\w*)\b").unwrap());
static CATEGORY_DOCUMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:document\w*|record\w*|report\w*)\b").unwrap());
static CATEGORY_MONITOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:monitor\w*|track\w*|observ\w*)\b").unwrap());
static CATEGORY_COMMUNICATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:contact\w*|communicat\w*|notif\w*|inform\w*)\b").unwrap());

static PRIORITY_HIGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:immediate\w*|urgent\w*|critical|must|required)\b").unwrap());
static PRIORITY_LOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:consider|may|could|optional\w*)\b").unwrap());

/// Candidates found in one message, in the order they appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeuristicFindings {
    pub suppliers: Vec<SupplierRisk>,
    pub actions: Vec<ComplianceAction>,
}

#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    supplier_patterns: Vec<Regex>,
    section_heading: Regex,
    excluded_prefixes: Vec<String>,
}

/// Case-insensitive alternation over `terms`, longest first so multi-word
/// terms win over their prefixes. An empty list never matches.
fn alternation(terms: &[String]) -> String {
    let mut terms: Vec<&str> = terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return r"[^\s\S]".to_string();
    }
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let escaped: Vec<String> = terms.iter().map(|t| regex::escape(t)).collect();
    format!("(?i:{})", escaped.join("|"))
}

impl HeuristicExtractor {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, regex::Error> {
        let risk = alternation(&vocabulary.risk_terms);
        let nouns = alternation(&vocabulary.supplier_nouns);
        let sections = alternation(&vocabulary.action_section_terms);

        // Risk words match as prefixes of a word: "issue" covers "issues".
        let risk = format!(r"\b{risk}\w*");
        let nouns = format!(r"\b{nouns}\b");

        let supplier_patterns = vec![
            // "vendor Acme Pty Ltd has significant compliance issues"
            format!(
                r#"{nouns}\s+(?i:named\s+|called\s+)?['"“]?({NAME})['"”]?\s+(?i:has|have|shows|demonstrates|presents|poses|exhibits|faces|faced)\s+(?:[\w-]+\s+){{0,3}}?{risk}"#
            ),
            // "a breach involving the contractor Smith & Sons"
            format!(
                r#"{risk}[^.!?\n]*?\s(?i:with|regarding|concerning|about|from|involving|by)\s+(?i:the\s+)?{nouns}\s+['"“]?({NAME})"#
            ),
            // "Acme Freight is flagged as a high risk"
            format!(
                r#"['"“]?({NAME})['"”]?\s+(?i:is\s+|was\s+|has\s+been\s+)?(?i:identified|classified|categori[sz]ed|flagged|marked|rated)\s+as\s+(?i:an?\s+)?(?i:(?:high|significant|major|elevated)[\s-]+)?(?i:risk)"#
            ),
            // "Acme Freight's repeated safety breaches"
            format!(r#"({NAME})(?:'s|’s)\s+(?:[\w-]+\s+){{0,3}}?{risk}"#),
        ]
        .into_iter()
        .map(|p| Regex::new(&p))
        .collect::<Result<Vec<_>, _>>()?;

        let section_heading = Regex::new(&sections)?;

        Ok(Self {
            supplier_patterns,
            section_heading,
            excluded_prefixes: vocabulary
                .excluded_prefixes
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        })
    }

    /// Scan plain text (payload and markup already removed) for candidates.
    pub fn extract(&self, text: &str) -> HeuristicFindings {
        HeuristicFindings {
            suppliers: self.suppliers(text),
            actions: self.actions(text),
        }
    }

    fn suppliers(&self, text: &str) -> Vec<SupplierRisk> {
        let mut hits: Vec<(usize, String, &str)> = Vec::new();

        for pattern in &self.supplier_patterns {
            for caps in pattern.captures_iter(text) {
                let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let name = self.clean_name(name.as_str());
                if name.is_empty() {
                    continue;
                }
                let context = window(text, whole.start(), whole.end());
                hits.push((whole.start(), name, context));
            }
        }
        hits.sort_by_key(|(start, _, _)| *start);

        let mut seen = HashSet::new();
        hits.into_iter()
            .filter(|(_, name, _)| seen.insert(name.to_lowercase()))
            .map(|(_, name, context)| SupplierRisk {
                supplier_name: name,
                risk_type: classify_risk(context),
                severity: classify_severity(context),
                summary: collapse_whitespace(context),
                evidence: String::new(),
            })
            .collect()
    }

    /// Trim quotes, trailing punctuation and dangling connectors. A leading
    /// article is dropped when a capitalised word follows it, unless the phrase
    /// with the article is one the validator must still see ("The question ...").
    fn clean_name(&self, raw: &str) -> String {
        let mut name = raw
            .trim()
            .trim_matches(|c: char| matches!(c, '\'' | '"' | '“' | '”'))
            .trim_end_matches(|c: char| matches!(c, ',' | '.' | ';' | ':'))
            .trim()
            .to_string();

        loop {
            let trimmed = ["&", "and", "of"]
                .iter()
                .find_map(|w| name.strip_suffix(w).filter(|rest| rest.ends_with(' ')))
                .map(|rest| rest.trim_end().trim_end_matches([',', '.', ';']).to_string());
            match trimmed {
                Some(rest) => name = rest,
                None => break,
            }
        }

        let lower = name.to_lowercase();
        if self.excluded_prefixes.iter().any(|p| lower.starts_with(p.as_str())) {
            return name;
        }
        for article in ["The ", "A ", "An "] {
            if let Some(rest) = name.strip_prefix(article) {
                if rest.chars().next().is_some_and(char::is_uppercase) {
                    return rest.to_string();
                }
            }
        }
        name
    }

    fn actions(&self, text: &str) -> Vec<ComplianceAction> {
        let mut actions: Vec<ComplianceAction> = Vec::new();

        let mut in_section = false;
        for line in text.lines() {
            if let Some(caps) = BULLET.captures(line) {
                if in_section {
                    let item = clean_action(&caps[1]);
                    let priority = classify_priority(&item);
                    actions.push(build_action(item, priority));
                }
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            in_section = self.is_section_heading(line);
        }

        let mut standalone: Vec<(usize, String, &str)> = Vec::new();
        for pattern in [&*RECOMMENDED, &*DIRECTIVE] {
            for caps in pattern.captures_iter(text) {
                let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                // "you should do the following:" introduces a list, it is not an action.
                if body.as_str().trim_end().ends_with(':') {
                    continue;
                }
                standalone.push((whole.start(), clean_action(body.as_str()), whole.as_str()));
            }
        }
        standalone.sort_by_key(|(start, _, _)| *start);

        for (_, item, matched) in standalone {
            let lower = item.to_lowercase();
            let overlaps = actions.iter().any(|a| {
                let existing = a.action.to_lowercase();
                existing.contains(&lower) || lower.contains(&existing)
            });
            if overlaps || item.is_empty() {
                continue;
            }
            actions.push(build_action(item, classify_priority(matched)));
        }

        actions
    }

    fn is_section_heading(&self, line: &str) -> bool {
        let line = line.trim();
        if line.chars().count() > 160 {
            return false;
        }
        self.section_heading.is_match(line) || DIRECTIVE_HEADING.is_match(line)
    }
}

fn build_action(item: String, priority: Priority) -> ComplianceAction {
    ComplianceAction {
        category: classify_category(&item),
        priority,
        action: item,
        rationale: String::new(),
    }
}

/// Up to 200 characters before and 300 after the match, on char boundaries.
fn window(text: &str, start: usize, end: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_BEFORE_CHARS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let to = text[end..]
        .char_indices()
        .nth(CONTEXT_AFTER_CHARS)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    text[from..to].trim()
}

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Strip emphasis markers and whitespace runs; capitalise the first letter.
fn clean_action(raw: &str) -> String {
    let text = EMPHASIS.replace_all(raw, "");
    let text = collapse_whitespace(&text);
    let text = text.trim_end_matches([',', ';', ':']).trim();
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn classify_risk(context: &str) -> RiskType {
    if RISK_FINANCIAL.is_match(context) {
        RiskType::FinancialRisk
    } else if RISK_COMPLIANCE.is_match(context) {
        RiskType::ComplianceRisk
    } else if RISK_REPUTATIONAL.is_match(context) {
        RiskType::ReputationalRisk
    } else if RISK_OPERATIONAL.is_match(context) {
        RiskType::OperationalRisk
    } else {
        RiskType::ComplianceRisk
    }
}

fn classify_severity(context: &str) -> Severity {
    if SEVERITY_HIGH.is_match(context) {
        Severity::High
    } else if SEVERITY_LOW.is_match(context) {
        Severity::Low
    } else {
        Severity::Medium
    }
}

fn classify_category(action: &str) -> ActionCategory {
    if CATEGORY_AUDIT.is_match(action) {
        ActionCategory::AuditReview
    } else if CATEGORY_VERIFY.is_match(action) {
        ActionCategory::Verification
    } else if CATEGORY_DOCUMENT.is_match(action) {
        ActionCategory::Documentation
    } else if CATEGORY_MONITOR.is_match(action) {
        ActionCategory::Monitoring
    } else if CATEGORY_COMMUNICATE.is_match(action) {
        ActionCategory::Communication
    } else {
        ActionCategory::Verification
    }
}

fn classify_priority(text: &str) -> Priority {
    if PRIORITY_HIGH.is_match(text) {
        Priority::High
    } else if PRIORITY_LOW.is_match(text) {
        Priority::Low
    } else {
        Priority::Medium
    }
}
