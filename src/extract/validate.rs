use thiserror::Error;

use crate::config::{Limits, Vocabulary};
use crate::report::{ComplianceAction, SupplierRisk};

/// Why a candidate was dropped. Never surfaced to users; only logged at debug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("name length {0} outside bounds")]
    NameLength(usize),

    #[error("name has no uppercase letter")]
    NoUppercase,

    #[error("name is a generic term")]
    GenericTerm,

    #[error("name starts with excluded prefix {0:?}")]
    ExcludedPrefix(String),

    #[error("text length {0} exceeds bound")]
    TextTooLong(usize),

    #[error("action length {0} outside bounds")]
    ActionLength(usize),

    #[error("text contains reasoning marker {0:?}")]
    ReasoningMarker(String),
}

/// Structural rules shared by the structured and heuristic extractors.
#[derive(Debug, Clone)]
pub struct Validator {
    generic_terms: Vec<String>,
    excluded_prefixes: Vec<String>,
    reasoning_markers: Vec<String>,
    limits: Limits,
}

fn lowered(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Validator {
    pub fn new(vocabulary: &Vocabulary, limits: &Limits) -> Self {
        Self {
            generic_terms: lowered(&vocabulary.generic_terms),
            excluded_prefixes: lowered(&vocabulary.excluded_prefixes),
            reasoning_markers: lowered(&vocabulary.reasoning_markers),
            limits: *limits,
        }
    }

    pub fn check_supplier_name(&self, name: &str) -> Result<(), Rejection> {
        let len = name.chars().count();
        if len < self.limits.name_min_chars || len > self.limits.name_max_chars {
            return Err(Rejection::NameLength(len));
        }
        if !name.chars().any(char::is_uppercase) {
            return Err(Rejection::NoUppercase);
        }
        let lower = name.to_lowercase();
        if self.generic_terms.iter().any(|t| *t == lower) {
            return Err(Rejection::GenericTerm);
        }
        if let Some(prefix) = self.excluded_prefixes.iter().find(|p| lower.starts_with(p.as_str())) {
            return Err(Rejection::ExcludedPrefix(prefix.clone()));
        }
        Ok(())
    }

    /// Summary, evidence and heuristic context windows.
    pub fn check_context(&self, text: &str) -> Result<(), Rejection> {
        let len = text.chars().count();
        if len > self.limits.context_max_chars {
            return Err(Rejection::TextTooLong(len));
        }
        self.check_markers(text)
    }

    pub fn check_action_text(&self, text: &str) -> Result<(), Rejection> {
        let len = text.chars().count();
        if len < self.limits.action_min_chars || len > self.limits.action_max_chars {
            return Err(Rejection::ActionLength(len));
        }
        self.check_markers(text)
    }

    pub fn check_markers(&self, text: &str) -> Result<(), Rejection> {
        let lower = text.to_lowercase();
        match self.reasoning_markers.iter().find(|m| lower.contains(m.as_str())) {
            Some(marker) => Err(Rejection::ReasoningMarker(marker.clone())),
            None => Ok(()),
        }
    }

    pub fn check_supplier(&self, supplier: &SupplierRisk) -> Result<(), Rejection> {
        self.check_supplier_name(&supplier.supplier_name)?;
        self.check_context(&supplier.summary)?;
        self.check_context(&supplier.evidence)
    }

    pub fn check_action(&self, action: &ComplianceAction) -> Result<(), Rejection> {
        self.check_action_text(&action.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::new(&Vocabulary::default(), &Limits::default())
    }

    #[test]
    fn name_length_boundaries() {
        let v = validator();
        assert_eq!(v.check_supplier_name("AB"), Err(Rejection::NameLength(2)));
        assert_eq!(v.check_supplier_name("ABC"), Ok(()));
        assert_eq!(v.check_supplier_name("Abc"), Ok(()));
        assert!(v.check_supplier_name(&format!("A{}", "b".repeat(99))).is_ok());
        assert_eq!(
            v.check_supplier_name(&format!("A{}", "b".repeat(100))),
            Err(Rejection::NameLength(101))
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(validator().check_supplier_name("Zé").is_err());
        assert!(validator().check_supplier_name("Zéé").is_ok());
    }

    #[test]
    fn requires_an_uppercase_letter() {
        assert_eq!(validator().check_supplier_name("acme pty ltd"), Err(Rejection::NoUppercase));
    }

    #[test]
    fn generic_terms_rejected_in_any_case() {
        let v = validator();
        assert_eq!(v.check_supplier_name("compliance"), Err(Rejection::NoUppercase));
        assert_eq!(v.check_supplier_name("Compliance"), Err(Rejection::GenericTerm));
        assert_eq!(v.check_supplier_name("COMPLIANCE"), Err(Rejection::GenericTerm));
        assert_eq!(v.check_supplier_name("Vendor"), Err(Rejection::GenericTerm));
    }

    #[test]
    fn excluded_prefixes_rejected() {
        let v = validator();
        assert!(matches!(
            v.check_supplier_name("The Search Results"),
            Err(Rejection::ExcludedPrefix(_))
        ));
        assert!(matches!(
            v.check_supplier_name("Policy Framework Group"),
            Err(Rejection::ExcludedPrefix(_))
        ));
        assert!(v.check_supplier_name("Acme Policy Group").is_ok());
    }

    #[test]
    fn context_bounds_and_markers() {
        let v = validator();
        assert!(v.check_context(&"a".repeat(1000)).is_ok());
        assert_eq!(v.check_context(&"a".repeat(1001)), Err(Rejection::TextTooLong(1001)));
        assert!(matches!(
            v.check_context("The search results show Acme was fined"),
            Err(Rejection::ReasoningMarker(_))
        ));
        assert!(v.check_context("").is_ok());
    }

    #[test]
    fn action_bounds() {
        let v = validator();
        assert_eq!(v.check_action_text("Too short"), Err(Rejection::ActionLength(9)));
        assert!(v.check_action_text("Verify ABN records").is_ok());
        assert!(v.check_action_text(&"a".repeat(300)).is_ok());
        assert!(v.check_action_text(&"a".repeat(301)).is_err());
        assert!(v.check_action_text("I am searching the contract register").is_err());
    }

    #[test]
    fn custom_vocabulary_is_honoured() {
        let vocab = Vocabulary {
            generic_terms: vec!["Widget".to_string()],
            ..Vocabulary::default()
        };
        let v = Validator::new(&vocab, &Limits::default());
        assert_eq!(v.check_supplier_name("WIDGET"), Err(Rejection::GenericTerm));
        assert!(v.check_supplier_name("Compliance").is_ok());
    }
}
