pub mod export;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::config::Limits;

/// Reduce an enum label to its comparable core: lowercase, no spaces, slashes,
/// underscores or dashes. "Operational Risk", "OperationalRisk" and
/// "operational_risk" all normalise to "operationalrisk".
fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '/' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Declares a closed label enum. Serializes to its display label; parses any
/// spelling of a member label and rejects everything else.
macro_rules! label_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String")]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl TryFrom<String> for $name {
            type Error = UnknownLabel;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize_label(s);
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| normalize_label(v.as_str()) == wanted)
                    .ok_or_else(|| UnknownLabel {
                        kind: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }
    };
}

/// A label that is not a member of its closed enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

label_enum!(
    /// Kind of exposure a supplier finding describes.
    RiskType {
        FinancialRisk => "Financial Risk",
        ComplianceRisk => "Compliance Risk",
        ReputationalRisk => "Reputational Risk",
        OperationalRisk => "Operational Risk",
    }
);

label_enum!(
    Severity {
        High => "High",
        Medium => "Medium",
        Low => "Low",
    }
);

label_enum!(
    ActionCategory {
        AuditReview => "Audit/Review",
        Verification => "Verification",
        Documentation => "Documentation",
        Monitoring => "Monitoring",
        Communication => "Communication",
    }
);

label_enum!(
    Priority {
        High => "High",
        Medium => "Medium",
        Low => "Low",
    }
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRisk {
    pub supplier_name: String,
    pub risk_type: RiskType,
    pub severity: Severity,
    pub summary: String,
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceAction {
    pub action: String,
    pub category: ActionCategory,
    pub priority: Priority,
    pub rationale: String,
}

/// Where a supplier candidate came from. Decides how its dedup key is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Structured,
    Heuristic,
}

/// Normalised identity of a report entry. Two entries with equal keys are the
/// same finding and only the first one is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    SupplierName(String),
    SupplierDetail(String),
    Action(String),
}

const SUPPLIER_DETAIL_KEY_CHARS: usize = 100;
const ACTION_KEY_CHARS: usize = 80;

fn fold_prefix(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect::<String>().to_lowercase()
}

impl DedupKey {
    pub fn for_supplier(supplier: &SupplierRisk, origin: Origin) -> Self {
        match origin {
            Origin::Structured => DedupKey::SupplierName(supplier.supplier_name.to_lowercase()),
            Origin::Heuristic => {
                let detail = format!("{}{}", supplier.summary, supplier.evidence);
                DedupKey::SupplierDetail(fold_prefix(&detail, SUPPLIER_DETAIL_KEY_CHARS))
            }
        }
    }

    pub fn for_action(action: &ComplianceAction) -> Self {
        DedupKey::Action(fold_prefix(&action.action, ACTION_KEY_CHARS))
    }
}

/// Deduplicated, capped findings for one transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportModel {
    pub suppliers_at_risk: Vec<SupplierRisk>,
    pub compliance_actions: Vec<ComplianceAction>,
}

impl ReportModel {
    pub fn is_empty(&self) -> bool {
        self.suppliers_at_risk.is_empty() && self.compliance_actions.is_empty()
    }

    /// Actions grouped High, Medium, Low; encounter order is kept inside each group.
    pub fn actions_by_priority(&self) -> Vec<(Priority, Vec<&ComplianceAction>)> {
        Priority::ALL
            .iter()
            .map(|p| {
                let group = self
                    .compliance_actions
                    .iter()
                    .filter(|a| a.priority == *p)
                    .collect::<Vec<_>>();
                (*p, group)
            })
            .filter(|(_, group)| !group.is_empty())
            .collect()
    }
}

/// Accumulates validated candidates in transcript order. First occurrence of a
/// key wins; later duplicates are dropped, not merged. Caps apply in `finish`.
#[derive(Debug)]
pub struct ReportBuilder {
    max_suppliers: usize,
    max_actions: usize,
    seen: HashSet<DedupKey>,
    suppliers: Vec<SupplierRisk>,
    actions: Vec<ComplianceAction>,
}

impl ReportBuilder {
    pub fn new(limits: &Limits) -> Self {
        Self {
            max_suppliers: limits.max_suppliers,
            max_actions: limits.max_actions,
            seen: HashSet::new(),
            suppliers: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Returns false when the entry was a duplicate.
    pub fn push_supplier(&mut self, supplier: SupplierRisk, origin: Origin) -> bool {
        if !self.seen.insert(DedupKey::for_supplier(&supplier, origin)) {
            tracing::debug!("Dropping duplicate supplier: {}", supplier.supplier_name);
            return false;
        }
        self.suppliers.push(supplier);
        true
    }

    pub fn push_action(&mut self, action: ComplianceAction) -> bool {
        if !self.seen.insert(DedupKey::for_action(&action)) {
            tracing::debug!("Dropping duplicate action: {}", action.action);
            return false;
        }
        self.actions.push(action);
        true
    }

    pub fn finish(mut self) -> ReportModel {
        self.suppliers.truncate(self.max_suppliers);
        self.actions.truncate(self.max_actions);
        ReportModel {
            suppliers_at_risk: self.suppliers,
            compliance_actions: self.actions,
        }
    }
}
