//! Parsing and schema validation of the embedded JSON payload.
//!
//! Entries are validated one at a time: a bad enum value or a blocklisted
//! supplier name drops that entry only, never the whole block.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::marker;
use super::validate::{Rejection, Validator};
use crate::report::{ComplianceAction, SupplierRisk, UnknownLabel};

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("payload is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has the wrong shape: {0}")]
    Shape(serde_json::Error),
}

/// Validated contents of one message's payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredBlock {
    pub suppliers_at_risk: Vec<SupplierRisk>,
    pub compliance_actions: Vec<ComplianceAction>,
}

impl StructuredBlock {
    pub fn is_empty(&self) -> bool {
        self.suppliers_at_risk.is_empty() && self.compliance_actions.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    #[serde(default, alias = "suppliersAtRisk")]
    suppliers_at_risk: Vec<serde_json::Value>,
    #[serde(default, alias = "complianceActions")]
    compliance_actions: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawSupplier {
    #[serde(alias = "supplierName")]
    supplier_name: String,
    #[serde(alias = "riskType")]
    risk_type: String,
    severity: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    evidence: String,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    action: String,
    category: String,
    priority: String,
    #[serde(default)]
    rationale: String,
}

#[derive(Debug, Error)]
enum EntryError {
    #[error("wrong shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error(transparent)]
    Label(#[from] UnknownLabel),

    #[error(transparent)]
    Rejected(#[from] Rejection),
}

/// Parse the payload body. Agents sometimes emit raw newlines or tabs inside
/// string values; a second attempt flattens those before giving up.
fn parse_body(body: &str) -> Result<RawBlock, BlockError> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(first) => {
            let flattened: String = body
                .chars()
                .map(|c| if matches!(c, '\r' | '\n' | '\t') { ' ' } else { c })
                .collect();
            serde_json::from_str(&flattened).map_err(|_| BlockError::NotJson(first))?
        }
    };
    if !value.is_object() {
        return Err(BlockError::NotAnObject);
    }
    serde_json::from_value(value).map_err(BlockError::Shape)
}

fn supplier_entry(value: serde_json::Value, validator: &Validator) -> Result<SupplierRisk, EntryError> {
    let raw: RawSupplier = serde_json::from_value(value)?;
    let supplier = SupplierRisk {
        supplier_name: raw.supplier_name.trim().to_string(),
        risk_type: raw.risk_type.parse()?,
        severity: raw.severity.parse()?,
        summary: raw.summary.trim().to_string(),
        evidence: raw.evidence.trim().to_string(),
    };
    validator.check_supplier(&supplier)?;
    Ok(supplier)
}

fn action_entry(value: serde_json::Value, validator: &Validator) -> Result<ComplianceAction, EntryError> {
    let raw: RawAction = serde_json::from_value(value)?;
    let action = ComplianceAction {
        action: raw.action.trim().to_string(),
        category: raw.category.parse()?,
        priority: raw.priority.parse()?,
        rationale: raw.rationale.trim().to_string(),
    };
    validator.check_action(&action)?;
    Ok(action)
}

/// Locate, parse and validate the payload in `content`. `None` when there is
/// no complete payload or it is not a JSON object; never fails otherwise.
pub fn extract_block(content: &str, validator: &Validator) -> Option<StructuredBlock> {
    let body = marker::find_block(content)?;
    let raw = match parse_body(body) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Ignoring structured data block: {e}");
            return None;
        }
    };

    let mut block = StructuredBlock::default();

    for (i, value) in raw.suppliers_at_risk.into_iter().enumerate() {
        match supplier_entry(value, validator) {
            Ok(s) => block.suppliers_at_risk.push(s),
            Err(e) => debug!("Dropping structured supplier #{i}: {e}"),
        }
    }
    for (i, value) in raw.compliance_actions.into_iter().enumerate() {
        match action_entry(value, validator) {
            Ok(a) => block.compliance_actions.push(a),
            Err(e) => debug!("Dropping structured action #{i}: {e}"),
        }
    }

    Some(block)
}
