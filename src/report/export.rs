use serde::{Deserialize, Serialize};

use super::{ComplianceAction, ReportModel, SupplierRisk};

/// Timestamp layout used in exports and export file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_timestamp: String,
    pub total_messages_analyzed: usize,
    pub suppliers_at_risk_count: usize,
    pub compliance_actions_count: usize,
}

/// The downloadable report: metadata plus the two finding lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportExport {
    pub report_metadata: ReportMetadata,
    pub suppliers_at_risk: Vec<SupplierRisk>,
    pub compliance_actions: Vec<ComplianceAction>,
}

impl ReportExport {
    pub fn new(report: &ReportModel, total_messages: usize, generated_timestamp: impl Into<String>) -> Self {
        Self {
            report_metadata: ReportMetadata {
                generated_timestamp: generated_timestamp.into(),
                total_messages_analyzed: total_messages,
                suppliers_at_risk_count: report.suppliers_at_risk.len(),
                compliance_actions_count: report.compliance_actions.len(),
            },
            suppliers_at_risk: report.suppliers_at_risk.clone(),
            compliance_actions: report.compliance_actions.clone(),
        }
    }

    /// Export stamped with the local wall-clock time.
    pub fn now(report: &ReportModel, total_messages: usize) -> Self {
        let ts = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::new(report, total_messages, ts)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering for sharing outside the tool.
    pub fn to_text(&self) -> String {
        let rule = "=".repeat(80);
        let thin = "-".repeat(80);
        let meta = &self.report_metadata;
        let mut lines = vec![
            rule.clone(),
            "PROCUREMENT COMPLIANCE REPORT".to_string(),
            rule.clone(),
            format!("Generated: {}", meta.generated_timestamp),
            format!("Total Messages Analyzed: {}", meta.total_messages_analyzed),
            String::new(),
            rule.clone(),
            "SUPPLIERS AT RISK".to_string(),
            rule.clone(),
            format!("Total: {}", meta.suppliers_at_risk_count),
            String::new(),
        ];

        for s in &self.suppliers_at_risk {
            lines.push(thin.clone());
            lines.push(format!("Supplier: {}", s.supplier_name));
            lines.push(format!("Risk Type: {}", s.risk_type));
            lines.push(format!("Severity: {}", s.severity));
            if !s.summary.is_empty() {
                lines.push(format!("Summary: {}", s.summary));
            }
            if !s.evidence.is_empty() {
                lines.push(format!("Evidence: {}", s.evidence));
            }
            lines.push(String::new());
        }

        lines.push(String::new());
        lines.push(rule.clone());
        lines.push("COMPLIANCE DUE DILIGENCE ACTIONS".to_string());
        lines.push(rule.clone());
        lines.push(format!("Total: {}", meta.compliance_actions_count));
        lines.push(String::new());

        for (idx, a) in self.compliance_actions.iter().enumerate() {
            lines.push(format!("{}. [{}] {}", idx + 1, a.priority, a.category));
            lines.push(format!("   {}", a.action));
            if !a.rationale.is_empty() {
                lines.push(format!("   Rationale: {}", a.rationale));
            }
            lines.push(String::new());
        }

        lines.push(rule.clone());
        lines.push("END OF REPORT".to_string());
        lines.push(rule);
        lines.join("\n")
    }

    /// `compliance_report_2026-01-15_09-30-00.json` style name for this export.
    pub fn default_filename(&self, extension: &str) -> String {
        let stamp = self
            .report_metadata
            .generated_timestamp
            .replace(' ', "_")
            .replace(':', "-");
        format!("compliance_report_{stamp}.{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ActionCategory, Priority, RiskType, Severity};

    fn sample() -> ReportModel {
        ReportModel {
            suppliers_at_risk: vec![SupplierRisk {
                supplier_name: "ABC Transport Services".to_string(),
                risk_type: RiskType::OperationalRisk,
                severity: Severity::Medium,
                summary: "Delays".to_string(),
                evidence: "News".to_string(),
            }],
            compliance_actions: vec![ComplianceAction {
                action: "Request updated delivery schedules".to_string(),
                category: ActionCategory::Communication,
                priority: Priority::High,
                rationale: "Repeated delays".to_string(),
            }],
        }
    }

    #[test]
    fn json_envelope_shape() {
        let export = ReportExport::new(&sample(), 4, "2026-01-15 09:30:00");
        let value: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();
        let meta = &value["report_metadata"];
        assert_eq!(meta["generated_timestamp"], "2026-01-15 09:30:00");
        assert_eq!(meta["total_messages_analyzed"], 4);
        assert_eq!(meta["suppliers_at_risk_count"], 1);
        assert_eq!(meta["compliance_actions_count"], 1);
        assert_eq!(value["suppliers_at_risk"][0]["risk_type"], "Operational Risk");
        assert_eq!(value["compliance_actions"][0]["category"], "Communication");
    }

    #[test]
    fn json_export_reads_back() {
        let export = ReportExport::new(&sample(), 4, "2026-01-15 09:30:00");
        let back: ReportExport = serde_json::from_str(&export.to_json().unwrap()).unwrap();
        assert_eq!(back, export);
    }

    #[test]
    fn text_report_lists_findings() {
        let text = ReportExport::new(&sample(), 4, "2026-01-15 09:30:00").to_text();
        assert!(text.contains("Generated: 2026-01-15 09:30:00"));
        assert!(text.contains("Supplier: ABC Transport Services"));
        assert!(text.contains("Risk Type: Operational Risk"));
        assert!(text.contains("1. [High] Communication"));
        assert!(text.contains("   Rationale: Repeated delays"));
        assert!(text.trim_end().ends_with(&"=".repeat(80)));
    }

    #[test]
    fn empty_report_still_renders_sections() {
        let text = ReportExport::new(&ReportModel::default(), 0, "2026-01-15 09:30:00").to_text();
        assert!(text.contains("SUPPLIERS AT RISK"));
        assert!(text.contains("Total: 0"));
        assert!(text.contains("END OF REPORT"));
    }

    #[test]
    fn filename_is_filesystem_safe() {
        let export = ReportExport::new(&ReportModel::default(), 0, "2026-01-15 09:30:00");
        assert_eq!(export.default_filename("json"), "compliance_report_2026-01-15_09-30-00.json");
    }
}
