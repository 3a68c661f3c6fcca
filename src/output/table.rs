use std::fmt::Write;

use unicode_width::UnicodeWidthStr;

use crate::report::ReportModel;
use crate::sanitize::SanitizedMessage;
use crate::transcript::Role;

/// Shown under a message whose payload was hidden from the rendering.
pub const STRUCTURED_DATA_INDICATOR: &str = "📋 Compliance data captured";

/// Truncate a string to fit within max_width (respecting unicode width).
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

/// Left-align to `width` display columns; `{:<N}` pads by chars, not columns.
fn pad(s: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(s);
    format!("{s}{}", " ".repeat(width.saturating_sub(used)))
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Terminal summary of a report for `riskscan report`.
pub fn render_report(report: &ReportModel, total_messages: usize) -> String {
    let mut out = String::new();

    if report.is_empty() {
        let _ = writeln!(
            out,
            "No suppliers at risk or compliance actions found in {total_messages} message{}.",
            plural(total_messages)
        );
        return out;
    }

    let suppliers = &report.suppliers_at_risk;
    let _ = writeln!(out, "{} supplier{} at risk:\n", suppliers.len(), plural(suppliers.len()));
    if !suppliers.is_empty() {
        let _ = writeln!(out, "  {} {} {}", pad("SUPPLIER", 40), pad("RISK TYPE", 20), "SEVERITY");
        let _ = writeln!(out, "  {}", "-".repeat(72));
        for s in suppliers {
            let _ = writeln!(
                out,
                "  {} {} {}",
                pad(&truncate(&s.supplier_name, 40), 40),
                pad(s.risk_type.as_str(), 20),
                s.severity
            );
            if !s.summary.is_empty() {
                let _ = writeln!(out, "    {}", truncate(&s.summary.replace('\n', " "), 74));
            }
            if !s.evidence.is_empty() {
                let _ = writeln!(out, "    evidence: {}", truncate(&s.evidence.replace('\n', " "), 64));
            }
            out.push('\n');
        }
    }

    let actions = &report.compliance_actions;
    let _ = writeln!(out, "{} compliance action{}:", actions.len(), plural(actions.len()));
    for (priority, group) in report.actions_by_priority() {
        let _ = writeln!(out, "\n  {priority} priority ({})", group.len());
        for (i, a) in group.iter().enumerate() {
            let _ = writeln!(out, "    {}. [{}] {}", i + 1, a.category, truncate(&a.action, 64));
            if !a.rationale.is_empty() {
                let _ = writeln!(out, "       └─ {}", truncate(&a.rationale, 64));
            }
        }
    }

    let _ = writeln!(out, "\nAnalyzed {total_messages} message{}.", plural(total_messages));
    out
}

pub fn print_report(report: &ReportModel, total_messages: usize) {
    print!("{}", render_report(report, total_messages));
}

/// One transcript message as it would appear in a chat view.
pub fn render_sanitized(index: usize, role: Role, message: &SanitizedMessage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{index}] {}", role.as_str());

    if message.main_text.is_empty() {
        let _ = writeln!(out, "  (no visible text)");
    } else {
        for line in message.main_text.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }

    if message.has_structured_data {
        let _ = writeln!(out, "\n  {STRUCTURED_DATA_INDICATOR}");
    }

    if let Some(reference) = &message.reference_text {
        let _ = writeln!(out, "\n  ── References ──");
        for line in reference.lines() {
            let _ = writeln!(out, "  │ {line}");
        }
    }

    out
}

pub fn print_sanitized(index: usize, role: Role, message: &SanitizedMessage) {
    println!("{}", render_sanitized(index, role, message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ActionCategory, ComplianceAction, Priority, RiskType, Severity, SupplierRisk};

    fn action(text: &str, priority: Priority) -> ComplianceAction {
        ComplianceAction {
            action: text.to_string(),
            category: ActionCategory::Verification,
            priority,
            rationale: String::new(),
        }
    }

    #[test]
    fn truncate_respects_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn empty_report_message() {
        let out = render_report(&ReportModel::default(), 1);
        assert_eq!(out, "No suppliers at risk or compliance actions found in 1 message.\n");
    }

    #[test]
    fn report_lists_suppliers_and_groups_actions() {
        let report = ReportModel {
            suppliers_at_risk: vec![SupplierRisk {
                supplier_name: "ABC Transport Services".to_string(),
                risk_type: RiskType::OperationalRisk,
                severity: Severity::Medium,
                summary: "Delays".to_string(),
                evidence: String::new(),
            }],
            compliance_actions: vec![
                action("Consider a follow-up review", Priority::Low),
                action("Verify ABN registration now", Priority::High),
            ],
        };
        let out = render_report(&report, 3);
        assert!(out.contains("1 supplier at risk:"));
        assert!(out.contains("ABC Transport Services"));
        assert!(out.contains("Operational Risk"));
        let high = out.find("High priority").unwrap();
        let low = out.find("Low priority").unwrap();
        assert!(high < low);
        assert!(out.contains("1. [Verification] Verify ABN registration now"));
        assert!(out.ends_with("Analyzed 3 messages.\n"));
    }

    #[test]
    fn sanitized_rendering_shows_indicator_and_references() {
        let message = SanitizedMessage {
            main_text: "Summary text.".to_string(),
            reference_text: Some("References:\n[1] Register".to_string()),
            has_structured_data: true,
        };
        let out = render_sanitized(2, Role::Assistant, &message);
        assert!(out.starts_with("[2] assistant\n  Summary text.\n"));
        assert!(out.contains(STRUCTURED_DATA_INDICATOR));
        assert!(out.contains("  │ [1] Register"));
    }

    #[test]
    fn sanitized_rendering_without_extras() {
        let message = SanitizedMessage {
            main_text: String::new(),
            reference_text: None,
            has_structured_data: false,
        };
        let out = render_sanitized(0, Role::Tool, &message);
        assert_eq!(out, "[0] tool\n  (no visible text)\n");
    }
}
