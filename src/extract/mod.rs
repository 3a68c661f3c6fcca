pub mod heuristic;
pub mod marker;
pub mod structured;
pub mod validate;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{Limits, RiskscanConfig};
use crate::report::{Origin, ReportBuilder, ReportModel};
use crate::sanitize::markup;
use crate::transcript::TranscriptMessage;
use heuristic::HeuristicExtractor;
use validate::Validator;

/// Builds a report from a transcript. Construct once per config; reusable
/// across transcripts.
#[derive(Debug, Clone)]
pub struct Extractor {
    validator: Validator,
    heuristic: HeuristicExtractor,
    limits: Limits,
}

impl Extractor {
    pub fn new(config: &RiskscanConfig) -> Result<Self> {
        let heuristic = HeuristicExtractor::new(&config.vocabulary)
            .context("Invalid vocabulary: could not build extraction patterns")?;
        Ok(Self {
            validator: Validator::new(&config.vocabulary, &config.limits),
            heuristic,
            limits: config.limits,
        })
    }

    /// Walk eligible messages in order. A message whose payload yields at
    /// least one valid entry contributes only those entries; any other message
    /// falls back to the heuristics.
    pub fn generate_report(&self, transcript: &[TranscriptMessage]) -> ReportModel {
        let mut builder = ReportBuilder::new(&self.limits);
        let mut structured_messages = 0usize;
        let mut heuristic_messages = 0usize;

        for (index, message) in transcript.iter().enumerate() {
            if !message.is_eligible() {
                debug!("Skipping message #{index} ({})", message.role.as_str());
                continue;
            }

            if let Some(block) = structured::extract_block(&message.content, &self.validator) {
                if !block.is_empty() {
                    structured_messages += 1;
                    for supplier in block.suppliers_at_risk {
                        builder.push_supplier(supplier, Origin::Structured);
                    }
                    for action in block.compliance_actions {
                        builder.push_action(action);
                    }
                    continue;
                }
            }

            heuristic_messages += 1;
            self.apply_heuristics(index, &message.content, &mut builder);
        }

        let report = builder.finish();
        info!(
            "Report built from {} messages ({structured_messages} structured, {heuristic_messages} heuristic): {} suppliers, {} actions",
            transcript.len(),
            report.suppliers_at_risk.len(),
            report.compliance_actions.len()
        );
        report
    }

    fn apply_heuristics(&self, index: usize, content: &str, builder: &mut ReportBuilder) {
        let text = markup::to_plain_text(&marker::strip_blocks(content));
        let findings = self.heuristic.extract(&text);

        for supplier in findings.suppliers {
            match self.validator.check_supplier(&supplier) {
                Ok(()) => {
                    builder.push_supplier(supplier, Origin::Heuristic);
                }
                Err(e) => debug!(
                    "Message #{index}: dropping heuristic supplier {:?}: {e}",
                    supplier.supplier_name
                ),
            }
        }
        for action in findings.actions {
            match self.validator.check_action(&action) {
                Ok(()) => {
                    builder.push_action(action);
                }
                Err(e) => debug!("Message #{index}: dropping heuristic action: {e}"),
            }
        }
    }
}

/// One-shot convenience over [`Extractor`].
pub fn generate_report(transcript: &[TranscriptMessage], config: &RiskscanConfig) -> Result<ReportModel> {
    Ok(Extractor::new(config)?.generate_report(transcript))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ActionCategory, Priority, RiskType, Severity};
    use crate::transcript::Role;

    fn extractor() -> Extractor {
        Extractor::new(&RiskscanConfig::default()).unwrap()
    }

    fn assistant(content: &str) -> TranscriptMessage {
        TranscriptMessage::new(Role::Assistant, content)
    }

    const PAYLOAD_MESSAGE: &str = "Summary text.\n\n---STRUCTURED_DATA---\n\
        {\"suppliers_at_risk\":[{\"supplier_name\":\"ABC Transport Services\",\"risk_type\":\"Operational Risk\",\"severity\":\"Medium\",\"summary\":\"Delays\",\"evidence\":\"News\"}],\
        \"compliance_actions\":[]}\n---END_STRUCTURED_DATA---";

    #[test]
    fn payload_entries_are_reported_exactly() {
        let report = extractor().generate_report(&[assistant(PAYLOAD_MESSAGE)]);
        assert_eq!(report.suppliers_at_risk.len(), 1);
        let s = &report.suppliers_at_risk[0];
        assert_eq!(s.supplier_name, "ABC Transport Services");
        assert_eq!(s.risk_type, RiskType::OperationalRisk);
        assert_eq!(s.severity, Severity::Medium);
        assert_eq!(s.summary, "Delays");
        assert_eq!(s.evidence, "News");
        assert!(report.compliance_actions.is_empty());
    }

    #[test]
    fn tool_output_contributes_nothing() {
        let transcript = vec![
            TranscriptMessage::new(Role::Tool, PAYLOAD_MESSAGE),
            assistant("No issues were found in the register."),
        ];
        let report = extractor().generate_report(&transcript);
        assert!(report.is_empty());
    }

    #[test]
    fn assistant_turns_with_tool_calls_are_skipped() {
        let transcript = vec![assistant(PAYLOAD_MESSAGE).with_tool_calls()];
        assert!(extractor().generate_report(&transcript).is_empty());
    }

    #[test]
    fn user_messages_are_scanned() {
        let transcript = vec![TranscriptMessage::new(Role::User, PAYLOAD_MESSAGE)];
        assert_eq!(extractor().generate_report(&transcript).suppliers_at_risk.len(), 1);
    }

    #[test]
    fn payload_wins_over_heuristics_in_the_same_message() {
        let content = format!(
            "The vendor Zenith Cleaning Group has significant compliance issues.\n\n{PAYLOAD_MESSAGE}"
        );
        let report = extractor().generate_report(&[assistant(&content)]);
        let names: Vec<_> = report.suppliers_at_risk.iter().map(|s| s.supplier_name.as_str()).collect();
        assert_eq!(names, vec!["ABC Transport Services"]);
    }

    #[test]
    fn empty_or_broken_payload_falls_back_to_heuristics() {
        let broken = "The vendor Zenith Cleaning Group has significant compliance issues.\n\n\
            ---STRUCTURED_DATA---\n{oops\n---END_STRUCTURED_DATA---";
        let empty = "The supplier Harbour Civil Works has ongoing delivery delays.\n\n\
            ---STRUCTURED_DATA---\n{\"suppliers_at_risk\":[],\"compliance_actions\":[]}\n---END_STRUCTURED_DATA---";
        let report = extractor().generate_report(&[assistant(broken), assistant(empty)]);
        let names: Vec<_> = report.suppliers_at_risk.iter().map(|s| s.supplier_name.as_str()).collect();
        assert_eq!(names, vec!["Zenith Cleaning Group", "Harbour Civil Works"]);
        assert_eq!(report.suppliers_at_risk[0].risk_type, RiskType::ComplianceRisk);
        assert_eq!(report.suppliers_at_risk[0].severity, Severity::High);
        assert_eq!(report.suppliers_at_risk[1].risk_type, RiskType::OperationalRisk);
        assert!(report.suppliers_at_risk.iter().all(|s| s.evidence.is_empty()));
    }

    #[test]
    fn fallback_is_decided_per_message() {
        let heuristic = assistant("The vendor Zenith Cleaning Group has significant compliance issues.");
        let report = extractor().generate_report(&[heuristic, assistant(PAYLOAD_MESSAGE)]);
        let names: Vec<_> = report.suppliers_at_risk.iter().map(|s| s.supplier_name.as_str()).collect();
        assert_eq!(names, vec!["Zenith Cleaning Group", "ABC Transport Services"]);
    }

    #[test]
    fn structured_suppliers_dedup_across_messages() {
        let report = extractor().generate_report(&[assistant(PAYLOAD_MESSAGE), assistant(PAYLOAD_MESSAGE)]);
        assert_eq!(report.suppliers_at_risk.len(), 1);
    }

    #[test]
    fn heuristic_actions_are_validated_and_collected() {
        let content = "Recommended actions:\n\
            - Immediately verify the ABN registration of all subcontractors\n\
            - Short one\n\
            - Consider documenting the review outcome in the contract file";
        let report = extractor().generate_report(&[assistant(content)]);
        let actions = &report.compliance_actions;
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].category, ActionCategory::Verification);
        assert_eq!(actions[0].priority, Priority::High);
        assert_eq!(actions[1].priority, Priority::Low);
    }

    #[test]
    fn markup_is_stripped_before_heuristics() {
        let content = "<p>The vendor <b>Zenith Cleaning Group</b> has significant compliance issues.</p>";
        let report = extractor().generate_report(&[assistant(content)]);
        assert_eq!(report.suppliers_at_risk[0].supplier_name, "Zenith Cleaning Group");
    }

    #[test]
    fn heuristic_hit_inside_reasoning_text_is_dropped() {
        let content = "The search results show that vendor Acme Corp has significant compliance issues.";
        let report = extractor().generate_report(&[assistant(content)]);
        assert!(report.suppliers_at_risk.is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn tool_prose_with_risk_wording_contributes_nothing() {
        let content = "The vendor Zenith Cleaning Group has significant compliance issues.";
        let transcript = vec![TranscriptMessage::new(Role::Tool, content)];
        assert!(extractor().generate_report(&transcript).is_empty());
        // Same text from the assistant is picked up.
        let report = extractor().generate_report(&[assistant(content)]);
        assert_eq!(report.suppliers_at_risk.len(), 1);
    }

    #[test]
    fn empty_transcript_gives_empty_report() {
        assert!(extractor().generate_report(&[]).is_empty());
        assert!(generate_report(&[], &RiskscanConfig::default()).unwrap().is_empty());
    }
}
