//! Typed signals: atomized facts pulled out of document sections, carrying
//! enough provenance to explain any downstream persona change.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::document::SectionType;

/// The closed vocabulary of extractable facts.
///
/// Rules target signals by this key; free-form string keys are deliberately
/// impossible so a typo in a rule file fails deserialization instead of
/// silently never matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKey {
    KpiTarget,
    EvaluationCriteria,
    BudgetAmount,
    GovernanceStructure,
    TechnicalRequirement,
    StrategicTheme,
    ComplianceMention,
    InnovationMention,
    ScopeItem,
    TimelineDate,
}

impl SignalKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKey::KpiTarget => "kpi_target",
            SignalKey::EvaluationCriteria => "evaluation_criteria",
            SignalKey::BudgetAmount => "budget_amount",
            SignalKey::GovernanceStructure => "governance_structure",
            SignalKey::TechnicalRequirement => "technical_requirement",
            SignalKey::StrategicTheme => "strategic_theme",
            SignalKey::ComplianceMention => "compliance_mention",
            SignalKey::InnovationMention => "innovation_mention",
            SignalKey::ScopeItem => "scope_item",
            SignalKey::TimelineDate => "timeline_date",
        }
    }
}

/// Where in the document a signal came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Index of the section in the structurer's output order.
    pub section_index: usize,
    pub section_type: SectionType,
    pub section_title: String,
    pub page_start: u32,
    pub page_end: u32,
}

/// One extracted fact.
///
/// `value` is the raw matched text; `payload` carries the parsed structured
/// form (numbers, canonical criterion names) that match conditions and
/// transforms operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub key: SignalKey,
    pub value: String,
    pub payload: Value,
    /// 0.0 – 1.0 extraction confidence, set by the matcher that produced it.
    pub confidence: f64,
    pub source: SourceRef,
}

impl Signal {
    /// Numeric field lookup on the structured payload, used by threshold
    /// match conditions. Absent or non-numeric fields yield `None`.
    pub fn payload_number(&self, field: &str) -> Option<f64> {
        self.payload.get(field).and_then(Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_signal(payload: Value) -> Signal {
        Signal {
            key: SignalKey::EvaluationCriteria,
            value: "기술 (40%)".to_string(),
            payload,
            confidence: 0.9,
            source: SourceRef {
                section_index: 0,
                section_type: SectionType::Evaluation,
                section_title: "평가 기준".to_string(),
                page_start: 3,
                page_end: 3,
            },
        }
    }

    #[test]
    fn test_signal_key_snake_case_matches_as_str() {
        let keys = [
            SignalKey::KpiTarget,
            SignalKey::EvaluationCriteria,
            SignalKey::BudgetAmount,
            SignalKey::GovernanceStructure,
            SignalKey::TechnicalRequirement,
            SignalKey::StrategicTheme,
            SignalKey::ComplianceMention,
            SignalKey::InnovationMention,
            SignalKey::ScopeItem,
            SignalKey::TimelineDate,
        ];
        for key in keys {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn test_payload_number_reads_numeric_fields() {
        let sig = make_signal(json!({"criterion": "tech", "weight": 0.4, "tech": 0.4}));
        assert_eq!(sig.payload_number("weight"), Some(0.4));
        assert_eq!(sig.payload_number("tech"), Some(0.4));
    }

    #[test]
    fn test_payload_number_none_for_missing_or_text_fields() {
        let sig = make_signal(json!({"criterion": "tech"}));
        assert_eq!(sig.payload_number("tech"), None, "absent field");
        assert_eq!(sig.payload_number("criterion"), None, "non-numeric field");
    }
}
