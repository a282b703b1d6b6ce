//! Signal extraction: runs every domain matcher over every section and emits
//! one typed signal per hit. No deduplication happens here; aggregate
//! effects are the rule engine's business. Sections with no recognizable
//! patterns simply contribute nothing.

use serde_json::json;
use tracing::debug;

use crate::document::lexicon::Lexicon;
use crate::models::document::{DocumentSection, SectionType};
use crate::models::signal::{Signal, SignalKey, SourceRef};
use crate::signals::patterns;

// Fixed confidences per matcher family. Pattern hits inside their home
// section type score higher than the same pattern found elsewhere, and
// keyword hits score higher when several distinct keywords co-occur.
const CRITERION_CONF_IN_EVALUATION: f64 = 0.9;
const CRITERION_CONF_ELSEWHERE: f64 = 0.7;
const MONEY_CONF: f64 = 0.85;
const KPI_CONF_IN_KPI_SECTION: f64 = 0.8;
const KPI_CONF_CUE_LINE: f64 = 0.7;
const TIMELINE_CONF: f64 = 0.75;
const KEYWORD_CONF_MULTI: f64 = 0.75;
const KEYWORD_CONF_SINGLE: f64 = 0.55;

/// Keyword-scan signal kinds, in emission order.
const KEYWORD_SCAN_KEYS: [SignalKey; 6] = [
    SignalKey::GovernanceStructure,
    SignalKey::TechnicalRequirement,
    SignalKey::StrategicTheme,
    SignalKey::ComplianceMention,
    SignalKey::InnovationMention,
    SignalKey::ScopeItem,
];

/// Extract all signals from structured sections, in deterministic order:
/// section by section, matcher family by matcher family.
pub fn extract_from_sections(sections: &[DocumentSection], lexicon: &Lexicon) -> Vec<Signal> {
    let mut signals = Vec::new();
    for (index, section) in sections.iter().enumerate() {
        let source = source_ref(index, section);
        extract_criteria(section, lexicon, &source, &mut signals);
        extract_money(section, &source, &mut signals);
        extract_kpi(section, lexicon, &source, &mut signals);
        extract_timeline(section, &source, &mut signals);
        extract_keywords(section, lexicon, &source, &mut signals);
    }
    debug!(signals = signals.len(), "extracted signals");
    signals
}

fn source_ref(index: usize, section: &DocumentSection) -> SourceRef {
    SourceRef {
        section_index: index,
        section_type: section.section_type,
        section_title: section.title.clone(),
        page_start: section.page_range.start,
        page_end: section.page_range.end,
    }
}

/// `<criterion> (<NN>%)` hits. The payload mirrors the canonical criterion
/// name as a numeric key so threshold rules can address it directly, e.g.
/// `"tech >= 0.35"`.
fn extract_criteria(
    section: &DocumentSection,
    lexicon: &Lexicon,
    source: &SourceRef,
    out: &mut Vec<Signal>,
) {
    let confidence = if section.section_type == SectionType::Evaluation {
        CRITERION_CONF_IN_EVALUATION
    } else {
        CRITERION_CONF_ELSEWHERE
    };
    for hit in patterns::criterion_weights(&section.content) {
        let criterion = lexicon
            .canonical_criterion(&hit.label)
            .unwrap_or(hit.label.as_str())
            .to_string();
        let mut payload = json!({
            "criterion": criterion,
            "weight": hit.weight,
        });
        payload[&criterion] = json!(hit.weight);
        out.push(Signal {
            key: SignalKey::EvaluationCriteria,
            value: hit.raw,
            payload,
            confidence,
            source: source.clone(),
        });
    }
}

fn extract_money(section: &DocumentSection, source: &SourceRef, out: &mut Vec<Signal>) {
    for hit in patterns::money_amounts(&section.content) {
        let mut payload = json!({ "amount": hit.amount, "currency": hit.currency });
        // Payment-schedule flags from the section summary ride along as
        // numeric keys so threshold rules can address them, e.g.
        // "installments >= 1".
        for flag in ["installments", "advance_payment"] {
            if section.normalized_payload[flag].as_bool() == Some(true) {
                payload[flag] = json!(1.0);
            }
        }
        out.push(Signal {
            key: SignalKey::BudgetAmount,
            value: hit.raw,
            payload,
            confidence: MONEY_CONF,
            source: source.clone(),
        });
    }
}

/// KPI statements count everywhere in a kpi section, but elsewhere only on
/// lines that carry an explicit target cue, to keep incidental figures out.
fn extract_kpi(
    section: &DocumentSection,
    lexicon: &Lexicon,
    source: &SourceRef,
    out: &mut Vec<Signal>,
) {
    if section.section_type == SectionType::Kpi {
        for hit in patterns::kpi_targets(&section.content) {
            out.push(kpi_signal(hit, KPI_CONF_IN_KPI_SECTION, source));
        }
        return;
    }
    for line in section.content.lines() {
        let lowered = line.to_lowercase();
        let has_cue = lexicon
            .kpi_line_cues
            .iter()
            .any(|cue| lowered.contains(&cue.to_lowercase()));
        if !has_cue {
            continue;
        }
        for hit in patterns::kpi_targets(line) {
            out.push(kpi_signal(hit, KPI_CONF_CUE_LINE, source));
        }
    }
}

fn kpi_signal(hit: patterns::KpiTarget, confidence: f64, source: &SourceRef) -> Signal {
    Signal {
        key: SignalKey::KpiTarget,
        value: hit.raw,
        payload: json!({ "name": hit.name, "target": hit.target, "unit": hit.unit }),
        confidence,
        source: source.clone(),
    }
}

fn extract_timeline(section: &DocumentSection, source: &SourceRef, out: &mut Vec<Signal>) {
    for hit in patterns::durations(&section.content) {
        out.push(Signal {
            key: SignalKey::TimelineDate,
            value: hit.raw,
            payload: json!({ "months": hit.months }),
            confidence: TIMELINE_CONF,
            source: source.clone(),
        });
    }
    for hit in patterns::date_refs(&section.content) {
        out.push(Signal {
            key: SignalKey::TimelineDate,
            value: hit.raw,
            payload: json!({ "year": hit.year, "month": hit.month }),
            confidence: TIMELINE_CONF,
            source: source.clone(),
        });
    }
}

/// Fixed keyword lists per signal kind; one signal per keyword found.
/// Several distinct hits for the same kind inside one section raise every
/// one of that kind's confidences.
fn extract_keywords(
    section: &DocumentSection,
    lexicon: &Lexicon,
    source: &SourceRef,
    out: &mut Vec<Signal>,
) {
    let lowered = section.content.to_lowercase();
    for key in KEYWORD_SCAN_KEYS {
        let found: Vec<&String> = lexicon
            .signal_keywords_for(key)
            .iter()
            .filter(|kw| lowered.contains(&kw.to_lowercase()))
            .collect();
        let confidence = if found.len() >= 2 {
            KEYWORD_CONF_MULTI
        } else {
            KEYWORD_CONF_SINGLE
        };
        for keyword in found {
            out.push(Signal {
                key,
                value: keyword.clone(),
                payload: json!({ "keyword": keyword }),
                confidence,
                source: source.clone(),
            });
        }
    }
}
